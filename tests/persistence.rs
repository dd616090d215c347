mod common;

use canvas_studio::element::FilterKind;
use canvas_studio::event::EditorEvent;
use canvas_studio::scene::SceneSnapshot;
use canvas_studio::services::{LocalIdentity, Plan, UserId, UserProfile};
use canvas_studio::tools::ToolId;
use canvas_studio::{EditorConfig, EditorContext, EditorError};
use common::{Harness, notifications};
use futures::executor::block_on;
use std::rc::Rc;

#[test]
fn test_burst_of_edits_saves_once() {
    let h = Harness::new(Plan::Free);
    let (mut session, log, id) = h.session(800, 600);
    session.switch_tool(Some(ToolId::Adjust)).unwrap();

    for value in [10.0, 20.0, 30.0, 40.0, 50.0] {
        session.set_adjustment(FilterKind::Brightness, value).unwrap();
        h.advance(&mut session, 100);
    }
    // Last edit at t=400, the autosave is due at t=2400
    h.clock.set(2399);
    block_on(session.tick()).unwrap();
    assert_eq!(h.projects.save_count(), 0);

    h.clock.set(2400);
    block_on(session.tick()).unwrap();
    assert_eq!(h.projects.save_count(), 1);
    assert_eq!(log.count(|e| matches!(e, EditorEvent::Saved { autosave: true })), 1);

    h.advance(&mut session, 10_000);
    assert_eq!(h.projects.save_count(), 1);
    assert!(!session.persistence().is_dirty());

    let stored = h.projects.record(&id).unwrap().document;
    assert_eq!(stored.scene_snapshot.unwrap(), session.scene().serialize().unwrap());
}

#[test]
fn test_manual_save() {
    let h = Harness::new(Plan::Free);
    let (mut session, log, id) = h.session(800, 600);
    session.switch_tool(Some(ToolId::Adjust)).unwrap();
    session.set_adjustment(FilterKind::Blur, 20.0).unwrap();

    block_on(session.save()).unwrap();
    assert_eq!(h.projects.save_count(), 1);
    assert!(notifications(&log).contains(&"Project saved successfully!".to_owned()));
    assert_eq!(
        h.projects.record(&id).unwrap().document.scene_snapshot,
        Some(session.scene().serialize().unwrap())
    );

    // The pending autosave was cancelled by the manual save
    h.advance(&mut session, 5000);
    assert_eq!(h.projects.save_count(), 1);
}

#[test]
fn test_failed_save_keeps_changes_dirty() {
    let h = Harness::new(Plan::Free);
    let (mut session, log, _) = h.session(800, 600);
    session.switch_tool(Some(ToolId::Adjust)).unwrap();
    session.set_adjustment(FilterKind::Blur, 20.0).unwrap();

    h.projects.set_offline(true);
    h.clock.advance(2000);
    assert!(matches!(block_on(session.tick()), Err(EditorError::ExternalService(_))));
    assert!(session.persistence().is_dirty());
    assert!(notifications(&log).iter().any(|m| m.starts_with("Failed to save project")));

    // Not retried on its own; the next save goes through
    h.projects.set_offline(false);
    h.advance(&mut session, 5000);
    assert_eq!(h.projects.save_count(), 0);
    block_on(session.save()).unwrap();
    assert_eq!(h.projects.save_count(), 1);
}

#[test]
fn test_reopen_restores_saved_scene() {
    let h = Harness::new(Plan::Free);
    let (mut session, _log, id) = h.session(800, 600);
    session.switch_tool(Some(ToolId::Crop)).unwrap();
    session.commit_crop().unwrap();
    session.switch_tool(Some(ToolId::Text)).unwrap();
    session.add_text().unwrap();
    block_on(session.close()).unwrap();
    let saved = session.scene().serialize().unwrap();
    assert_eq!(h.projects.save_count(), 1);

    let (reopened, _log) = h.open(&id);
    assert!(reopened.load_warnings().is_empty());
    assert_eq!(reopened.scene().serialize().unwrap(), saved);
    assert_eq!(reopened.scene().objects().len(), 2);
}

#[test]
fn test_close_without_changes_does_not_save() {
    let h = Harness::new(Plan::Free);
    let (mut session, _log, _) = h.session(800, 600);
    session.switch_tool(Some(ToolId::Crop)).unwrap();
    block_on(session.close()).unwrap();
    assert_eq!(h.projects.save_count(), 0);
    assert_eq!(session.active_tool(), None);
}

#[test]
fn test_corrupt_snapshot_falls_back_to_image() {
    let h = Harness::new(Plan::Free);
    let id = h.create_project(800, 600);
    let mut record = h.projects.record(&id).unwrap();
    record.document.scene_snapshot = Some(SceneSnapshot::from_string("{ not json"));
    h.projects.insert(record);

    let (session, _log) = h.open(&id);
    assert_eq!(session.load_warnings().len(), 1);
    assert_eq!(session.scene().objects().len(), 1);
    assert!(session.scene().main_image().is_some());
}

#[test]
fn test_open_requires_owner() {
    let h = Harness::new(Plan::Free);
    let id = h.create_project(400, 400);
    let open_as = |identity: LocalIdentity| {
        let mut services = h.services.clone();
        services.identity = Rc::new(identity);
        block_on(EditorContext::open(services, EditorConfig::default(), Rc::new(h.clock.clone()), &id))
    };

    let stranger = UserProfile {
        id: UserId("someone-else".to_owned()),
        ..common::user(Plan::Pro, 0)
    };
    assert!(matches!(open_as(LocalIdentity::signed_in(stranger)), Err(EditorError::Auth(_))));
    assert!(matches!(open_as(LocalIdentity::signed_out()), Err(EditorError::Auth(_))));
}

#[test]
fn test_free_plan_project_quota() {
    let h = Harness::new(Plan::Free);
    for _ in 0..3 {
        h.create_project(100, 100);
    }
    let result = block_on(EditorContext::create_project(
        &h.services,
        "One too many",
        common::png(100, 100, [0, 0, 0, 255]),
        "extra.png",
    ));
    let err = result.unwrap_err();
    assert!(matches!(err, EditorError::QuotaExceeded(_)));
    assert!(err.is_upgrade_prompt());
}

#[test]
fn test_reset_to_original() {
    let h = Harness::new(Plan::Free);
    let (mut session, log, id) = h.session(800, 600);
    let original_src = h.projects.record(&id).unwrap().document.original_image.unwrap();
    session.switch_tool(Some(ToolId::Adjust)).unwrap();
    session.set_adjustment(FilterKind::Brightness, 60.0).unwrap();
    let adjusted = session.scene().serialize().unwrap();

    let image = block_on(session.reset_to_original()).unwrap();
    let reset = session.scene().get(image).unwrap().as_image().unwrap();
    assert!(reset.filters.is_empty());
    assert_eq!(reset.src, original_src);
    assert_eq!(session.scene().objects().len(), 1);
    assert_eq!(session.active_tool(), Some(ToolId::Adjust));
    assert!(notifications(&log).contains(&"Canvas reset to original image".to_owned()));

    let stored = h.projects.record(&id).unwrap().document;
    assert_eq!(stored.current_image.as_deref(), Some(original_src.as_str()));
    assert!(!stored.flags.background_removed);

    // The reset itself can be undone
    assert!(block_on(session.undo()).unwrap());
    assert_eq!(session.scene().serialize().unwrap(), adjusted);
}

#[test]
fn test_reset_without_original_fails() {
    let h = Harness::new(Plan::Free);
    let id = h.create_project(400, 400);
    let mut record = h.projects.record(&id).unwrap();
    record.document.original_image = None;
    h.projects.insert(record);

    let (mut session, log) = h.open(&id);
    assert!(matches!(block_on(session.reset_to_original()), Err(EditorError::NotFound(_))));
    assert!(notifications(&log).contains(&"No original image found to reset to".to_owned()));
}

#[test]
fn test_settings_from_config() {
    let h = Harness::new(Plan::Free);
    let id = h.create_project(400, 400);
    let config = EditorConfig::from_json_str(r#"{ "autosave_delay_ms": 100 }"#).unwrap();
    let mut session = block_on(EditorContext::open(h.services.clone(), config, Rc::new(h.clock.clone()), &id)).unwrap();
    session.switch_tool(Some(ToolId::Adjust)).unwrap();
    session.set_adjustment(FilterKind::Blur, 5.0).unwrap();
    h.advance(&mut session, 100);
    assert_eq!(h.projects.save_count(), 1);
}
