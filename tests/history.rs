mod common;

use canvas_studio::element::{FilterKind, ObjectKind, ObjectRole};
use canvas_studio::event::EditorEvent;
use canvas_studio::history::HistoryState;
use canvas_studio::services::Plan;
use canvas_studio::tools::ToolId;
use common::Harness;
use futures::executor::block_on;

#[test]
fn test_undo_redo_restore_exact_snapshots() {
    let h = Harness::new(Plan::Free);
    let (mut session, log, _) = h.session(800, 600);
    let baseline = session.scene().serialize().unwrap();

    session.switch_tool(Some(ToolId::Adjust)).unwrap();
    session.set_adjustment(FilterKind::Brightness, 40.0).unwrap();
    h.advance(&mut session, 500);
    let edited = session.scene().serialize().unwrap();
    assert_ne!(edited, baseline);
    assert!(session.history().can_undo());
    assert!(log.count(|e| matches!(e, EditorEvent::HistoryChanged { can_undo: true, .. })) >= 1);

    assert!(block_on(session.undo()).unwrap());
    assert_eq!(session.scene().serialize().unwrap(), baseline);
    assert_eq!(session.history().state(), HistoryState::Idle);
    assert!(session.history().can_redo());

    assert!(block_on(session.redo()).unwrap());
    assert_eq!(session.scene().serialize().unwrap(), edited);
    assert!(!session.history().can_redo());
}

#[test]
fn test_undo_flushes_pending_capture() {
    let h = Harness::new(Plan::Free);
    let (mut session, _log, _) = h.session(800, 600);
    let baseline = session.scene().serialize().unwrap();

    session.switch_tool(Some(ToolId::Adjust)).unwrap();
    session.set_adjustment(FilterKind::Contrast, 25.0).unwrap();
    // No time passes, the capture is still waiting out its debounce
    assert!(block_on(session.undo()).unwrap());
    assert_eq!(session.scene().serialize().unwrap(), baseline);
    assert_eq!(session.history().redo_depth(), 1);
}

#[test]
fn test_nothing_to_undo() {
    let h = Harness::new(Plan::Free);
    let (mut session, _log, _) = h.session(400, 400);
    assert!(!session.history().can_undo());
    assert!(!block_on(session.undo()).unwrap());
    assert!(!block_on(session.redo()).unwrap());
    assert_eq!(session.history().undo_depth(), 1);
}

#[test]
fn test_burst_of_edits_is_one_entry() {
    let h = Harness::new(Plan::Free);
    let (mut session, _log, _) = h.session(800, 600);
    session.switch_tool(Some(ToolId::Adjust)).unwrap();

    session.set_adjustment(FilterKind::Brightness, 10.0).unwrap();
    h.advance(&mut session, 100);
    session.set_adjustment(FilterKind::Brightness, 20.0).unwrap();
    h.advance(&mut session, 100);
    session.set_adjustment(FilterKind::Brightness, 30.0).unwrap();
    h.advance(&mut session, 499);
    assert_eq!(session.history().undo_depth(), 1);
    h.advance(&mut session, 1);
    assert_eq!(session.history().undo_depth(), 2);
}

#[test]
fn test_identical_state_is_not_recorded() {
    let h = Harness::new(Plan::Free);
    let (mut session, _log, _) = h.session(800, 600);
    session.switch_tool(Some(ToolId::Adjust)).unwrap();

    session.set_adjustment(FilterKind::Saturation, 50.0).unwrap();
    h.advance(&mut session, 500);
    assert_eq!(session.history().undo_depth(), 2);

    session.set_adjustment(FilterKind::Saturation, 50.0).unwrap();
    h.advance(&mut session, 500);
    assert_eq!(session.history().undo_depth(), 2);
}

#[test]
fn test_new_edit_clears_redo() {
    let h = Harness::new(Plan::Free);
    let (mut session, _log, _) = h.session(800, 600);
    session.switch_tool(Some(ToolId::Adjust)).unwrap();

    session.set_adjustment(FilterKind::Brightness, 40.0).unwrap();
    h.advance(&mut session, 500);
    assert!(block_on(session.undo()).unwrap());
    assert!(session.history().can_redo());

    session.set_adjustment(FilterKind::Blur, 10.0).unwrap();
    h.advance(&mut session, 500);
    assert!(!session.history().can_redo());
    assert!(!block_on(session.redo()).unwrap());
}

#[test]
fn test_history_is_capped() {
    let h = Harness::new(Plan::Free);
    let (mut session, _log, _) = h.session(800, 600);
    session.switch_tool(Some(ToolId::Adjust)).unwrap();

    for value in 1..=25 {
        session.set_adjustment(FilterKind::Brightness, value as f32).unwrap();
        h.advance(&mut session, 500);
    }
    assert_eq!(session.history().undo_depth(), 20);

    let mut undone = 0;
    while block_on(session.undo()).unwrap() {
        undone += 1;
    }
    assert_eq!(undone, 19);
    assert!(!session.history().can_undo());
    assert_eq!(session.history().redo_depth(), 19);
}

#[test]
fn test_undo_while_cropping_keeps_one_frame() {
    let h = Harness::new(Plan::Free);
    let (mut session, _log, _) = h.session(800, 600);
    let baseline = session.scene().serialize().unwrap();

    session.switch_tool(Some(ToolId::Adjust)).unwrap();
    session.set_adjustment(FilterKind::Brightness, 40.0).unwrap();
    h.advance(&mut session, 500);

    session.switch_tool(Some(ToolId::Crop)).unwrap();
    assert!(block_on(session.undo()).unwrap());

    // The crop tool is back on the restored scene with a fresh frame
    assert_eq!(session.active_tool(), Some(ToolId::Crop));
    let frames = session.scene().objects_of_kind(ObjectKind::Role(ObjectRole::CropOverlay));
    assert_eq!(frames.len(), 1);
    assert_eq!(session.scene().serialize().unwrap(), baseline);
}

#[test]
fn test_restore_does_not_record_history() {
    let h = Harness::new(Plan::Free);
    let (mut session, _log, _) = h.session(800, 600);
    session.switch_tool(Some(ToolId::Adjust)).unwrap();
    session.set_adjustment(FilterKind::Brightness, 40.0).unwrap();
    h.advance(&mut session, 500);

    assert!(block_on(session.undo()).unwrap());
    h.advance(&mut session, 1000);
    assert_eq!(session.history().undo_depth(), 1);
    assert_eq!(session.history().redo_depth(), 1);
}
