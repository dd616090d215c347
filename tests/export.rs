mod common;

use canvas_studio::event::EditorEvent;
use canvas_studio::renderer::{EXPORT_PRESETS, ExportFormat, ExportPreset};
use canvas_studio::services::{Identity, Plan};
use canvas_studio::tools::ToolId;
use canvas_studio::{EditorError, Element};
use common::{Harness, notifications, user};
use egui::{pos2, vec2};
use futures::executor::block_on;

#[test]
fn test_export_ignores_zoom() {
    let h = Harness::new(Plan::Free);
    let (mut session, log, _) = h.session(1000, 1000);
    let zoom = session.present(vec2(440.0, 440.0));
    assert!((zoom - 0.4).abs() < 1e-6);
    assert!(log.count(|e| matches!(e, EditorEvent::ViewChanged { .. })) == 1);

    let exported = block_on(session.export(&ExportPreset::for_format(ExportFormat::Png))).unwrap();
    assert_eq!((exported.width, exported.height), (1000, 1000));
    assert_eq!(exported.file_name, "Poster.png");

    let decoded = image::load_from_memory(&exported.bytes).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (1000, 1000));
    assert_eq!(decoded.get_pixel(500, 500).0, [200, 40, 40, 255]);
    assert_eq!(decoded.get_pixel(2, 997).0, [200, 40, 40, 255]);

    // The view is back where it was
    assert!((session.scene().viewport().zoom - 0.4).abs() < 1e-6);
    assert!(notifications(&log).contains(&"Image exported as PNG!".to_owned()));
}

#[test]
fn test_export_leaves_out_tool_overlays() {
    let h = Harness::new(Plan::Free);
    let (mut session, _log, _) = h.session(200, 100);
    session.switch_tool(Some(ToolId::Crop)).unwrap();

    let exported = block_on(session.export(&EXPORT_PRESETS[0])).unwrap();
    let decoded = image::load_from_memory(&exported.bytes).unwrap().to_rgba8();
    // The crop frame's stroke would land on (20, 10)
    assert_eq!(decoded.get_pixel(20, 10).0, [200, 40, 40, 255]);
    // The on-screen view still shows it
    let view = session.render_view();
    assert_ne!(view.get_pixel(20, 10).0, [200, 40, 40, 255]);
}

#[test]
fn test_jpeg_export() {
    let h = Harness::new(Plan::Free);
    let (mut session, _log, _) = h.session(300, 200);
    let preset = ExportPreset::find("JPEG (Medium)").unwrap();
    let exported = block_on(session.export(&preset)).unwrap();
    assert_eq!(exported.file_name, "Poster.jpg");
    assert_eq!(image::guess_format(&exported.bytes).unwrap(), image::ImageFormat::Jpeg);
}

#[test]
fn test_export_quota() {
    let h = Harness::with_user(user(Plan::Free, 19));
    let (mut session, log, _) = h.session(100, 100);
    let preset = ExportPreset::for_format(ExportFormat::Png);

    block_on(session.export(&preset)).unwrap();
    assert_eq!(h.identity.current_user().unwrap().exports_this_month, 20);

    let err = block_on(session.export(&preset)).unwrap_err();
    assert!(matches!(err, EditorError::QuotaExceeded(_)));
    assert_eq!(log.count(|e| matches!(e, EditorEvent::UpgradeRequired { tool: None, .. })), 1);
    assert!(notifications(&log).contains(&"Upgrade to export more images".to_owned()));
}

#[test]
fn test_pro_exports_are_unlimited() {
    let h = Harness::with_user(user(Plan::Pro, 500));
    let (mut session, _log, _) = h.session(100, 100);
    block_on(session.export(&EXPORT_PRESETS[3])).unwrap();
    assert_eq!(h.identity.current_user().unwrap().exports_this_month, 501);
}

#[test]
fn test_moved_image_exports_background() {
    let h = Harness::new(Plan::Free);
    let (mut session, _log, _) = h.session(400, 400);
    let image = session.scene().main_image().unwrap();
    session.pointer_down(pos2(200.0, 200.0));
    session.pointer_move(pos2(400.0, 200.0));
    session.pointer_up(pos2(400.0, 200.0));
    assert_eq!(session.scene().get(image).unwrap().rect().min, pos2(200.0, 0.0));

    let exported = block_on(session.export(&EXPORT_PRESETS[0])).unwrap();
    let decoded = image::load_from_memory(&exported.bytes).unwrap().to_rgba8();
    assert_eq!(decoded.get_pixel(100, 200).0, [255, 255, 255, 255]);
    assert_eq!(decoded.get_pixel(300, 200).0, [200, 40, 40, 255]);
}

#[test]
fn test_text_export_paints_every_glyph() {
    use canvas_studio::tools::TextTool;

    let h = Harness::new(Plan::Free);
    let (mut session, _log, _) = h.session(800, 300);
    session
        .register_font("Ubuntu", epaint_default_fonts::UBUNTU_LIGHT.to_vec())
        .unwrap();
    session.switch_tool(Some(ToolId::Text)).unwrap();
    let id = session.add_text().unwrap();
    session
        .with_tool(|text: &mut TextTool, cx| {
            text.set_font_size(40.0, cx)?;
            text.set_content("WWWWWWWW", cx)
        })
        .unwrap();

    // Eight W's at 40px advance well past 8 * 40 * 0.6
    let rect = session.scene().get(id).unwrap().rect();
    assert!(rect.width() > 255.0, "{:?}", rect);

    let exported = block_on(session.export(&ExportPreset::for_format(ExportFormat::Png))).unwrap();
    let decoded = image::load_from_memory(&exported.bytes).unwrap().to_rgba8();
    let rightmost_ink = (rect.min.y.max(0.0) as u32..rect.max.y.min(300.0) as u32)
        .flat_map(|y| (0..800).map(move |x| (x, y)))
        .filter(|&(x, y)| decoded.get_pixel(x, y)[0] < 120)
        .map(|(x, _)| x as f32)
        .fold(0.0f32, f32::max);
    assert!(rightmost_ink > rect.min.x + 250.0, "ink ends at {} in {:?}", rightmost_ink, rect);
    assert!(rightmost_ink <= rect.max.x + 1.0);
}
