mod common;

use std::time::Instant;

use approx::assert_abs_diff_eq;

use common::*;
use retouch_core::config::EditorConfig;
use retouch_core::editor::{Editor, EditorEvent, Gesture, Hint, PendingOperation, Tool};
use retouch_core::error::RetouchError;
use retouch_core::geometry::{NormalizedRect, PixelRect, PixelSize, Point, Vec2};
use retouch_core::history::ImageRef;
use retouch_core::resize::{AspectChoice, Handle};
use retouch_core::selection::Detection;

fn draw(editor: &mut Editor, from: (f32, f32), to: (f32, f32)) -> Option<NormalizedRect> {
    editor.pointer_down(screen_point(from.0, from.1))?;
    editor.pointer_move(screen_point(to.0, to.1));
    editor.pointer_up();
    editor.drain_events().into_iter().find_map(|e| match e {
        EditorEvent::CropCompleted(r) => Some(r),
        _ => None,
    })
}

fn detections() -> Vec<Detection> {
    vec![
        Detection::new("person", rect(0.1, 0.0, 0.6, 1.0)),
        Detection::new("hat", rect(0.3, 0.0, 0.2, 0.15)),
    ]
}

// ---------------------------------------------------------------------------
// Opening
// ---------------------------------------------------------------------------

#[test]
fn test_open_fits_image() {
    let editor = open_editor();
    let snap = editor.snapshot();
    assert_abs_diff_eq!(snap.committed.zoom, FIT_ZOOM, epsilon = 1e-6);
    assert_eq!(snap.live, snap.committed);
    assert_abs_diff_eq!(snap.image_bounds.x, BOUNDS_X, epsilon = 1e-3);
    assert_abs_diff_eq!(snap.image_bounds.y, BOUNDS_Y, epsilon = 1e-3);
    assert_eq!(snap.tool, Tool::Pan);
    assert!(!snap.crop_mode && !snap.expansion_mode);
    assert!(!snap.can_undo && !snap.can_redo);
}

#[test]
fn test_open_rejects_zero_dimensions() {
    let err = Editor::open(
        EditorConfig::default(),
        ImageRef::new("broken"),
        PixelSize::new(0, 100),
        CONTAINER,
    )
    .unwrap_err();
    assert_eq!(err, RetouchError::InvalidDimensions { width: 0, height: 100 });
}

#[test]
fn test_open_rejects_invalid_config() {
    let mut config = EditorConfig::default();
    config.viewport.min_zoom = 10.0;
    let err = Editor::open(config, ImageRef::new("img"), NATURAL, CONTAINER).unwrap_err();
    assert!(matches!(err, RetouchError::InvalidConfig(_)));
}

// ---------------------------------------------------------------------------
// Pointer routing
// ---------------------------------------------------------------------------

#[test]
fn test_pan_tool_drag_pans_and_commits_on_release() {
    let mut editor = open_editor();
    assert_eq!(editor.pointer_down(Point::new(500.0, 500.0)), Some(Gesture::Pan));
    assert!(editor.pointer_move(Point::new(530.0, 510.0)));

    let snap = editor.snapshot();
    assert_eq!(snap.live.pan, Vec2::new(30.0, 10.0));
    assert_eq!(snap.committed.pan, Vec2::ZERO);

    editor.pointer_up();
    let events = editor.drain_events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        EditorEvent::ViewportCommitted(state) => assert_eq!(state.pan, Vec2::new(30.0, 10.0)),
        other => panic!("unexpected event {other:?}"),
    }
    assert!(editor.gesture().is_none());
}

#[test]
fn test_crop_tool_draws_selection() {
    let mut editor = open_editor();
    editor.toggle_crop_mode();
    assert_eq!(editor.tool(), Tool::Crop);

    let r = draw(&mut editor, (0.6, 0.7), (0.1, 0.2)).unwrap();
    assert_rect_near(r, rect(0.1, 0.2, 0.5, 0.5));
    assert_eq!(editor.crop_pixels(), Some(PixelRect { x: 200, y: 200, width: 1000, height: 500 }));
}

#[test]
fn test_crop_press_outside_image_is_ignored() {
    let mut editor = open_editor();
    editor.toggle_crop_mode();
    assert!(editor.pointer_down(Point::new(10.0, 10.0)).is_none());
    assert!(editor.gesture().is_none());
}

#[test]
fn test_tiny_draw_emits_nothing() {
    let mut editor = open_editor();
    editor.toggle_crop_mode();
    assert!(draw(&mut editor, (0.5, 0.5), (0.505, 0.505)).is_none());
    assert!(editor.selection().rect().is_none());
}

#[test]
fn test_space_overrides_crop_tool() {
    let mut editor = open_editor();
    editor.toggle_crop_mode();
    editor.space_down();
    assert_eq!(editor.pointer_down(screen_point(0.5, 0.5)), Some(Gesture::Pan));
    editor.pointer_up();

    editor.space_up();
    assert_eq!(editor.pointer_down(screen_point(0.5, 0.5)), Some(Gesture::Draw));
}

#[test]
fn test_candidates_block_freehand_draw() {
    let mut editor = open_editor();
    editor.toggle_crop_mode();
    editor.begin_detection().unwrap();
    editor.finish_detection(detections());

    assert!(editor.pointer_down(screen_point(0.5, 0.5)).is_none());

    assert!(editor.draw_manually());
    assert_eq!(editor.pointer_down(screen_point(0.5, 0.5)), Some(Gesture::Draw));
}

#[test]
fn test_pending_operation_blocks_input() {
    let mut editor = open_editor();
    editor.begin_upscale(2).unwrap();
    assert!(editor.pointer_down(Point::new(500.0, 500.0)).is_none());
    assert!(!editor.undo());
    assert!(!editor.select_aspect(AspectChoice::Free));
}

#[test]
fn test_pending_operation_freezes_modes() {
    let mut editor = open_editor();
    assert!(editor.select_aspect(AspectChoice::Free));
    editor.begin_upscale(2).unwrap();

    assert!(!editor.toggle_crop_mode());
    assert!(!editor.cancel_expansion());
    assert!(!editor.draw_manually());
    assert_eq!(editor.toggle_pan_tool(), Tool::Pan);

    assert!(!editor.is_crop_mode());
    assert!(editor.is_expansion_mode());
    assert_eq!(editor.tool(), Tool::Pan);
}

#[test]
fn test_pending_operation_keeps_selection() {
    let mut editor = open_editor();
    editor.toggle_crop_mode();
    let drawn = draw(&mut editor, (0.1, 0.1), (0.5, 0.5)).unwrap();
    editor.begin_edit().unwrap();

    assert!(!editor.clear_selection());
    assert_eq!(editor.toggle_pan_tool(), Tool::Crop);
    assert!(editor.toggle_crop_mode());
    assert_eq!(editor.selection().rect(), Some(drawn));
}

#[test]
fn test_second_press_during_gesture_is_ignored() {
    let mut editor = open_editor();
    editor.pointer_down(Point::new(500.0, 500.0));
    assert!(editor.pointer_down(Point::new(100.0, 100.0)).is_none());
    assert_eq!(editor.gesture(), Some(Gesture::Pan));
}

// ---------------------------------------------------------------------------
// Expansion
// ---------------------------------------------------------------------------

#[test]
fn test_expansion_handle_takes_priority_over_pan() {
    let mut editor = open_editor();
    assert!(editor.select_aspect(AspectChoice::Free));
    assert_eq!(editor.tool(), Tool::Pan);

    let corner = Point::new(BOUNDS_X + BOUNDS_W, BOUNDS_Y + BOUNDS_H);
    assert_eq!(
        editor.pointer_down(corner),
        Some(Gesture::Resize(Handle::BottomRight))
    );

    // 95 screen px at zoom 0.475 is 200 image px, a tenth of the width.
    assert!(editor.pointer_move(Point::new(corner.x + 95.0, corner.y)));
    editor.pointer_up();
    assert_rect_near(editor.resize().rect(), rect(0.0, 0.0, 1.1, 1.0));

    // Away from the handles the pointer pans.
    assert_eq!(editor.pointer_down(screen_point(0.5, 0.5)), Some(Gesture::Pan));
}

#[test]
fn test_select_aspect_leaves_crop_mode() {
    let mut editor = open_editor();
    editor.toggle_crop_mode();
    draw(&mut editor, (0.1, 0.1), (0.5, 0.5)).unwrap();

    let ratio = "16:9".parse().unwrap();
    assert!(editor.select_aspect(AspectChoice::Locked(ratio)));
    assert!(editor.is_expansion_mode());
    assert!(!editor.is_crop_mode());
    assert!(editor.selection().rect().is_none());
    // 2:1 image, so 16:9 grows vertically.
    assert_rect_near(editor.resize().rect(), rect(0.0, -0.0625, 1.0, 1.125));
}

#[test]
fn test_crop_mode_refused_during_expansion() {
    let mut editor = open_editor();
    assert!(editor.select_aspect(AspectChoice::Locked("1:1".parse().unwrap())));

    assert!(!editor.toggle_crop_mode());
    assert!(editor.is_expansion_mode());
    assert!(editor.resize().is_changed());
    assert_eq!(editor.tool(), Tool::Pan);

    assert!(editor.cancel_expansion());
    assert!(editor.toggle_crop_mode());
    assert_eq!(editor.tool(), Tool::Crop);
}

#[test]
fn test_expansion_flow_commits_and_leaves_mode() {
    let mut editor = open_editor();
    editor.select_aspect(AspectChoice::Locked("1:1".parse().unwrap()));

    let request = editor.begin_expansion().unwrap();
    assert_eq!(request.image.as_str(), "img-0");
    assert_eq!(request.canvas.width, 2000);
    assert_eq!(request.canvas.height, 2000);
    assert_eq!(request.canvas.offset_y, 500);
    assert_eq!(editor.pending(), Some(PendingOperation::Expansion));

    assert!(editor.complete_operation("img-1".into()));
    assert!(!editor.is_expansion_mode());
    assert!(!editor.resize().is_changed());
    assert_eq!(editor.image().as_str(), "img-1");
    assert!(editor.history().can_undo());
}

#[test]
fn test_expansion_without_change_is_refused() {
    let mut editor = open_editor();
    assert_eq!(editor.begin_expansion().unwrap_err(), RetouchError::NothingToExpand);

    editor.select_aspect(AspectChoice::Free);
    assert_eq!(editor.begin_expansion().unwrap_err(), RetouchError::NothingToExpand);
    assert!(editor.pending().is_none());
}

#[test]
fn test_cancel_expansion_resets_rect() {
    let mut editor = open_editor();
    editor.select_aspect(AspectChoice::Locked("1:1".parse().unwrap()));
    assert!(editor.cancel_expansion());
    assert!(!editor.is_expansion_mode());
    assert_eq!(editor.resize().rect(), NormalizedRect::FULL);
}

// ---------------------------------------------------------------------------
// Operations and history
// ---------------------------------------------------------------------------

#[test]
fn test_edit_flow_with_undo_and_redo() {
    let mut editor = open_editor();
    editor.toggle_crop_mode();
    draw(&mut editor, (0.1, 0.2), (0.6, 0.7)).unwrap();

    let request = editor.begin_edit().unwrap();
    assert_eq!(request.image.as_str(), "img-0");
    assert_eq!(request.pixels, PixelRect { x: 200, y: 200, width: 1000, height: 500 });
    assert!(request.label.is_none());

    assert!(editor.complete_operation("img-1".into()));
    assert_eq!(
        editor.drain_events(),
        vec![EditorEvent::ImageChanged("img-1".into())]
    );
    assert!(!editor.is_crop_mode());
    assert_eq!(editor.tool(), Tool::Pan);
    assert!(editor.selection().rect().is_none());

    assert!(editor.undo());
    assert_eq!(editor.image().as_str(), "img-0");
    assert!(editor.redo());
    assert_eq!(editor.image().as_str(), "img-1");
    assert!(!editor.redo());
}

#[test]
fn test_edit_without_selection_fails() {
    let mut editor = open_editor();
    assert_eq!(editor.begin_edit().unwrap_err(), RetouchError::NoSelection);
    assert!(editor.pending().is_none());
}

#[test]
fn test_edit_carries_candidate_label() {
    let mut editor = open_editor();
    editor.toggle_crop_mode();
    editor.begin_detection().unwrap();
    let ids = editor.finish_detection(detections());

    assert!(editor.select_candidate(ids[1]));
    let request = editor.begin_edit().unwrap();
    assert_eq!(request.label.as_deref(), Some("hat"));
    assert_eq!(request.rect, rect(0.3, 0.0, 0.2, 0.15));
}

#[test]
fn test_failed_operation_keeps_state() {
    let mut editor = open_editor();
    editor.begin_upscale(4).unwrap();
    editor.fail_operation("service unavailable");

    assert!(editor.pending().is_none());
    assert_eq!(editor.image().as_str(), "img-0");
    assert!(!editor.history().can_undo());
    assert_eq!(
        editor.drain_events(),
        vec![EditorEvent::OperationFailed {
            operation: PendingOperation::Upscale { factor: 4 },
            message: "service unavailable".to_string(),
        }]
    );
}

#[test]
fn test_operations_do_not_overlap() {
    let mut editor = open_editor();
    editor.begin_upscale(2).unwrap();
    assert_eq!(
        editor.begin_detection().unwrap_err(),
        RetouchError::OperationPending("2x upscale".to_string())
    );
    assert_eq!(editor.pending(), Some(PendingOperation::Upscale { factor: 2 }));
}

#[test]
fn test_result_without_pending_operation_is_ignored() {
    let mut editor = open_editor();
    assert!(!editor.complete_operation("stray".into()));
    assert_eq!(editor.image().as_str(), "img-0");
    assert!(editor.drain_events().is_empty());
}

#[test]
fn test_upscale_factor_must_be_at_least_two() {
    let mut editor = open_editor();
    assert_eq!(
        editor.begin_upscale(1).unwrap_err(),
        RetouchError::InvalidUpscaleFactor(1)
    );
}

#[test]
fn test_load_image_resets_everything() {
    let mut editor = open_editor();
    editor.begin_upscale(2).unwrap();
    editor.complete_operation("img-1".into());
    editor.toggle_crop_mode();

    editor.load_image("other".into(), PixelSize::new(800, 600)).unwrap();
    let snap = editor.snapshot();
    assert_abs_diff_eq!(snap.committed.zoom, 1.1875, epsilon = 1e-6);
    assert_eq!(snap.tool, Tool::Pan);
    assert!(!snap.crop_mode);
    assert!(!snap.can_undo && !snap.can_redo);
    assert_eq!(editor.history().len(), 1);
}

#[test]
fn test_image_decoded_refits() {
    let mut editor = open_editor();
    editor.zoom_by(2.0);
    editor.drain_events();

    let state = editor.image_decoded(PixelSize::new(1000, 1000)).unwrap();
    assert_abs_diff_eq!(state.zoom, 0.95, epsilon = 1e-6);
    assert_eq!(editor.drain_events(), vec![EditorEvent::ViewportCommitted(state)]);
}

// ---------------------------------------------------------------------------
// Modes, hints and timers
// ---------------------------------------------------------------------------

#[test]
fn test_hints_follow_crop_progress() {
    let mut editor = open_editor();
    assert_eq!(editor.hint(), Hint::None);

    editor.toggle_crop_mode();
    assert_eq!(editor.hint(), Hint::DrawSelection);

    editor.begin_detection().unwrap();
    assert_eq!(editor.hint(), Hint::WaitingForDetection);

    let ids = editor.finish_detection(detections());
    assert_eq!(editor.hint(), Hint::SelectCandidate);

    editor.select_candidate(ids[0]);
    assert_eq!(editor.hint(), Hint::None);
    assert_eq!(editor.snapshot().selected_label.as_deref(), Some("person"));
}

#[test]
fn test_toggle_pan_tool_only_inside_crop_mode() {
    let mut editor = open_editor();
    assert_eq!(editor.toggle_pan_tool(), Tool::Pan);

    editor.toggle_crop_mode();
    assert_eq!(editor.toggle_pan_tool(), Tool::Pan);
    assert_eq!(editor.toggle_pan_tool(), Tool::Crop);

    editor.toggle_crop_mode();
    assert_eq!(editor.tool(), Tool::Pan);
}

#[test]
fn test_candidate_at_screen_position() {
    let mut editor = open_editor();
    editor.toggle_crop_mode();
    editor.begin_detection().unwrap();
    let ids = editor.finish_detection(detections());

    assert_eq!(editor.candidate_at(screen_point(0.4, 0.1)), Some(ids[1]));
    assert_eq!(editor.candidate_at(screen_point(0.2, 0.8)), Some(ids[0]));
    assert_eq!(editor.candidate_at(screen_point(0.9, 0.5)), None);
}

#[test]
fn test_wheel_commit_arrives_on_tick() {
    let mut editor = open_editor();
    let t0 = Instant::now();
    editor.wheel(Vec2::new(0.0, 40.0), false, t0);

    editor.tick(ms(t0, 149));
    assert!(editor.drain_events().is_empty());

    editor.tick(ms(t0, 150));
    let events = editor.drain_events();
    match events.as_slice() {
        [EditorEvent::ViewportCommitted(state)] => assert_eq!(state.pan, Vec2::new(0.0, -40.0)),
        other => panic!("unexpected events {other:?}"),
    }
}

#[test]
fn test_pan_warning_expires() {
    let mut editor = open_editor();
    let t0 = Instant::now();
    editor.trigger_pan_warning(t0);
    assert!(editor.snapshot().pan_warning);

    editor.tick(ms(t0, 2999));
    assert!(editor.snapshot().pan_warning);

    editor.tick(ms(t0, 3000));
    assert!(!editor.snapshot().pan_warning);
}

#[test]
fn test_shutdown_drops_pending_commit() {
    let mut editor = open_editor();
    let t0 = Instant::now();
    editor.wheel(Vec2::new(0.0, 40.0), false, t0);
    editor.shutdown();

    editor.tick(ms(t0, 1000));
    assert!(editor.drain_events().is_empty());
}
