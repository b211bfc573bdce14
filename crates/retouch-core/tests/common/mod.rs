#![allow(dead_code)]

use std::time::{Duration, Instant};

use retouch_core::config::EditorConfig;
use retouch_core::editor::Editor;
use retouch_core::geometry::{NormalizedRect, PixelSize, Point, Size};
use retouch_core::history::ImageRef;

/// Natural size used by the editor fixtures: a 2:1 landscape image.
pub const NATURAL: PixelSize = PixelSize::new(2000, 1000);

/// Square viewport container.
pub const CONTAINER: Size = Size::new(1000.0, 1000.0);

/// Fit zoom for `NATURAL` in `CONTAINER`: min(0.5, 1.0) * 0.95.
pub const FIT_ZOOM: f32 = 0.475;

/// Rendered image bounds after a fit: 950x475 centred in the container.
pub const BOUNDS_X: f32 = 25.0;
pub const BOUNDS_Y: f32 = 262.5;
pub const BOUNDS_W: f32 = 950.0;
pub const BOUNDS_H: f32 = 475.0;

/// An editor with `img-0` loaded and fitted.
pub fn open_editor() -> Editor {
    Editor::open(
        EditorConfig::default(),
        ImageRef::new("img-0"),
        NATURAL,
        CONTAINER,
    )
    .unwrap()
}

/// Viewport position of a normalized image coordinate, for a fitted,
/// unpanned editor.
pub fn screen_point(nx: f32, ny: f32) -> Point {
    Point::new(BOUNDS_X + nx * BOUNDS_W, BOUNDS_Y + ny * BOUNDS_H)
}

pub fn rect(x: f32, y: f32, width: f32, height: f32) -> NormalizedRect {
    NormalizedRect::new(x, y, width, height)
}

pub fn ms(t0: Instant, millis: u64) -> Instant {
    t0 + Duration::from_millis(millis)
}

pub fn assert_rect_near(actual: NormalizedRect, expected: NormalizedRect) {
    assert!(
        actual.approx_eq(&expected)
            || ((actual.x - expected.x).abs() < 1e-4
                && (actual.y - expected.y).abs() < 1e-4
                && (actual.width - expected.width).abs() < 1e-4
                && (actual.height - expected.height).abs() < 1e-4),
        "expected {expected:?}, got {actual:?}"
    );
}
