use std::time::Instant;

use tracing::debug;

use crate::config::ViewportConfig;
use crate::consts::FALLBACK_ZOOM;
use crate::geometry::{PixelSize, Point, ScreenRect, Size, Vec2};
use crate::schedule::Debounce;

/// Zoom factor and pan offset (viewport pixels) of the displayed image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportState {
    pub zoom: f32,
    pub pan: Vec2,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
        }
    }
}

/// Direction of the most recent ctrl+wheel zoom gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

#[derive(Clone, Copy, Debug)]
struct PanDrag {
    start: Point,
    start_state: ViewportState,
}

/// Owns the viewport transform.
///
/// Two copies of the state exist. `live` changes on every wheel or drag
/// tick and is what the renderer applies. `committed` is what dependent
/// computations (image bounds, pointer mapping) read; it catches up with
/// `live` when a drag ends, on discrete zoom steps, or once the wheel has
/// been quiet for the configured commit delay.
#[derive(Clone, Debug)]
pub struct ViewportController {
    config: ViewportConfig,
    live: ViewportState,
    committed: ViewportState,
    commit_timer: Debounce,
    indicator_timer: Debounce,
    zoom_direction: Option<ZoomDirection>,
    drag: Option<PanDrag>,
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new(ViewportConfig::default())
    }
}

impl ViewportController {
    pub fn new(config: ViewportConfig) -> Self {
        let commit_timer = Debounce::from_millis(config.commit_delay_ms);
        let indicator_timer = Debounce::from_millis(config.zoom_indicator_ms);
        Self {
            config,
            live: ViewportState::default(),
            committed: ViewportState::default(),
            commit_timer,
            indicator_timer,
            zoom_direction: None,
            drag: None,
        }
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    /// State to render right now.
    pub fn live(&self) -> ViewportState {
        self.live
    }

    /// Observable state; lags `live` while a gesture is settling.
    pub fn committed(&self) -> ViewportState {
        self.committed
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn has_pending_commit(&self) -> bool {
        self.commit_timer.is_pending()
    }

    pub fn zoom_direction(&self) -> Option<ZoomDirection> {
        self.zoom_direction
    }

    fn clamp_zoom(&self, zoom: f32) -> f32 {
        zoom.clamp(self.config.min_zoom, self.config.max_zoom)
    }

    /// Zoom that fits `natural` inside `container` with the configured margin.
    ///
    /// Falls back to a zoom of 1 when either size is zero or unknown.
    pub fn fit_to_container(&self, natural: PixelSize, container: Size) -> ViewportState {
        let scale_x = container.width / natural.width as f32;
        let scale_y = container.height / natural.height as f32;
        let zoom = scale_x.min(scale_y) * self.config.fit_margin;
        let zoom = if zoom > 0.0 && zoom.is_finite() {
            zoom
        } else {
            FALLBACK_ZOOM
        };
        ViewportState {
            zoom,
            pan: Vec2::ZERO,
        }
    }

    /// Fit and apply immediately to both live and committed state.
    pub fn reset_to_fit(&mut self, natural: PixelSize, container: Size) -> ViewportState {
        let state = self.fit_to_container(natural, container);
        self.live = state;
        self.committed = state;
        self.commit_timer.cancel();
        self.drag = None;
        debug!(zoom = state.zoom, "Viewport reset to fit");
        state
    }

    /// Wheel tick. With ctrl held the vertical delta zooms exponentially,
    /// otherwise the delta pans in raw viewport pixels. Live state changes
    /// now; the commit is (re)scheduled.
    pub fn apply_wheel(&mut self, delta: Vec2, ctrl: bool, now: Instant) -> ViewportState {
        if ctrl {
            let amount = -delta.y * self.config.wheel_zoom_sensitivity;
            let zoom = self.live.zoom * amount.exp();
            if !zoom.is_nan() {
                self.live.zoom = self.clamp_zoom(zoom);
            }
            self.zoom_direction = Some(if amount > 0.0 {
                ZoomDirection::In
            } else {
                ZoomDirection::Out
            });
            self.indicator_timer.schedule(now);
        } else if delta.x.is_finite() && delta.y.is_finite() {
            self.live.pan = self.live.pan - delta;
        }
        self.commit_timer.schedule(now);
        self.live
    }

    /// Pan state for a drag that started at `start` with `start_state`.
    pub fn apply_drag(start: Point, current: Point, start_state: ViewportState) -> ViewportState {
        ViewportState {
            zoom: start_state.zoom,
            pan: start_state.pan + (current - start),
        }
    }

    pub fn begin_drag(&mut self, pointer: Point) {
        self.drag = Some(PanDrag {
            start: pointer,
            start_state: self.live,
        });
    }

    /// Move an active drag. Returns the new live state, or `None` when no
    /// drag is in progress.
    pub fn update_drag(&mut self, pointer: Point) -> Option<ViewportState> {
        let drag = self.drag?;
        self.live = Self::apply_drag(drag.start, pointer, drag.start_state);
        Some(self.live)
    }

    /// Finish the drag and commit. Returns whether committed state changed.
    pub fn end_drag(&mut self) -> bool {
        if self.drag.take().is_none() {
            return false;
        }
        self.commit()
    }

    /// Discrete zoom step (toolbar buttons): multiply, clamp, commit now.
    pub fn zoom_by_factor(&mut self, factor: f32) -> ViewportState {
        let zoom = self.live.zoom * factor;
        if !zoom.is_nan() {
            self.live.zoom = self.clamp_zoom(zoom);
        }
        self.commit();
        self.live
    }

    /// Copy live into committed. Returns whether anything changed.
    pub fn commit(&mut self) -> bool {
        self.commit_timer.cancel();
        if self.committed == self.live {
            return false;
        }
        self.committed = self.live;
        debug!(
            zoom = self.committed.zoom,
            pan_x = self.committed.pan.x,
            pan_y = self.committed.pan.y,
            "Viewport committed"
        );
        true
    }

    /// Run due timers. Returns whether committed state changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.indicator_timer.fire(now) {
            self.zoom_direction = None;
        }
        if self.commit_timer.fire(now) {
            return self.commit();
        }
        false
    }

    /// Drop timers and any in-flight drag.
    pub fn shutdown(&mut self) {
        self.commit_timer.cancel();
        self.indicator_timer.cancel();
        self.zoom_direction = None;
        self.drag = None;
    }

    /// On-screen bounds of the image for `state`: the natural size scaled
    /// by zoom, centred in the container and shifted by the pan offset.
    pub fn image_bounds(state: ViewportState, natural: PixelSize, container: Size) -> ScreenRect {
        let center = Point::new(container.width / 2.0, container.height / 2.0) + state.pan;
        let size = Size::new(
            natural.width as f32 * state.zoom,
            natural.height as f32 * state.zoom,
        );
        ScreenRect::from_center_size(center, size)
    }

    /// Image bounds derived from committed state.
    pub fn rendered_image_bounds(&self, natural: PixelSize, container: Size) -> ScreenRect {
        Self::image_bounds(self.committed, natural, container)
    }

    /// Fraction of `bounds` under `pointer`, or `None` when the pointer is
    /// outside the bounds or the bounds are empty.
    pub fn map_pointer_to_normalized(pointer: Point, bounds: ScreenRect) -> Option<Point> {
        if !(bounds.width > 0.0 && bounds.height > 0.0) || !bounds.contains(pointer) {
            return None;
        }
        Some(Point::new(
            (pointer.x - bounds.x) / bounds.width,
            (pointer.y - bounds.y) / bounds.height,
        ))
    }
}
