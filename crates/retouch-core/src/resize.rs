use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ExpansionConfig;
use crate::error::{Result, RetouchError};
use crate::geometry::{ExpansionCanvas, NormalizedRect, PixelSize, Point, ScreenRect};

/// A `width:height` ratio, both sides positive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AspectRatio {
    width: f32,
    height: f32,
}

impl AspectRatio {
    pub fn new(width: f32, height: f32) -> Result<Self> {
        if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
            return Err(RetouchError::InvalidAspectRatio(format!("{width}:{height}")));
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Width divided by height.
    pub fn value(&self) -> f32 {
        self.width / self.height
    }
}

impl FromStr for AspectRatio {
    type Err = RetouchError;

    fn from_str(s: &str) -> Result<Self> {
        let (w, h) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| RetouchError::InvalidAspectRatio(s.to_string()))?;
        let w: f32 = w
            .trim()
            .parse()
            .map_err(|_| RetouchError::InvalidAspectRatio(s.to_string()))?;
        let h: f32 = h
            .trim()
            .parse()
            .map_err(|_| RetouchError::InvalidAspectRatio(s.to_string()))?;
        Self::new(w, h)
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

/// Free-form or locked to a ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AspectChoice {
    Free,
    Locked(AspectRatio),
}

impl FromStr for AspectChoice {
    type Err = RetouchError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("free") {
            Ok(Self::Free)
        } else {
            s.parse().map(Self::Locked)
        }
    }
}

impl fmt::Display for AspectChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Locked(r) => write!(f, "{r}"),
        }
    }
}

/// One of the eight drag points on the expansion rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Handle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl Handle {
    pub const ALL: [Handle; 8] = [
        Handle::TopLeft,
        Handle::Top,
        Handle::TopRight,
        Handle::Right,
        Handle::BottomRight,
        Handle::Bottom,
        Handle::BottomLeft,
        Handle::Left,
    ];

    pub fn is_corner(self) -> bool {
        matches!(
            self,
            Handle::TopLeft | Handle::TopRight | Handle::BottomLeft | Handle::BottomRight
        )
    }

    pub fn moves_left(self) -> bool {
        matches!(self, Handle::TopLeft | Handle::Left | Handle::BottomLeft)
    }

    pub fn moves_right(self) -> bool {
        matches!(self, Handle::TopRight | Handle::Right | Handle::BottomRight)
    }

    pub fn moves_top(self) -> bool {
        matches!(self, Handle::TopLeft | Handle::Top | Handle::TopRight)
    }

    pub fn moves_bottom(self) -> bool {
        matches!(self, Handle::BottomLeft | Handle::Bottom | Handle::BottomRight)
    }

    /// Screen position of this handle on `rect`: corners, or edge midpoints.
    pub fn anchor(self, rect: ScreenRect) -> Point {
        let x = if self.moves_left() {
            rect.x
        } else if self.moves_right() {
            rect.right()
        } else {
            rect.x + rect.width / 2.0
        };
        let y = if self.moves_top() {
            rect.y
        } else if self.moves_bottom() {
            rect.bottom()
        } else {
            rect.y + rect.height / 2.0
        };
        Point::new(x, y)
    }

    /// Handle within `tolerance` screen pixels of `pointer`, corners first.
    pub fn hit_test(pointer: Point, rect: ScreenRect, tolerance: f32) -> Option<Handle> {
        let near = |h: Handle| {
            let d = pointer - h.anchor(rect);
            (d.x * d.x + d.y * d.y).sqrt() < tolerance
        };
        Self::ALL
            .iter()
            .filter(|h| h.is_corner())
            .chain(Self::ALL.iter().filter(|h| !h.is_corner()))
            .copied()
            .find(|&h| near(h))
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Handle::TopLeft => "top-left",
            Handle::Top => "top",
            Handle::TopRight => "top-right",
            Handle::Right => "right",
            Handle::BottomRight => "bottom-right",
            Handle::Bottom => "bottom",
            Handle::BottomLeft => "bottom-left",
            Handle::Left => "left",
        };
        write!(f, "{name}")
    }
}

#[derive(Clone, Copy, Debug)]
struct HandleDrag {
    handle: Handle,
    pointer_start: Point,
    rect_at_start: NormalizedRect,
}

/// The canvas-expansion rectangle and its resize rules.
///
/// The rectangle is expressed in fractions of the current image, so an
/// expansion reaches past `[0, 1]`. It is always present; the full frame
/// means "no expansion".
#[derive(Clone, Debug)]
pub struct ResizeEngine {
    min_size: f32,
    rect: NormalizedRect,
    lock: Option<AspectRatio>,
    drag: Option<HandleDrag>,
}

impl Default for ResizeEngine {
    fn default() -> Self {
        Self::new(&ExpansionConfig::default())
    }
}

impl ResizeEngine {
    pub fn new(config: &ExpansionConfig) -> Self {
        Self {
            min_size: config.min_size,
            rect: NormalizedRect::FULL,
            lock: None,
            drag: None,
        }
    }

    pub fn rect(&self) -> NormalizedRect {
        self.rect
    }

    pub fn lock(&self) -> Option<AspectRatio> {
        self.lock
    }

    pub fn active_handle(&self) -> Option<Handle> {
        self.drag.map(|d| d.handle)
    }

    /// Switch between free-form and a locked ratio.
    ///
    /// A locked ratio yields the largest rectangle of that shape that still
    /// covers the image, centred on it. Returns false (and changes nothing)
    /// for a locked ratio when the image size is unknown.
    pub fn select_aspect(&mut self, choice: AspectChoice, natural: PixelSize) -> bool {
        let ratio = match choice {
            AspectChoice::Free => {
                self.lock = None;
                self.rect = NormalizedRect::FULL;
                self.drag = None;
                return true;
            }
            AspectChoice::Locked(ratio) => ratio,
        };
        if !natural.is_valid() {
            return false;
        }

        let target = ratio.value();
        let image_ratio = natural.aspect_ratio();
        self.rect = if target > image_ratio {
            let width = target / image_ratio;
            NormalizedRect::new((1.0 - width) / 2.0, 0.0, width, 1.0)
        } else {
            let height = image_ratio / target;
            NormalizedRect::new(0.0, (1.0 - height) / 2.0, 1.0, height)
        };
        self.lock = Some(ratio);
        self.drag = None;
        debug!(%ratio, rect = ?self.rect, "Expansion aspect selected");
        true
    }

    pub fn begin_handle_drag(&mut self, handle: Handle, pointer_start: Point) {
        self.drag = Some(HandleDrag {
            handle,
            pointer_start,
            rect_at_start: self.rect,
        });
    }

    /// Resize from the drag's starting rectangle by the pointer travel.
    ///
    /// Screen travel is divided by `zoom` and then by the natural image size
    /// to get a normalized delta. Returns false when the proposal is
    /// rejected; the previous rectangle is kept in that case.
    pub fn update_handle_drag(&mut self, pointer: Point, zoom: f32, natural: PixelSize) -> bool {
        let Some(drag) = self.drag else {
            return false;
        };
        if !(zoom > 0.0) || !natural.is_valid() {
            return false;
        }

        let travel = (pointer - drag.pointer_start) / zoom;
        let dx = travel.x / natural.width as f32;
        let dy = travel.y / natural.height as f32;

        let proposed = match self.lock {
            Some(ratio) => {
                let k = ratio.value();
                if drag.handle.is_corner() {
                    locked_corner(drag.handle, drag.rect_at_start, dx, dy, k)
                } else {
                    locked_edge(drag.handle, drag.rect_at_start, dx, dy, k)
                }
            }
            None => free(drag.handle, drag.rect_at_start, dx, dy),
        };

        let valid = proposed.width > self.min_size
            && proposed.height > self.min_size
            && proposed.x.is_finite()
            && proposed.y.is_finite()
            && proposed.width.is_finite()
            && proposed.height.is_finite();
        if valid {
            self.rect = proposed;
        }
        valid
    }

    pub fn end_handle_drag(&mut self) {
        self.drag = None;
    }

    /// True once the rectangle differs from the full frame.
    pub fn is_changed(&self) -> bool {
        self.rect != NormalizedRect::FULL
    }

    /// Back to free-form, full frame.
    pub fn cancel(&mut self) {
        self.lock = None;
        self.rect = NormalizedRect::FULL;
        self.drag = None;
    }

    /// Pixel layout of the expanded canvas for an image of `natural` size.
    pub fn expansion_canvas(&self, natural: PixelSize) -> ExpansionCanvas {
        ExpansionCanvas::plan(&self.rect, natural)
    }
}

fn locked_corner(handle: Handle, start: NormalizedRect, dx: f32, dy: f32, k: f32) -> NormalizedRect {
    let mut width = start.width;
    let mut height = start.height;

    if handle.moves_right() {
        width = start.width + dx;
    } else if handle.moves_left() {
        width = start.width - dx;
    }
    if handle.moves_bottom() {
        height = start.height + dy;
    } else if handle.moves_top() {
        height = start.height - dy;
    }

    // The axis that moved more drives the other.
    if dx.abs() > dy.abs() {
        height = width / k;
    } else {
        width = height * k;
    }

    let x = if handle.moves_left() {
        start.right() - width
    } else {
        start.x
    };
    let y = if handle.moves_top() {
        start.bottom() - height
    } else {
        start.y
    };
    NormalizedRect::new(x, y, width, height)
}

fn locked_edge(handle: Handle, start: NormalizedRect, dx: f32, dy: f32, k: f32) -> NormalizedRect {
    match handle {
        Handle::Left | Handle::Right => {
            let width = if handle == Handle::Right {
                start.width + dx
            } else {
                start.width - dx
            };
            let height = width / k;
            let x = if handle == Handle::Left {
                start.x + dx
            } else {
                start.x
            };
            let y = start.y - (height - start.height) / 2.0;
            NormalizedRect::new(x, y, width, height)
        }
        _ => {
            let height = if handle == Handle::Bottom {
                start.height + dy
            } else {
                start.height - dy
            };
            let width = height * k;
            let x = start.x - (width - start.width) / 2.0;
            let y = if handle == Handle::Top {
                start.y + dy
            } else {
                start.y
            };
            NormalizedRect::new(x, y, width, height)
        }
    }
}

fn free(handle: Handle, start: NormalizedRect, dx: f32, dy: f32) -> NormalizedRect {
    let mut rect = start;
    if handle.moves_left() {
        rect.x = start.x + dx;
        rect.width = start.width - dx;
    }
    if handle.moves_right() {
        rect.width = start.width + dx;
    }
    if handle.moves_top() {
        rect.y = start.y + dy;
        rect.height = start.height - dy;
    }
    if handle.moves_bottom() {
        rect.height = start.height + dy;
    }
    rect
}
