use std::fmt;
use std::mem;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EditorConfig;
use crate::error::{Result, RetouchError};
use crate::geometry::{ExpansionCanvas, NormalizedRect, PixelRect, PixelSize, Point, ScreenRect, Size, Vec2};
use crate::history::{HistoryStack, ImageRef};
use crate::resize::{AspectChoice, AspectRatio, Handle, ResizeEngine};
use crate::schedule::Debounce;
use crate::selection::{Detection, DrawOutcome, ObjectId, SelectionEngine};
use crate::viewport::{ViewportController, ViewportState, ZoomDirection};

/// Primary-button behaviour on the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    #[default]
    Pan,
    Crop,
}

/// The gesture currently owning the pointer stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gesture {
    Pan,
    Draw,
    Resize(Handle),
}

/// An external operation the editor is waiting on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PendingOperation {
    Detection,
    Edit,
    Expansion,
    Upscale { factor: u32 },
}

impl fmt::Display for PendingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detection => write!(f, "object detection"),
            Self::Edit => write!(f, "edit"),
            Self::Expansion => write!(f, "canvas expansion"),
            Self::Upscale { factor } => write!(f, "{factor}x upscale"),
        }
    }
}

/// Inputs for an edit of the selected region.
#[derive(Clone, Debug, PartialEq)]
pub struct EditRequest {
    pub image: ImageRef,
    pub rect: NormalizedRect,
    /// `rect` in source pixels.
    pub pixels: PixelRect,
    /// Label of the picked candidate, when the region came from detection.
    pub label: Option<String>,
}

/// Inputs for outpainting the expansion rectangle.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpansionRequest {
    pub image: ImageRef,
    pub rect: NormalizedRect,
    pub canvas: ExpansionCanvas,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UpscaleRequest {
    pub image: ImageRef,
    pub factor: u32,
}

/// Notifications for the presentation layer, drained with
/// [`Editor::drain_events`].
#[derive(Clone, Debug, PartialEq)]
pub enum EditorEvent {
    /// The displayed image changed (commit, undo or redo).
    ImageChanged(ImageRef),
    /// A freehand crop was completed.
    CropCompleted(NormalizedRect),
    /// The observable viewport caught up with the live transform.
    ViewportCommitted(ViewportState),
    OperationFailed {
        operation: PendingOperation,
        message: String,
    },
}

/// Guidance shown while crop mode is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hint {
    None,
    WaitingForDetection,
    SelectCandidate,
    DrawSelection,
}

/// Everything the presentation layer needs to draw one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct EditorSnapshot {
    pub image: ImageRef,
    pub natural: PixelSize,
    pub tool: Tool,
    pub crop_mode: bool,
    pub expansion_mode: bool,
    pub live: ViewportState,
    pub committed: ViewportState,
    pub image_bounds: ScreenRect,
    pub zoom_direction: Option<ZoomDirection>,
    pub crop_rect: Option<NormalizedRect>,
    pub selected_label: Option<String>,
    pub candidate_count: usize,
    pub expansion_rect: NormalizedRect,
    pub expansion_lock: Option<AspectRatio>,
    pub expansion_changed: bool,
    pub can_undo: bool,
    pub can_redo: bool,
    pub gesture: Option<Gesture>,
    pub pending: Option<PendingOperation>,
    pub hint: Hint,
    pub pan_warning: bool,
}

/// Routes one pointer stream to the viewport, the selection or the
/// expansion resize, and sequences external operations into history.
#[derive(Debug)]
pub struct Editor {
    config: EditorConfig,
    viewport: ViewportController,
    selection: SelectionEngine,
    resize: ResizeEngine,
    history: HistoryStack,
    image: ImageRef,
    natural: PixelSize,
    container: Size,
    tool: Tool,
    crop_mode: bool,
    expansion_mode: bool,
    space_pan: bool,
    gesture: Option<Gesture>,
    pending: Option<PendingOperation>,
    selected_label: Option<String>,
    pan_warning: Debounce,
    pan_warning_visible: bool,
    events: Vec<EditorEvent>,
}

impl Editor {
    /// Open `image` (of `natural` size) in a viewport of `container` size.
    pub fn open(
        config: EditorConfig,
        image: ImageRef,
        natural: PixelSize,
        container: Size,
    ) -> Result<Self> {
        config.validate()?;
        check_dimensions(natural)?;

        let mut viewport = ViewportController::new(config.viewport.clone());
        viewport.reset_to_fit(natural, container);
        let selection = SelectionEngine::new(&config.selection);
        let resize = ResizeEngine::new(&config.expansion);
        let pan_warning = Debounce::from_millis(config.notifications.pan_warning_ms);

        info!(
            image = %image,
            width = natural.width,
            height = natural.height,
            "Image opened"
        );

        Ok(Self {
            config,
            viewport,
            selection,
            resize,
            history: HistoryStack::new(image.clone()),
            image,
            natural,
            container,
            tool: Tool::Pan,
            crop_mode: false,
            expansion_mode: false,
            space_pan: false,
            gesture: None,
            pending: None,
            selected_label: None,
            pan_warning,
            pan_warning_visible: false,
            events: Vec::new(),
        })
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn selection(&self) -> &SelectionEngine {
        &self.selection
    }

    pub fn resize(&self) -> &ResizeEngine {
        &self.resize
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn image(&self) -> &ImageRef {
        &self.image
    }

    pub fn natural(&self) -> PixelSize {
        self.natural
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn gesture(&self) -> Option<Gesture> {
        self.gesture
    }

    pub fn pending(&self) -> Option<PendingOperation> {
        self.pending
    }

    pub fn is_crop_mode(&self) -> bool {
        self.crop_mode
    }

    pub fn is_expansion_mode(&self) -> bool {
        self.expansion_mode
    }

    // ---------------------------------------------------------------------
    // Image lifecycle
    // ---------------------------------------------------------------------

    /// Switch to a different image. Discards history, selection, expansion
    /// and tool state, and fits the new image.
    pub fn load_image(&mut self, image: ImageRef, natural: PixelSize) -> Result<()> {
        check_dimensions(natural)?;
        self.history.reset(image.clone());
        self.image = image;
        self.natural = natural;
        self.tool = Tool::Pan;
        self.crop_mode = false;
        self.expansion_mode = false;
        self.gesture = None;
        self.pending = None;
        self.selection.clear();
        self.selected_label = None;
        self.resize.cancel();
        self.viewport.reset_to_fit(natural, self.container);
        info!(
            image = %self.image,
            width = natural.width,
            height = natural.height,
            "Image loaded"
        );
        Ok(())
    }

    /// The displayed image finished decoding with `natural` size (after an
    /// edit, undo or redo). Refits the view.
    pub fn image_decoded(&mut self, natural: PixelSize) -> Result<ViewportState> {
        check_dimensions(natural)?;
        self.natural = natural;
        Ok(self.reset_view())
    }

    /// The viewport container changed size.
    pub fn set_container(&mut self, container: Size) -> ViewportState {
        self.container = container;
        self.reset_view()
    }

    pub fn reset_view(&mut self) -> ViewportState {
        let state = self.viewport.reset_to_fit(self.natural, self.container);
        self.events.push(EditorEvent::ViewportCommitted(state));
        state
    }

    /// Cancel timers and end any gesture, e.g. before the view goes away.
    pub fn shutdown(&mut self) {
        self.viewport.shutdown();
        self.pan_warning.cancel();
        self.pan_warning_visible = false;
        self.gesture = None;
    }

    // ---------------------------------------------------------------------
    // Pointer routing
    // ---------------------------------------------------------------------

    fn can_pan(&self) -> bool {
        self.tool == Tool::Pan || (self.tool == Tool::Crop && self.space_pan) || self.expansion_mode
    }

    /// Expansion rectangle as currently rendered.
    pub fn expansion_screen_rect(&self) -> ScreenRect {
        let bounds = ViewportController::image_bounds(self.viewport.live(), self.natural, self.container);
        bounds.project(&self.resize.rect())
    }

    fn handle_at(&self, pos: Point) -> Option<Handle> {
        Handle::hit_test(
            pos,
            self.expansion_screen_rect(),
            self.config.expansion.handle_tolerance,
        )
    }

    fn map_pointer(&self, pos: Point) -> Option<Point> {
        let bounds = self.viewport.rendered_image_bounds(self.natural, self.container);
        ViewportController::map_pointer_to_normalized(pos, bounds)
    }

    /// Primary button pressed at `pos` (viewport pixels). Returns the
    /// gesture that took the pointer, if any.
    pub fn pointer_down(&mut self, pos: Point) -> Option<Gesture> {
        if self.pending.is_some() || self.gesture.is_some() {
            return None;
        }

        let handle = if self.expansion_mode {
            self.handle_at(pos)
        } else {
            None
        };

        let gesture = if let Some(handle) = handle {
            self.resize.begin_handle_drag(handle, pos);
            Gesture::Resize(handle)
        } else if self.can_pan() {
            self.viewport.begin_drag(pos);
            Gesture::Pan
        } else if self.crop_mode && self.tool == Tool::Crop && !self.selection.has_candidates() {
            let anchor = self.map_pointer(pos)?;
            self.selection.begin_draw(anchor);
            Gesture::Draw
        } else {
            return None;
        };

        debug!(?gesture, x = pos.x, y = pos.y, "Gesture started");
        self.gesture = Some(gesture);
        Some(gesture)
    }

    /// Pointer moved. Returns whether the active gesture changed any state.
    pub fn pointer_move(&mut self, pos: Point) -> bool {
        match self.gesture {
            Some(Gesture::Resize(_)) => {
                let zoom = self.viewport.live().zoom;
                self.resize.update_handle_drag(pos, zoom, self.natural)
            }
            Some(Gesture::Pan) => self.viewport.update_drag(pos).is_some(),
            Some(Gesture::Draw) => match self.map_pointer(pos) {
                Some(p) => self.selection.update_draw(p).is_some(),
                None => false,
            },
            None => false,
        }
    }

    /// Pointer released: finalize the active gesture.
    pub fn pointer_up(&mut self) {
        let Some(gesture) = self.gesture.take() else {
            return;
        };
        match gesture {
            Gesture::Resize(_) => self.resize.end_handle_drag(),
            Gesture::Pan => {
                if self.viewport.end_drag() {
                    self.events
                        .push(EditorEvent::ViewportCommitted(self.viewport.committed()));
                }
            }
            Gesture::Draw => match self.selection.end_draw() {
                DrawOutcome::Completed(rect) => {
                    self.selected_label = None;
                    self.events.push(EditorEvent::CropCompleted(rect));
                }
                DrawOutcome::Discarded => debug!("Selection too small, discarded"),
                DrawOutcome::NotDrawing => {}
            },
        }
        debug!(?gesture, "Gesture ended");
    }

    /// Pointer left the canvas; same as a release.
    pub fn pointer_leave(&mut self) {
        self.pointer_up();
    }

    /// Wheel or trackpad scroll. Ctrl turns it into a zoom.
    pub fn wheel(&mut self, delta: Vec2, ctrl: bool, now: Instant) -> ViewportState {
        self.viewport.apply_wheel(delta, ctrl, now)
    }

    /// Run due timers.
    pub fn tick(&mut self, now: Instant) {
        if self.viewport.poll(now) {
            self.events
                .push(EditorEvent::ViewportCommitted(self.viewport.committed()));
        }
        if self.pan_warning.fire(now) {
            self.pan_warning_visible = false;
        }
    }

    pub fn space_down(&mut self) {
        self.space_pan = true;
    }

    pub fn space_up(&mut self) {
        self.space_pan = false;
    }

    /// Discrete zoom step, committed at once.
    pub fn zoom_by(&mut self, factor: f32) -> ViewportState {
        let before = self.viewport.committed();
        let state = self.viewport.zoom_by_factor(factor);
        if self.viewport.committed() != before {
            self.events.push(EditorEvent::ViewportCommitted(state));
        }
        state
    }

    /// Show the "switch to the pan tool" banner for a while.
    pub fn trigger_pan_warning(&mut self, now: Instant) {
        self.pan_warning_visible = true;
        self.pan_warning.schedule(now);
    }

    // ---------------------------------------------------------------------
    // Tools and modes
    // ---------------------------------------------------------------------

    /// Outside crop mode the tool is always `Pan`; inside it toggles.
    /// Unchanged while an operation is pending.
    pub fn toggle_pan_tool(&mut self) -> Tool {
        if self.pending.is_some() {
            return self.tool;
        }
        self.tool = if !self.crop_mode {
            Tool::Pan
        } else if self.tool == Tool::Pan {
            Tool::Crop
        } else {
            Tool::Pan
        };
        self.tool
    }

    /// Enter or leave crop mode. Returns whether crop mode is now active.
    ///
    /// Refused while expansion mode is active or an operation is pending.
    pub fn toggle_crop_mode(&mut self) -> bool {
        if self.pending.is_some() || self.expansion_mode {
            return self.crop_mode;
        }
        self.crop_mode = !self.crop_mode;
        if self.crop_mode {
            self.tool = Tool::Crop;
        } else {
            self.tool = Tool::Pan;
            self.reset_selection();
        }
        self.crop_mode
    }

    /// Enter expansion mode with `choice`. Leaves crop mode.
    pub fn select_aspect(&mut self, choice: AspectChoice) -> bool {
        if self.pending.is_some() || self.gesture.is_some() {
            return false;
        }
        self.expansion_mode = true;
        self.tool = Tool::Pan;
        self.crop_mode = false;
        self.reset_selection();
        self.resize.select_aspect(choice, self.natural)
    }

    pub fn cancel_expansion(&mut self) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.expansion_mode = false;
        self.resize.cancel();
        true
    }

    /// Drop detection results and start a freehand selection.
    pub fn draw_manually(&mut self) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.reset_selection();
        self.tool = Tool::Crop;
        true
    }

    pub fn clear_selection(&mut self) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.reset_selection();
        true
    }

    fn reset_selection(&mut self) {
        self.selection.clear();
        self.selected_label = None;
    }

    /// Pick a detected candidate as the region to edit.
    pub fn select_candidate(&mut self, id: ObjectId) -> bool {
        if self.pending.is_some() {
            return false;
        }
        let Some(object) = self.selection.select_candidate(id) else {
            return false;
        };
        self.selected_label = Some(object.label.clone());
        self.tool = Tool::Crop;
        true
    }

    /// Candidate under a viewport position, if any.
    pub fn candidate_at(&self, pos: Point) -> Option<ObjectId> {
        let p = self.map_pointer(pos)?;
        self.selection.candidate_at(p).map(|c| c.id)
    }

    pub fn crop_pixels(&self) -> Option<PixelRect> {
        self.selection.rect().map(|r| r.to_pixels(self.natural))
    }

    // ---------------------------------------------------------------------
    // External operations
    // ---------------------------------------------------------------------

    fn start(&mut self, op: PendingOperation) -> Result<()> {
        if let Some(current) = self.pending {
            return Err(RetouchError::OperationPending(current.to_string()));
        }
        if self.gesture.is_some() {
            self.pointer_up();
        }
        self.pending = Some(op);
        debug!(%op, "Operation started");
        Ok(())
    }

    pub fn begin_detection(&mut self) -> Result<ImageRef> {
        self.start(PendingOperation::Detection)?;
        self.reset_selection();
        Ok(self.image.clone())
    }

    /// Detection returned. Stores the candidates and switches to the crop tool.
    pub fn finish_detection(&mut self, detections: Vec<Detection>) -> Vec<ObjectId> {
        if self.pending != Some(PendingOperation::Detection) {
            warn!("Detection result arrived with no detection pending");
            return Vec::new();
        }
        self.pending = None;
        let ids = self.selection.set_candidates(detections);
        self.tool = Tool::Crop;
        info!(count = ids.len(), "Candidates received");
        ids
    }

    pub fn begin_edit(&mut self) -> Result<EditRequest> {
        let rect = self.selection.rect().ok_or(RetouchError::NoSelection)?;
        self.start(PendingOperation::Edit)?;
        Ok(EditRequest {
            image: self.image.clone(),
            rect,
            pixels: rect.to_pixels(self.natural),
            label: self.selected_label.clone(),
        })
    }

    pub fn begin_expansion(&mut self) -> Result<ExpansionRequest> {
        if !self.expansion_mode || !self.resize.is_changed() {
            return Err(RetouchError::NothingToExpand);
        }
        self.start(PendingOperation::Expansion)?;
        let rect = self.resize.rect();
        Ok(ExpansionRequest {
            image: self.image.clone(),
            rect,
            canvas: ExpansionCanvas::plan(&rect, self.natural),
        })
    }

    pub fn begin_upscale(&mut self, factor: u32) -> Result<UpscaleRequest> {
        if factor < 2 {
            return Err(RetouchError::InvalidUpscaleFactor(factor));
        }
        self.start(PendingOperation::Upscale { factor })?;
        Ok(UpscaleRequest {
            image: self.image.clone(),
            factor,
        })
    }

    /// The pending edit, expansion or upscale produced `result`. Commits it
    /// to history and tidies up the mode that requested it.
    pub fn complete_operation(&mut self, result: ImageRef) -> bool {
        let op = match self.pending {
            Some(op @ (PendingOperation::Edit
            | PendingOperation::Expansion
            | PendingOperation::Upscale { .. })) => op,
            other => {
                warn!(pending = ?other, "Ignoring image result with no matching operation");
                return false;
            }
        };
        self.pending = None;
        self.commit_image(result);

        match op {
            PendingOperation::Edit => {
                self.reset_selection();
                self.crop_mode = false;
                self.tool = Tool::Pan;
            }
            PendingOperation::Expansion => {
                self.expansion_mode = false;
                self.resize.cancel();
            }
            PendingOperation::Upscale { .. } | PendingOperation::Detection => {}
        }
        true
    }

    /// The pending operation failed; state is left as it was before it started.
    pub fn fail_operation(&mut self, message: impl Into<String>) {
        let Some(operation) = self.pending.take() else {
            return;
        };
        let message = message.into();
        warn!(%operation, %message, "Operation failed");
        self.events
            .push(EditorEvent::OperationFailed { operation, message });
    }

    fn commit_image(&mut self, image: ImageRef) {
        let current = self.history.commit(image).clone();
        self.image = current.clone();
        self.events.push(EditorEvent::ImageChanged(current));
    }

    pub fn undo(&mut self) -> bool {
        if self.pending.is_some() {
            return false;
        }
        match self.history.undo() {
            Some(entry) => {
                let entry = entry.clone();
                self.image = entry.clone();
                self.events.push(EditorEvent::ImageChanged(entry));
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        if self.pending.is_some() {
            return false;
        }
        match self.history.redo() {
            Some(entry) => {
                let entry = entry.clone();
                self.image = entry.clone();
                self.events.push(EditorEvent::ImageChanged(entry));
                true
            }
            None => false,
        }
    }

    // ---------------------------------------------------------------------
    // Presentation
    // ---------------------------------------------------------------------

    pub fn hint(&self) -> Hint {
        if !self.crop_mode {
            return Hint::None;
        }
        if self.pending == Some(PendingOperation::Detection) {
            Hint::WaitingForDetection
        } else if self.selection.rect().is_some() {
            Hint::None
        } else if self.selection.has_candidates() {
            Hint::SelectCandidate
        } else {
            Hint::DrawSelection
        }
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            image: self.image.clone(),
            natural: self.natural,
            tool: self.tool,
            crop_mode: self.crop_mode,
            expansion_mode: self.expansion_mode,
            live: self.viewport.live(),
            committed: self.viewport.committed(),
            image_bounds: self.viewport.rendered_image_bounds(self.natural, self.container),
            zoom_direction: self.viewport.zoom_direction(),
            crop_rect: self.selection.rect(),
            selected_label: self.selected_label.clone(),
            candidate_count: self.selection.candidates().len(),
            expansion_rect: self.resize.rect(),
            expansion_lock: self.resize.lock(),
            expansion_changed: self.resize.is_changed(),
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
            gesture: self.gesture,
            pending: self.pending,
            hint: self.hint(),
            pan_warning: self.pan_warning_visible,
        }
    }

    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        mem::take(&mut self.events)
    }
}

fn check_dimensions(natural: PixelSize) -> Result<()> {
    if natural.is_valid() {
        Ok(())
    } else {
        Err(RetouchError::InvalidDimensions {
            width: natural.width,
            height: natural.height,
        })
    }
}
