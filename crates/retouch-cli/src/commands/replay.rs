use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Args;
use retouch_core::config::EditorConfig;
use retouch_core::editor::{Editor, EditorEvent};
use retouch_core::geometry::{PixelSize, Point, Size, Vec2};
use retouch_core::history::ImageRef;
use retouch_core::resize::AspectChoice;
use retouch_core::selection::{Detection, ObjectId};
use serde::Deserialize;
use tracing::{debug, info};

use super::load_config;
use crate::summary;

#[derive(Args)]
pub struct ReplayArgs {
    /// Session script (TOML)
    pub script: PathBuf,

    /// Editor config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// A scripted editing session: the opening image, the viewport size and
/// a list of input steps applied in order.
#[derive(Debug, Deserialize)]
pub struct Script {
    pub image: ImageSpec,
    #[serde(default = "default_container")]
    pub container: Size,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

fn default_container() -> Size {
    Size::new(1000.0, 1000.0)
}

#[derive(Debug, Deserialize)]
pub struct ImageSpec {
    pub id: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Step {
    PointerDown {
        x: f32,
        y: f32,
    },
    PointerMove {
        x: f32,
        y: f32,
    },
    PointerUp,
    PointerLeave,
    Wheel {
        #[serde(default)]
        dx: f32,
        #[serde(default)]
        dy: f32,
        #[serde(default)]
        ctrl: bool,
    },
    /// Advance the clock and run due timers.
    Wait {
        ms: u64,
    },
    SpaceDown,
    SpaceUp,
    TogglePanTool,
    ToggleCropMode,
    ZoomBy {
        factor: f32,
    },
    ResetView,
    Container {
        width: f32,
        height: f32,
    },
    Aspect {
        ratio: String,
    },
    CancelExpansion,
    DrawManually,
    ClearSelection,
    Detect,
    Detections {
        #[serde(default)]
        objects: Vec<Detection>,
    },
    /// Pick a candidate by its position in the last detection list.
    Pick {
        index: usize,
    },
    Edit,
    Expand,
    Upscale {
        factor: u32,
    },
    Complete {
        result: String,
    },
    Fail {
        message: String,
    },
    Decoded {
        width: u32,
        height: u32,
    },
    Undo,
    Redo,
    Load {
        id: String,
        width: u32,
        height: u32,
    },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::PointerDown { .. } => "pointer-down",
            Step::PointerMove { .. } => "pointer-move",
            Step::PointerUp => "pointer-up",
            Step::PointerLeave => "pointer-leave",
            Step::Wheel { .. } => "wheel",
            Step::Wait { .. } => "wait",
            Step::SpaceDown => "space-down",
            Step::SpaceUp => "space-up",
            Step::TogglePanTool => "toggle-pan-tool",
            Step::ToggleCropMode => "toggle-crop-mode",
            Step::ZoomBy { .. } => "zoom-by",
            Step::ResetView => "reset-view",
            Step::Container { .. } => "container",
            Step::Aspect { .. } => "aspect",
            Step::CancelExpansion => "cancel-expansion",
            Step::DrawManually => "draw-manually",
            Step::ClearSelection => "clear-selection",
            Step::Detect => "detect",
            Step::Detections { .. } => "detections",
            Step::Pick { .. } => "pick",
            Step::Edit => "edit",
            Step::Expand => "expand",
            Step::Upscale { .. } => "upscale",
            Step::Complete { .. } => "complete",
            Step::Fail { .. } => "fail",
            Step::Decoded { .. } => "decoded",
            Step::Undo => "undo",
            Step::Redo => "redo",
            Step::Load { .. } => "load",
        }
    }
}

/// What one step did.
#[derive(Debug)]
pub struct StepReport {
    pub action: &'static str,
    pub outcome: String,
    pub events: Vec<EditorEvent>,
}

pub struct ReplayReport {
    pub editor: Editor,
    pub steps: Vec<StepReport>,
    pub elapsed: Duration,
}

/// Drives an [`Editor`] with a virtual clock.
struct Session {
    editor: Editor,
    start: Instant,
    now: Instant,
    candidates: Vec<ObjectId>,
}

impl Session {
    fn apply(&mut self, step: &Step) -> Result<String> {
        let ed = &mut self.editor;
        let outcome = match step {
            Step::PointerDown { x, y } => match ed.pointer_down(Point::new(*x, *y)) {
                Some(gesture) => format!("{gesture:?}"),
                None => "ignored".to_string(),
            },
            Step::PointerMove { x, y } => {
                if ed.pointer_move(Point::new(*x, *y)) {
                    "updated".to_string()
                } else {
                    "no change".to_string()
                }
            }
            Step::PointerUp | Step::PointerLeave => {
                let gesture = ed.gesture();
                if matches!(step, Step::PointerUp) {
                    ed.pointer_up();
                } else {
                    ed.pointer_leave();
                }
                match gesture {
                    Some(g) => format!("{g:?} ended"),
                    None => "ignored".to_string(),
                }
            }
            Step::Wheel { dx, dy, ctrl } => {
                let state = ed.wheel(Vec2::new(*dx, *dy), *ctrl, self.now);
                summary::describe_state(state)
            }
            Step::Wait { ms } => {
                self.now += Duration::from_millis(*ms);
                ed.tick(self.now);
                format!("t = {} ms", (self.now - self.start).as_millis())
            }
            Step::SpaceDown => {
                ed.space_down();
                "space held".to_string()
            }
            Step::SpaceUp => {
                ed.space_up();
                "space released".to_string()
            }
            Step::TogglePanTool => format!("tool {:?}", ed.toggle_pan_tool()),
            Step::ToggleCropMode => {
                if ed.toggle_crop_mode() {
                    "crop mode on".to_string()
                } else {
                    "crop mode off".to_string()
                }
            }
            Step::ZoomBy { factor } => summary::describe_state(ed.zoom_by(*factor)),
            Step::ResetView => summary::describe_state(ed.reset_view()),
            Step::Container { width, height } => {
                summary::describe_state(ed.set_container(Size::new(*width, *height)))
            }
            Step::Aspect { ratio } => {
                let choice: AspectChoice = ratio.parse()?;
                if ed.select_aspect(choice) {
                    format!("{choice} -> {}", summary::describe_rect(ed.resize().rect()))
                } else {
                    "ignored".to_string()
                }
            }
            Step::CancelExpansion => {
                if ed.cancel_expansion() {
                    "expansion cancelled".to_string()
                } else {
                    "ignored".to_string()
                }
            }
            Step::DrawManually => {
                if ed.draw_manually() {
                    "candidates dropped".to_string()
                } else {
                    "ignored".to_string()
                }
            }
            Step::ClearSelection => {
                if ed.clear_selection() {
                    "selection cleared".to_string()
                } else {
                    "ignored".to_string()
                }
            }
            Step::Detect => match ed.begin_detection() {
                Ok(image) => format!("detecting on {image}"),
                Err(e) => format!("rejected: {e}"),
            },
            Step::Detections { objects } => {
                self.candidates = ed.finish_detection(objects.clone());
                format!("{} candidate(s)", self.candidates.len())
            }
            Step::Pick { index } => match self.candidates.get(*index) {
                Some(&id) if ed.select_candidate(id) => {
                    let label = ed.selection().selected().map(|c| c.label.clone());
                    format!("picked {}", label.unwrap_or_default())
                }
                _ => "ignored".to_string(),
            },
            Step::Edit => match ed.begin_edit() {
                Ok(req) => format!(
                    "editing {} at {}x{}+{}+{}",
                    req.image, req.pixels.width, req.pixels.height, req.pixels.x, req.pixels.y
                ),
                Err(e) => format!("rejected: {e}"),
            },
            Step::Expand => match ed.begin_expansion() {
                Ok(req) => format!(
                    "expanding {} to {}x{}",
                    req.image, req.canvas.width, req.canvas.height
                ),
                Err(e) => format!("rejected: {e}"),
            },
            Step::Upscale { factor } => match ed.begin_upscale(*factor) {
                Ok(req) => format!("upscaling {} by {}x", req.image, req.factor),
                Err(e) => format!("rejected: {e}"),
            },
            Step::Complete { result } => {
                if ed.complete_operation(ImageRef::new(result.as_str())) {
                    format!("now showing {result}")
                } else {
                    "ignored".to_string()
                }
            }
            Step::Fail { message } => {
                ed.fail_operation(message.as_str());
                "operation failed".to_string()
            }
            Step::Decoded { width, height } => {
                summary::describe_state(ed.image_decoded(PixelSize::new(*width, *height))?)
            }
            Step::Undo => {
                if ed.undo() {
                    format!("now showing {}", ed.image())
                } else {
                    "nothing to undo".to_string()
                }
            }
            Step::Redo => {
                if ed.redo() {
                    format!("now showing {}", ed.image())
                } else {
                    "nothing to redo".to_string()
                }
            }
            Step::Load { id, width, height } => {
                ed.load_image(ImageRef::new(id.as_str()), PixelSize::new(*width, *height))?;
                self.candidates.clear();
                format!("loaded {id}")
            }
        };
        Ok(outcome)
    }
}

/// Run every step of `script` against a fresh editor.
pub fn run_script(script: &Script, config: EditorConfig) -> Result<ReplayReport> {
    let natural = PixelSize::new(script.image.width, script.image.height);
    let editor = Editor::open(
        config,
        ImageRef::new(script.image.id.as_str()),
        natural,
        script.container,
    )
    .context("Failed to open the script image")?;

    let start = Instant::now();
    let mut session = Session {
        editor,
        start,
        now: start,
        candidates: Vec::new(),
    };

    let mut steps = Vec::with_capacity(script.steps.len());
    for (i, step) in script.steps.iter().enumerate() {
        let outcome = session
            .apply(step)
            .with_context(|| format!("Step {} ({}) failed", i + 1, step.name()))?;
        debug!(step = i + 1, action = step.name(), %outcome, "Step applied");
        steps.push(StepReport {
            action: step.name(),
            outcome,
            events: session.editor.drain_events(),
        });
    }

    info!(steps = steps.len(), "Replay finished");
    Ok(ReplayReport {
        elapsed: session.now - session.start,
        editor: session.editor,
        steps,
    })
}

pub fn run(args: &ReplayArgs) -> Result<()> {
    let contents = std::fs::read_to_string(&args.script)
        .with_context(|| format!("Failed to read script {}", args.script.display()))?;
    let script: Script = toml::from_str(&contents).context("Invalid session script")?;
    let config = load_config(args.config.as_deref())?;

    let report = run_script(&script, config)?;
    summary::print_replay_summary(&args.script, &report);
    Ok(())
}
