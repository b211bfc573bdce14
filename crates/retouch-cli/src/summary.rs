use std::path::Path;

use console::Style;
use retouch_core::editor::{EditorEvent, Hint};
use retouch_core::geometry::{ExpansionCanvas, NormalizedRect, PixelSize, ScreenRect, Size};
use retouch_core::resize::AspectChoice;
use retouch_core::viewport::ViewportState;

use crate::commands::replay::ReplayReport;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    event: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            event: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

fn rule(title: &str) -> String {
    "\u{2550}".repeat(title.chars().count())
}

pub fn describe_state(state: ViewportState) -> String {
    format!(
        "zoom {:.3}  pan ({:.1}, {:.1})",
        state.zoom, state.pan.x, state.pan.y
    )
}

pub fn describe_rect(r: NormalizedRect) -> String {
    format!(
        "x {:.4}  y {:.4}  w {:.4}  h {:.4}",
        r.x, r.y, r.width, r.height
    )
}

fn describe_bounds(b: ScreenRect) -> String {
    format!("{:.1}x{:.1} at ({:.1}, {:.1})", b.width, b.height, b.x, b.y)
}

fn describe_event(event: &EditorEvent) -> String {
    match event {
        EditorEvent::ImageChanged(image) => format!("image changed to {image}"),
        EditorEvent::CropCompleted(r) => format!("crop completed: {}", describe_rect(*r)),
        EditorEvent::ViewportCommitted(state) => {
            format!("viewport committed: {}", describe_state(*state))
        }
        EditorEvent::OperationFailed { operation, message } => {
            format!("{operation} failed: {message}")
        }
    }
}

pub fn print_fit_summary(
    natural: PixelSize,
    container: Size,
    state: ViewportState,
    bounds: ScreenRect,
) {
    let s = Styles::new();
    let title = "Fit to Container";

    println!();
    println!("  {}", s.title.apply_to(title));
    println!("  {}", s.title.apply_to(rule(title)));
    println!();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Image"),
        s.value.apply_to(format!("{}x{}", natural.width, natural.height))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Container"),
        s.value.apply_to(format!("{}x{}", container.width, container.height))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Zoom"),
        s.value.apply_to(format!("{:.4}", state.zoom))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Bounds"),
        s.value.apply_to(describe_bounds(bounds))
    );
    println!();
}

pub fn print_expansion_summary(
    natural: PixelSize,
    choice: AspectChoice,
    rect: NormalizedRect,
    canvas: ExpansionCanvas,
) {
    let s = Styles::new();
    let title = "Canvas Expansion";

    println!();
    println!("  {}", s.title.apply_to(title));
    println!("  {}", s.title.apply_to(rule(title)));
    println!();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Image"),
        s.value.apply_to(format!("{}x{}", natural.width, natural.height))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Aspect"),
        s.event.apply_to(choice)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Rect"),
        s.value.apply_to(describe_rect(rect))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Canvas"),
        s.value.apply_to(format!("{}x{}", canvas.width, canvas.height))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Placement"),
        s.value
            .apply_to(format!("original at ({}, {})", canvas.offset_x, canvas.offset_y))
    );
    if !canvas.contains_original(natural) {
        println!(
            "  {:<14}{}",
            "",
            s.disabled.apply_to("canvas crops the original")
        );
    }
    println!();
}

pub fn print_replay_summary(script: &Path, report: &ReplayReport) {
    let s = Styles::new();
    let title = "Replay";
    let editor = &report.editor;
    let snap = editor.snapshot();

    println!();
    println!("  {}", s.title.apply_to(title));
    println!("  {}", s.title.apply_to(rule(title)));
    println!();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Script"),
        s.path.apply_to(script.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Steps"),
        s.value.apply_to(report.steps.len())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Clock"),
        s.value.apply_to(format!("{} ms", report.elapsed.as_millis()))
    );
    println!();

    println!("  {}", s.header.apply_to("Steps"));
    for (i, step) in report.steps.iter().enumerate() {
        println!(
            "    {:>3}  {:<18}{}",
            s.label.apply_to(i + 1),
            s.value.apply_to(step.action),
            step.outcome
        );
        for event in &step.events {
            println!("         {}", s.event.apply_to(describe_event(event)));
        }
    }
    println!();

    println!("  {}", s.header.apply_to("Final State"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Image"),
        s.path.apply_to(&snap.image)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Size"),
        s.value
            .apply_to(format!("{}x{}", snap.natural.width, snap.natural.height))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("View"),
        s.value.apply_to(describe_state(snap.committed))
    );
    if snap.live != snap.committed {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Live"),
            s.disabled.apply_to(describe_state(snap.live))
        );
    }
    println!(
        "    {:<12}{}",
        s.label.apply_to("Tool"),
        s.value.apply_to(format!("{:?}", snap.tool))
    );

    let mode = match (snap.crop_mode, snap.expansion_mode) {
        (true, _) => "crop",
        (_, true) => "expansion",
        _ => "view",
    };
    println!("    {:<12}{}", s.label.apply_to("Mode"), s.value.apply_to(mode));

    match snap.crop_rect {
        Some(r) => println!(
            "    {:<12}{}{}",
            s.label.apply_to("Selection"),
            s.value.apply_to(describe_rect(r)),
            snap.selected_label
                .as_deref()
                .map(|l| format!("  ({l})"))
                .unwrap_or_default()
        ),
        None => println!(
            "    {:<12}{}",
            s.label.apply_to("Selection"),
            s.disabled.apply_to("none")
        ),
    }
    if snap.candidate_count > 0 {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Candidates"),
            s.value.apply_to(snap.candidate_count)
        );
    }
    if snap.expansion_mode {
        let lock = snap
            .expansion_lock
            .map(|r| r.to_string())
            .unwrap_or_else(|| "free".to_string());
        println!(
            "    {:<12}{}  {}",
            s.label.apply_to("Expansion"),
            s.value.apply_to(describe_rect(snap.expansion_rect)),
            s.event.apply_to(lock)
        );
    }
    if let Some(op) = snap.pending {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Pending"),
            s.disabled.apply_to(op)
        );
    }
    println!(
        "    {:<12}{} / {}",
        s.label.apply_to("History"),
        s.value.apply_to(editor.history().cursor() + 1),
        s.value.apply_to(editor.history().len())
    );

    let hint = match snap.hint {
        Hint::None => None,
        Hint::WaitingForDetection => Some("waiting for detection"),
        Hint::SelectCandidate => Some("click an object to select it"),
        Hint::DrawSelection => Some("drag to draw a selection"),
    };
    if let Some(hint) = hint {
        println!("    {:<12}{}", s.label.apply_to("Hint"), s.disabled.apply_to(hint));
    }
    println!();
}
