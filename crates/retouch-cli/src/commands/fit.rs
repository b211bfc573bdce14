use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use retouch_core::geometry::Size;
use retouch_core::viewport::ViewportController;

use super::{load_config, ImageSizeArgs};
use crate::summary;

#[derive(Args)]
pub struct FitArgs {
    #[command(flatten)]
    pub image: ImageSizeArgs,

    /// Viewport container width in pixels
    #[arg(long, default_value = "1000")]
    pub container_width: f32,

    /// Viewport container height in pixels
    #[arg(long, default_value = "1000")]
    pub container_height: f32,

    /// Editor config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: &FitArgs) -> Result<()> {
    let natural = args.image.resolve()?;
    let config = load_config(args.config.as_deref())?;
    let container = Size::new(args.container_width, args.container_height);

    let viewport = ViewportController::new(config.viewport);
    let state = viewport.fit_to_container(natural, container);
    let bounds = ViewportController::image_bounds(state, natural, container);

    summary::print_fit_summary(natural, container, state, bounds);
    Ok(())
}
