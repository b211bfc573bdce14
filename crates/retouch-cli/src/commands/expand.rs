use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use retouch_core::resize::{AspectChoice, ResizeEngine};

use super::{load_config, ImageSizeArgs};
use crate::summary;

#[derive(Args)]
pub struct ExpandArgs {
    #[command(flatten)]
    pub image: ImageSizeArgs,

    /// Target aspect ratio as W:H, or "free"
    #[arg(short, long)]
    pub aspect: AspectChoice,

    /// Editor config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: &ExpandArgs) -> Result<()> {
    let natural = args.image.resolve()?;
    let config = load_config(args.config.as_deref())?;

    let mut engine = ResizeEngine::new(&config.expansion);
    if !engine.select_aspect(args.aspect, natural) {
        bail!("Cannot plan an expansion for a {}x{} image", natural.width, natural.height);
    }
    let canvas = engine.expansion_canvas(natural);

    summary::print_expansion_summary(natural, args.aspect, engine.rect(), canvas);
    Ok(())
}
