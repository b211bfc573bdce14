pub mod config;
pub mod expand;
pub mod fit;
pub mod replay;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use retouch_core::config::EditorConfig;
use retouch_core::geometry::PixelSize;

/// Where the natural image size comes from: an image file, or explicit
/// dimensions.
#[derive(Args)]
pub struct ImageSizeArgs {
    /// Image file; only its header is read
    pub file: Option<PathBuf>,

    /// Image width in pixels (instead of a file)
    #[arg(long, requires = "height", conflicts_with = "file")]
    pub width: Option<u32>,

    /// Image height in pixels (instead of a file)
    #[arg(long, requires = "width", conflicts_with = "file")]
    pub height: Option<u32>,
}

impl ImageSizeArgs {
    pub fn resolve(&self) -> Result<PixelSize> {
        let size = match (&self.file, self.width, self.height) {
            (Some(path), _, _) => {
                let (w, h) = image::image_dimensions(path)
                    .with_context(|| format!("Failed to read image header of {}", path.display()))?;
                PixelSize::new(w, h)
            }
            (None, Some(w), Some(h)) => PixelSize::new(w, h),
            _ => bail!("Give an image file or both --width and --height"),
        };
        if !size.is_valid() {
            bail!("Image has zero size ({}x{})", size.width, size.height);
        }
        Ok(size)
    }
}

/// Load an editor config from TOML, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<EditorConfig> {
    let config: EditorConfig = match path {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            toml::from_str(&contents).context("Invalid editor config")?
        }
        None => EditorConfig::default(),
    };
    config.validate().context("Invalid editor config")?;
    Ok(config)
}
