use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_ASPECT_PRESETS, FIT_MARGIN, HANDLE_HIT_TOLERANCE, MAX_ZOOM, MIN_EXPANSION_SIZE,
    MIN_SELECTION_SIZE, MIN_ZOOM, PAN_WARNING_MS, VIEWPORT_COMMIT_DELAY_MS,
    WHEEL_ZOOM_SENSITIVITY, ZOOM_INDICATOR_MS,
};
use crate::error::{Result, RetouchError};
use crate::resize::AspectRatio;

/// Tunables for the whole editor. Every field has a default, so a config
/// file only needs the values it overrides.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub expansion: ExpansionConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "default_min_zoom")]
    pub min_zoom: f32,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f32,
    /// Fraction of the container the image fills after a fit.
    #[serde(default = "default_fit_margin")]
    pub fit_margin: f32,
    /// Exponential rate applied to ctrl+wheel deltas.
    #[serde(default = "default_wheel_sensitivity")]
    pub wheel_zoom_sensitivity: f32,
    /// Quiet period before live wheel state is committed.
    #[serde(default = "default_commit_delay_ms")]
    pub commit_delay_ms: u64,
    #[serde(default = "default_zoom_indicator_ms")]
    pub zoom_indicator_ms: u64,
}

fn default_min_zoom() -> f32 {
    MIN_ZOOM
}
fn default_max_zoom() -> f32 {
    MAX_ZOOM
}
fn default_fit_margin() -> f32 {
    FIT_MARGIN
}
fn default_wheel_sensitivity() -> f32 {
    WHEEL_ZOOM_SENSITIVITY
}
fn default_commit_delay_ms() -> u64 {
    VIEWPORT_COMMIT_DELAY_MS
}
fn default_zoom_indicator_ms() -> u64 {
    ZOOM_INDICATOR_MS
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            fit_margin: FIT_MARGIN,
            wheel_zoom_sensitivity: WHEEL_ZOOM_SENSITIVITY,
            commit_delay_ms: VIEWPORT_COMMIT_DELAY_MS,
            zoom_indicator_ms: ZOOM_INDICATOR_MS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Drawn rectangles below this size on either axis are discarded.
    #[serde(default = "default_min_selection_size")]
    pub min_size: f32,
}

fn default_min_selection_size() -> f32 {
    MIN_SELECTION_SIZE
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_size: MIN_SELECTION_SIZE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpansionConfig {
    /// Resizes producing a side at or below this are rejected.
    #[serde(default = "default_min_expansion_size")]
    pub min_size: f32,
    /// Handle hit radius in screen pixels.
    #[serde(default = "default_handle_tolerance")]
    pub handle_tolerance: f32,
    /// Ratios offered in the aspect picker, as `W:H` strings.
    #[serde(default = "default_presets")]
    pub presets: Vec<String>,
}

fn default_min_expansion_size() -> f32 {
    MIN_EXPANSION_SIZE
}
fn default_handle_tolerance() -> f32 {
    HANDLE_HIT_TOLERANCE
}
fn default_presets() -> Vec<String> {
    DEFAULT_ASPECT_PRESETS.iter().map(|s| s.to_string()).collect()
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            min_size: MIN_EXPANSION_SIZE,
            handle_tolerance: HANDLE_HIT_TOLERANCE,
            presets: default_presets(),
        }
    }
}

impl ExpansionConfig {
    /// Parse the configured presets.
    pub fn aspect_presets(&self) -> Result<Vec<AspectRatio>> {
        self.presets.iter().map(|s| s.parse()).collect()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_pan_warning_ms")]
    pub pan_warning_ms: u64,
}

fn default_pan_warning_ms() -> u64 {
    PAN_WARNING_MS
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            pan_warning_ms: PAN_WARNING_MS,
        }
    }
}

impl EditorConfig {
    /// Reject values the engines cannot honour.
    pub fn validate(&self) -> Result<()> {
        let v = &self.viewport;
        if !(v.min_zoom > 0.0 && v.min_zoom <= v.max_zoom) {
            return Err(RetouchError::InvalidConfig(format!(
                "zoom limits must satisfy 0 < min <= max (got {}..{})",
                v.min_zoom, v.max_zoom
            )));
        }
        if !(v.fit_margin > 0.0 && v.fit_margin <= 1.0) {
            return Err(RetouchError::InvalidConfig(format!(
                "fit_margin must be in (0, 1], got {}",
                v.fit_margin
            )));
        }
        if !(v.wheel_zoom_sensitivity > 0.0) {
            return Err(RetouchError::InvalidConfig(
                "wheel_zoom_sensitivity must be positive".into(),
            ));
        }
        if !(self.selection.min_size > 0.0 && self.selection.min_size < 1.0) {
            return Err(RetouchError::InvalidConfig(format!(
                "selection.min_size must be in (0, 1), got {}",
                self.selection.min_size
            )));
        }
        if !(self.expansion.min_size > 0.0 && self.expansion.min_size < 1.0) {
            return Err(RetouchError::InvalidConfig(format!(
                "expansion.min_size must be in (0, 1), got {}",
                self.expansion.min_size
            )));
        }
        if !(self.expansion.handle_tolerance >= 0.0) {
            return Err(RetouchError::InvalidConfig(
                "expansion.handle_tolerance must not be negative".into(),
            ));
        }
        self.expansion.aspect_presets()?;
        Ok(())
    }
}
