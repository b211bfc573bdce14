/// Lower bound for the viewport zoom factor.
pub const MIN_ZOOM: f32 = 0.2;

/// Upper bound for the viewport zoom factor.
pub const MAX_ZOOM: f32 = 5.0;

/// Fraction of the container the image occupies after a fit (5% margin).
pub const FIT_MARGIN: f32 = 0.95;

/// Zoom used when a fit cannot be computed (unknown or zero dimensions).
pub const FALLBACK_ZOOM: f32 = 1.0;

/// Exponential zoom rate per wheel delta unit: `zoom * exp(-dy * rate)`.
pub const WHEEL_ZOOM_SENSITIVITY: f32 = 0.01;

/// Quiet period after the last wheel tick before live viewport state is committed.
pub const VIEWPORT_COMMIT_DELAY_MS: u64 = 150;

/// How long the zoom direction indicator stays visible after the last zoom tick.
pub const ZOOM_INDICATOR_MS: u64 = 200;

/// How long the "pan tool required" warning banner stays up.
pub const PAN_WARNING_MS: u64 = 3000;

/// Drawn selections narrower or shorter than this (normalized) are discarded.
pub const MIN_SELECTION_SIZE: f32 = 0.02;

/// Expansion rectangles must stay strictly larger than this (normalized) on both axes.
pub const MIN_EXPANSION_SIZE: f32 = 0.2;

/// Hit radius around expansion handles, in screen pixels.
pub const HANDLE_HIT_TOLERANCE: f32 = 10.0;

/// Aspect ratios offered for canvas expansion.
pub const DEFAULT_ASPECT_PRESETS: [&str; 5] = ["1:1", "16:9", "9:16", "4:3", "3:4"];

/// Tolerance when comparing normalized coordinates for equality.
pub const EPSILON: f32 = 1e-6;
