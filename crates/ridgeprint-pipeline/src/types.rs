//! Shared types for the ridgeprint preprocessing pipeline.

use std::f64::consts::TAU;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can pass fingerprint
/// rasters around without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage` so downstream crates can reference rendered
/// templates without depending on `image` directly.
pub use image::RgbImage;

/// A rendered minutiae template: an RGB raster of exactly the configured
/// template size.
pub type Template = RgbImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create new dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Dimensions of an existing raster.
    #[must_use]
    pub fn of<P: image::Pixel>(image: &image::ImageBuffer<P, Vec<P::Subpixel>>) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Returns `true` if either side is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

// ───────────────────────── Quality ───────────────────────────────────

/// A fingerprint quality score as reported by the external quality tool.
///
/// Scores run from [`QualityScore::BEST`] (1) to [`QualityScore::WORST`]
/// (5). Lower is better; the filter comparison depends on this polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityScore {
    value: u8,
    exit_status: i32,
}

impl QualityScore {
    /// Best possible score.
    pub const BEST: u8 = 1;
    /// Worst possible score.
    pub const WORST: u8 = 5;

    /// Create a score, returning `None` if `value` is outside
    /// `BEST..=WORST`.
    #[must_use]
    pub const fn new(value: u8, exit_status: i32) -> Option<Self> {
        if value < Self::BEST || value > Self::WORST {
            return None;
        }
        Some(Self { value, exit_status })
    }

    /// The score itself (1 = best, 5 = worst).
    #[must_use]
    pub const fn value(self) -> u8 {
        self.value
    }

    /// Raw exit status of the tool run that produced this score.
    #[must_use]
    pub const fn exit_status(self) -> i32 {
        self.exit_status
    }
}

// ───────────────────────── Minutiae ──────────────────────────────────

/// The two kinds of ridge feature the extraction tool reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MinutiaKind {
    /// A ridge that stops (tool type code 1).
    RidgeEnding,
    /// A ridge that splits in two (tool type code 2).
    Bifurcation,
}

impl MinutiaKind {
    /// Map the extraction tool's numeric type code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::RidgeEnding),
            2 => Some(Self::Bifurcation),
            _ => None,
        }
    }

    /// The extraction tool's numeric type code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::RidgeEnding => 1,
            Self::Bifurcation => 2,
        }
    }
}

/// A single minutia in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Minutia {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
    /// Local ridge direction in radians, always in `[0, 2π)`.
    pub angle: f64,
    /// Ridge ending or bifurcation.
    pub kind: MinutiaKind,
    /// Tool-reported reliability in `[0, 1]`.
    pub quality: f64,
}

impl Minutia {
    /// Create a minutia, wrapping `angle` into `[0, 2π)` and clamping
    /// `quality` into `[0, 1]`.
    #[must_use]
    pub fn new(x: f64, y: f64, angle: f64, kind: MinutiaKind, quality: f64) -> Self {
        Self {
            x,
            y,
            angle: normalize_angle(angle),
            kind,
            quality: quality.clamp(0.0, 1.0),
        }
    }
}

/// Wrap an angle in radians into `[0, 2π)`.
#[must_use]
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// The ordered minutiae of one image plus the source image dimensions.
///
/// Coordinates stay in the source image's pixel space; only the
/// renderer maps them onto the template canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinutiaeSet {
    minutiae: Vec<Minutia>,
    dimensions: Dimensions,
}

impl MinutiaeSet {
    /// Create a set from minutiae in extraction order.
    #[must_use]
    pub const fn new(minutiae: Vec<Minutia>, dimensions: Dimensions) -> Self {
        Self {
            minutiae,
            dimensions,
        }
    }

    /// An empty set for an image of the given size.
    #[must_use]
    pub const fn empty(dimensions: Dimensions) -> Self {
        Self::new(Vec::new(), dimensions)
    }

    /// The minutiae in extraction order.
    #[must_use]
    pub fn minutiae(&self) -> &[Minutia] {
        &self.minutiae
    }

    /// Source image dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Number of minutiae.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.minutiae.len()
    }

    /// Returns `true` if the set holds no minutiae.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.minutiae.is_empty()
    }

    /// Drop minutiae whose quality is below `min_quality`, keeping order.
    #[must_use]
    pub fn retain_quality(mut self, min_quality: f64) -> Self {
        self.minutiae.retain(|m| m.quality >= min_quality);
        self
    }

    /// Count of minutiae of the given kind.
    #[must_use]
    pub fn count_kind(&self, kind: MinutiaKind) -> usize {
        self.minutiae.iter().filter(|m| m.kind == kind).count()
    }
}

// ───────────────────────── Configuration ─────────────────────────────

/// Crop-and-center settings applied before enhancement.
///
/// The crop finds the bounding box of "ink" (pixels darker than
/// `brightness_threshold`), grows it by `cropping_margin`, then pads the
/// shorter side with white until the box has `target_aspect_ratio`
/// (width / height).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    /// Whether to crop at all.
    pub enabled: bool,
    /// Margin around the ink bounding box, in pixels.
    pub cropping_margin: u32,
    /// Output width / height ratio. Must be finite and positive.
    pub target_aspect_ratio: f64,
    /// Pixels strictly darker than this count as ink.
    pub brightness_threshold: u8,
}

impl CropConfig {
    /// Default margin around the ink bounding box.
    pub const DEFAULT_CROPPING_MARGIN: u32 = 75;
    /// Default output aspect ratio (square).
    pub const DEFAULT_TARGET_ASPECT_RATIO: f64 = 1.0;
    /// Default ink brightness threshold.
    pub const DEFAULT_BRIGHTNESS_THRESHOLD: u8 = 225;
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cropping_margin: Self::DEFAULT_CROPPING_MARGIN,
            target_aspect_ratio: Self::DEFAULT_TARGET_ASPECT_RATIO,
            brightness_threshold: Self::DEFAULT_BRIGHTNESS_THRESHOLD,
        }
    }
}

/// Ridge enhancement settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceConfig {
    /// Mean intensity after contrast normalization.
    pub target_mean: f64,
    /// Intensity variance after contrast normalization.
    pub target_variance: f64,
    /// Side of the square blocks used for the orientation estimate.
    pub block_size: u32,
    /// Radius, in blocks, of the box filter that smooths the orientation
    /// field. Zero disables smoothing.
    pub orientation_smoothing: u32,
    /// Half-length in pixels of the oriented smoothing kernel.
    pub smoothing_radius: u32,
    /// Gaussian sigma of the oriented smoothing kernel, in pixels.
    pub smoothing_sigma: f64,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            target_mean: 128.0,
            target_variance: 2500.0,
            block_size: 16,
            orientation_smoothing: 1,
            smoothing_radius: 4,
            smoothing_sigma: 2.0,
        }
    }
}

/// Everything needed to turn raw scan bytes into a processed image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Crop-and-center step, applied first.
    pub crop: CropConfig,
    /// Ridge enhancement step.
    pub enhance: EnhanceConfig,
}

/// Template rendering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Exact output size of every template.
    pub template_size: Dimensions,
    /// Length of the orientation segment, in template pixels.
    pub orientation_line_length: f64,
    /// Radius (or half side) of each minutia marker, in template pixels.
    pub marker_radius: f64,
    /// Stroke width of the orientation segment.
    pub line_width: f32,
    /// Gaussian sigma applied to the finished template. Non-positive
    /// values leave the template crisp.
    pub soften_sigma: f32,
}

impl RenderConfig {
    /// Default template side length.
    pub const DEFAULT_TEMPLATE_SIDE: u32 = 256;
    /// Default orientation segment length.
    pub const DEFAULT_ORIENTATION_LINE_LENGTH: f64 = 15.0;
    /// Default marker radius.
    pub const DEFAULT_MARKER_RADIUS: f64 = 3.0;

    /// Check the configuration before any canvas is allocated.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidConfig`] for a zero-sized template,
    /// or a negative or non-finite line length, marker radius, line width
    /// or softening sigma.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.template_size.is_empty() {
            return Err(RenderError::InvalidConfig(format!(
                "template size must be positive, got {}",
                self.template_size
            )));
        }
        let lengths = [
            ("orientation_line_length", self.orientation_line_length),
            ("marker_radius", self.marker_radius),
            ("line_width", f64::from(self.line_width)),
            ("soften_sigma", f64::from(self.soften_sigma)),
        ];
        for (name, value) in lengths {
            if !value.is_finite() || value < 0.0 {
                return Err(RenderError::InvalidConfig(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            template_size: Dimensions::new(Self::DEFAULT_TEMPLATE_SIDE, Self::DEFAULT_TEMPLATE_SIDE),
            orientation_line_length: Self::DEFAULT_ORIENTATION_LINE_LENGTH,
            marker_radius: Self::DEFAULT_MARKER_RADIUS,
            line_width: 1.0,
            soften_sigma: 0.0,
        }
    }
}

// ───────────────────────── Errors ────────────────────────────────────

/// Errors from decoding, cropping, or enhancing a fingerprint image.
#[derive(Debug, thiserror::Error)]
pub enum EnhanceError {
    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The decoded image has a zero-sized side.
    #[error("image has zero width or height")]
    EmptyImage,

    /// Preprocessing configuration is invalid.
    #[error("invalid preprocessing configuration: {0}")]
    InvalidConfig(String),
}

/// Errors from rendering a template.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Rendering configuration is invalid.
    #[error("invalid render configuration: {0}")]
    InvalidConfig(String),

    /// The minutiae set claims a zero-sized source image, so no scale
    /// factor exists.
    #[error("source dimensions {0} are empty")]
    EmptySource(Dimensions),
}
