//! ridgeprint-pipeline: Pure fingerprint image processing (sans-IO).
//!
//! Turns raw scan bytes into processed grayscale images and minutiae sets
//! into fixed-size RGB templates:
//!
//! decode -> crop and center -> enhance ... minutiae -> render.
//!
//! This crate has **no I/O dependencies**. It works on in-memory byte
//! slices and rasters; subprocess tools live in `ridgeprint-tools` and
//! directory handling in `ridgeprint-batch`.

pub mod blur;
pub mod crop;
pub mod enhance;
pub mod grayscale;
pub mod layout;
pub mod minutiae;
pub mod quality;
pub mod render;
pub mod types;

pub use minutiae::{ParsedMinutiae, format_minutiae, parse_minutiae};
pub use quality::{QualityVerdict, judge};
pub use render::render;
pub use types::{
    CropConfig, Dimensions, EnhanceConfig, EnhanceError, GrayImage, Minutia, MinutiaKind,
    MinutiaeSet, PreprocessConfig, QualityScore, RenderConfig, RenderError, RgbImage, Template,
};

/// Decode raw image bytes and crop-and-center the result, without
/// enhancing it.
///
/// # Errors
///
/// Returns [`EnhanceError`] if the bytes are empty or undecodable, the
/// image is zero-sized, or the crop configuration is invalid.
pub fn prepare(image_bytes: &[u8], crop: &CropConfig) -> Result<GrayImage, EnhanceError> {
    let gray = grayscale::decode_grayscale(image_bytes)?;
    crop::crop_and_center(&gray, crop)
}

/// Run the full preprocessing chain on raw image bytes.
///
/// # Pipeline steps
///
/// 1. Decode image and convert to grayscale
/// 2. Crop to the inked area and pad to the target aspect ratio
/// 3. Ridge enhancement (see [`enhance`](enhance::enhance))
///
/// # Errors
///
/// Returns [`EnhanceError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`EnhanceError::ImageDecode`] if the image format is unrecognized.
/// Returns [`EnhanceError::InvalidConfig`] for an invalid crop or
/// enhancement configuration.
pub fn preprocess(image_bytes: &[u8], config: &PreprocessConfig) -> Result<GrayImage, EnhanceError> {
    let cropped = prepare(image_bytes, &config.crop)?;
    enhance::enhance(&cropped, &config.enhance)
}
