//! Crop a fingerprint scan to its inked area and center it.
//!
//! Scanners often leave wide white borders and place the finger off
//! center. Cropping to the ink bounding box (plus a margin) and padding
//! to a fixed aspect ratio gives the minutiae tool, and later the
//! template renderer, a consistent framing across a batch.

use image::GrayImage;

use crate::types::{CropConfig, EnhanceError};

/// Inclusive pixel bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bounds {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl Bounds {
    const fn width(self) -> u32 {
        self.x1 - self.x0 + 1
    }

    const fn height(self) -> u32 {
        self.y1 - self.y0 + 1
    }
}

/// Bounding box of all pixels strictly darker than `threshold`.
fn ink_bounds(image: &GrayImage, threshold: u8) -> Option<Bounds> {
    let mut bounds: Option<Bounds> = None;
    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel.0[0] >= threshold {
            continue;
        }
        bounds = Some(match bounds {
            None => Bounds {
                x0: x,
                y0: y,
                x1: x,
                y1: y,
            },
            Some(b) => Bounds {
                x0: b.x0.min(x),
                y0: b.y0.min(y),
                x1: b.x1.max(x),
                y1: b.y1.max(y),
            },
        });
    }
    bounds
}

/// Crop `image` to its ink plus margin, then pad to the target aspect
/// ratio with the crop centered.
///
/// Returns the image unchanged when cropping is disabled or no pixel is
/// darker than the brightness threshold.
///
/// # Errors
///
/// Returns [`EnhanceError::EmptyImage`] for a zero-sized image and
/// [`EnhanceError::InvalidConfig`] if the target aspect ratio is not a
/// finite positive number.
pub fn crop_and_center(image: &GrayImage, config: &CropConfig) -> Result<GrayImage, EnhanceError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(EnhanceError::EmptyImage);
    }
    let ratio = config.target_aspect_ratio;
    if !ratio.is_finite() || ratio <= 0.0 {
        return Err(EnhanceError::InvalidConfig(format!(
            "target aspect ratio must be finite and positive, got {ratio}"
        )));
    }
    if !config.enabled {
        return Ok(image.clone());
    }
    let Some(ink) = ink_bounds(image, config.brightness_threshold) else {
        return Ok(image.clone());
    };

    let margin = config.cropping_margin;
    let bounds = Bounds {
        x0: ink.x0.saturating_sub(margin),
        y0: ink.y0.saturating_sub(margin),
        x1: ink.x1.saturating_add(margin).min(image.width() - 1),
        y1: ink.y1.saturating_add(margin).min(image.height() - 1),
    };

    let (out_w, out_h) = padded_size(bounds.width(), bounds.height(), ratio);
    let pad_x = (out_w - bounds.width()) / 2;
    let pad_y = (out_h - bounds.height()) / 2;

    Ok(GrayImage::from_fn(out_w, out_h, |x, y| {
        let inside_x = x >= pad_x && x - pad_x < bounds.width();
        let inside_y = y >= pad_y && y - pad_y < bounds.height();
        if inside_x && inside_y {
            *image.get_pixel(bounds.x0 + x - pad_x, bounds.y0 + y - pad_y)
        } else {
            image::Luma([u8::MAX])
        }
    }))
}

/// Grow the shorter side of a `w`×`h` box until `w / h ≈ ratio`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn padded_size(w: u32, h: u32, ratio: f64) -> (u32, u32) {
    let (wf, hf) = (f64::from(w), f64::from(h));
    if wf / hf < ratio {
        let grown = (hf * ratio).round().min(f64::from(u32::MAX)) as u32;
        (grown.max(w), h)
    } else {
        let grown = (wf / ratio).round().min(f64::from(u32::MAX)) as u32;
        (w, grown.max(h))
    }
}
