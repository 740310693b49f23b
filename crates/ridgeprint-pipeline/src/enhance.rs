//! Ridge enhancement.
//!
//! Four deterministic steps, none of which change the image size:
//!
//! 1. **Contrast normalization** to a fixed mean and variance, so scans
//!    from different sensors and pressures start from the same range.
//! 2. **Orientation estimate**: the dominant ridge direction per block,
//!    from Sobel gradients (see [`OrientationField`]).
//! 3. **Oriented smoothing**: each pixel becomes a Gaussian-weighted mean
//!    of samples taken *along* the local ridge. Noise and small breaks
//!    inside a ridge are averaged away while the contrast *across*
//!    ridges is kept.
//! 4. **Contrast stretch** back to the full `0..=255` range.

use image::GrayImage;

use crate::types::{EnhanceConfig, EnhanceError};

/// Enhance ridge structure in a grayscale fingerprint image.
///
/// # Errors
///
/// Returns [`EnhanceError::EmptyImage`] for a zero-sized image and
/// [`EnhanceError::InvalidConfig`] for a zero block size or a
/// non-positive target variance or smoothing sigma.
pub fn enhance(image: &GrayImage, config: &EnhanceConfig) -> Result<GrayImage, EnhanceError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(EnhanceError::EmptyImage);
    }
    validate(config)?;

    let normalized = normalize_contrast(image, config.target_mean, config.target_variance);
    let field = OrientationField::estimate(&normalized, config.block_size, config.orientation_smoothing);
    let smoothed = oriented_smooth(
        &normalized,
        &field,
        config.smoothing_radius,
        config.smoothing_sigma,
    );
    Ok(stretch_contrast(&smoothed))
}

fn validate(config: &EnhanceConfig) -> Result<(), EnhanceError> {
    if config.block_size == 0 {
        return Err(EnhanceError::InvalidConfig("block_size must be positive".to_string()));
    }
    if !(config.target_variance.is_finite() && config.target_variance > 0.0) {
        return Err(EnhanceError::InvalidConfig(format!(
            "target_variance must be finite and positive, got {}",
            config.target_variance
        )));
    }
    if !(config.smoothing_sigma.is_finite() && config.smoothing_sigma > 0.0) {
        return Err(EnhanceError::InvalidConfig(format!(
            "smoothing_sigma must be finite and positive, got {}",
            config.smoothing_sigma
        )));
    }
    if !config.target_mean.is_finite() {
        return Err(EnhanceError::InvalidConfig("target_mean must be finite".to_string()));
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u8(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Normalize intensities to the given mean and variance.
///
/// Uses the per-pixel mapping
/// `out = mean0 ± sqrt(var0 × (p - mean)² / var)`, with the sign taken
/// from `p - mean`. A uniform image (zero variance) maps to `mean0`.
#[must_use = "returns the normalized image"]
#[allow(clippy::cast_precision_loss)]
pub fn normalize_contrast(image: &GrayImage, target_mean: f64, target_variance: f64) -> GrayImage {
    let count = image.as_raw().len().max(1) as f64;
    let mean = image.as_raw().iter().map(|&p| f64::from(p)).sum::<f64>() / count;
    let variance = image
        .as_raw()
        .iter()
        .map(|&p| {
            let d = f64::from(p) - mean;
            d * d
        })
        .sum::<f64>()
        / count;

    if variance < f64::EPSILON {
        let fill = to_u8(target_mean);
        return GrayImage::from_pixel(image.width(), image.height(), image::Luma([fill]));
    }

    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let d = f64::from(pixel.0[0]) - mean;
        let spread = (target_variance * d * d / variance).sqrt();
        let value = if d > 0.0 {
            target_mean + spread
        } else {
            target_mean - spread
        };
        pixel.0[0] = to_u8(value);
    }
    out
}

/// Linearly stretch the intensity range to `0..=255`.
///
/// A uniform image is returned unchanged.
#[must_use = "returns the stretched image"]
pub fn stretch_contrast(image: &GrayImage) -> GrayImage {
    let (Some(&lo), Some(&hi)) = (image.as_raw().iter().min(), image.as_raw().iter().max()) else {
        return image.clone();
    };
    if lo == hi {
        return image.clone();
    }
    let range = f64::from(hi - lo);
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = to_u8(f64::from(pixel.0[0] - lo) * 255.0 / range);
    }
    out
}

// ───────────────────────── Orientation field ─────────────────────────

/// Block-wise ridge orientation.
///
/// Gradients are averaged in the doubled-angle domain, where opposite
/// gradient directions (the two flanks of the same ridge) reinforce
/// instead of cancel:
///
/// ```text
/// vx = Σ 2·gx·gy
/// vy = Σ (gx² − gy²)
/// gradient angle φ = ½·atan2(vx, vy)
/// ridge angle    θ = φ + π/2
/// ```
#[derive(Debug, Clone)]
pub struct OrientationField {
    block_size: u32,
    blocks_x: u32,
    blocks_y: u32,
    /// Ridge angle per block in radians, row-major.
    angles: Vec<f64>,
}

impl OrientationField {
    /// Estimate the field for `image` using square blocks of
    /// `block_size` pixels, box-smoothed over `smoothing` neighbouring
    /// blocks in each direction.
    #[must_use]
    pub fn estimate(image: &GrayImage, block_size: u32, smoothing: u32) -> Self {
        let block_size = block_size.max(1);
        let blocks_x = image.width().div_ceil(block_size);
        let blocks_y = image.height().div_ceil(block_size);
        let n = (blocks_x * blocks_y) as usize;

        let presmoothed = crate::blur::gaussian_blur(image, 1.0);
        let gx = imageproc::gradients::horizontal_sobel(&presmoothed);
        let gy = imageproc::gradients::vertical_sobel(&presmoothed);

        let mut vx = vec![0.0_f64; n];
        let mut vy = vec![0.0_f64; n];
        for (x, y, px) in gx.enumerate_pixels() {
            let dx = f64::from(px.0[0]);
            let dy = f64::from(gy.get_pixel(x, y).0[0]);
            let idx = ((y / block_size) * blocks_x + x / block_size) as usize;
            vx[idx] += 2.0 * dx * dy;
            vy[idx] += dx.mul_add(dx, -(dy * dy));
        }

        let (vx, vy) = if smoothing > 0 {
            (
                box_smooth(&vx, blocks_x, blocks_y, smoothing),
                box_smooth(&vy, blocks_x, blocks_y, smoothing),
            )
        } else {
            (vx, vy)
        };

        let angles = vx
            .iter()
            .zip(&vy)
            .map(|(&sx, &sy)| 0.5 * sx.atan2(sy) + std::f64::consts::FRAC_PI_2)
            .collect();

        Self {
            block_size,
            blocks_x,
            blocks_y,
            angles,
        }
    }

    /// Ridge angle at pixel `(x, y)` in radians (image y axis down).
    #[must_use]
    pub fn angle_at(&self, x: u32, y: u32) -> f64 {
        let bx = (x / self.block_size).min(self.blocks_x - 1);
        let by = (y / self.block_size).min(self.blocks_y - 1);
        self.angles[(by * self.blocks_x + bx) as usize]
    }
}

/// Box-average a row-major grid over a `(2r+1)²` neighbourhood, clamped
/// at the borders.
fn box_smooth(grid: &[f64], w: u32, h: u32, radius: u32) -> Vec<f64> {
    let r = i64::from(radius);
    let (wi, hi) = (i64::from(w), i64::from(h));
    let mut out = Vec::with_capacity(grid.len());
    for y in 0..hi {
        for x in 0..wi {
            let mut sum = 0.0;
            for ny in (y - r).max(0)..=(y + r).min(hi - 1) {
                for nx in (x - r).max(0)..=(x + r).min(wi - 1) {
                    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
                    let idx = (ny * wi + nx) as usize;
                    sum += grid[idx];
                }
            }
            out.push(sum);
        }
    }
    out
}

/// Average each pixel with samples along the local ridge direction.
#[must_use = "returns the smoothed image"]
#[allow(clippy::cast_possible_truncation)]
pub fn oriented_smooth(
    image: &GrayImage,
    field: &OrientationField,
    radius: u32,
    sigma: f64,
) -> GrayImage {
    let r = i32::try_from(radius).unwrap_or(i32::MAX);
    let weights: Vec<(f64, f64)> = (-r..=r)
        .map(|t| {
            let t = f64::from(t);
            (t, (-(t * t) / (2.0 * sigma * sigma)).exp())
        })
        .collect();
    let max_x = f64::from(image.width() - 1);
    let max_y = f64::from(image.height() - 1);

    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let theta = field.angle_at(x, y);
        let (sin, cos) = theta.sin_cos();
        let (xf, yf) = (f64::from(x), f64::from(y));
        let mut acc = 0.0;
        let mut norm = 0.0;
        for &(t, w) in &weights {
            #[allow(clippy::cast_sign_loss)]
            let sx = t.mul_add(cos, xf).round().clamp(0.0, max_x) as u32;
            #[allow(clippy::cast_sign_loss)]
            let sy = t.mul_add(sin, yf).round().clamp(0.0, max_y) as u32;
            acc += w * f64::from(image.get_pixel(sx, sy).0[0]);
            norm += w;
        }
        image::Luma([to_u8(acc / norm)])
    })
}
