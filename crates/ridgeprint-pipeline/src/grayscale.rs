//! Image decoding and grayscale conversion.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, TIFF) and produces the
//! single-channel 8-bit raster every later stage works on. Fingerprint
//! scans are usually grayscale already; color inputs are converted with
//! the standard luminance weights.

use image::GrayImage;

use crate::types::EnhanceError;

/// Decode raw image bytes and convert to grayscale.
///
/// # Errors
///
/// Returns [`EnhanceError::EmptyInput`] if `bytes` is empty.
/// Returns [`EnhanceError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
/// Returns [`EnhanceError::EmptyImage`] if the decoded image has a
/// zero-sized side.
pub fn decode_grayscale(bytes: &[u8]) -> Result<GrayImage, EnhanceError> {
    if bytes.is_empty() {
        return Err(EnhanceError::EmptyInput);
    }

    let gray = image::load_from_memory(bytes)?.to_luma8();
    if gray.width() == 0 || gray.height() == 0 {
        return Err(EnhanceError::EmptyImage);
    }
    Ok(gray)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Helper: encode an RGBA image as a PNG byte buffer.
    fn encode_rgba(img: &image::RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn empty_input_returns_error() {
        let result = decode_grayscale(&[]);
        assert!(matches!(result, Err(EnhanceError::EmptyInput)));
    }

    #[test]
    fn corrupt_bytes_returns_image_decode_error() {
        let result = decode_grayscale(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(EnhanceError::ImageDecode(_))));
    }

    #[test]
    fn output_dimensions_match_input() {
        let img = image::RgbaImage::from_fn(17, 31, |_, _| image::Rgba([128, 64, 32, 255]));
        let gray = decode_grayscale(&encode_rgba(&img)).unwrap();
        assert_eq!(gray.width(), 17);
        assert_eq!(gray.height(), 31);
    }

    #[test]
    fn white_stays_white() {
        let img = image::RgbaImage::from_fn(2, 2, |_, _| image::Rgba([255, 255, 255, 255]));
        let gray = decode_grayscale(&encode_rgba(&img)).unwrap();
        assert!(gray.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn grayscale_conversion_weights_green_highest() {
        let value = |r, g, b| {
            let img = image::RgbaImage::from_fn(1, 1, |_, _| image::Rgba([r, g, b, 255]));
            decode_grayscale(&encode_rgba(&img)).unwrap().get_pixel(0, 0).0[0]
        };
        let (r_val, g_val, b_val) = (value(255, 0, 0), value(0, 255, 0), value(0, 0, 255));
        assert!(
            g_val > r_val && r_val > b_val,
            "expected green > red > blue luminance, got R={r_val} G={g_val} B={b_val}",
        );
    }
}
