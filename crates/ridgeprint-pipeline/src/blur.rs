//! Gaussian blur helpers.
//!
//! Wraps [`imageproc::filter::gaussian_blur_f32`]. [`gaussian_blur`]
//! works on a single grayscale channel; [`gaussian_blur_rgb`] blurs each
//! channel of a rendered template independently so bifurcation and
//! ridge-ending channels never bleed into each other.

use image::GrayImage;

use crate::types::RgbImage;

/// Apply Gaussian blur to a grayscale image.
///
/// Non-positive sigma values return the image unchanged, since
/// `imageproc`'s underlying function panics on `sigma <= 0.0`.
#[must_use = "returns the blurred image"]
pub fn gaussian_blur(image: &GrayImage, sigma: f32) -> GrayImage {
    if sigma <= 0.0 {
        return image.clone();
    }

    imageproc::filter::gaussian_blur_f32(image, sigma)
}

/// Apply Gaussian blur to an RGB image by blurring each channel
/// independently.
///
/// Non-positive sigma values return the image unchanged.
#[must_use = "returns the blurred RGB image"]
pub fn gaussian_blur_rgb(image: &RgbImage, sigma: f32) -> RgbImage {
    if sigma <= 0.0 {
        return image.clone();
    }

    let (w, h) = (image.width(), image.height());

    let channels: [GrayImage; 3] = std::array::from_fn(|c| {
        GrayImage::from_fn(w, h, |x, y| image::Luma([image.get_pixel(x, y).0[c]]))
    });
    let blurred: [GrayImage; 3] =
        std::array::from_fn(|c| imageproc::filter::gaussian_blur_f32(&channels[c], sigma));

    RgbImage::from_fn(w, h, |x, y| {
        image::Rgb([
            blurred[0].get_pixel(x, y).0[0],
            blurred[1].get_pixel(x, y).0[0],
            blurred[2].get_pixel(x, y).0[0],
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A single lit pixel in the middle of a dark 11x11 image.
    fn dot_image() -> GrayImage {
        GrayImage::from_fn(11, 11, |x, y| {
            if x == 5 && y == 5 {
                image::Luma([255])
            } else {
                image::Luma([0])
            }
        })
    }

    #[test]
    fn zero_sigma_returns_identical_image() {
        let img = dot_image();
        assert_eq!(img, gaussian_blur(&img, 0.0));
    }

    #[test]
    fn negative_sigma_returns_identical_image() {
        let img = dot_image();
        assert_eq!(img, gaussian_blur(&img, -1.0));
    }

    #[test]
    fn blur_spreads_a_dot() {
        let blurred = gaussian_blur(&dot_image(), 1.5);
        assert!(blurred.get_pixel(5, 5).0[0] < 255);
        assert!(blurred.get_pixel(6, 5).0[0] > 0);
    }

    #[test]
    fn rgb_output_dimensions_preserved() {
        let img = RgbImage::new(17, 31);
        let blurred = gaussian_blur_rgb(&img, 1.4);
        assert_eq!(blurred.dimensions(), (17, 31));
    }

    #[test]
    fn rgb_channels_stay_separate() {
        // Only the red channel is lit; blurring must not leak into green/blue.
        let img = RgbImage::from_fn(11, 11, |x, y| {
            if x == 5 && y == 5 {
                image::Rgb([255, 0, 0])
            } else {
                image::Rgb([0, 0, 0])
            }
        });
        let blurred = gaussian_blur_rgb(&img, 1.5);
        for pixel in blurred.pixels() {
            assert_eq!(pixel.0[1], 0);
            assert_eq!(pixel.0[2], 0);
        }
        assert!(blurred.get_pixel(6, 5).0[0] > 0);
    }

    #[test]
    fn rgb_zero_sigma_returns_identical_image() {
        let img = RgbImage::from_fn(4, 4, |_, _| image::Rgb([100, 150, 200]));
        assert_eq!(img, gaussian_blur_rgb(&img, 0.0));
    }
}
