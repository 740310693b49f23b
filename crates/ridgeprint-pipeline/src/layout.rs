//! Source-to-template coordinate transform.
//!
//! Maps source-image pixel coordinates onto the template canvas with a
//! single uniform scale and a centering offset:
//!
//! ```text
//! s        = min(template_w / source_w, template_h / source_h)
//! offset_x = (template_w - source_w × s) / 2
//! offset_y = (template_h - source_h × s) / 2
//! canvas_x = offset_x + x × s
//! canvas_y = offset_y + y × s
//! ```
//!
//! The scaled source frame is centered on the canvas, so the placement
//! of a minutia depends only on its position within the source image,
//! never on where the other minutiae cluster. Any point inside the
//! source frame lands inside `[0, template_w) × [0, template_h)`.

use crate::types::{Dimensions, RenderError};

/// Uniform scale plus centering offset from source pixels to template
/// pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateLayout {
    /// Scale applied to both axes.
    pub scale: f64,
    /// Horizontal offset of the scaled source frame on the canvas.
    pub offset_x: f64,
    /// Vertical offset of the scaled source frame on the canvas.
    pub offset_y: f64,
}

impl TemplateLayout {
    /// Fit a `source` frame into a `template` canvas without distortion.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::EmptySource`] if `source` has a zero side
    /// and [`RenderError::InvalidConfig`] if `template` does.
    pub fn fit(source: Dimensions, template: Dimensions) -> Result<Self, RenderError> {
        if source.is_empty() {
            return Err(RenderError::EmptySource(source));
        }
        if template.is_empty() {
            return Err(RenderError::InvalidConfig(format!(
                "template size must be positive, got {template}"
            )));
        }

        let (sw, sh) = (f64::from(source.width), f64::from(source.height));
        let (tw, th) = (f64::from(template.width), f64::from(template.height));
        let scale = (tw / sw).min(th / sh);

        // Clamp away rounding noise that would push the frame a hair
        // past the left or top edge.
        let offset_x = ((tw - sw * scale) / 2.0).max(0.0);
        let offset_y = ((th - sh * scale) / 2.0).max(0.0);

        Ok(Self {
            scale,
            offset_x,
            offset_y,
        })
    }

    /// Map a source-pixel position onto the canvas.
    #[must_use]
    pub fn project(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x.mul_add(self.scale, self.offset_x),
            y.mul_add(self.scale, self.offset_y),
        )
    }
}
