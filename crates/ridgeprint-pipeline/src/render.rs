//! Template rendering.
//!
//! Draws a [`MinutiaeSet`] onto a fixed-size black RGB canvas with
//! `tiny-skia`:
//!
//! - bifurcations are red filled circles, ridge endings green filled
//!   squares, both of `marker_radius`;
//! - each marker gets an orientation segment of
//!   `orientation_line_length` in its own colour, ending at
//!   `(x + L·cos a, y − L·sin a)` since the image y axis points down;
//! - minutiae are drawn in input order, so later markers paint over
//!   earlier ones where they overlap.
//!
//! Positions are mapped with [`TemplateLayout`]. Anything that lands
//! outside the canvas is clipped by the rasterizer.

use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::blur::gaussian_blur_rgb;
use crate::layout::TemplateLayout;
use crate::types::{Minutia, MinutiaKind, MinutiaeSet, RenderConfig, RenderError, Template};

/// Marker colour per minutia kind.
const fn kind_rgb(kind: MinutiaKind) -> [u8; 3] {
    match kind {
        MinutiaKind::Bifurcation => [255, 0, 0],
        MinutiaKind::RidgeEnding => [0, 255, 0],
    }
}

/// Render `set` into a template of exactly `config.template_size`.
///
/// An empty set yields a blank (black) canvas. The output depends only on
/// the inputs, so rendering the same set twice is byte-identical.
///
/// # Errors
///
/// Returns [`RenderError::InvalidConfig`] if `config` fails
/// [`RenderConfig::validate`] and [`RenderError::EmptySource`] if the set's
/// source dimensions have a zero side.
pub fn render(set: &MinutiaeSet, config: &RenderConfig) -> Result<Template, RenderError> {
    config.validate()?;
    let layout = TemplateLayout::fit(set.dimensions(), config.template_size)?;

    let size = config.template_size;
    let Some(mut pixmap) = Pixmap::new(size.width, size.height) else {
        return Err(RenderError::InvalidConfig(format!(
            "cannot allocate a {size} canvas"
        )));
    };
    pixmap.fill(Color::BLACK);

    for minutia in set.minutiae() {
        draw_minutia(&mut pixmap, &layout, minutia, config);
    }

    let template = pixmap_to_rgb(&pixmap);
    Ok(gaussian_blur_rgb(&template, config.soften_sigma))
}

#[allow(clippy::cast_possible_truncation)]
fn draw_minutia(pixmap: &mut Pixmap, layout: &TemplateLayout, minutia: &Minutia, config: &RenderConfig) {
    let (cx, cy) = layout.project(minutia.x, minutia.y);
    let [r, g, b] = kind_rgb(minutia.kind);
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, 255);
    paint.anti_alias = true;

    let radius = config.marker_radius;
    if radius > 0.0 {
        match minutia.kind {
            MinutiaKind::Bifurcation => {
                if let Some(circle) = PathBuilder::from_circle(cx as f32, cy as f32, radius as f32) {
                    pixmap.fill_path(&circle, &paint, FillRule::Winding, Transform::identity(), None);
                }
            }
            MinutiaKind::RidgeEnding => {
                let side = (2.0 * radius) as f32;
                if let Some(square) =
                    Rect::from_xywh((cx - radius) as f32, (cy - radius) as f32, side, side)
                {
                    pixmap.fill_rect(square, &paint, Transform::identity(), None);
                }
            }
        }
    }

    let length = config.orientation_line_length;
    if length > 0.0 && config.line_width > 0.0 {
        let (sin, cos) = minutia.angle.sin_cos();
        let mut pb = PathBuilder::new();
        pb.move_to(cx as f32, cy as f32);
        pb.line_to(length.mul_add(cos, cx) as f32, (-length).mul_add(sin, cy) as f32);
        if let Some(path) = pb.finish() {
            let stroke = Stroke {
                width: config.line_width,
                ..Stroke::default()
            };
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }
}

/// Drop the alpha channel. The canvas starts opaque and every paint is
/// opaque, so premultiplied and straight colour agree.
fn pixmap_to_rgb(pixmap: &Pixmap) -> Template {
    let data = pixmap.data();
    let width = pixmap.width();
    Template::from_fn(width, pixmap.height(), |x, y| {
        let off = ((y * width + x) * 4) as usize;
        image::Rgb([data[off], data[off + 1], data[off + 2]])
    })
}
