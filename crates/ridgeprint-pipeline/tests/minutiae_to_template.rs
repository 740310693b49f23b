//! Integration test: parse extraction-tool output and render it into a template.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use ridgeprint_pipeline::{Dimensions, MinutiaKind, RenderConfig, parse_minutiae, render};

const TOOL_OUTPUT: &str = "12.5 30.0 1.57 1 0.9\n200.0 10.0 0.0 2 0.5\n";

#[test]
fn tool_output_renders_one_marker_per_minutia() {
    let parsed = parse_minutiae(TOOL_OUTPUT);
    assert_eq!(parsed.malformed_lines, 0);
    let kinds: Vec<_> = parsed.minutiae.iter().map(|m| m.kind).collect();
    assert_eq!(kinds, [MinutiaKind::RidgeEnding, MinutiaKind::Bifurcation]);

    let set = parsed.into_set(Dimensions::new(256, 256));
    let template = render(&set, &RenderConfig::default()).expect("render should succeed");
    assert_eq!(template.dimensions(), (256, 256));

    // Same-size source: positions map one to one.
    assert_eq!(template.get_pixel(12, 30).0, [0, 255, 0]);
    assert_eq!(template.get_pixel(200, 10).0, [255, 0, 0]);
}

#[test]
fn in_frame_minutiae_land_inside_any_template() {
    let source = Dimensions::new(333, 517);
    let text: String = (0..50)
        .map(|i| {
            let x = f64::from(i * 37 % 333);
            let y = f64::from(i * 91 % 517);
            format!("{x} {y} {} {} 0.8\n", f64::from(i) * 0.3, 1 + i % 2)
        })
        .collect();
    let set = parse_minutiae(&text).into_set(source);
    assert_eq!(set.len(), 50);

    for (tw, th) in [(256, 256), (128, 300), (500, 64)] {
        let config = RenderConfig {
            template_size: Dimensions::new(tw, th),
            orientation_line_length: 0.0,
            marker_radius: 0.5,
            ..RenderConfig::default()
        };
        let template = render(&set, &config).unwrap();
        assert_eq!(template.dimensions(), (tw, th));
        let lit = template.pixels().filter(|p| p.0 != [0, 0, 0]).count();
        assert!(lit > 0, "{tw}x{th}: no minutiae visible");
    }
}

#[test]
fn render_is_byte_identical_across_runs() {
    let set = parse_minutiae(TOOL_OUTPUT).into_set(Dimensions::new(640, 480));
    let config = RenderConfig {
        soften_sigma: 1.5,
        ..RenderConfig::default()
    };
    let first = render(&set, &config).unwrap();
    for _ in 0..3 {
        assert_eq!(render(&set, &config).unwrap().as_raw(), first.as_raw());
    }
}
