//! Minutiae text format.
//!
//! The extraction tool writes one minutia per line:
//!
//! ```text
//! x y angle type quality
//! ```
//!
//! whitespace separated, with `type` 1 for a ridge ending and 2 for a
//! bifurcation. Persisted minutiae files use the same line format,
//! preceded by a `# size <width> <height>` header recording the source
//! image dimensions. Any other `#` line is a comment.
//!
//! Parsing is lenient per line: a malformed line is skipped and counted,
//! never fatal for the whole file.

use std::fmt::Write as _;

use crate::types::{Dimensions, Minutia, MinutiaKind, MinutiaeSet};

const SIZE_HEADER: &str = "size";

/// Result of parsing minutiae text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMinutiae {
    /// Well-formed minutiae, in line order.
    pub minutiae: Vec<Minutia>,
    /// Number of non-blank, non-comment lines that were skipped.
    pub malformed_lines: usize,
    /// Source dimensions from a `# size` header, if present.
    pub dimensions: Option<Dimensions>,
}

impl ParsedMinutiae {
    /// Build a [`MinutiaeSet`], taking dimensions from the header when
    /// present and from `fallback` otherwise.
    #[must_use]
    pub fn into_set(self, fallback: Dimensions) -> MinutiaeSet {
        MinutiaeSet::new(self.minutiae, self.dimensions.unwrap_or(fallback))
    }
}

/// Parse minutiae text from the extraction tool or a persisted file.
#[must_use]
pub fn parse_minutiae(text: &str) -> ParsedMinutiae {
    let mut parsed = ParsedMinutiae {
        minutiae: Vec::new(),
        malformed_lines: 0,
        dimensions: None,
    };

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            if let Some(dims) = parse_size_header(comment) {
                parsed.dimensions = Some(dims);
            }
            continue;
        }
        match parse_line(line) {
            Some(minutia) => parsed.minutiae.push(minutia),
            None => parsed.malformed_lines += 1,
        }
    }

    parsed
}

fn parse_size_header(comment: &str) -> Option<Dimensions> {
    let mut fields = comment.split_whitespace();
    if fields.next()? != SIZE_HEADER {
        return None;
    }
    let width = fields.next()?.parse().ok()?;
    let height = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some(Dimensions::new(width, height))
}

fn parse_line(line: &str) -> Option<Minutia> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [x, y, angle, code, quality] = fields.as_slice() else {
        return None;
    };

    let x: f64 = x.parse().ok()?;
    let y: f64 = y.parse().ok()?;
    let angle: f64 = angle.parse().ok()?;
    let kind = MinutiaKind::from_code(code.parse().ok()?)?;
    let quality: f64 = quality.parse().ok()?;

    if !(x.is_finite() && y.is_finite() && angle.is_finite()) {
        return None;
    }
    if !(0.0..=1.0).contains(&quality) {
        return None;
    }
    Some(Minutia::new(x, y, angle, kind, quality))
}

/// Serialize a set to the persisted text format, header first.
///
/// [`parse_minutiae`] reads the result back to an equal set.
#[must_use]
pub fn format_minutiae(set: &MinutiaeSet) -> String {
    let dims = set.dimensions();
    let mut out = format!("# {SIZE_HEADER} {} {}\n", dims.width, dims.height);
    for m in set.minutiae() {
        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "{} {} {} {} {}",
            m.x,
            m.y,
            m.angle,
            m.kind.code(),
            m.quality
        );
    }
    out
}
