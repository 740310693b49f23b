use std::path::Path;

use ridgeprint_pipeline::{Dimensions, MinutiaeSet};
use ridgeprint_tools::{FingerprintTools, ToolError};

/// Minutiae for one image plus what was discarded on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub set: MinutiaeSet,
    /// Tool output lines that could not be parsed.
    pub malformed_lines: usize,
    /// Minutiae dropped for falling below the quality floor.
    pub dropped: usize,
}

/// Runs the minutiae tool and applies the per-minutia quality floor.
#[derive(Debug)]
pub struct MinutiaeExtractor<'a, T: ?Sized> {
    tools: &'a T,
    min_quality: f64,
}

impl<'a, T: FingerprintTools + ?Sized> MinutiaeExtractor<'a, T> {
    #[must_use]
    pub const fn new(tools: &'a T, min_quality: f64) -> Self {
        Self { tools, min_quality }
    }

    /// Extract minutiae from `image`, recording `dimensions` as the
    /// source size. An empty result is valid.
    ///
    /// # Errors
    ///
    /// Propagates the tool's [`ToolError`].
    pub fn extract(&self, image: &Path, dimensions: Dimensions) -> Result<Extraction, ToolError> {
        let parsed = self.tools.minutiae(image)?;
        let malformed_lines = parsed.malformed_lines;
        let raw = MinutiaeSet::new(parsed.minutiae, dimensions);
        let before = raw.len();
        let set = raw.retain_quality(self.min_quality);
        Ok(Extraction {
            dropped: before - set.len(),
            set,
            malformed_lines,
        })
    }
}
