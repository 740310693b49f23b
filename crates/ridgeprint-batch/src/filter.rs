use std::path::Path;

use ridgeprint_pipeline::{QualityVerdict, judge};
use ridgeprint_tools::{FingerprintTools, ToolError};

/// Scores images with the quality tool and applies the threshold.
#[derive(Debug)]
pub struct QualityFilter<'a, T: ?Sized> {
    tools: &'a T,
    threshold: u8,
}

impl<'a, T: FingerprintTools + ?Sized> QualityFilter<'a, T> {
    #[must_use]
    pub const fn new(tools: &'a T, threshold: u8) -> Self {
        Self { tools, threshold }
    }

    /// Score `image` and decide whether it may continue.
    ///
    /// The image file is only read by the tool, never modified.
    ///
    /// # Errors
    ///
    /// Propagates the tool's [`ToolError`].
    pub fn filter(&self, image: &Path) -> Result<QualityVerdict, ToolError> {
        let score = self.tools.quality(image)?;
        Ok(judge(score, self.threshold))
    }
}
