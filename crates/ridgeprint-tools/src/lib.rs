//! ridgeprint-tools: adapter for the external fingerprint tools.
//!
//! Two command-line tools do the fingerprint-specific analysis:
//!
//! - the **quality** tool prints a single score, 1 (best) to 5 (worst);
//! - the **minutiae** tool writes `<prefix>.min`, one
//!   `x y angle type quality` line per detected minutia.
//!
//! [`ExternalTools`] runs them as child processes with a timeout, captures
//! their output through scoped temporary files and parses it into
//! `ridgeprint-pipeline` types. The [`FingerprintTools`] trait is the seam
//! the batch orchestrator is written against, so tests can substitute an
//! in-memory double.

mod config;
mod error;
mod external;
mod process;
mod quality;

use std::path::Path;

pub use config::{ToolConfig, ToolKind};
pub use error::ToolError;
pub use external::ExternalTools;
pub use quality::parse_quality_output;
pub use ridgeprint_pipeline::{ParsedMinutiae, QualityScore};

/// Access to the quality and minutiae tools.
pub trait FingerprintTools {
    /// Check that `tool` can be run at all, before any image is processed.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::NotAvailable`] if the tool cannot be invoked.
    fn validate(&self, tool: ToolKind) -> Result<(), ToolError>;

    /// Score `image` with the quality tool.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolError`] if the tool fails, times out, or prints
    /// something other than a single score.
    fn quality(&self, image: &Path) -> Result<QualityScore, ToolError>;

    /// Extract minutiae from `image` with the minutiae tool.
    ///
    /// Malformed output lines are skipped and counted, not fatal.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolError`] if the tool fails, times out, or writes no
    /// output file.
    fn minutiae(&self, image: &Path) -> Result<ParsedMinutiae, ToolError>;
}

impl<T: FingerprintTools + ?Sized> FingerprintTools for &T {
    fn validate(&self, tool: ToolKind) -> Result<(), ToolError> {
        (**self).validate(tool)
    }

    fn quality(&self, image: &Path) -> Result<QualityScore, ToolError> {
        (**self).quality(image)
    }

    fn minutiae(&self, image: &Path) -> Result<ParsedMinutiae, ToolError> {
        (**self).minutiae(image)
    }
}
