use std::path::PathBuf;

use ridgeprint_tools::ToolError;

/// Errors that abort a whole run before any image is processed.
///
/// Per-image problems never surface here; they become failed
/// [`StageResult`](crate::StageResult)s.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// A tool the run needs failed startup validation.
    #[error(transparent)]
    ToolNotAvailable(#[from] ToolError),

    /// The input directory could not be read.
    #[error("cannot read input directory {}: {source}", path.display())]
    InputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An output directory could not be created.
    #[error("cannot create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
}
