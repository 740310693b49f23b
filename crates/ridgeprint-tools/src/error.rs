use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use crate::config::ToolKind;

/// Errors from invoking an external fingerprint tool.
///
/// Every per-image variant names the tool and the image it was run on,
/// so the orchestrator can turn it into a stage result without extra
/// context.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The executable is missing, not a file, or not executable.
    #[error("{tool} tool not available at {}: {reason}", path.display())]
    NotAvailable {
        /// Which tool.
        tool: ToolKind,
        /// Configured executable path.
        path: PathBuf,
        /// What the check found.
        reason: String,
    },

    /// The tool ran but exited unsuccessfully.
    #[error("{tool} tool failed on {image} ({status}): {stderr}")]
    Execution {
        /// Which tool.
        tool: ToolKind,
        /// Image identifier.
        image: String,
        /// Exit status of the child process.
        status: ExitStatus,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// The tool did not finish within the configured timeout and was
    /// killed.
    #[error("{tool} tool timed out on {image} after {}s", timeout.as_secs_f64())]
    Timeout {
        /// Which tool.
        tool: ToolKind,
        /// Image identifier.
        image: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The tool exited successfully but its output could not be used.
    #[error("{tool} tool produced unusable output for {image}: {reason}")]
    Output {
        /// Which tool.
        tool: ToolKind,
        /// Image identifier.
        image: String,
        /// What was wrong with the output.
        reason: String,
    },

    /// Spawning the tool or handling its temporary files failed.
    #[error("{tool} tool I/O error on {image}: {source}")]
    Io {
        /// Which tool.
        tool: ToolKind,
        /// Image identifier.
        image: String,
        /// Underlying error.
        source: std::io::Error,
    },
}

impl ToolError {
    /// The tool this error came from.
    #[must_use]
    pub const fn tool(&self) -> ToolKind {
        match self {
            Self::NotAvailable { tool, .. }
            | Self::Execution { tool, .. }
            | Self::Timeout { tool, .. }
            | Self::Output { tool, .. }
            | Self::Io { tool, .. } => *tool,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_display_names_tool_and_image() {
        let err = ToolError::Timeout {
            tool: ToolKind::Minutiae,
            image: "f001.png".to_string(),
            timeout: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "minutiae tool timed out on f001.png after 30s");
        assert_eq!(err.tool(), ToolKind::Minutiae);
    }

    #[test]
    fn not_available_display_includes_path() {
        let err = ToolError::NotAvailable {
            tool: ToolKind::Quality,
            path: PathBuf::from("/opt/nfiq"),
            reason: "not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "quality tool not available at /opt/nfiq: not found"
        );
    }
}
