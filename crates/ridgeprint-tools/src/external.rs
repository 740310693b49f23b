//! The real subprocess-backed [`FingerprintTools`] implementation.

use std::ffi::OsString;
use std::path::Path;

use ridgeprint_pipeline::{ParsedMinutiae, QualityScore, parse_minutiae};
use tracing::{debug, warn};

use crate::FingerprintTools;
use crate::config::{ToolConfig, ToolKind};
use crate::error::ToolError;
use crate::process::{Captured, RunOutcome, run_with_timeout};
use crate::quality::parse_quality_output;

/// File stem the minutiae tool is told to write under; it appends `.min`.
const OUTPUT_STEM: &str = "out";

/// Runs the configured external executables.
#[derive(Debug, Clone, Default)]
pub struct ExternalTools {
    config: ToolConfig,
}

impl ExternalTools {
    #[must_use]
    pub const fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    /// Run `tool` and return its output, mapping timeouts, spawn failures
    /// and non-zero exits into [`ToolError`].
    fn invoke(&self, tool: ToolKind, image: &str, args: Vec<OsString>) -> Result<Captured, ToolError> {
        let path = self.config.path(tool);
        let timeout = self.config.timeout();
        debug!(%tool, image, path = %path.display(), "running tool");

        let outcome = run_with_timeout(path, args, timeout).map_err(|source| ToolError::Io {
            tool,
            image: image.to_string(),
            source,
        })?;
        let captured = match outcome {
            RunOutcome::Finished(captured) => captured,
            RunOutcome::TimedOut => {
                return Err(ToolError::Timeout {
                    tool,
                    image: image.to_string(),
                    timeout,
                });
            }
        };

        let stderr = captured.stderr.trim();
        if !stderr.is_empty() {
            warn!(%tool, image, stderr, "tool wrote to stderr");
        }
        if !captured.status.success() {
            return Err(ToolError::Execution {
                tool,
                image: image.to_string(),
                status: captured.status,
                stderr: stderr.to_string(),
            });
        }
        Ok(captured)
    }
}

impl FingerprintTools for ExternalTools {
    fn validate(&self, tool: ToolKind) -> Result<(), ToolError> {
        let path = self.config.path(tool);
        check_executable(path).map_err(|reason| ToolError::NotAvailable {
            tool,
            path: path.to_path_buf(),
            reason,
        })
    }

    fn quality(&self, image: &Path) -> Result<QualityScore, ToolError> {
        let id = image_id(image);
        let captured = self.invoke(ToolKind::Quality, &id, vec![image.as_os_str().to_owned()])?;
        parse_quality_output(&captured.stdout, captured.status.code().unwrap_or_default()).map_err(
            |reason| ToolError::Output {
                tool: ToolKind::Quality,
                image: id,
                reason,
            },
        )
    }

    fn minutiae(&self, image: &Path) -> Result<ParsedMinutiae, ToolError> {
        let tool = ToolKind::Minutiae;
        let id = image_id(image);
        let io_err = |source| ToolError::Io {
            tool,
            image: id.clone(),
            source,
        };

        // Removed on drop, on every return path below.
        let scratch = tempfile::Builder::new()
            .prefix("ridgeprint-min")
            .tempdir()
            .map_err(io_err)?;
        let prefix = scratch.path().join(OUTPUT_STEM);

        let mut args: Vec<OsString> = self.config.minutiae_args.iter().map(OsString::from).collect();
        args.push(image.as_os_str().to_owned());
        args.push(prefix.as_os_str().to_owned());
        self.invoke(tool, &id, args)?;

        let min_path = prefix.with_extension("min");
        let text = match std::fs::read_to_string(&min_path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ToolError::Output {
                    tool,
                    image: id,
                    reason: format!("no {OUTPUT_STEM}.min written"),
                });
            }
            Err(e) => return Err(io_err(e)),
        };

        let parsed = parse_minutiae(&text);
        if parsed.malformed_lines > 0 {
            warn!(
                image = %id,
                malformed = parsed.malformed_lines,
                kept = parsed.minutiae.len(),
                "skipped malformed minutiae lines"
            );
        }
        Ok(parsed)
    }
}

/// Short identifier for log lines and errors: the file name when there is
/// one, the whole path otherwise.
fn image_id(image: &Path) -> String {
    image.file_name().map_or_else(
        || image.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

fn check_executable(path: &Path) -> Result<(), String> {
    let metadata = std::fs::metadata(path).map_err(|e| e.to_string())?;
    if !metadata.is_file() {
        return Err("not a regular file".to_string());
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err("not executable".to_string());
        }
    }
    Ok(())
}
