use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The two external tools the pipeline drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Scores an image 1 (best) to 5 (worst).
    Quality,
    /// Writes a `.min` file of detected minutiae.
    Minutiae,
}

impl ToolKind {
    /// Every tool kind, in pipeline order.
    pub const ALL: [Self; 2] = [Self::Quality, Self::Minutiae];
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Quality => "quality",
            Self::Minutiae => "minutiae",
        })
    }
}

/// Where the external tools live and how long they may run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Quality tool executable. Invoked as `<quality_path> <image>`.
    pub quality_path: PathBuf,
    /// Minutiae tool executable. Invoked as
    /// `<minutiae_path> [minutiae_args...] <image> <output_prefix>`.
    pub minutiae_path: PathBuf,
    /// Extra leading arguments for the minutiae tool.
    pub minutiae_args: Vec<String>,
    /// Per-invocation timeout in seconds.
    pub timeout_secs: u64,
}

impl ToolConfig {
    /// Default quality tool location.
    pub const DEFAULT_QUALITY_PATH: &str = "./external_tools/nfiq";
    /// Default minutiae tool location.
    pub const DEFAULT_MINUTIAE_PATH: &str = "./external_tools/mindtct";
    /// Default per-invocation timeout.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
    /// Longest per-invocation timeout accepted from configuration (one day).
    pub const MAX_TIMEOUT_SECS: u64 = 86_400;

    /// The per-invocation timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Configured executable for `tool`.
    #[must_use]
    pub fn path(&self, tool: ToolKind) -> &Path {
        match tool {
            ToolKind::Quality => &self.quality_path,
            ToolKind::Minutiae => &self.minutiae_path,
        }
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            quality_path: PathBuf::from(Self::DEFAULT_QUALITY_PATH),
            minutiae_path: PathBuf::from(Self::DEFAULT_MINUTIAE_PATH),
            minutiae_args: Vec::new(),
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
        }
    }
}
