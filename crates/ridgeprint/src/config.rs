//! Configuration file support.
//!
//! Settings are layered, lowest priority first:
//!
//! 1. built-in defaults;
//! 2. a TOML file, either `--config <FILE>` or `ridgeprint.toml` searched
//!    upwards from the working directory;
//! 3. command line flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail, ensure};
use ridgeprint_batch::BatchConfig;
use ridgeprint_pipeline::{Dimensions, PreprocessConfig, QualityScore, RenderConfig};
use ridgeprint_tools::ToolConfig;
use serde::Deserialize;
use tracing::{debug, info};

/// File name searched for when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "ridgeprint.toml";

/// Contents of a configuration file. Every field is optional.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub run: RunSection,
    pub tools: ToolsSection,
    pub batch: BatchSection,
    /// Replaces the default crop and enhancement settings when present.
    pub preprocess: Option<PreprocessConfig>,
    /// Replaces the default render settings when present.
    pub render: Option<RenderConfig>,
}

/// Stage switches and template size.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct RunSection {
    pub filter_quality: Option<bool>,
    pub enhance: Option<bool>,
    pub template_size: Option<Dimensions>,
}

/// External tool locations.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    pub quality_path: Option<PathBuf>,
    pub minutiae_path: Option<PathBuf>,
    pub minutiae_args: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
}

/// Acceptance thresholds.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct BatchSection {
    pub nfiq_threshold: Option<u8>,
    pub min_minutiae_count: Option<usize>,
    pub min_minutia_quality: Option<f64>,
}

/// Values given on the command line. `None` defers to the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub filter_quality: Option<bool>,
    pub enhance: Option<bool>,
    pub template_size: Option<Dimensions>,
    pub quality_path: Option<PathBuf>,
    pub minutiae_path: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub nfiq_threshold: Option<u8>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub tools: ToolConfig,
    pub batch: BatchConfig,
    pub filter_quality: bool,
    pub enhance: bool,
    pub template_size: Dimensions,
}

impl FileConfig {
    /// Load `explicit` if given, else the nearest `ridgeprint.toml`, else
    /// nothing.
    ///
    /// # Errors
    ///
    /// Fails if a selected file cannot be read or parsed. An explicit
    /// path that does not exist is an error; a missing searched-for file
    /// is not.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let cwd = std::env::current_dir().context("cannot determine working directory")?;
                match find_config_in_parents(&cwd) {
                    Some(path) => path,
                    None => {
                        debug!("no {CONFIG_FILE_NAME} found, using defaults");
                        return Ok(Self::default());
                    }
                }
            }
        };
        info!("loading config: {}", path.display());
        load_file(&path)
    }

    /// Layer `overrides` over this file and the defaults, then validate.
    ///
    /// # Errors
    ///
    /// Fails if a resolved value is out of range.
    pub fn resolve(self, overrides: Overrides) -> anyhow::Result<Settings> {
        let tool_defaults = ToolConfig::default();
        let tools = ToolConfig {
            quality_path: overrides
                .quality_path
                .or(self.tools.quality_path)
                .unwrap_or(tool_defaults.quality_path),
            minutiae_path: overrides
                .minutiae_path
                .or(self.tools.minutiae_path)
                .unwrap_or(tool_defaults.minutiae_path),
            minutiae_args: self.tools.minutiae_args.unwrap_or(tool_defaults.minutiae_args),
            timeout_secs: overrides
                .timeout_secs
                .or(self.tools.timeout_secs)
                .unwrap_or(tool_defaults.timeout_secs),
        };

        let batch_defaults = BatchConfig::default();
        let mut render = self.render.unwrap_or(batch_defaults.render);
        let template_size = overrides
            .template_size
            .or(self.run.template_size)
            .unwrap_or(render.template_size);
        render.template_size = template_size;
        let batch = BatchConfig {
            nfiq_threshold: overrides
                .nfiq_threshold
                .or(self.batch.nfiq_threshold)
                .unwrap_or(batch_defaults.nfiq_threshold),
            preprocess: self.preprocess.unwrap_or(batch_defaults.preprocess),
            render,
            min_minutiae_count: self
                .batch
                .min_minutiae_count
                .unwrap_or(batch_defaults.min_minutiae_count),
            min_minutia_quality: self
                .batch
                .min_minutia_quality
                .unwrap_or(batch_defaults.min_minutia_quality),
        };

        let settings = Settings {
            tools,
            batch,
            filter_quality: overrides
                .filter_quality
                .or(self.run.filter_quality)
                .unwrap_or(true),
            enhance: overrides.enhance.or(self.run.enhance).unwrap_or(true),
            template_size,
        };
        settings.validate()?;
        Ok(settings)
    }
}

impl Settings {
    fn validate(&self) -> anyhow::Result<()> {
        let threshold = self.batch.nfiq_threshold;
        ensure!(
            (QualityScore::BEST..=QualityScore::WORST).contains(&threshold),
            "nfiq_threshold must be {}-{}, got {threshold}",
            QualityScore::BEST,
            QualityScore::WORST
        );
        let floor = self.batch.min_minutia_quality;
        ensure!(
            (0.0..=1.0).contains(&floor),
            "min_minutia_quality must be 0.0-1.0, got {floor}"
        );
        let timeout = self.tools.timeout_secs;
        if timeout == 0 || timeout > ToolConfig::MAX_TIMEOUT_SECS {
            bail!(
                "timeout_secs must be 1-{}, got {timeout}",
                ToolConfig::MAX_TIMEOUT_SECS
            );
        }
        self.batch.render.validate()?;
        Ok(())
    }
}

/// Parse `WxH` or `W,H` into dimensions.
///
/// # Errors
///
/// Returns a message suitable for clap when the text is not two positive
/// integers.
pub fn parse_dimensions(text: &str) -> Result<Dimensions, String> {
    let (w, h) = text
        .split_once(['x', 'X', ','])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{text}'"))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<u32>()
            .ok()
            .filter(|&v| v > 0)
            .ok_or_else(|| format!("'{s}' is not a positive integer"))
    };
    Ok(Dimensions::new(parse(w)?, parse(h)?))
}

/// Search for `ridgeprint.toml` in `start` and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        current = dir.parent();
    }
    None
}

fn load_file(path: &Path) -> anyhow::Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("invalid config file {}", path.display()))
}
