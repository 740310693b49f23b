use ridgeprint_pipeline::{PreprocessConfig, RenderConfig, quality};
use serde::{Deserialize, Serialize};

/// Settings for a batch run. Tool locations live in
/// [`ToolConfig`](ridgeprint_tools::ToolConfig).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Highest quality score (1 best, 5 worst) that is accepted.
    pub nfiq_threshold: u8,
    /// Crop and enhancement settings.
    pub preprocess: PreprocessConfig,
    /// Template rendering settings.
    pub render: RenderConfig,
    /// Sets with fewer minutiae are not rendered. Zero renders every set.
    pub min_minutiae_count: usize,
    /// Minutiae with a lower tool-reported quality are dropped after
    /// extraction.
    pub min_minutia_quality: f64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            nfiq_threshold: quality::DEFAULT_THRESHOLD,
            preprocess: PreprocessConfig::default(),
            render: RenderConfig::default(),
            min_minutiae_count: 0,
            min_minutia_quality: 0.0,
        }
    }
}
