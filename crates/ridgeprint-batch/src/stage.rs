//! Stages, per-image state, and per-stage results.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// One step of the preprocessing pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    QualityFilter,
    Enhancement,
    MinutiaeExtraction,
    TemplateRendering,
}

impl Stage {
    /// Stable name used in logs and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::QualityFilter => "quality_filter",
            Self::Enhancement => "enhancement",
            Self::MinutiaeExtraction => "minutiae_extraction",
            Self::TemplateRendering => "template_rendering",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a stage ended for one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageStatus {
    Success,
    Failed,
    Skipped,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Skipped => "SKIPPED",
        })
    }
}

/// The record of one stage run on one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    /// Image identifier (file stem).
    pub image_id: String,
    pub stage: Stage,
    pub status: StageStatus,
    /// Human-readable outcome: counts on success, the reason otherwise.
    pub detail: String,
    /// Wall-clock time spent in the stage (seconds when serialized).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

/// Where an image is in the pipeline.
///
/// ```text
/// Raw → QualityChecked → Enhanced → MinutiaeExtracted → TemplateRendered
///     ↘ Rejected
/// any → Failed { stage }
/// ```
///
/// `Rejected`, `Failed` and the state matching the requested final stage
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum ImageState {
    Raw,
    QualityChecked,
    /// Score worse than the threshold.
    Rejected {
        score: u8,
    },
    /// A processed image was written, enhanced or not.
    Enhanced,
    MinutiaeExtracted,
    TemplateRendered,
    Failed {
        stage: Stage,
    },
}

impl ImageState {
    /// The state an image is in once `stage` has completed for it.
    #[must_use]
    pub const fn after(stage: Stage) -> Self {
        match stage {
            Stage::QualityFilter => Self::QualityChecked,
            Stage::Enhancement => Self::Enhanced,
            Stage::MinutiaeExtraction => Self::MinutiaeExtracted,
            Stage::TemplateRendering => Self::TemplateRendered,
        }
    }

    /// Whether this state is the one `final_stage` leads to.
    #[must_use]
    pub fn reached(self, final_stage: Stage) -> bool {
        self == Self::after(final_stage)
    }
}
