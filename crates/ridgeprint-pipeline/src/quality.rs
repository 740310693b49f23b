//! Quality filter decision.
//!
//! Scores come from the external quality tool on a 1 (best) to 5 (worst)
//! scale. An image is accepted when its score is *at most* the threshold.

use serde::{Deserialize, Serialize};

use crate::types::QualityScore;

/// Default acceptance threshold: scores 1, 2 and 3 pass.
pub const DEFAULT_THRESHOLD: u8 = 3;

/// Outcome of judging one quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityVerdict {
    /// Whether the image may continue through the pipeline.
    pub accepted: bool,
    /// The score the decision was based on.
    pub score: QualityScore,
    /// The threshold in effect.
    pub threshold: u8,
}

/// Accept `score` iff `score <= threshold`.
#[must_use]
pub const fn judge(score: QualityScore, threshold: u8) -> QualityVerdict {
    QualityVerdict {
        accepted: score.value() <= threshold,
        score,
        threshold,
    }
}
