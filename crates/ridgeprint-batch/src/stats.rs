//! Run statistics.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::stage::{ImageState, Stage, StageResult, StageStatus};

/// Counts for one stage across a run.
///
/// `attempted` counts runs that did work (`succeeded + failed`); skipped
/// runs are tallied separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageStats {
    pub stage: Stage,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// `succeeded / attempted`, or 0.0 when nothing was attempted.
    pub success_rate: f64,
}

impl StageStats {
    const fn new(stage: Stage) -> Self {
        Self {
            stage,
            attempted: 0,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            success_rate: 0.0,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn count(&mut self, status: StageStatus) {
        match status {
            StageStatus::Success => self.succeeded += 1,
            StageStatus::Failed => self.failed += 1,
            StageStatus::Skipped => self.skipped += 1,
        }
        self.attempted = self.succeeded + self.failed;
        self.success_rate = if self.attempted == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.attempted as f64
        };
    }
}

/// Statistics for one orchestrator run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStats {
    /// The stage the run was asked to reach.
    pub final_stage: Stage,
    /// Images discovered in the input directory.
    pub images: usize,
    /// Images that reached the final stage.
    pub completed: usize,
    /// Images rejected by the quality filter.
    pub rejected: usize,
    /// `completed / images`, or 0.0 for an empty batch.
    pub overall_success_rate: f64,
    /// Per-stage counts, in the order stages were first seen.
    pub stages: Vec<StageStats>,
    /// Every stage result, in execution order.
    pub results: Vec<StageResult>,
}

impl PipelineStats {
    #[must_use]
    pub const fn new(final_stage: Stage) -> Self {
        Self {
            final_stage,
            images: 0,
            completed: 0,
            rejected: 0,
            overall_success_rate: 0.0,
            stages: Vec::new(),
            results: Vec::new(),
        }
    }

    /// Add one stage result.
    pub fn record(&mut self, result: StageResult) {
        let index = match self.stages.iter().position(|s| s.stage == result.stage) {
            Some(index) => index,
            None => {
                self.stages.push(StageStats::new(result.stage));
                self.stages.len() - 1
            }
        };
        self.stages[index].count(result.status);
        self.results.push(result);
    }

    /// Account for one image that has finished its run in `state`.
    #[allow(clippy::cast_precision_loss)]
    pub fn record_image(&mut self, state: ImageState) {
        self.images += 1;
        if state.reached(self.final_stage) {
            self.completed += 1;
        }
        if matches!(state, ImageState::Rejected { .. }) {
            self.rejected += 1;
        }
        self.overall_success_rate = self.completed as f64 / self.images as f64;
    }

    /// Counts for `stage`, if it ran at all.
    #[must_use]
    pub fn stage(&self, stage: Stage) -> Option<&StageStats> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    /// Human-readable summary table.
    #[must_use]
    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<20} {:>9} {:>9} {:>9} {:>9} {:>8}",
            "stage", "attempted", "succeeded", "failed", "skipped", "rate"
        );
        for s in &self.stages {
            let _ = writeln!(
                out,
                "{:<20} {:>9} {:>9} {:>9} {:>9} {:>7.1}%",
                s.stage.name(),
                s.attempted,
                s.succeeded,
                s.failed,
                s.skipped,
                s.success_rate * 100.0
            );
        }
        let _ = writeln!(
            out,
            "\n{} images, {} reached {}, {} rejected ({:.1}% overall)",
            self.images,
            self.completed,
            self.final_stage,
            self.rejected,
            self.overall_success_rate * 100.0
        );
        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn result(stage: Stage, status: StageStatus) -> StageResult {
        StageResult {
            image_id: "img".to_string(),
            stage,
            status,
            detail: String::new(),
            duration: Duration::ZERO,
        }
    }

    #[test]
    fn empty_batch_has_zero_rate() {
        let stats = PipelineStats::new(Stage::TemplateRendering);
        assert_eq!(stats.images, 0);
        assert!(stats.overall_success_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn attempted_is_succeeded_plus_failed() {
        let mut stats = PipelineStats::new(Stage::Enhancement);
        stats.record(result(Stage::Enhancement, StageStatus::Success));
        stats.record(result(Stage::Enhancement, StageStatus::Failed));
        stats.record(result(Stage::Enhancement, StageStatus::Skipped));
        stats.record(result(Stage::Enhancement, StageStatus::Success));

        let s = stats.stage(Stage::Enhancement).unwrap();
        assert_eq!(s.attempted, 3);
        assert_eq!(s.succeeded, 2);
        assert_eq!(s.failed, 1);
        assert_eq!(s.skipped, 1);
        assert!((s.success_rate - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(stats.results.len(), 4);
    }

    #[test]
    fn stages_keep_first_seen_order() {
        let mut stats = PipelineStats::new(Stage::TemplateRendering);
        stats.record(result(Stage::QualityFilter, StageStatus::Success));
        stats.record(result(Stage::Enhancement, StageStatus::Success));
        stats.record(result(Stage::QualityFilter, StageStatus::Failed));
        let order: Vec<_> = stats.stages.iter().map(|s| s.stage).collect();
        assert_eq!(order, [Stage::QualityFilter, Stage::Enhancement]);
    }

    #[test]
    fn overall_rate_counts_final_state_only() {
        let mut stats = PipelineStats::new(Stage::TemplateRendering);
        stats.record_image(ImageState::TemplateRendered);
        stats.record_image(ImageState::Rejected { score: 5 });
        stats.record_image(ImageState::Failed {
            stage: Stage::Enhancement,
        });
        stats.record_image(ImageState::MinutiaeExtracted);
        assert_eq!(stats.images, 4);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.rejected, 1);
        assert!((stats.overall_success_rate - 0.25).abs() < 1e-12);
    }

    #[test]
    fn report_lists_every_stage() {
        let mut stats = PipelineStats::new(Stage::MinutiaeExtraction);
        stats.record(result(Stage::Enhancement, StageStatus::Success));
        stats.record(result(Stage::MinutiaeExtraction, StageStatus::Failed));
        stats.record_image(ImageState::Failed {
            stage: Stage::MinutiaeExtraction,
        });
        let report = stats.report();
        assert!(report.contains("enhancement"));
        assert!(report.contains("minutiae_extraction"));
        assert!(report.contains("1 images, 0 reached minutiae_extraction, 0 rejected"));
    }

    #[test]
    fn stats_serialize_to_json() {
        let mut stats = PipelineStats::new(Stage::Enhancement);
        stats.record(result(Stage::Enhancement, StageStatus::Success));
        stats.record_image(ImageState::Enhanced);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["final_stage"], "enhancement");
        assert_eq!(json["stages"][0]["succeeded"], 1);
        assert_eq!(json["completed"], 1);
    }
}
