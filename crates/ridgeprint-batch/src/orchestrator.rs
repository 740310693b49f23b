//! Directory-level pipeline runs.
//!
//! Each run discovers its inputs, validates the tools it needs, then
//! walks every image through the requested stages one at a time. A stage
//! failure ends that image's run and is recorded; it never aborts the
//! batch.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use image::ExtendedColorType;
use ridgeprint_pipeline::{
    Dimensions, EnhanceError, MinutiaeSet, RenderConfig, RenderError, format_minutiae,
    parse_minutiae, prepare, preprocess, render,
};
use ridgeprint_tools::{FingerprintTools, ToolError, ToolKind};
use tracing::{debug, info, warn};

use crate::config::BatchConfig;
use crate::error::BatchError;
use crate::extract::MinutiaeExtractor;
use crate::filter::QualityFilter;
use crate::output::{
    MINUTIAE_EXTENSION, OutputLayout, SUPPORTED_EXTENSIONS, encode_png, image_id, list_files,
    write_atomic,
};
use crate::stage::{ImageState, Stage, StageResult, StageStatus};
use crate::stats::PipelineStats;

/// Why a stage did not complete for one image.
#[derive(Debug, thiserror::Error)]
enum StageError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("rejected: score {score} exceeds threshold {threshold}")]
    Rejected { score: u8, threshold: u8 },

    #[error(transparent)]
    Enhance(#[from] EnhanceError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("{action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

impl StageError {
    fn io<'a>(action: &'static str, path: &'a Path) -> impl FnOnce(std::io::Error) -> Self + 'a {
        move |source| Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A completed stage: its artifact plus how to record it.
struct Outcome<V> {
    value: V,
    status: StageStatus,
    detail: String,
}

impl<V> Outcome<V> {
    fn success(value: V, detail: impl Into<String>) -> Self {
        Self {
            value,
            status: StageStatus::Success,
            detail: detail.into(),
        }
    }

    /// The stage was bypassed but the image still moves on.
    fn skipped(value: V, detail: impl Into<String>) -> Self {
        Self {
            value,
            status: StageStatus::Skipped,
            detail: detail.into(),
        }
    }
}

/// One image's walk through the stages.
struct ImageRun<'s> {
    id: String,
    state: ImageState,
    stats: &'s mut PipelineStats,
}

impl<'s> ImageRun<'s> {
    fn new(path: &Path, start: ImageState, stats: &'s mut PipelineStats) -> Self {
        Self {
            id: image_id(path),
            state: start,
            stats,
        }
    }

    fn record(&mut self, stage: Stage, status: StageStatus, detail: String, duration: Duration) {
        if status == StageStatus::Failed {
            warn!(image = %self.id, %stage, %detail, "stage failed");
        } else {
            debug!(image = %self.id, %stage, %status, %detail, ?duration, "stage finished");
        }
        self.stats.record(StageResult {
            image_id: self.id.clone(),
            stage,
            status,
            detail,
            duration,
        });
    }

    /// Run `stage`, record its result, and advance the image state on
    /// success. Returns the artifact, or `None` if the image stops here.
    fn attempt<V>(
        &mut self,
        stage: Stage,
        f: impl FnOnce() -> Result<Outcome<V>, StageError>,
    ) -> Option<V> {
        let start = Instant::now();
        let result = f();
        let duration = start.elapsed();
        match result {
            Ok(outcome) => {
                self.record(stage, outcome.status, outcome.detail, duration);
                self.state = ImageState::after(stage);
                Some(outcome.value)
            }
            Err(e) => {
                self.fail(stage, &e, duration);
                None
            }
        }
    }

    fn fail(&mut self, stage: Stage, error: &StageError, duration: Duration) {
        self.state = match error {
            StageError::Rejected { score, .. } => ImageState::Rejected { score: *score },
            _ => ImageState::Failed { stage },
        };
        self.record(stage, StageStatus::Failed, error.to_string(), duration);
    }

    /// Record `stage` as skipped without advancing the image.
    fn skip(&mut self, stage: Stage, detail: String) {
        self.record(stage, StageStatus::Skipped, detail, Duration::ZERO);
    }

    fn finish(self) {
        debug!(image = %self.id, state = ?self.state, "image finished");
        self.stats.record_image(self.state);
    }
}

/// Drives images through the stages against a set of tools.
#[derive(Debug)]
pub struct Orchestrator<T> {
    tools: T,
    config: BatchConfig,
}

impl<T: FingerprintTools> Orchestrator<T> {
    #[must_use]
    pub const fn new(tools: T, config: BatchConfig) -> Self {
        Self { tools, config }
    }

    // ───────────────────────── Runs ──────────────────────────────────

    /// Quality filter, enhancement, minutiae extraction and template
    /// rendering for every image in `input_dir`.
    ///
    /// Writes `processed/`, `minutiae_txt/` and `templates/` under
    /// `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError`] if a needed tool fails validation, the input
    /// directory cannot be read, or the output directories cannot be
    /// created. Per-image failures are recorded in the returned stats.
    pub fn run_full_pipeline(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        filter_quality: bool,
        enhance: bool,
        template_size: Dimensions,
    ) -> Result<PipelineStats, BatchError> {
        if filter_quality {
            self.tools.validate(ToolKind::Quality)?;
        }
        self.tools.validate(ToolKind::Minutiae)?;
        let images = discover(input_dir, SUPPORTED_EXTENSIONS)?;
        let layout = OutputLayout::new(output_dir);
        for dir in [layout.processed(), layout.minutiae(), layout.templates()] {
            create_dir(&dir)?;
        }
        let render_config = RenderConfig {
            template_size,
            ..self.config.render.clone()
        };

        info!(images = images.len(), input = %input_dir.display(), "starting full pipeline");
        let mut stats = PipelineStats::new(Stage::TemplateRendering);
        for path in &images {
            let mut run = ImageRun::new(path, ImageState::Raw, &mut stats);
            self.full_chain(&mut run, path, &layout, filter_quality, enhance, &render_config);
            run.finish();
        }
        log_summary(&stats);
        Ok(stats)
    }

    /// Quality filter and enhancement only; processed PNGs are written
    /// directly into `output_dir`.
    ///
    /// # Errors
    ///
    /// See [`run_full_pipeline`](Self::run_full_pipeline).
    pub fn run_preprocessing_only(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        filter_quality: bool,
        enhance: bool,
    ) -> Result<PipelineStats, BatchError> {
        if filter_quality {
            self.tools.validate(ToolKind::Quality)?;
        }
        let images = discover(input_dir, SUPPORTED_EXTENSIONS)?;
        create_dir(output_dir)?;

        info!(images = images.len(), input = %input_dir.display(), "starting preprocessing");
        let mut stats = PipelineStats::new(Stage::Enhancement);
        for path in &images {
            let mut run = ImageRun::new(path, ImageState::Raw, &mut stats);
            let out = output_dir.join(format!("{}.png", run.id));
            if self.quality_stage(&mut run, path, filter_quality).is_some() {
                self.enhancement_stage(&mut run, path, enhance, &out);
            }
            run.finish();
        }
        log_summary(&stats);
        Ok(stats)
    }

    /// Minutiae extraction from already processed images; writes
    /// `output_dir/minutiae_txt/<id>.txt`.
    ///
    /// # Errors
    ///
    /// See [`run_full_pipeline`](Self::run_full_pipeline).
    pub fn run_minutiae_extraction_only(
        &self,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<PipelineStats, BatchError> {
        self.tools.validate(ToolKind::Minutiae)?;
        let images = discover(input_dir, SUPPORTED_EXTENSIONS)?;
        let layout = OutputLayout::new(output_dir);
        create_dir(&layout.minutiae())?;

        info!(images = images.len(), input = %input_dir.display(), "starting minutiae extraction");
        let mut stats = PipelineStats::new(Stage::MinutiaeExtraction);
        for path in &images {
            let mut run = ImageRun::new(path, ImageState::Enhanced, &mut stats);
            let out = minutiae_path(&layout, &run.id);
            self.extraction_stage(&mut run, path, None, &out);
            run.finish();
        }
        log_summary(&stats);
        Ok(stats)
    }

    /// Render persisted minutiae files from `minutiae_dir` into
    /// `output_dir/<id>.png`.
    ///
    /// Files without a `# size` header are assumed to come from images of
    /// `template_size`.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError`] if `minutiae_dir` cannot be read or
    /// `output_dir` cannot be created.
    pub fn run_template_creation_only(
        &self,
        minutiae_dir: &Path,
        output_dir: &Path,
        template_size: Dimensions,
    ) -> Result<PipelineStats, BatchError> {
        let files = discover(minutiae_dir, &[MINUTIAE_EXTENSION])?;
        create_dir(output_dir)?;
        let render_config = RenderConfig {
            template_size,
            ..self.config.render.clone()
        };

        info!(files = files.len(), input = %minutiae_dir.display(), "starting template creation");
        let mut stats = PipelineStats::new(Stage::TemplateRendering);
        for path in &files {
            let mut run = ImageRun::new(path, ImageState::MinutiaeExtracted, &mut stats);
            let start = Instant::now();
            match load_minutiae(path, template_size) {
                Ok(set) => {
                    let out = output_dir.join(format!("{}.png", run.id));
                    self.render_stage(&mut run, &set, &render_config, &out);
                }
                Err(e) => run.fail(Stage::TemplateRendering, &e, start.elapsed()),
            }
            run.finish();
        }
        log_summary(&stats);
        Ok(stats)
    }

    // ───────────────────────── Stages ────────────────────────────────

    fn full_chain(
        &self,
        run: &mut ImageRun<'_>,
        path: &Path,
        layout: &OutputLayout,
        filter_quality: bool,
        enhance: bool,
        render_config: &RenderConfig,
    ) -> Option<()> {
        let id = run.id.clone();
        self.quality_stage(run, path, filter_quality)?;
        let processed = layout.processed().join(format!("{id}.png"));
        let dimensions = self.enhancement_stage(run, path, enhance, &processed)?;
        let set = self.extraction_stage(run, &processed, Some(dimensions), &minutiae_path(layout, &id))?;
        let template = layout.templates().join(format!("{id}.png"));
        self.render_stage(run, &set, render_config, &template)
    }

    fn quality_stage(&self, run: &mut ImageRun<'_>, path: &Path, enabled: bool) -> Option<()> {
        if !enabled {
            return run.attempt(Stage::QualityFilter, || {
                Ok(Outcome::skipped((), "quality filter disabled"))
            });
        }
        let filter = QualityFilter::new(&self.tools, self.config.nfiq_threshold);
        run.attempt(Stage::QualityFilter, || {
            let verdict = filter.filter(path)?;
            let score = verdict.score.value();
            if !verdict.accepted {
                return Err(StageError::Rejected {
                    score,
                    threshold: verdict.threshold,
                });
            }
            Ok(Outcome::success(
                (),
                format!("score {score} within threshold {}", verdict.threshold),
            ))
        })
    }

    /// Decode, crop, optionally enhance, and persist one image. Returns
    /// the processed image's dimensions.
    fn enhancement_stage(
        &self,
        run: &mut ImageRun<'_>,
        path: &Path,
        enhance: bool,
        out: &Path,
    ) -> Option<Dimensions> {
        run.attempt(Stage::Enhancement, || {
            let bytes = std::fs::read(path).map_err(StageError::io("cannot read", path))?;
            let image = if enhance {
                preprocess(&bytes, &self.config.preprocess)?
            } else {
                prepare(&bytes, &self.config.preprocess.crop)?
            };
            let png = encode_png(image.as_raw(), image.width(), image.height(), ExtendedColorType::L8)?;
            write_atomic(out, &png).map_err(StageError::io("cannot write", out))?;

            let dimensions = Dimensions::of(&image);
            Ok(if enhance {
                Outcome::success(dimensions, format!("enhanced {dimensions}"))
            } else {
                Outcome::skipped(dimensions, format!("enhancement disabled, wrote {dimensions}"))
            })
        })
    }

    /// Extract minutiae from `image_path` and persist them. `dimensions` is
    /// read from the file when not already known.
    fn extraction_stage(
        &self,
        run: &mut ImageRun<'_>,
        image_path: &Path,
        dimensions: Option<Dimensions>,
        out: &Path,
    ) -> Option<MinutiaeSet> {
        let extractor = MinutiaeExtractor::new(&self.tools, self.config.min_minutia_quality);
        run.attempt(Stage::MinutiaeExtraction, || {
            let dimensions = match dimensions {
                Some(d) => d,
                None => {
                    let (w, h) = image::image_dimensions(image_path)?;
                    Dimensions::new(w, h)
                }
            };
            let extraction = extractor.extract(image_path, dimensions)?;
            write_atomic(out, format_minutiae(&extraction.set).as_bytes())
                .map_err(StageError::io("cannot write", out))?;
            let detail = format!(
                "{} minutiae ({} malformed lines, {} below quality floor)",
                extraction.set.len(),
                extraction.malformed_lines,
                extraction.dropped
            );
            Ok(Outcome::success(extraction.set, detail))
        })
    }

    fn render_stage(
        &self,
        run: &mut ImageRun<'_>,
        set: &MinutiaeSet,
        config: &RenderConfig,
        out: &Path,
    ) -> Option<()> {
        let min = self.config.min_minutiae_count;
        if set.len() < min {
            run.skip(
                Stage::TemplateRendering,
                format!("{} minutiae, fewer than {min}", set.len()),
            );
            return None;
        }
        run.attempt(Stage::TemplateRendering, || {
            let template = render(set, config)?;
            let png = encode_png(
                template.as_raw(),
                template.width(),
                template.height(),
                ExtendedColorType::Rgb8,
            )?;
            write_atomic(out, &png).map_err(StageError::io("cannot write", out))?;
            Ok(Outcome::success(
                (),
                format!("{} minutiae on {}", set.len(), Dimensions::of(&template)),
            ))
        })
    }
}

// ───────────────────────── Helpers ───────────────────────────────────

fn discover(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, BatchError> {
    list_files(dir, extensions).map_err(|source| BatchError::InputDir {
        path: dir.to_path_buf(),
        source,
    })
}

fn create_dir(dir: &Path) -> Result<(), BatchError> {
    std::fs::create_dir_all(dir).map_err(|source| BatchError::OutputDir {
        path: dir.to_path_buf(),
        source,
    })
}

fn minutiae_path(layout: &OutputLayout, id: &str) -> PathBuf {
    layout.minutiae().join(format!("{id}.{MINUTIAE_EXTENSION}"))
}

fn load_minutiae(path: &Path, fallback: Dimensions) -> Result<MinutiaeSet, StageError> {
    let text = std::fs::read_to_string(path).map_err(StageError::io("cannot read", path))?;
    let parsed = parse_minutiae(&text);
    if parsed.malformed_lines > 0 {
        warn!(
            file = %path.display(),
            malformed = parsed.malformed_lines,
            "skipped malformed minutiae lines"
        );
    }
    Ok(parsed.into_set(fallback))
}

fn log_summary(stats: &PipelineStats) {
    info!(
        images = stats.images,
        completed = stats.completed,
        rejected = stats.rejected,
        rate = stats.overall_success_rate,
        final_stage = %stats.final_stage,
        "run finished"
    );
}
