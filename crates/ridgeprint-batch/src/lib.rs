//! ridgeprint-batch: directory-level fingerprint preprocessing.
//!
//! Walks a directory of raw scans through the four stages
//!
//! quality filter -> enhancement -> minutiae extraction -> template rendering
//!
//! one image at a time, recording a [`StageResult`] for every stage run
//! and summarizing them in [`PipelineStats`]. A failing image never stops
//! the batch; only startup problems ([`BatchError`]) do.
//!
//! Persisted layout under the output directory:
//!
//! ```text
//! processed/<id>.png      cropped (and enhanced) grayscale scans
//! minutiae_txt/<id>.txt   "# size W H" header, then "x y angle type quality" lines
//! templates/<id>.png      rendered RGB templates
//! ```

mod config;
mod error;
mod extract;
mod filter;
mod orchestrator;
pub mod output;
mod stage;
mod stats;

pub use config::BatchConfig;
pub use error::BatchError;
pub use extract::{Extraction, MinutiaeExtractor};
pub use filter::QualityFilter;
pub use orchestrator::Orchestrator;
pub use stage::{ImageState, Stage, StageResult, StageStatus};
pub use stats::{PipelineStats, StageStats};
