//! ridgeprint: turn directories of raw fingerprint scans into minutiae
//! template images.
//!
//! # Usage
//!
//! ```text
//! ridgeprint [-v...] [--config FILE] [--json] <COMMAND>
//!
//!   full        <INPUT_DIR> <OUTPUT_DIR>   quality filter, enhance, extract, render
//!   preprocess  <INPUT_DIR> <OUTPUT_DIR>   quality filter and enhance only
//!   extract     <INPUT_DIR> <OUTPUT_DIR>   minutiae from already processed images
//!   render      <MINUTIAE_DIR> <OUTPUT_DIR>  templates from persisted minutiae
//! ```
//!
//! Per-image failures are reported in the run statistics and do not
//! change the exit status; configuration and tool validation failures
//! exit with status 1.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use ridgeprint_batch::{Orchestrator, PipelineStats};
use ridgeprint_pipeline::Dimensions;
use ridgeprint_tools::ExternalTools;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::{FileConfig, Overrides, Settings, parse_dimensions};

/// Fingerprint preprocessing: raw scans to minutiae templates.
#[derive(Parser)]
#[command(name = "ridgeprint", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). Without
    /// it, `RUST_LOG` is honoured, falling back to warnings only.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file. Defaults to the nearest `ridgeprint.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print run statistics as JSON instead of a table.
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    tools: ToolArgs,

    #[command(subcommand)]
    command: Command,
}

/// Tool overrides shared by every subcommand.
#[derive(Args)]
struct ToolArgs {
    /// Quality tool executable.
    #[arg(long, global = true)]
    quality_tool: Option<PathBuf>,

    /// Minutiae tool executable.
    #[arg(long, global = true)]
    minutiae_tool: Option<PathBuf>,

    /// Per-invocation tool timeout in seconds.
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Highest accepted quality score (1 best, 5 worst).
    #[arg(long, global = true)]
    nfiq_threshold: Option<u8>,
}

#[derive(Subcommand)]
enum Command {
    /// Run every stage and write processed/, minutiae_txt/ and templates/.
    Full {
        #[command(flatten)]
        dirs: Dirs,
        #[command(flatten)]
        stages: StageArgs,
        /// Template size as WIDTHxHEIGHT.
        #[arg(long, value_parser = parse_dimensions)]
        template_size: Option<Dimensions>,
    },
    /// Quality filter and enhancement only.
    Preprocess {
        #[command(flatten)]
        dirs: Dirs,
        #[command(flatten)]
        stages: StageArgs,
    },
    /// Minutiae extraction from already processed images.
    Extract {
        #[command(flatten)]
        dirs: Dirs,
    },
    /// Render templates from persisted minutiae files.
    Render {
        #[command(flatten)]
        dirs: Dirs,
        /// Template size as WIDTHxHEIGHT.
        #[arg(long, value_parser = parse_dimensions)]
        template_size: Option<Dimensions>,
    },
}

#[derive(Args)]
struct Dirs {
    /// Directory to read from.
    input: PathBuf,
    /// Directory to write into. Created if missing.
    output: PathBuf,
}

#[derive(Args)]
struct StageArgs {
    /// Skip the quality filter.
    #[arg(long)]
    no_quality_filter: bool,

    /// Crop only; skip ridge enhancement.
    #[arg(long)]
    no_enhance: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        let mut overrides = Overrides {
            quality_path: self.tools.quality_tool.clone(),
            minutiae_path: self.tools.minutiae_tool.clone(),
            timeout_secs: self.tools.timeout,
            nfiq_threshold: self.tools.nfiq_threshold,
            ..Overrides::default()
        };
        match &self.command {
            Command::Full {
                stages,
                template_size,
                ..
            } => {
                overrides.filter_quality = stages.no_quality_filter.then_some(false);
                overrides.enhance = stages.no_enhance.then_some(false);
                overrides.template_size = *template_size;
            }
            Command::Preprocess { stages, .. } => {
                overrides.filter_quality = stages.no_quality_filter.then_some(false);
                overrides.enhance = stages.no_enhance.then_some(false);
            }
            Command::Render { template_size, .. } => overrides.template_size = *template_size,
            Command::Extract { .. } => {}
        }
        overrides
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<PipelineStats> {
    let settings: Settings = FileConfig::load(cli.config.as_deref())?.resolve(cli.overrides())?;
    tracing::debug!(?settings, "resolved settings");

    let orchestrator = Orchestrator::new(ExternalTools::new(settings.tools), settings.batch);
    let stats = match &cli.command {
        Command::Full { dirs, .. } => orchestrator.run_full_pipeline(
            &dirs.input,
            &dirs.output,
            settings.filter_quality,
            settings.enhance,
            settings.template_size,
        ),
        Command::Preprocess { dirs, .. } => orchestrator.run_preprocessing_only(
            &dirs.input,
            &dirs.output,
            settings.filter_quality,
            settings.enhance,
        ),
        Command::Extract { dirs } => {
            orchestrator.run_minutiae_extraction_only(&dirs.input, &dirs.output)
        }
        Command::Render { dirs, .. } => orchestrator.run_template_creation_only(
            &dirs.input,
            &dirs.output,
            settings.template_size,
        ),
    }?;
    Ok(stats)
}

fn print_stats(stats: &PipelineStats, json: bool) -> anyhow::Result<()> {
    if json {
        let text = serde_json::to_string_pretty(stats).context("cannot serialize statistics")?;
        println!("{text}");
    } else {
        print!("{}", stats.report());
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli).and_then(|stats| print_stats(&stats, cli.json)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
