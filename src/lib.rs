//! # StentKit
//!
//! Derives the flattened strut pattern of a balloon-expandable stent from a
//! minimal specification: dimensions, ring/crown counts, a link matrix and
//! a gap policy.
//!
//! ## Architecture
//!
//! StentKit is organized as a workspace with multiple crates:
//!
//! 1. **stentkit-core** - Input data model and structural validation
//! 2. **stentkit-geometry** - Crown arc solver, gap resolution, column
//!    scaling, ring stacking and per-cell geometry
//! 3. **stentkit-export** - JSON document and XLSX workbook output
//! 4. **stentkit-settings** - Derivation config (solver tuning, fault policy)
//! 5. **stentkit** - Command-line binary that integrates all crates

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use stentkit_export::{write_outputs, OutputPaths};
use stentkit_geometry::StentDeriver;
use stentkit_settings::DerivationConfig;

pub use stentkit_core::{InputDocument, SpecError};
pub use stentkit_geometry::{Derivation, DeriveOptions, FaultPolicy};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// `--version` text including the build stamp.
pub const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_DATE"), ")");

/// Command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(name = "stentkit", version, long_version = LONG_VERSION, about)]
pub struct Cli {
    /// Input document (JSON). With --template, the file to create.
    pub input: PathBuf,

    /// Derivation config (.json or .toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output directory [default: the input's directory]
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Write a starter input document instead of deriving
    #[arg(long)]
    pub template: bool,
}

/// A faulted cell, for the stderr report.
#[derive(Debug, Clone, PartialEq)]
pub struct FaultReport {
    pub ring: usize,
    pub col: usize,
    pub cause: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Template(PathBuf),
    Derived {
        paths: OutputPaths,
        faults: Vec<FaultReport>,
    },
}

impl RunOutcome {
    /// 0 on success, 2 when outputs were written with faulted cells.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Derived { faults, .. } if !faults.is_empty() => 2,
            _ => 0,
        }
    }
}

fn output_dir(cli: &Cli) -> PathBuf {
    if let Some(dir) = &cli.out_dir {
        return dir.clone();
    }
    match cli.input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn load_input(path: &Path) -> anyhow::Result<InputDocument> {
    let doc = InputDocument::load(path)
        .with_context(|| format!("Failed to read input document {}", path.display()))?;
    Ok(doc)
}

/// Run one invocation end to end.
pub fn run(cli: &Cli) -> anyhow::Result<RunOutcome> {
    let config =
        DerivationConfig::resolve(cli.config.as_deref()).context("Failed to load config")?;

    if cli.template {
        config
            .write_template(&cli.input)
            .with_context(|| format!("Failed to write template {}", cli.input.display()))?;
        tracing::info!("Template written: {}", cli.input.display());
        return Ok(RunOutcome::Template(cli.input.clone()));
    }

    let input = load_input(&cli.input)?;
    let derived = StentDeriver::new(config.derive_options())
        .derive(&input)
        .with_context(|| format!("Derivation failed for {}", cli.input.display()))?;

    let out_dir = output_dir(cli);
    let paths = write_outputs(&input, &derived, &out_dir)
        .with_context(|| format!("Failed to write outputs to {}", out_dir.display()))?;

    let faults = derived
        .faulted_cells()
        .map(|cell| FaultReport {
            ring: cell.ring,
            col: cell.col,
            cause: cell
                .fault
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        })
        .collect();

    Ok(RunOutcome::Derived { paths, faults })
}

/// Initialize logging with the default configuration
///
/// `RUST_LOG` is honoured on top of an INFO default. Output goes to
/// stderr; stdout carries only the written paths.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
