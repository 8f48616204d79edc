//! # StentKit Export
//!
//! Writes a finished derivation as two files side by side:
//!
//! - `derived_<YYYYMMDD_HHMMSS>.json`: the [`OutputDocument`]
//! - `derived_<YYYYMMDD_HHMMSS>.xlsx`: the same content as a [`Workbook`]

pub mod document;
pub mod error;
pub mod workbook;

pub use document::{Meta, OutputDocument, ParametersEcho, UNITS};
pub use error::{ExportError, ExportResult};
pub use workbook::{Sheet, Value, Workbook, CELL_HEADERS, SHEET_NAMES};

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use stentkit_core::InputDocument;
use stentkit_geometry::Derivation;

/// Paths of one written output pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub json: PathBuf,
    pub xlsx: PathBuf,
}

/// Output file stem for a timestamp.
pub fn output_stem(timestamp: &DateTime<Local>) -> String {
    format!("derived_{}", timestamp.format("%Y%m%d_%H%M%S"))
}

/// Write the JSON document and the workbook into `out_dir`.
pub fn write_outputs(
    input: &InputDocument,
    derived: &Derivation,
    out_dir: &Path,
) -> ExportResult<OutputPaths> {
    if !out_dir.is_dir() {
        return Err(ExportError::MissingDirectory(out_dir.display().to_string()));
    }

    let stem = output_stem(&Local::now());
    let paths = OutputPaths {
        json: out_dir.join(format!("{stem}.json")),
        xlsx: out_dir.join(format!("{stem}.xlsx")),
    };

    let document = OutputDocument::new(input, derived);
    std::fs::write(&paths.json, document.to_json_string()?)?;
    tracing::info!("Derived document written: {}", paths.json.display());

    Workbook::from_derivation(input, derived).save(&paths.xlsx)?;
    tracing::info!("Workbook written: {}", paths.xlsx.display());

    Ok(paths)
}
