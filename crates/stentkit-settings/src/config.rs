//! Derivation configuration
//!
//! One [`DerivationConfig`] value per run, built by the caller and never
//! shared through global state. Files are JSON or TOML, chosen by
//! extension, and validated on load and before save.
//!
//! ```toml
//! fault_policy = "isolate"
//!
//! [solver]
//! scan_step_deg = 0.05
//! max_iterations = 120
//! ```

use crate::error::{SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use stentkit_core::{GapPolicy, InputDocument, LinkMatrix, StentParameters, DEFAULT_KEEPOUT_MIN_MM};
use stentkit_geometry::{DeriveOptions, FaultPolicy, SolverSettings};

/// File name inside the per-user config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// The designer's baseline stent, used as the starter input.
pub fn baseline_document() -> InputDocument {
    let rings = 6;
    let crowns = 8;
    let parameters = StentParameters {
        diameter_mm: 1.8,
        length_mm: 8.0,
        num_rings: rings,
        crowns_per_ring: crowns,
        strut_width_mm_by_ring: vec![0.05; rings],
        height_factors: vec![1.2, 1.0, 1.0, 1.0, 1.0, 1.1],
        r_factor: 2.5,
        x_keepout_min_mm: DEFAULT_KEEPOUT_MIN_MM,
    };
    InputDocument::new(
        parameters,
        LinkMatrix::unlinked(rings - 1, crowns),
        GapPolicy::default(),
    )
}

/// Everything that tunes a derivation without being part of the stent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivationConfig {
    pub fault_policy: FaultPolicy,
    pub solver: SolverSettings,
    /// Starter input written by `--template`
    pub defaults: InputDocument,
}

impl Default for DerivationConfig {
    fn default() -> Self {
        Self {
            fault_policy: FaultPolicy::default(),
            solver: SolverSettings::default(),
            defaults: baseline_document(),
        }
    }
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> SettingsResult<Format> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        _ => Err(SettingsError::UnsupportedFormat(path.display().to_string())),
    }
}

impl DerivationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// `<config dir>/stentkit/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("stentkit").join(CONFIG_FILE_NAME))
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)?;
        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };
        config.validate()?;
        tracing::debug!("Loaded derivation config from {}", path.display());
        Ok(config)
    }

    /// Load `path` if given, else the default location if it exists, else
    /// built-in defaults.
    pub fn resolve(path: Option<&Path>) -> SettingsResult<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;
        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> SettingsResult<()> {
        let s = &self.solver;
        if !s.is_valid() {
            return Err(SettingsError::InvalidSetting {
                key: "solver".to_string(),
                reason: format!(
                    "scan must satisfy 0 < start ({}) < end ({}) < 90 with positive step, \
                     span, iterations and tolerances",
                    s.scan_start_deg, s.scan_end_deg
                ),
            });
        }
        self.defaults.validate()?;
        Ok(())
    }

    pub fn derive_options(&self) -> DeriveOptions {
        DeriveOptions {
            solver: self.solver,
            fault_policy: self.fault_policy,
        }
    }

    /// Write the baseline document as a JSON input file.
    pub fn write_template(&self, path: &Path) -> SettingsResult<()> {
        std::fs::write(path, self.defaults.to_json_string()?)?;
        Ok(())
    }
}
