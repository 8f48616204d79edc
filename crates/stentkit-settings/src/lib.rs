//! StentKit Settings Crate
//!
//! Loads, validates and saves the per-run derivation configuration.

pub mod config;
pub mod error;

pub use config::{baseline_document, DerivationConfig, CONFIG_FILE_NAME};
pub use error::{SettingsError, SettingsResult};
