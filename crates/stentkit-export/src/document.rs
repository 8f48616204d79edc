//! The derived JSON document.
//!
//! Everything from the input is echoed (with default labels filled in and
//! the two derived parameter values added) ahead of the derived fields, so
//! an output document can be fed straight back in as an input.

use crate::error::ExportResult;
use chrono::Local;
use serde::Serialize;
use stentkit_core::{FoldLockSpec, GapPolicy, InputDocument, LinkSection, StentParameters};
use stentkit_geometry::Derivation;
use uuid::Uuid;

pub const UNITS: &str = "mm (angles in deg)";

/// Provenance block. Not part of the derived content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meta {
    /// RFC 3339, local time, whole seconds
    pub generated_at: String,
    pub units: &'static str,
    pub run_id: Uuid,
    pub version: &'static str,
}

impl Meta {
    pub fn now() -> Self {
        Self {
            generated_at: Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, false),
            units: UNITS,
            run_id: Uuid::new_v4(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Input parameters plus circumference and pitch.
#[derive(Debug, Serialize)]
pub struct ParametersEcho<'a> {
    #[serde(flatten)]
    pub parameters: &'a StentParameters,
    pub circumference_mm: f64,
    pub pitch_mm: f64,
}

impl<'a> ParametersEcho<'a> {
    pub fn new(parameters: &'a StentParameters) -> Self {
        Self {
            parameters,
            circumference_mm: parameters.circumference_mm(),
            pitch_mm: parameters.pitch_mm(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OutputDocument<'a> {
    pub meta: Meta,
    pub parameters: ParametersEcho<'a>,
    pub links: LinkSection,
    /// As given; any fold-lock override is visible in `gaps_matrix`
    pub gaps_policy: GapPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fold_lock: Option<&'a FoldLockSpec>,
    #[serde(flatten)]
    pub derived: &'a Derivation,
}

impl<'a> OutputDocument<'a> {
    pub fn new(input: &'a InputDocument, derived: &'a Derivation) -> Self {
        let mut links = input.links.clone();
        links.fill_default_labels();
        Self {
            meta: Meta::now(),
            parameters: ParametersEcho::new(&input.parameters),
            links,
            gaps_policy: input.gaps_policy,
            fold_lock: input.fold_lock.as_ref(),
            derived,
        }
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    pub fn to_json_string(&self) -> ExportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
