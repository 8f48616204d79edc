//! The minimal stent specification as stored on disk.

use crate::data::fold_lock::FoldLockSpec;
use crate::error::{require_positive, SpecResult};
use crate::gaps::GapPolicy;
use crate::links::{LinkMatrix, LinkSection};
use crate::parameters::StentParameters;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters, link topology and gap policy: everything the derivation
/// needs and nothing it produces.
///
/// Unknown top-level fields are ignored, so a derived output document can
/// be fed back in as a fresh input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDocument {
    pub parameters: StentParameters,
    pub links: LinkSection,
    pub gaps_policy: GapPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fold_lock: Option<FoldLockSpec>,
}

impl InputDocument {
    /// Assemble a document with default labels.
    pub fn new(parameters: StentParameters, matrix: LinkMatrix, gaps_policy: GapPolicy) -> Self {
        Self {
            parameters,
            links: LinkSection::new(matrix),
            gaps_policy,
            fold_lock: None,
        }
    }

    /// Parse from JSON text. Shapes are not checked; call [`Self::validate`].
    pub fn from_json_str(json: &str) -> SpecResult<Self> {
        let mut doc: Self = serde_json::from_str(json)?;
        doc.links.validate_labels()?;
        doc.links.fill_default_labels();
        Ok(doc)
    }

    /// Read and parse a JSON document.
    pub fn load(path: &Path) -> SpecResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let doc = Self::from_json_str(&content)?;
        tracing::debug!(
            "Loaded stent spec from {}: {} rings x {} crowns",
            path.display(),
            doc.parameters.num_rings,
            doc.parameters.crowns_per_ring
        );
        Ok(doc)
    }

    /// Pretty JSON rendering.
    pub fn to_json_string(&self) -> SpecResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Every structural precondition of the derivation.
    ///
    /// Runs before any numeric work; the first violation is returned.
    pub fn validate(&self) -> SpecResult<()> {
        self.parameters.validate()?;
        self.links.matrix.expect_shape(self.parameters.link_shape())?;
        self.links.validate_labels()?;
        self.gaps_policy.validate()?;
        if let Some(fold_lock) = &self.fold_lock {
            require_positive("fold_lock.balloon_wall_um", fold_lock.balloon_wall_um)?;
        }
        Ok(())
    }

    /// The gap policy after the fold-lock table (if any) is applied.
    ///
    /// The looked-up value replaces `end_linked_mm`; the other four rules
    /// are used as given.
    pub fn effective_gap_policy(&self) -> GapPolicy {
        let mut policy = self.gaps_policy;
        if let Some(fold_lock) = &self.fold_lock {
            policy.end_linked_mm = fold_lock.gap_mm();
        }
        policy
    }

    /// Interface labels, defaulted when the document has none.
    pub fn interface_labels(&self) -> Vec<String> {
        let mut links = self.links.clone();
        links.fill_default_labels();
        links.interfaces
    }

    /// Column labels as strings, defaulted when the document has none.
    pub fn column_labels(&self) -> Vec<String> {
        let mut links = self.links.clone();
        links.fill_default_labels();
        links.matrix_cols.iter().map(ToString::to_string).collect()
    }
}
