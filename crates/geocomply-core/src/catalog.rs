//! Jurisdiction-indexed rule catalog.
//!
//! The catalog document is a flat list of [`LawArtifact`]s produced by the
//! offline extraction tool. [`Catalog`] groups them by jurisdiction label,
//! keeping the order in which each jurisdiction first appears so that
//! "catalog order" is stable for context selection and tie-breaks.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Placeholder jurisdiction for artifacts the extractor could not classify.
pub const UNCLASSIFIED_JURISDICTION: &str = "TBD";

/// A single obligation extracted from a law.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique within its law (not across jurisdictions).
    pub rule_id: String,
    pub title: String,
    #[serde(default)]
    pub section: Option<String>,
    pub text: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub citations: Vec<String>,
}

/// One ingested regulation and its extracted rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LawArtifact {
    pub filename: String,
    #[serde(default)]
    pub original_file: String,
    #[serde(default)]
    pub md_file: String,
    pub title: String,
    #[serde(default)]
    pub regulatory_area: String,
    /// Free-text label such as `EU` or `US-Utah`.
    #[serde(default)]
    pub jurisdiction: Option<String>,
    /// e.g. `DSA Art. 16`, `18 U.S.C. § 2258A`
    #[serde(default)]
    pub law_identifiers: Vec<String>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl LawArtifact {
    /// Jurisdiction label used for indexing; blank or missing maps to `TBD`.
    pub fn jurisdiction_label(&self) -> &str {
        match self.jurisdiction.as_deref().map(str::trim) {
            Some(j) if !j.is_empty() => j,
            _ => UNCLASSIFIED_JURISDICTION,
        }
    }
}

/// Read-only mapping from jurisdiction label to its laws.
///
/// Built once per process and shared behind an `Arc`; nothing in the
/// pipeline mutates it.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<(String, Vec<LawArtifact>)>,
}

impl Catalog {
    /// Group artifacts by jurisdiction, preserving first-appearance order.
    pub fn from_artifacts(artifacts: Vec<LawArtifact>) -> Self {
        let mut entries: Vec<(String, Vec<LawArtifact>)> = Vec::new();
        for law in artifacts {
            let label = law.jurisdiction_label().to_string();
            match entries.iter_mut().find(|(j, _)| *j == label) {
                Some((_, laws)) => laws.push(law),
                None => entries.push((label, vec![law])),
            }
        }
        let catalog = Self { entries };
        debug!(
            jurisdictions = catalog.entries.len(),
            laws = catalog.law_count(),
            rules = catalog.rule_count(),
            "catalog indexed"
        );
        catalog
    }

    /// Laws filed under `jurisdiction`, in catalog order. Empty if unknown.
    pub fn laws(&self, jurisdiction: &str) -> &[LawArtifact] {
        self.entries
            .iter()
            .find(|(j, _)| j == jurisdiction)
            .map(|(_, laws)| laws.as_slice())
            .unwrap_or(&[])
    }

    /// Jurisdiction labels in first-appearance order.
    pub fn jurisdictions(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(j, _)| j.as_str())
    }

    /// Every rule across all jurisdictions as `(jurisdiction, rule)`, in
    /// catalog order.
    pub fn rules(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.entries.iter().flat_map(|(j, laws)| {
            laws.iter()
                .flat_map(move |law| law.rules.iter().map(move |rule| (j.as_str(), rule)))
        })
    }

    pub fn law_count(&self) -> usize {
        self.entries.iter().map(|(_, laws)| laws.len()).sum()
    }

    pub fn rule_count(&self) -> usize {
        self.rules().count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
