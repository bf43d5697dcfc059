//! Structured output contract for committee agents.
//!
//! Classifiers answer with a [`Classification`], auditors with an
//! [`AuditResult`]. Both are deserialized from model output and then checked
//! with `validate()`; anything that parses as JSON but fails here is a schema
//! violation rather than malformed output.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum VerdictError {
    #[error("confidence must be within [0, 1], got {0}")]
    ConfidenceOutOfRange(f64),
}

/// A structured answer an agent can be asked to produce.
pub trait Verdict {
    /// Short name used in logs and error messages.
    const KIND: &'static str;

    /// Range and consistency checks that serde cannot express.
    fn validate(&self) -> Result<(), VerdictError> {
        Ok(())
    }
}

/// One classifier's opinion on a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Classification {
    pub needs_geo_compliance: bool,
    /// Self-reported certainty in `[0, 1]`.
    pub confidence: f64,
    pub regulation_candidates: Vec<String>,
    /// Never null; a missing or null value deserializes to `""`.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub reasoning: String,
}

impl Verdict for Classification {
    const KIND: &'static str = "classification";

    fn validate(&self) -> Result<(), VerdictError> {
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(VerdictError::ConfidenceOutOfRange(self.confidence));
        }
        Ok(())
    }
}

/// One auditor's verdict on the classifiers' outputs.
///
/// `corrected_label` and `corrected_regs` are independent: an auditor may
/// override the label, the regulation list, both, or neither.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AuditResult {
    pub approve: bool,
    #[serde(default)]
    pub corrected_label: Option<bool>,
    #[serde(default)]
    pub corrected_regs: Option<Vec<String>>,
    #[serde(default)]
    pub fixes: Option<String>,
}

impl Verdict for AuditResult {
    const KIND: &'static str = "audit";
}

impl AuditResult {
    /// Whether the auditor proposed any change at all.
    ///
    /// An empty `corrected_regs` list carries nothing and does not count.
    pub fn has_correction(&self) -> bool {
        self.corrected_label.is_some()
            || self
                .corrected_regs
                .as_ref()
                .is_some_and(|regs| !regs.is_empty())
    }

    /// Approved and proposed no change.
    pub fn is_clean_approval(&self) -> bool {
        self.approve && !self.has_correction()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
