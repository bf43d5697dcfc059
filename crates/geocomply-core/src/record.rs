//! Decision trace emitted once per pipeline invocation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::verdict::{AuditResult, Classification};

/// Free-form metadata attached to a retrieved evidence chunk.
pub type SourceMetadata = serde_json::Map<String, serde_json::Value>;

/// Everything needed to audit one compliance determination.
///
/// Agent outputs are keyed by agent name and serialize as top-level fields
/// (`classifier_A`, `auditor_strict`, ...). `catalog_rule_ids` serializes as
/// the used ids joined by `|`.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub feature_name: String,
    pub needs_geo_compliance: bool,
    pub confidence: f64,
    pub regulations: Vec<String>,
    #[serde(serialize_with = "pipe_joined")]
    pub catalog_rule_ids: Vec<String>,
    #[serde(flatten)]
    pub classifications: BTreeMap<String, Classification>,
    #[serde(flatten)]
    pub audits: BTreeMap<String, AuditResult>,
    pub retrieval_sources: Vec<SourceMetadata>,
    pub timestamp: DateTime<Utc>,
    /// agent name → model id
    pub models: BTreeMap<String, String>,
    pub embeddings: String,
}

impl RunRecord {
    /// Top-level keys of the serialized record other than agent outputs.
    /// Agent names must not reuse them.
    pub const FIELD_NAMES: [&'static str; 9] = [
        "feature_name",
        "needs_geo_compliance",
        "confidence",
        "regulations",
        "catalog_rule_ids",
        "retrieval_sources",
        "timestamp",
        "models",
        "embeddings",
    ];
}

fn pipe_joined<S: Serializer>(ids: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ids.join("|"))
}
