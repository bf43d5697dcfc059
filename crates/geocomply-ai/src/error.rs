use geocomply_retrieval::RetrievalError;
use thiserror::Error;

use crate::generation::GenerationError;

/// Anything that aborts a pipeline run. No partial verdicts are produced.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{agent}: output was not valid JSON after one repair attempt: {raw:?}")]
    MalformedOutput { agent: String, raw: String },

    #[error("{agent}: output does not match the {kind} schema: {reason}")]
    SchemaViolation {
        agent: String,
        kind: &'static str,
        reason: String,
    },

    #[error("{agent}: generation failed: {source}")]
    Generation {
        agent: String,
        #[source]
        source: GenerationError,
    },

    #[error("retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("invalid committee: {0}")]
    InvalidCommittee(String),
}

impl PipelineError {
    pub(crate) fn schema(agent: &str, kind: &'static str, reason: impl ToString) -> Self {
        Self::SchemaViolation {
            agent: agent.to_string(),
            kind,
            reason: reason.to_string(),
        }
    }
}
