//! Decision layer: structured LLM generation, the agent committee, decision
//! fusion, and the end-to-end pipeline.

mod error;
pub use error::PipelineError;

pub mod committee;
pub mod fusion;
pub mod generation;
pub mod pipeline;
pub mod prompts;
pub mod structured;

#[cfg(feature = "http")]
mod http;
#[cfg(feature = "http")]
pub use http::HttpGenerator;

#[cfg(test)]
mod testing;

pub use committee::{AgentSpec, Committee, Deliberation, Role};
pub use fusion::{FusionOutcome, fuse};
pub use generation::{DEFAULT_MAX_TOKENS, GenerationError, GenerationRequest, TextGenerator};
pub use pipeline::{DEFAULT_EMBEDDING_MODEL, Pipeline, PipelineSettings};
pub use structured::generate_structured;
