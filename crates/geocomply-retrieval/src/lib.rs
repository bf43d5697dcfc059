//! Retrieval layer: the vector-search service that supplies the
//! embedding-grounded half of the evidence.
//!
//! The index itself is built and served elsewhere; this crate only defines
//! the query boundary ([`Retriever`]), renders results into evidence text,
//! and (behind the `http` feature) talks to a remote service.

use async_trait::async_trait;
use geocomply_core::SourceMetadata;
use serde::Deserialize;
use thiserror::Error;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::HttpRetriever;

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One passage returned by the retrieval service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RetrievedChunk {
    pub content: String,
    #[serde(default)]
    pub metadata: SourceMetadata,
}

/// Query side of a vector index.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Up to `top_k` passages most similar to `text`, best first.
    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<RetrievedChunk>, RetrievalError>;
}

/// Retriever used when no service is configured: always returns nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRetriever;

#[async_trait]
impl Retriever for NoRetriever {
    async fn query(&self, _text: &str, _top_k: usize) -> Result<Vec<RetrievedChunk>, RetrievalError> {
        Ok(Vec::new())
    }
}

/// Retrieved passages rendered for prompting, plus their metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievedEvidence {
    pub text: String,
    pub sources: Vec<SourceMetadata>,
}

/// Render chunks as `[CTX n] content` (1-based) separated by blank lines.
pub fn format_chunks(chunks: Vec<RetrievedChunk>) -> RetrievedEvidence {
    let mut parts = Vec::with_capacity(chunks.len());
    let mut sources = Vec::with_capacity(chunks.len());
    for (i, chunk) in chunks.into_iter().enumerate() {
        parts.push(format!("[CTX {}] {}", i + 1, chunk.content));
        sources.push(chunk.metadata);
    }
    RetrievedEvidence {
        text: parts.join("\n\n"),
        sources,
    }
}
