//! Text-generation boundary.

use async_trait::async_trait;
use thiserror::Error;

/// Token budget per completion unless configured otherwise.
pub const DEFAULT_MAX_TOKENS: u32 = 600;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("completion contained no message content")]
    EmptyCompletion,
}

/// One chat-style completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// A backend that turns a system+user prompt pair into raw text.
///
/// Implementations must be safe to call concurrently; the committee issues
/// several requests at once against the same instance.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;

    /// Identifier recorded alongside every verdict this backend produced.
    fn model_id(&self) -> &str;
}
