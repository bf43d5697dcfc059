//! HTTP client for a remote retrieval service.
//!
//! Protocol: `POST {base}/query` with `{"text": ..., "top_k": n}`, answered by
//! `{"results": [{"content": ..., "metadata": {...}}]}` in similarity order.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{RetrievalError, RetrievedChunk, Retriever};

/// Retriever backed by a vector index served over HTTP.
pub struct HttpRetriever {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    text: &'a str,
    top_k: usize,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<RetrievedChunk>,
}

impl HttpRetriever {
    /// Create a client for the given service base URL.
    ///
    /// `base_url` should be like `http://localhost:8100` (a trailing slash is
    /// tolerated). `timeout` bounds each query end to end.
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, RetrievalError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<RetrievedChunk>, RetrievalError> {
        let url = format!("{}/query", self.base_url);

        info!(url = %url, top_k, "querying retrieval service");
        let resp = self
            .client
            .post(&url)
            .json(&QueryRequest { text, top_k })
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RetrievalError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        let mut parsed: QueryResponse = serde_json::from_str(&body)?;
        // Services are asked for top_k but not trusted to honour it.
        parsed.results.truncate(top_k);
        info!(count = parsed.results.len(), "retrieved passages");
        Ok(parsed.results)
    }
}
