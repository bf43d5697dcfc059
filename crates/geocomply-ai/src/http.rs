//! OpenAI-compatible chat-completions client (vLLM, TGI, llama.cpp server,
//! hosted endpoints).

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::generation::{GenerationError, GenerationRequest, TextGenerator};

pub struct HttpGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpGenerator {
    /// `base_url` is the API root, e.g. `http://localhost:8000/v1`.
    /// `timeout` bounds each request end to end.
    pub fn new(base_url: String, model: String, timeout: Duration) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key: None,
        })
    }

    /// Send `Authorization: Bearer <key>` with every request.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }
}

#[async_trait]
impl TextGenerator for HttpGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": request.system_prompt},
                {"role": "user", "content": request.user_prompt}
            ],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature
        });

        debug!(url = %url, model = %self.model, temperature = request.temperature, "requesting completion");
        let mut builder = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let text = resp.text().await?;
        let value: serde_json::Value = serde_json::from_str(&text)?;
        value["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or(GenerationError::EmptyCompletion)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
