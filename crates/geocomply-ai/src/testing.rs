//! Fake generators shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::generation::{GenerationError, GenerationRequest, TextGenerator};

/// Replays canned responses in order and records every request.
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<String, GenerationError>>>,
    seen: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_results(responses.into_iter().map(|s| Ok(s.into())).collect())
    }

    pub fn from_results(responses: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn user_prompts(&self) -> Vec<String> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.user_prompt.clone())
            .collect()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.seen.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted response left"))
    }

    fn model_id(&self) -> &str {
        "scripted"
    }
}

/// Answers each request with a function of the request, so concurrent
/// callers get deterministic responses regardless of scheduling.
pub struct FnGenerator<F> {
    respond: F,
    seen: Mutex<Vec<GenerationRequest>>,
}

impl<F> FnGenerator<F>
where
    F: Fn(&GenerationRequest) -> Result<String, GenerationError> + Send + Sync,
{
    pub fn new(respond: F) -> Self {
        Self {
            respond,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl<F> TextGenerator for FnGenerator<F>
where
    F: Fn(&GenerationRequest) -> Result<String, GenerationError> + Send + Sync,
{
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.seen.lock().unwrap().push(request.clone());
        (self.respond)(request)
    }

    fn model_id(&self) -> &str {
        "fn-model"
    }
}
