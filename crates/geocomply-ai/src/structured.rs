//! JSON-only generation with a single repair attempt.
//!
//! Small instruction-tuned models frequently wrap JSON in markdown fences or
//! add prose. Fences are stripped; anything else that fails to parse gets
//! exactly one repair request with an explicit instruction appended to the
//! user prompt. There is no further retry.

use geocomply_core::Verdict;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::PipelineError;
use crate::generation::{GenerationRequest, TextGenerator};

/// Appended to the user prompt for the repair attempt.
pub const REPAIR_INSTRUCTION: &str =
    "\n\nYour previous output was invalid JSON. Return VALID JSON only per the schema. No prose.";

/// Remove a surrounding markdown code fence, including its language tag line.
///
/// Text that does not start with a fence is returned trimmed and otherwise
/// untouched.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let unfenced = trimmed.trim_matches('`');
    match unfenced.split_once('\n') {
        Some((_lang, body)) => body,
        None => unfenced,
    }
}

/// Parse model output as a single JSON value after fence stripping.
pub fn parse_json_strict(raw: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(strip_code_fence(raw))
}

/// Generate and parse a JSON value, issuing one repair request on failure.
///
/// Backend errors are returned immediately and never retried.
pub async fn generate_structured(
    agent: &str,
    generator: &dyn TextGenerator,
    request: &GenerationRequest,
) -> Result<Value, PipelineError> {
    let first = call(agent, generator, request).await?;
    match parse_json_strict(&first) {
        Ok(value) => return Ok(value),
        Err(e) => warn!(agent, error = %e, "output was not valid JSON, requesting repair"),
    }

    let repair = GenerationRequest {
        user_prompt: format!("{}{REPAIR_INSTRUCTION}", request.user_prompt),
        ..request.clone()
    };
    let second = call(agent, generator, &repair).await?;
    parse_json_strict(&second).map_err(|_| PipelineError::MalformedOutput {
        agent: agent.to_string(),
        raw: second,
    })
}

/// [`generate_structured`], then deserialize into `T` and validate it.
///
/// A well-formed value of the wrong shape is a schema violation; it is not
/// sent back for repair.
pub async fn generate_verdict<T>(
    agent: &str,
    generator: &dyn TextGenerator,
    request: &GenerationRequest,
) -> Result<T, PipelineError>
where
    T: Verdict + DeserializeOwned,
{
    let value = generate_structured(agent, generator, request).await?;
    let verdict: T =
        serde_json::from_value(value).map_err(|e| PipelineError::schema(agent, T::KIND, e))?;
    verdict
        .validate()
        .map_err(|e| PipelineError::schema(agent, T::KIND, e))?;
    debug!(agent, kind = T::KIND, "verdict accepted");
    Ok(verdict)
}

async fn call(
    agent: &str,
    generator: &dyn TextGenerator,
    request: &GenerationRequest,
) -> Result<String, PipelineError> {
    debug!(agent, model = generator.model_id(), temperature = request.temperature, "calling generator");
    generator
        .generate(request)
        .await
        .map_err(|source| PipelineError::Generation {
            agent: agent.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::GenerationError;
    use crate::testing::ScriptedGenerator;
    use geocomply_core::Classification;

    fn request() -> GenerationRequest {
        GenerationRequest {
            system_prompt: "sys".into(),
            user_prompt: "user".into(),
            temperature: 0.0,
            max_tokens: 600,
        }
    }

    #[test]
    fn strips_fence_and_language_tag() {
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}\n");
        assert_eq!(strip_code_fence("  ```\n[1]\n```  "), "[1]\n");
    }

    #[test]
    fn unfenced_text_is_only_trimmed() {
        assert_eq!(strip_code_fence("  {\"a\": 1}\n"), "{\"a\": 1}");
    }

    #[test]
    fn fence_without_newline_keeps_content() {
        assert_eq!(strip_code_fence("```{}```"), "{}");
    }

    #[test]
    fn prose_is_rejected() {
        assert!(parse_json_strict("Sure! Here is the JSON: {}").is_err());
    }

    #[tokio::test]
    async fn valid_first_output_needs_one_call() {
        let generator = ScriptedGenerator::new(["{\"approve\": true}"]);
        let value = generate_structured("a", &generator, &request()).await.unwrap();
        assert_eq!(value["approve"], true);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn fenced_invalid_then_valid_repair_succeeds() {
        let generator = ScriptedGenerator::new([
            "```json\n{needs_geo_compliance: yes}\n```",
            "```json\n{\"needs_geo_compliance\": true}\n```",
        ]);
        let value = generate_structured("a", &generator, &request()).await.unwrap();
        assert_eq!(value["needs_geo_compliance"], true);
        assert_eq!(generator.calls(), 2);

        let prompts = generator.user_prompts();
        assert_eq!(prompts[0], "user");
        assert_eq!(prompts[1], format!("user{REPAIR_INSTRUCTION}"));
    }

    #[tokio::test]
    async fn two_invalid_outputs_are_malformed_after_exactly_two_calls() {
        let generator = ScriptedGenerator::new(["not json", "still not json"]);
        let err = generate_structured("classifier_A", &generator, &request())
            .await
            .unwrap_err();
        match err {
            PipelineError::MalformedOutput { agent, raw } => {
                assert_eq!(agent, "classifier_A");
                assert_eq!(raw, "still not json");
            }
            other => panic!("expected malformed output, got {other:?}"),
        }
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn backend_error_is_not_retried() {
        let generator = ScriptedGenerator::from_results(vec![Err(GenerationError::Server {
            status: 502,
            body: "bad gateway".into(),
        })]);
        let err = generate_structured("a", &generator, &request()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Generation { .. }));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn out_of_range_confidence_is_a_schema_violation() {
        let generator = ScriptedGenerator::new([
            r#"{"needs_geo_compliance": true, "confidence": 1.7, "regulation_candidates": []}"#,
        ]);
        let err = generate_verdict::<Classification>("a", &generator, &request())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::SchemaViolation { kind: "classification", .. }
        ));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn wrong_shape_is_a_schema_violation_without_repair() {
        let generator = ScriptedGenerator::new([r#"{"label": "yes"}"#]);
        let err = generate_verdict::<Classification>("a", &generator, &request())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::SchemaViolation { .. }));
        assert_eq!(generator.calls(), 1);
    }
}
