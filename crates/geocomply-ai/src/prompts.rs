//! System prompts and user-prompt builders for committee agents.

use std::fmt::Write as _;

use geocomply_core::{AuditResult, Classification};
use schemars::{JsonSchema, schema_for};

pub const CLASSIFIER_PROMPT: &str = "You are a geo-compliance classifier.\n\
Classify if the feature description requires legal geo-specific compliance (not just business rollout).\n\
Use only retrieved context.\n\
Return valid JSON per schema.";

/// Appended to [`CLASSIFIER_PROMPT`] for the second, more lenient classifier.
pub const PRAGMATIC_SUFFIX: &str =
    "\nAdopt a pragmatic, risk-aware interpretation when evidence is ambiguous.";

pub const AUDITOR_STRICT_PROMPT: &str = "You are a strict textualist compliance auditor.\n\
Approve only if classification aligns exactly with retrieved laws.\n\
Return valid JSON per schema.";

pub const AUDITOR_RISK_PROMPT: &str = "You are a risk-oriented compliance auditor.\n\
Err on the side of caution: if evidence hints at a legal requirement, prefer 'compliance required'.\n\
Return valid JSON per schema.";

const SCHEMA_INSTRUCTION: &str =
    "Return ONLY valid JSON that matches this schema (no extra text):\n";

/// Pretty-printed JSON Schema for `T`.
pub fn schema_json<T: JsonSchema>() -> String {
    serde_json::to_string_pretty(&schema_for!(T)).unwrap_or_default()
}

pub fn classifier_user_prompt(feature_text: &str, evidence: &str) -> String {
    format!(
        "FEATURE:\n{feature_text}\n\n\
         RETRIEVED CONTEXT (laws/glossary/examples):\n{evidence}\n\n\
         {SCHEMA_INSTRUCTION}{}",
        schema_json::<Classification>()
    )
}

/// Auditor prompt: feature, evidence, then every classifier's output under
/// its upper-cased agent name.
pub fn auditor_user_prompt(
    feature_text: &str,
    evidence: &str,
    classifications: &[(&str, &Classification)],
) -> String {
    let mut prompt = format!("FEATURE:\n{feature_text}\n\nRETRIEVED CONTEXT:\n{evidence}\n\n");
    for (agent, classification) in classifications {
        let body = serde_json::to_string_pretty(classification).unwrap_or_default();
        let _ = write!(prompt, "{}:\n{body}\n\n", agent.to_uppercase());
    }
    prompt.push_str(SCHEMA_INSTRUCTION);
    prompt.push_str(&schema_json::<AuditResult>());
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Classification {
        Classification {
            needs_geo_compliance: true,
            confidence: 0.9,
            regulation_candidates: vec!["Utah Social Media Regulation Act".into()],
            reasoning: "Curfew for Utah minors.".into(),
        }
    }

    #[test]
    fn classifier_prompt_layout() {
        let p = classifier_user_prompt("Curfew\nUtah minors", "[CTX 1] text");
        assert!(p.starts_with("FEATURE:\nCurfew\nUtah minors\n\nRETRIEVED CONTEXT (laws/glossary/examples):\n[CTX 1] text\n\n"));
        assert!(p.contains(SCHEMA_INSTRUCTION));
        assert!(p.contains("\"needs_geo_compliance\""));
        assert!(p.contains("\"regulation_candidates\""));
    }

    #[test]
    fn auditor_prompt_lists_classifiers_in_order() {
        let c = sample();
        let p = auditor_user_prompt("f", "ctx", &[("classifier_A", &c), ("classifier_B", &c)]);
        let a = p.find("CLASSIFIER_A:\n{").unwrap();
        let b = p.find("CLASSIFIER_B:\n{").unwrap();
        assert!(a < b);
        assert!(p.starts_with("FEATURE:\nf\n\nRETRIEVED CONTEXT:\nctx\n\n"));
        assert!(p.contains("\"corrected_label\""));
    }

    #[test]
    fn pragmatic_variant_extends_base() {
        let b = format!("{CLASSIFIER_PROMPT}{PRAGMATIC_SUFFIX}");
        assert!(b.ends_with("when evidence is ambiguous."));
        assert!(b.starts_with(CLASSIFIER_PROMPT));
    }
}
