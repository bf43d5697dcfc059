//! The agent committee: classifiers first, then auditors who see every
//! classifier's output.
//!
//! Both stages fan out concurrently and join before moving on. The first
//! failure in either stage aborts the whole deliberation; sibling calls still
//! in flight are dropped.

use std::collections::BTreeMap;

use futures::future::try_join_all;
use geocomply_core::{AuditResult, Classification, RunRecord};
use tracing::info;

use crate::PipelineError;
use crate::generation::{DEFAULT_MAX_TOKENS, GenerationRequest, TextGenerator};
use crate::prompts::{
    AUDITOR_RISK_PROMPT, AUDITOR_STRICT_PROMPT, CLASSIFIER_PROMPT, PRAGMATIC_SUFFIX,
    auditor_user_prompt, classifier_user_prompt,
};
use crate::structured::generate_verdict;

/// Keys that reports add next to the record's own fields.
const REPORT_KEYS: &[&str] = &["similar_features"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Classifier,
    Auditor,
}

/// One committee seat.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSpec {
    /// Unique name; becomes the agent's key in run records.
    pub name: String,
    pub role: Role,
    pub system_prompt: String,
    pub temperature: f32,
}

impl AgentSpec {
    pub fn classifier(name: &str, system_prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            name: name.to_string(),
            role: Role::Classifier,
            system_prompt: system_prompt.into(),
            temperature,
        }
    }

    pub fn auditor(name: &str, system_prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            name: name.to_string(),
            role: Role::Auditor,
            system_prompt: system_prompt.into(),
            temperature,
        }
    }
}

/// Everything the committee produced for one feature, in seat order.
#[derive(Debug, Clone, PartialEq)]
pub struct Deliberation {
    pub classifications: Vec<(String, Classification)>,
    pub audits: Vec<(String, AuditResult)>,
}

impl Deliberation {
    pub fn classification_values(&self) -> Vec<Classification> {
        self.classifications.iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn audit_values(&self) -> Vec<AuditResult> {
        self.audits.iter().map(|(_, a)| a.clone()).collect()
    }

    pub fn classification_map(&self) -> BTreeMap<String, Classification> {
        self.classifications.iter().cloned().collect()
    }

    pub fn audit_map(&self) -> BTreeMap<String, AuditResult> {
        self.audits.iter().cloned().collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Committee {
    agents: Vec<AgentSpec>,
    max_tokens: u32,
}

impl Default for Committee {
    /// Two classifiers (baseline and pragmatic) and two auditors (strict
    /// textualist and risk-oriented).
    fn default() -> Self {
        Self {
            agents: vec![
                AgentSpec::classifier("classifier_A", CLASSIFIER_PROMPT, 0.0),
                AgentSpec::classifier(
                    "classifier_B",
                    format!("{CLASSIFIER_PROMPT}{PRAGMATIC_SUFFIX}"),
                    0.3,
                ),
                AgentSpec::auditor("auditor_strict", AUDITOR_STRICT_PROMPT, 0.0),
                AgentSpec::auditor("auditor_risk", AUDITOR_RISK_PROMPT, 0.0),
            ],
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl Committee {
    /// Build a committee from explicit seats.
    ///
    /// Requires at least one classifier, at least one auditor, and unique
    /// agent names. Names become top-level record keys, so they may not
    /// reuse a [`RunRecord`] field name.
    pub fn new(agents: Vec<AgentSpec>) -> Result<Self, PipelineError> {
        if !agents.iter().any(|a| a.role == Role::Classifier) {
            return Err(PipelineError::InvalidCommittee("no classifier".into()));
        }
        if !agents.iter().any(|a| a.role == Role::Auditor) {
            return Err(PipelineError::InvalidCommittee("no auditor".into()));
        }
        for (i, agent) in agents.iter().enumerate() {
            let name = agent.name.as_str();
            if RunRecord::FIELD_NAMES.contains(&name) || REPORT_KEYS.contains(&name) {
                return Err(PipelineError::InvalidCommittee(format!(
                    "agent name {name:?} is a reserved record key"
                )));
            }
            if agents[..i].iter().any(|a| a.name == agent.name) {
                return Err(PipelineError::InvalidCommittee(format!(
                    "duplicate agent name {:?}",
                    agent.name
                )));
            }
        }
        Ok(Self {
            agents,
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn agents(&self) -> &[AgentSpec] {
        &self.agents
    }

    fn seats(&self, role: Role) -> impl Iterator<Item = &AgentSpec> {
        self.agents.iter().filter(move |a| a.role == role)
    }

    fn request(&self, agent: &AgentSpec, user_prompt: String) -> GenerationRequest {
        GenerationRequest {
            system_prompt: agent.system_prompt.clone(),
            user_prompt,
            temperature: agent.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Run every classifier, then every auditor, against the same evidence.
    pub async fn deliberate(
        &self,
        generator: &dyn TextGenerator,
        feature_text: &str,
        evidence: &str,
    ) -> Result<Deliberation, PipelineError> {
        let classifier_prompt = classifier_user_prompt(feature_text, evidence);
        let classifications = try_join_all(self.seats(Role::Classifier).map(|agent| {
            let request = self.request(agent, classifier_prompt.clone());
            async move {
                let c: Classification = generate_verdict(&agent.name, generator, &request).await?;
                Ok::<_, PipelineError>((agent.name.clone(), c))
            }
        }))
        .await?;
        info!(
            classifiers = classifications.len(),
            positive = classifications.iter().filter(|(_, c)| c.needs_geo_compliance).count(),
            "classification stage complete"
        );

        let labelled: Vec<(&str, &Classification)> = classifications
            .iter()
            .map(|(name, c)| (name.as_str(), c))
            .collect();
        let auditor_prompt = auditor_user_prompt(feature_text, evidence, &labelled);
        let audits = try_join_all(self.seats(Role::Auditor).map(|agent| {
            let request = self.request(agent, auditor_prompt.clone());
            async move {
                let a: AuditResult = generate_verdict(&agent.name, generator, &request).await?;
                Ok::<_, PipelineError>((agent.name.clone(), a))
            }
        }))
        .await?;
        info!(
            auditors = audits.len(),
            approvals = audits.iter().filter(|(_, a)| a.approve).count(),
            "audit stage complete"
        );

        Ok(Deliberation {
            classifications,
            audits,
        })
    }
}
