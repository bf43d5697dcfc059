//! End-to-end determination for a single feature.

use std::sync::Arc;

use chrono::Utc;
use geocomply_core::{Catalog, RunRecord};
use geocomply_retrieval::{Retriever, format_chunks};
use geocomply_store::{ContextLimits, build_context};
use tracing::{info, warn};

use crate::PipelineError;
use crate::committee::Committee;
use crate::fusion::fuse;
use crate::generation::{DEFAULT_MAX_TOKENS, TextGenerator};

/// Embedding model recorded when none is configured.
pub const DEFAULT_EMBEDDING_MODEL: &str = "BAAI/bge-small-en-v1.5";

/// Tunables for one pipeline instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub context: ContextLimits,
    pub retrieval_top_k: usize,
    pub max_tokens: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            context: ContextLimits::default(),
            retrieval_top_k: 5,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

pub struct Pipeline {
    catalog: Arc<Catalog>,
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn TextGenerator>,
    committee: Committee,
    settings: PipelineSettings,
    embedding_model: String,
}

impl Pipeline {
    /// A pipeline with the default committee and settings.
    pub fn new(
        catalog: Arc<Catalog>,
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            catalog,
            retriever,
            generator,
            committee: Committee::default(),
            settings: PipelineSettings::default(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }

    pub fn with_committee(mut self, committee: Committee) -> Self {
        self.committee = committee.with_max_tokens(self.settings.max_tokens);
        self
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.committee = self.committee.with_max_tokens(settings.max_tokens);
        self.settings = settings;
        self
    }

    pub fn with_embedding_model(mut self, embedding_model: impl Into<String>) -> Self {
        self.embedding_model = embedding_model.into();
        self
    }

    /// Decide whether a feature needs geo-specific legal compliance.
    ///
    /// Any failure aborts the run; there is no partial record.
    pub async fn run(
        &self,
        feature_name: &str,
        feature_description: &str,
    ) -> Result<RunRecord, PipelineError> {
        let feature_text = format!("{feature_name}\n{feature_description}")
            .trim()
            .to_string();
        info!(feature = feature_name, "starting determination");

        let catalog_ctx = build_context(&self.catalog, &feature_text, &self.settings.context);
        let chunks = self
            .retriever
            .query(&feature_text, self.settings.retrieval_top_k)
            .await?;
        let retrieved = format_chunks(chunks);
        info!(
            catalog_rules = catalog_ctx.rule_ids.len(),
            retrieved = retrieved.sources.len(),
            "evidence gathered"
        );

        let evidence = if catalog_ctx.is_empty() {
            retrieved.text
        } else {
            format!("{}\n\n{}", catalog_ctx.text, retrieved.text)
                .trim()
                .to_string()
        };
        if evidence.trim().is_empty() {
            warn!(feature = feature_name, "no catalog or retrieved evidence, proceeding without context");
        }

        let deliberation = self
            .committee
            .deliberate(self.generator.as_ref(), &feature_text, &evidence)
            .await?;
        let outcome = fuse(
            &deliberation.classification_values(),
            &deliberation.audit_values(),
        );
        info!(
            needs_geo_compliance = outcome.needs_geo_compliance,
            confidence = outcome.confidence,
            regulations = outcome.regulations.len(),
            "determination complete"
        );

        let model = self.generator.model_id().to_string();
        let models = self
            .committee
            .agents()
            .iter()
            .map(|a| (a.name.clone(), model.clone()))
            .collect();

        Ok(RunRecord {
            feature_name: feature_name.to_string(),
            needs_geo_compliance: outcome.needs_geo_compliance,
            confidence: outcome.confidence,
            regulations: outcome.regulations,
            catalog_rule_ids: catalog_ctx.rule_ids,
            classifications: deliberation.classification_map(),
            audits: deliberation.audit_map(),
            retrieval_sources: retrieved.sources,
            timestamp: Utc::now(),
            models,
            embeddings: self.embedding_model.clone(),
        })
    }
}
