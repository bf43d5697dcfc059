//! `geocomply`: decide whether a product feature needs geo-specific legal
//! compliance.
//!
//! ```bash
//! # Built-in Utah curfew example
//! geocomply
//!
//! # Your own feature
//! geocomply "PF default toggle" "Personalized feed is disabled by default for EU minors."
//!
//! # Against a hosted endpoint with a retrieval service
//! LLM_BASE_URL=https://api.example.com/v1 LLM_API_KEY=... \
//!   geocomply --retrieval-url http://localhost:8100 "Feature" "Description"
//! ```
//!
//! The JSON report goes to stdout; logs and the summary card go to stderr.

mod summary;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use geocomply_ai::{HttpGenerator, Pipeline, PipelineSettings};
use geocomply_core::RunRecord;
use geocomply_retrieval::{HttpRetriever, NoRetriever, Retriever};
use geocomply_store::{ContextLimits, CsvLog, JsonlLog, load_catalog};
use serde::Serialize;
use tracing::info;

const EXAMPLE_NAME: &str = "Curfew login blocker with ASL and GH for Utah minors";
const EXAMPLE_DESCRIPTION: &str = "To comply with the Utah Social Media Regulation Act, we restrict logins for under-18 users at night within Utah via GH. EchoTrace logs for audits.";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Feature name (the built-in example runs unless a description follows)
    name: Option<String>,

    /// Feature description; remaining words are joined with spaces
    description: Vec<String>,

    /// Law catalog document (JSON array of law artifacts)
    #[arg(long, env = "GEOCOMPLY_CATALOG", default_value = geocomply_store::DEFAULT_CATALOG_PATH)]
    catalog: PathBuf,

    /// OpenAI-compatible API root
    #[arg(long, env = "LLM_BASE_URL", default_value = "http://localhost:8000/v1")]
    llm_url: String,

    #[arg(long, env = "LLM_MODEL_ID", default_value = "Qwen/Qwen2.5-1.5B-Instruct")]
    llm_model: String,

    #[arg(long, env = "LLM_API_KEY", hide_env_values = true)]
    llm_api_key: Option<String>,

    /// Per-request timeout for generation calls
    #[arg(long, default_value_t = 120)]
    llm_timeout_secs: u64,

    #[arg(long, default_value_t = geocomply_ai::DEFAULT_MAX_TOKENS)]
    max_tokens: u32,

    /// Retrieval service root; without it only the catalog grounds the committee
    #[arg(long, env = "RETRIEVAL_URL")]
    retrieval_url: Option<String>,

    /// Per-request timeout for retrieval calls
    #[arg(long, default_value_t = 30)]
    retrieval_timeout_secs: u64,

    /// Passages requested from the retrieval service
    #[arg(long, default_value_t = 5)]
    top_k: usize,

    /// Embedding model recorded in run logs
    #[arg(long, env = "EMBEDDING_MODEL_ID", default_value = geocomply_ai::DEFAULT_EMBEDDING_MODEL)]
    embedding_model: String,

    #[arg(long, default_value = geocomply_store::DEFAULT_CSV_LOG)]
    csv_log: PathBuf,

    /// Also append each report as one JSON line here
    #[arg(long)]
    jsonl_log: Option<PathBuf>,

    /// Earlier features with overlapping regulations to list
    #[arg(long, default_value_t = 5)]
    similar_top_n: usize,
}

impl Args {
    /// Name and description to evaluate. Both must be given, otherwise the
    /// built-in example is used.
    fn feature(&self) -> (String, String) {
        match &self.name {
            Some(name) if !self.description.is_empty() => {
                (name.clone(), self.description.join(" "))
            }
            _ => (EXAMPLE_NAME.to_string(), EXAMPLE_DESCRIPTION.to_string()),
        }
    }
}

/// What the CLI prints and logs: the run record plus related earlier features.
#[derive(Serialize)]
struct Report<'a> {
    #[serde(flatten)]
    record: &'a RunRecord,
    similar_features: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    info!("geocomply v{}", env!("CARGO_PKG_VERSION"));

    let catalog = load_catalog(&args.catalog)
        .with_context(|| format!("loading catalog {}", args.catalog.display()))?;

    let retriever: Arc<dyn Retriever> = match &args.retrieval_url {
        Some(url) => Arc::new(
            HttpRetriever::new(url.clone(), Duration::from_secs(args.retrieval_timeout_secs))
                .context("building retrieval client")?,
        ),
        None => {
            info!("no retrieval service configured, using catalog context only");
            Arc::new(NoRetriever)
        }
    };
    let generator = HttpGenerator::new(
        args.llm_url.clone(),
        args.llm_model.clone(),
        Duration::from_secs(args.llm_timeout_secs),
    )
    .context("building generation client")?
    .with_api_key(args.llm_api_key.clone());

    let settings = PipelineSettings {
        context: ContextLimits::default(),
        retrieval_top_k: args.top_k,
        max_tokens: args.max_tokens,
    };
    let pipeline = Pipeline::new(Arc::new(catalog), retriever, Arc::new(generator))
        .with_settings(settings)
        .with_embedding_model(args.embedding_model.clone());

    let (name, description) = args.feature();
    let record = pipeline
        .run(&name, &description)
        .await
        .with_context(|| format!("determining compliance for {name:?}"))?;

    let csv = CsvLog::new(&args.csv_log);
    let similar_features = csv
        .similar_features(&record.regulations, args.similar_top_n)
        .context("reading earlier determinations")?;
    let report = Report {
        record: &record,
        similar_features,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    eprint!("{}", summary::render(&record, &report.similar_features));

    csv.append(&record)
        .with_context(|| format!("appending to {}", csv.path().display()))?;
    if let Some(path) = &args.jsonl_log {
        JsonlLog::new(path)
            .append(&report)
            .with_context(|| format!("appending to {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use std::collections::BTreeMap;

    #[test]
    fn no_arguments_uses_builtin_example() {
        let args = Args::try_parse_from(["geocomply"]).unwrap();
        let (name, description) = args.feature();
        assert_eq!(name, EXAMPLE_NAME);
        assert!(description.starts_with("To comply with the Utah"));
    }

    #[test]
    fn name_without_description_uses_builtin_example() {
        let args = Args::try_parse_from(["geocomply", "Lonely name"]).unwrap();
        let (name, description) = args.feature();
        assert_eq!(name, EXAMPLE_NAME);
        assert_eq!(description, EXAMPLE_DESCRIPTION);
    }

    #[test]
    fn description_words_are_joined() {
        let args = Args::try_parse_from(["geocomply", "PF toggle", "Default", "off", "in", "EU"]).unwrap();
        assert_eq!(
            args.feature(),
            ("PF toggle".to_string(), "Default off in EU".to_string())
        );
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "geocomply",
            "--top-k",
            "3",
            "--max-tokens",
            "256",
            "--jsonl-log",
            "out.jsonl",
        ])
        .unwrap();
        assert_eq!(args.top_k, 3);
        assert_eq!(args.max_tokens, 256);
        assert_eq!(args.jsonl_log, Some(PathBuf::from("out.jsonl")));
        assert_eq!(args.similar_top_n, 5);
        assert_eq!(args.retrieval_timeout_secs, 30);
    }

    #[test]
    fn report_flattens_record() {
        let record = RunRecord {
            feature_name: "f".into(),
            needs_geo_compliance: false,
            confidence: 0.85,
            regulations: vec![],
            catalog_rule_ids: vec!["EU:DSA-1".into()],
            classifications: BTreeMap::new(),
            audits: BTreeMap::new(),
            retrieval_sources: vec![],
            timestamp: DateTime::from_timestamp(0, 0).unwrap(),
            models: BTreeMap::new(),
            embeddings: "e".into(),
        };
        let report = Report {
            record: &record,
            similar_features: vec!["earlier".into()],
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["feature_name"], "f");
        assert_eq!(value["catalog_rule_ids"], "EU:DSA-1");
        assert_eq!(value["similar_features"][0], "earlier");
    }
}
