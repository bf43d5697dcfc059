//! Append-only run logs: a flattened CSV table and a JSONL trace.
//!
//! The CSV has a fixed header. List-valued fields are pipe-joined and
//! object-valued fields are inlined as JSON, quoted per RFC 4180.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use geocomply_core::RunRecord;
use serde::Serialize;
use tracing::{debug, info};

use crate::StoreError;

pub const DEFAULT_CSV_LOG: &str = "data/outputs.csv";

/// Column order of the CSV log.
pub const CSV_HEADER: [&str; 12] = [
    "feature_name",
    "needs_geo_compliance",
    "confidence",
    "regulations",
    "classifier_A",
    "classifier_B",
    "auditor_strict",
    "auditor_risk",
    "retrieval_sources",
    "timestamp",
    "models",
    "embeddings",
];

/// CSV table of past determinations.
pub struct CsvLog {
    path: PathBuf,
}

impl CsvLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, writing the header first if the file is new or empty.
    pub fn append(&self, record: &RunRecord) -> Result<(), StoreError> {
        ensure_parent(&self.path)?;
        let needs_header = fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let mut out = String::new();
        if needs_header {
            push_csv_line(&mut out, CSV_HEADER.iter().copied());
        }
        let row = csv_row(record)?;
        push_csv_line(&mut out, row.iter().map(String::as_str));

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(out.as_bytes())?;
        info!(
            path = %self.path.display(),
            feature = %record.feature_name,
            "appended csv row"
        );
        Ok(())
    }

    /// Names of earlier features whose regulations overlap `regulations`.
    ///
    /// Returns at most `top_n` names in log order. A missing log or an empty
    /// regulation list yields no matches.
    pub fn similar_features(
        &self,
        regulations: &[String],
        top_n: usize,
    ) -> Result<Vec<String>, StoreError> {
        if regulations.is_empty() || !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.path)?;
        let mut rows = parse_csv(&text).into_iter();
        let Some(header) = rows.next() else {
            return Ok(Vec::new());
        };
        let (Some(name_idx), Some(regs_idx)) = (
            header.iter().position(|h| h == "feature_name"),
            header.iter().position(|h| h == "regulations"),
        ) else {
            return Ok(Vec::new());
        };

        let matches: Vec<String> = rows
            .filter(|row| {
                row.get(regs_idx).is_some_and(|prior| {
                    prior
                        .split('|')
                        .any(|reg| regulations.iter().any(|r| r == reg))
                })
            })
            .filter_map(|row| row.get(name_idx).cloned())
            .take(top_n)
            .collect();
        debug!(matches = matches.len(), "similar feature lookup");
        Ok(matches)
    }
}

/// One JSON document per line.
pub struct JsonlLog {
    path: PathBuf,
}

impl JsonlLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn append<T: Serialize>(&self, row: &T) -> Result<(), StoreError> {
        ensure_parent(&self.path)?;
        let mut line = serde_json::to_string(row)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        info!(path = %self.path.display(), "appended jsonl row");
        Ok(())
    }
}

/// Flatten a record into CSV field values, in [`CSV_HEADER`] order.
pub fn csv_row(record: &RunRecord) -> Result<Vec<String>, StoreError> {
    Ok(vec![
        record.feature_name.clone(),
        record.needs_geo_compliance.to_string(),
        record.confidence.to_string(),
        record.regulations.join("|"),
        agent_column(&record.classifications, "classifier_A")?,
        agent_column(&record.classifications, "classifier_B")?,
        agent_column(&record.audits, "auditor_strict")?,
        agent_column(&record.audits, "auditor_risk")?,
        serde_json::to_string(&record.retrieval_sources)?,
        record.timestamp.to_rfc3339(),
        serde_json::to_string(&record.models)?,
        record.embeddings.clone(),
    ])
}

fn agent_column<T: Serialize>(
    outputs: &BTreeMap<String, T>,
    agent: &str,
) -> Result<String, StoreError> {
    Ok(match outputs.get(agent) {
        Some(output) => serde_json::to_string(output)?,
        None => String::new(),
    })
}

fn ensure_parent(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn push_csv_line<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    let quoted: Vec<String> = fields.map(quote_field).collect();
    out.push_str(&quoted.join(","));
    out.push_str("\r\n");
}

fn quote_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Minimal RFC 4180 reader: quoted fields may hold commas, quotes, newlines.
fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}
