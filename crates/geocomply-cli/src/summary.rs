//! Human-readable verdict card, written to stderr next to the JSON report.

use std::fmt::Write as _;

use geocomply_core::RunRecord;

const MAX_LIST_ITEMS: usize = 6;

/// Render a short card: verdict, confidence, regulations, and per-agent votes.
pub fn render(record: &RunRecord, similar: &[String]) -> String {
    let mut out = String::new();
    let verdict = if record.needs_geo_compliance {
        "COMPLIANCE REQUIRED"
    } else {
        "no geo-specific compliance"
    };
    let _ = writeln!(out, "── {} ──", record.feature_name);
    let _ = writeln!(out, "  verdict      {verdict} (confidence {:.3})", record.confidence);
    write_list(&mut out, "regulations", &record.regulations);
    write_list(&mut out, "catalog", &record.catalog_rule_ids);

    for (agent, c) in &record.classifications {
        let vote = if c.needs_geo_compliance { "yes" } else { "no" };
        let _ = writeln!(out, "  {agent:<16}{vote} ({:.2})", c.confidence);
    }
    for (agent, a) in &record.audits {
        let stance = match (a.approve, a.corrected_label) {
            (_, Some(label)) => format!("corrects label to {label}"),
            (true, None) if a.has_correction() => "approves, corrects regulations".to_string(),
            (true, None) => "approves".to_string(),
            (false, None) => "objects".to_string(),
        };
        let _ = writeln!(out, "  {agent:<16}{stance}");
    }
    write_list(&mut out, "similar", similar);
    out
}

fn write_list(out: &mut String, label: &str, items: &[String]) {
    if items.is_empty() {
        let _ = writeln!(out, "  {label:<13}(none)");
        return;
    }
    let shown: Vec<&str> = items.iter().take(MAX_LIST_ITEMS).map(String::as_str).collect();
    let more = items.len().saturating_sub(MAX_LIST_ITEMS);
    if more > 0 {
        let _ = writeln!(out, "  {label:<13}{} (+{more} more)", shown.join(", "));
    } else {
        let _ = writeln!(out, "  {label:<13}{}", shown.join(", "));
    }
}
