//! Catalog grounding for a feature description.
//!
//! Two tiers:
//!
//! 1. **Jurisdiction-guided.** Infer jurisdictions from a fixed keyword table
//!    and take the first few rules of the first few laws filed under each.
//! 2. **Keyword overlap.** Only when tier 1 produces nothing: score every
//!    rule by how many of its title words occur in the feature text and keep
//!    the best few.
//!
//! Keyword matching on jurisdictions misses silently whenever the feature
//! avoids the table's phrasing, so the overlap tier recovers partial
//! grounding instead of handing the committee an empty catalog section.

use std::collections::HashSet;

use geocomply_core::{Catalog, Rule};
use tracing::debug;

/// Case-insensitive substring triggers per jurisdiction, in detection order.
const JURISDICTION_KEYWORDS: &[(&str, &[&str])] = &[
    ("EU", &["eea", "eu", "european union", "europe"]),
    ("US-Utah", &["utah"]),
    ("US-Florida", &["florida"]),
    ("US-California", &["california", " ca "]),
    (
        "US-Federal",
        &["ncmec", "federal", "18 u.s.c", "us code", "us federal"],
    ),
];

/// Characters stripped from both ends of feature words before matching.
const WORD_PUNCTUATION: &[char] = &[',', '.', ':', ';', '(', ')', '[', ']'];

/// Caps applied when selecting catalog rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextLimits {
    pub max_laws_per_jurisdiction: usize,
    pub max_rules_per_law: usize,
    /// Rules kept by the keyword-overlap fallback.
    pub fallback_top_k: usize,
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self {
            max_laws_per_jurisdiction: 2,
            max_rules_per_law: 2,
            fallback_top_k: 4,
        }
    }
}

/// Rendered catalog evidence plus the `jurisdiction:rule_id` of each rule used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogContext {
    pub text: String,
    pub rule_ids: Vec<String>,
}

impl CatalogContext {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn from_rules<'a>(rules: impl IntoIterator<Item = (&'a str, &'a Rule)>) -> Self {
        let mut parts = Vec::new();
        let mut rule_ids = Vec::new();
        for (jurisdiction, rule) in rules {
            parts.push(render_rule(jurisdiction, rule));
            rule_ids.push(format!("{jurisdiction}:{}", rule.rule_id));
        }
        Self {
            text: parts.join("\n\n"),
            rule_ids,
        }
    }
}

/// Build catalog evidence for `feature_text`, falling back to keyword
/// overlap when jurisdiction inference yields nothing.
pub fn build_context(
    catalog: &Catalog,
    feature_text: &str,
    limits: &ContextLimits,
) -> CatalogContext {
    let primary = jurisdiction_context(catalog, feature_text, limits);
    if !primary.is_empty() {
        return primary;
    }
    let fallback = keyword_fallback(catalog, feature_text, limits.fallback_top_k);
    debug!(
        rules = fallback.rule_ids.len(),
        "jurisdiction lookup empty, used keyword fallback"
    );
    fallback
}

/// Jurisdictions mentioned in `text`, in table order, without duplicates.
pub fn guess_jurisdictions(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    let mut found: Vec<&'static str> = Vec::new();
    for &(jurisdiction, keywords) in JURISDICTION_KEYWORDS {
        if keywords.iter().any(|k| lower.contains(k)) && !found.contains(&jurisdiction) {
            found.push(jurisdiction);
        }
    }
    found
}

/// Tier 1: rules from the laws filed under each inferred jurisdiction.
pub fn jurisdiction_context(
    catalog: &Catalog,
    feature_text: &str,
    limits: &ContextLimits,
) -> CatalogContext {
    let jurisdictions = guess_jurisdictions(feature_text);
    debug!(?jurisdictions, "inferred jurisdictions");

    let selected = jurisdictions.into_iter().flat_map(|j| {
        catalog
            .laws(j)
            .iter()
            .take(limits.max_laws_per_jurisdiction)
            .flat_map(move |law| {
                law.rules
                    .iter()
                    .take(limits.max_rules_per_law)
                    .map(move |rule| (j, rule))
            })
    });
    CatalogContext::from_rules(selected)
}

/// Tier 2: rules whose title shares the most words with the feature text.
///
/// Ties keep catalog order; rules with no overlap are never returned.
pub fn keyword_fallback(catalog: &Catalog, feature_text: &str, top_k: usize) -> CatalogContext {
    let features = feature_keywords(feature_text);

    let mut scored: Vec<(usize, &str, &Rule)> = catalog
        .rules()
        .filter_map(|(j, rule)| {
            let title = rule.title.to_lowercase();
            let score = title
                .split_whitespace()
                .collect::<HashSet<_>>()
                .into_iter()
                .filter(|token| features.contains(*token))
                .count();
            (score > 0).then_some((score, j, rule))
        })
        .collect();
    // Stable sort keeps catalog order within equal scores.
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    CatalogContext::from_rules(
        scored
            .into_iter()
            .take(top_k)
            .map(|(_, j, rule)| (j, rule)),
    )
}

/// Lowercased words longer than three characters, outer punctuation removed.
fn feature_keywords(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .filter(|w| w.chars().count() > 3)
        .map(|w| w.trim_matches(WORD_PUNCTUATION).to_lowercase())
        .collect()
}

fn render_rule(jurisdiction: &str, rule: &Rule) -> String {
    format!(
        "[CAT {jurisdiction} {}] {} — {}",
        rule.rule_id, rule.title, rule.text
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use geocomply_core::LawArtifact;

    fn rule(id: &str, title: &str) -> Rule {
        Rule {
            rule_id: id.into(),
            title: title.into(),
            section: None,
            text: format!("{title} obligation text."),
            keywords: vec![],
            citations: vec![],
        }
    }

    fn law(jurisdiction: &str, filename: &str, rules: Vec<Rule>) -> LawArtifact {
        LawArtifact {
            filename: filename.into(),
            original_file: String::new(),
            md_file: String::new(),
            title: filename.into(),
            regulatory_area: String::new(),
            jurisdiction: Some(jurisdiction.into()),
            law_identifiers: vec![],
            rules,
        }
    }

    fn sample_catalog() -> Catalog {
        Catalog::from_artifacts(vec![
            law(
                "US-Utah",
                "utah_smra.md",
                vec![
                    rule("UT-1", "Curfew for minor accounts"),
                    rule("UT-2", "Age verification"),
                    rule("UT-3", "Parental consent"),
                ],
            ),
            law(
                "EU",
                "dsa.md",
                vec![
                    rule("DSA-Art15-1", "Transparency Reporting"),
                    rule("DSA-Art16-1", "Notice and action mechanisms"),
                ],
            ),
            law("US-Federal", "ncmec.md", vec![rule("2258A-1", "Reporting child abuse")]),
        ])
    }

    #[test]
    fn utah_feature_takes_first_two_rules() {
        let ctx = build_context(
            &sample_catalog(),
            "Curfew login blocker for Utah minors",
            &ContextLimits::default(),
        );
        assert_eq!(ctx.rule_ids, vec!["US-Utah:UT-1", "US-Utah:UT-2"]);
        assert!(ctx.text.contains("[CAT US-Utah UT-1] Curfew for minor accounts — "));
        assert!(ctx.text.contains("[CAT US-Utah UT-2] Age verification — "));
        assert!(!ctx.text.contains("UT-3"));
        assert_eq!(ctx.text.matches("[CAT ").count(), 2);
    }

    #[test]
    fn rules_are_separated_by_blank_lines() {
        let ctx = jurisdiction_context(&sample_catalog(), "utah", &ContextLimits::default());
        assert_eq!(ctx.text.split("\n\n").count(), 2);
    }

    #[test]
    fn jurisdictions_detected_in_table_order_without_duplicates() {
        let js = guess_jurisdictions("NCMEC reporting for Utah and European Union users in the EU");
        assert_eq!(js, vec!["EU", "US-Utah", "US-Federal"]);
    }

    #[test]
    fn jurisdiction_matching_is_case_insensitive_substring() {
        assert_eq!(guess_jurisdictions("FLORIDA minors"), vec!["US-Florida"]);
        assert_eq!(guess_jurisdictions("Rollout in ca only"), vec!["US-California"]);
        assert_eq!(guess_jurisdictions("Cites 18 U.S.C. 2258A"), vec!["US-Federal"]);
        assert!(guess_jurisdictions("Dark mode toggle").is_empty());
    }

    #[test]
    fn law_and_rule_caps_apply() {
        let catalog = Catalog::from_artifacts(vec![
            law("EU", "a.md", vec![rule("A-1", "a"), rule("A-2", "b")]),
            law("EU", "b.md", vec![rule("B-1", "c")]),
            law("EU", "c.md", vec![rule("C-1", "d")]),
        ]);
        let limits = ContextLimits {
            max_laws_per_jurisdiction: 2,
            max_rules_per_law: 1,
            fallback_top_k: 4,
        };
        let ctx = jurisdiction_context(&catalog, "EU rollout", &limits);
        assert_eq!(ctx.rule_ids, vec!["EU:A-1", "EU:B-1"]);
    }

    #[test]
    fn inferred_jurisdiction_without_catalog_entries_falls_back() {
        // "Florida" is inferred but has no laws; title overlap still grounds it.
        let ctx = build_context(
            &sample_catalog(),
            "Florida parental consent flow",
            &ContextLimits::default(),
        );
        assert_eq!(ctx.rule_ids, vec!["US-Utah:UT-3"]);
    }

    #[test]
    fn fallback_ranks_overlap_above_zero_overlap() {
        let ctx = keyword_fallback(
            &sample_catalog(),
            "Quarterly transparency reporting dashboard for moderators",
            4,
        );
        assert_eq!(ctx.rule_ids[0], "EU:DSA-Art15-1");
        // Zero-overlap rules are dropped entirely.
        assert!(!ctx.rule_ids.contains(&"US-Utah:UT-2".to_string()));
    }

    #[test]
    fn fallback_ties_keep_catalog_order() {
        let ctx = keyword_fallback(&sample_catalog(), "reporting pipeline", 4);
        assert_eq!(ctx.rule_ids, vec!["EU:DSA-Art15-1", "US-Federal:2258A-1"]);
    }

    #[test]
    fn fallback_strips_punctuation_and_ignores_short_words() {
        // "(curfew)," survives stripping; "for" and "age" are too short.
        let ctx = keyword_fallback(&sample_catalog(), "A (curfew), for age", 4);
        assert_eq!(ctx.rule_ids, vec!["US-Utah:UT-1"]);
    }

    #[test]
    fn fallback_respects_top_k() {
        let ctx = keyword_fallback(&sample_catalog(), "reporting", 1);
        assert_eq!(ctx.rule_ids.len(), 1);
    }

    #[test]
    fn no_signal_gives_empty_context() {
        let ctx = build_context(&sample_catalog(), "Dark mode toggle", &ContextLimits::default());
        assert!(ctx.is_empty());
        assert!(ctx.rule_ids.is_empty());
    }
}
