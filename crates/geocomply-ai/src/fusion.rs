//! Decision fusion: collapse the committee's outputs into one verdict.
//!
//! The rule is deliberately asymmetric. A negative determination needs
//! unanimity: every classifier says "no" and every auditor approves without
//! proposing a correction. Anything short of that resolves toward
//! "compliance required" unless the auditors unanimously correct the label
//! the other way. Missing a legal obligation costs far more than reviewing a
//! feature that turns out not to need it, so this must not be replaced by a
//! majority vote.

use std::collections::BTreeSet;

use geocomply_core::{AuditResult, Classification};

/// Longest regulation list a verdict carries.
pub const MAX_REGULATIONS: usize = 6;

/// Minimum confidence reported for a unanimous negative.
pub const CONSENSUS_NEGATIVE_FLOOR: f64 = 0.85;

#[derive(Debug, Clone, PartialEq)]
pub struct FusionOutcome {
    pub needs_geo_compliance: bool,
    pub confidence: f64,
    pub regulations: Vec<String>,
}

/// Fuse classifier and auditor outputs.
///
/// 1. Consensus negative (no classifier flags need, every auditor gives a
///    clean approval): `false`, confidence floored at
///    [`CONSENSUS_NEGATIVE_FLOOR`].
/// 2. Otherwise, if every auditor supplied a `corrected_label` and they
///    agree, that label wins.
/// 3. Otherwise `true` if any classifier voted `true` or any auditor
///    corrected toward `true`. Only the value of a correction counts here,
///    not its presence: a lone `false` correction never forces `true`.
///
/// Confidence is the classifiers' mean rounded to three decimals. Regulations
/// are the sorted, deduplicated union of classifier candidates and auditor
/// corrections, capped at [`MAX_REGULATIONS`].
pub fn fuse(classifications: &[Classification], audits: &[AuditResult]) -> FusionOutcome {
    let all_no = classifications.iter().all(|c| !c.needs_geo_compliance);
    let all_approve = audits.iter().all(AuditResult::is_clean_approval);
    let consensus_negative = all_no && all_approve;

    let needs_geo_compliance = if consensus_negative {
        false
    } else {
        let corrections: Vec<bool> = audits.iter().filter_map(|a| a.corrected_label).collect();
        let unanimous_correction = !audits.is_empty()
            && corrections.len() == audits.len()
            && corrections.iter().all(|&c| c == corrections[0]);
        if unanimous_correction {
            corrections[0]
        } else {
            !all_no || corrections.contains(&true)
        }
    };

    let mut confidence = round3(mean(classifications.iter().map(|c| c.confidence)));
    if consensus_negative {
        confidence = confidence.max(CONSENSUS_NEGATIVE_FLOOR);
    }

    FusionOutcome {
        needs_geo_compliance,
        confidence,
        regulations: merge_regulations(classifications, audits),
    }
}

fn merge_regulations(classifications: &[Classification], audits: &[AuditResult]) -> Vec<String> {
    let candidates = classifications
        .iter()
        .flat_map(|c| c.regulation_candidates.iter());
    let corrections = audits
        .iter()
        .filter_map(|a| a.corrected_regs.as_ref())
        .flatten();
    candidates
        .chain(corrections)
        .cloned()
        .collect::<BTreeSet<String>>()
        .into_iter()
        .take(MAX_REGULATIONS)
        .collect()
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    values.sum::<f64>() / n as f64
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
