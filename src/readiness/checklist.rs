//! Checklist completion scoring: tier-weighted progress with recency and
//! deployment bonuses.

use crate::scoring::{round1, round3};
use crate::store::{ChecklistItem, ChecklistTier, EvidenceRecord, EvidenceStatus};
use chrono::Utc;
use std::collections::HashSet;
use uuid::Uuid;

const RECENCY_WINDOW_DAYS: i64 = 180;
const RECENCY_MAX_BONUS: f64 = 0.1;
const DEPLOYMENT_BONUS: f64 = 0.1;

#[derive(Debug, Clone, Default)]
pub struct ChecklistScore {
    /// Completion score in `[0, 100]`.
    pub score: f64,
    pub has_unmet_critical: bool,
    pub missing_critical: Vec<String>,
    pub top_gaps: Vec<String>,
    pub next_actions: Vec<String>,
}

/// 0.6 × non-negotiable completion + 0.3 × strong-signal completion, plus a
/// recency bonus that decays linearly over 180 days since the newest verified
/// proof and a flat bonus for any deployed-URL proof.
pub fn score_checklist(items: &[ChecklistItem], proofs: &[EvidenceRecord]) -> ChecklistScore {
    let completed: HashSet<Uuid> = proofs
        .iter()
        .filter(|p| p.status == EvidenceStatus::Verified)
        .filter_map(|p| p.checklist_item_id)
        .collect();

    let non_negotiables: Vec<&ChecklistItem> = items
        .iter()
        .filter(|i| i.tier == ChecklistTier::NonNegotiable)
        .collect();
    let strong_signals: Vec<&ChecklistItem> = items
        .iter()
        .filter(|i| i.tier == ChecklistTier::StrongSignal)
        .collect();

    let completed_n = non_negotiables.iter().filter(|i| completed.contains(&i.id)).count();
    let completed_s = strong_signals.iter().filter(|i| completed.contains(&i.id)).count();
    let n = non_negotiables.len().max(1) as f64;
    let s = strong_signals.len().max(1) as f64;

    let base = 0.6 * (completed_n as f64 / n)
        + 0.3 * (completed_s as f64 / s)
        + recency_bonus(proofs)
        + deployment_bonus(proofs);
    let base = base.clamp(0.0, 1.0);

    let missing_critical: Vec<String> = non_negotiables
        .iter()
        .filter(|i| i.is_critical && !completed.contains(&i.id))
        .map(|i| i.title.clone())
        .collect();

    let gaps: Vec<&&ChecklistItem> = non_negotiables
        .iter()
        .filter(|i| !completed.contains(&i.id))
        .chain(strong_signals.iter().filter(|i| !completed.contains(&i.id)))
        .collect();
    let top_gaps: Vec<String> = gaps.iter().take(5).map(|i| i.title.clone()).collect();
    let next_actions: Vec<String> = gaps
        .iter()
        .take(3)
        .map(|i| format!("Complete requirement: {}", i.title))
        .collect();

    ChecklistScore {
        score: round1(base * 100.0),
        has_unmet_critical: !missing_critical.is_empty(),
        missing_critical,
        top_gaps,
        next_actions,
    }
}

fn recency_bonus(proofs: &[EvidenceRecord]) -> f64 {
    let most_recent = proofs
        .iter()
        .filter(|p| p.status == EvidenceStatus::Verified)
        .map(|p| p.created_at)
        .max();
    let Some(most_recent) = most_recent else {
        return 0.0;
    };

    let days = (Utc::now() - most_recent).num_days();
    if days <= 0 {
        return RECENCY_MAX_BONUS;
    }
    if days >= RECENCY_WINDOW_DAYS {
        return 0.0;
    }
    round3(RECENCY_MAX_BONUS * (1.0 - days as f64 / RECENCY_WINDOW_DAYS as f64))
}

fn deployment_bonus(proofs: &[EvidenceRecord]) -> f64 {
    if proofs.iter().any(|p| p.proof_type == "deployed_url") {
        DEPLOYMENT_BONUS
    } else {
        0.0
    }
}
