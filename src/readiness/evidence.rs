//! Scores the density of a user's verified proof submissions.

use crate::scoring::{clamp_score, round2};
use crate::store::{EvidenceRecord, EvidenceStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EvidenceCounts {
    pub verified: usize,
    pub repo_verified: usize,
    pub total: usize,
}

/// `100 × (0.7 × verified ratio + 0.3 × repo-verified ratio)`; zero when the
/// user has no proof records at all.
pub fn score_evidence(records: &[EvidenceRecord]) -> (f64, EvidenceCounts) {
    if records.is_empty() {
        return (0.0, EvidenceCounts::default());
    }

    let total = records.len();
    let verified = records
        .iter()
        .filter(|r| r.status == EvidenceStatus::Verified)
        .count();
    let repo_verified = records.iter().filter(|r| r.repo_verified()).count();

    let ratio = (verified as f64 / total as f64) * 0.7 + (repo_verified as f64 / total as f64) * 0.3;
    (
        round2(clamp_score(ratio * 100.0)),
        EvidenceCounts {
            verified,
            repo_verified,
            total,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::{Map, Value};
    use uuid::Uuid;

    fn record(status: EvidenceStatus, repo_verified: bool) -> EvidenceRecord {
        let mut metadata = Map::new();
        if repo_verified {
            metadata.insert("repo_verified".into(), Value::Bool(true));
        }
        EvidenceRecord {
            id: Uuid::new_v4(),
            checklist_item_id: None,
            status,
            proof_type: "link".into(),
            proficiency_level: None,
            metadata,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_records_score_zero() {
        let (score, counts) = score_evidence(&[]);
        assert_eq!(score, 0.0);
        assert_eq!(counts, EvidenceCounts::default());
    }

    #[test]
    fn weighted_blend_of_verified_and_repo_verified() {
        let records = vec![
            record(EvidenceStatus::Verified, true),
            record(EvidenceStatus::Submitted, false),
        ];
        // verified 1/2, repo 1/2 → (0.7*0.5 + 0.3*0.5) * 100 = 50.
        let (score, counts) = score_evidence(&records);
        assert_eq!(score, 50.0);
        assert_eq!(counts.verified, 1);
        assert_eq!(counts.repo_verified, 1);
        assert_eq!(counts.total, 2);
    }

    #[test]
    fn all_verified_and_repo_verified_is_a_hundred() {
        let records = vec![record(EvidenceStatus::Verified, true)];
        let (score, _) = score_evidence(&records);
        assert_eq!(score, 100.0);
    }

    #[test]
    fn rejected_and_pending_records_dilute_the_score() {
        let records = vec![
            record(EvidenceStatus::Verified, false),
            record(EvidenceStatus::Rejected, false),
            record(EvidenceStatus::NeedsMoreEvidence, false),
            record(EvidenceStatus::Submitted, false),
        ];
        let (score, counts) = score_evidence(&records);
        assert_eq!(score, round2(0.25 * 0.7 * 100.0));
        assert_eq!(counts.verified, 1);
        assert_eq!(counts.repo_verified, 0);
    }
}
