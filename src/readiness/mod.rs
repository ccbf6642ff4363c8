//! Readiness path: checklist completion blended with engineering signal and
//! market alignment into a banded, capped composite.

pub mod checklist;
pub mod engineering;
pub mod evidence;

pub use checklist::{ChecklistScore, score_checklist};
pub use engineering::{EngineeringMetrics, EngineeringSignalAnalyzer, EngineeringSignalResult};
pub use evidence::{EvidenceCounts, score_evidence};

use crate::scoring::{clamp_score, round1};

/// Composite weights: checklist / engineering / alignment.
const WEIGHT_CHECKLIST: f64 = 0.65;
const WEIGHT_ENGINEERING: f64 = 0.20;
const WEIGHT_ALIGNMENT: f64 = 0.15;

/// Ceiling applied while any critical requirement is unmet.
const UNMET_CRITICAL_CAP: f64 = 85.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, strum::Display)]
pub enum ReadinessBand {
    #[serde(rename = "Market Ready")]
    #[strum(serialize = "Market Ready")]
    MarketReady,
    #[serde(rename = "Competitive but risky")]
    #[strum(serialize = "Competitive but risky")]
    CompetitiveButRisky,
    #[serde(rename = "Focus gaps")]
    #[strum(serialize = "Focus gaps")]
    FocusGaps,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ReadinessResult {
    pub score: f64,
    pub checklist_score: f64,
    pub engineering_score: f64,
    pub market_alignment_score: f64,
    pub band: ReadinessBand,
    pub capped: bool,
    pub cap_reason: Option<String>,
    pub top_gaps: Vec<String>,
    pub next_actions: Vec<String>,
}

pub struct ReadinessAggregator;

impl ReadinessAggregator {
    /// `0.65 × checklist + 0.20 × engineering + 0.15 × alignment`, clamped to
    /// `[0, 100]`. An unmet critical requirement caps the composite at 85
    /// regardless of the raw blend.
    pub fn aggregate(
        checklist: &ChecklistScore,
        engineering_score: f64,
        market_alignment_score: f64,
    ) -> ReadinessResult {
        let checklist_score = clamp_score(checklist.score);
        let engineering_score = clamp_score(engineering_score);
        let market_alignment_score = clamp_score(market_alignment_score);

        let mut score = WEIGHT_CHECKLIST * checklist_score
            + WEIGHT_ENGINEERING * engineering_score
            + WEIGHT_ALIGNMENT * market_alignment_score;

        let mut capped = false;
        let mut cap_reason = None;
        if checklist.has_unmet_critical {
            if score > UNMET_CRITICAL_CAP {
                score = UNMET_CRITICAL_CAP;
            }
            capped = true;
            cap_reason = Some(format!(
                "Missing critical requirement(s): {}",
                checklist.missing_critical.join(", ")
            ));
        }

        let score = round1(clamp_score(score));
        ReadinessResult {
            score,
            checklist_score,
            engineering_score,
            market_alignment_score,
            band: band_for(score),
            capped,
            cap_reason,
            top_gaps: checklist.top_gaps.clone(),
            next_actions: checklist.next_actions.clone(),
        }
    }
}

fn band_for(score: f64) -> ReadinessBand {
    if score >= 85.0 {
        ReadinessBand::MarketReady
    } else if score >= 65.0 {
        ReadinessBand::CompetitiveButRisky
    } else {
        ReadinessBand::FocusGaps
    }
}
