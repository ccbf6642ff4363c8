//! Top-level market stress test: required-skill overlap, proof density, and
//! vacancy momentum combined into one composite, with a projection of how the
//! score weathers automation pressure.
//!
//! Required skills and benchmarks resolve independently, each with its own
//! live→snapshot fallback; the whole composite is additionally snapshotted so
//! a total provider outage can still serve the previous full result.

use crate::error::Result;
use crate::market::benchmark::{
    HiringCompany, MarketBenchmarkResolver, QueryMode, TrendLabel,
};
use crate::providers::vacancy::SeriesPoint;
use crate::readiness::evidence::{EvidenceCounts, score_evidence};
use crate::scoring::{clamp_score, round1, round2};
use crate::skills::canonical::{normalize_skill, resilience_multiplier};
use crate::skills::repo_verify::RepositorySkillVerifier;
use crate::skills::requirements::SkillRequirementResolver;
use crate::snapshot::{SnapshotKind, SnapshotStore, SourceMode, cache_key};
use crate::store::DataStore;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

pub const STRESS_FORMULA: &str =
    "MRI = (0.40 * Skill Match) + (0.30 * Market Demand) + (0.30 * Proof Density)";
pub const STRESS_FORMULA_VERSION: &str = "2026.1";

const WEIGHT_SKILL_OVERLAP: f64 = 0.40;
const WEIGHT_EVIDENCE: f64 = 0.30;
const WEIGHT_MARKET: f64 = 0.30;

const MISSING_SKILLS_LIMIT: usize = 10;
const PROJECTION_LIST_LIMIT: usize = 8;
const REPO_MISSING_LIMIT: usize = 15;

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct ComponentScores {
    pub skill_overlap: f64,
    pub evidence_verification: f64,
    pub market_trend: f64,
}

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct ComponentWeights {
    pub skill_overlap: f64,
    pub evidence_verification: f64,
    pub market_trend: f64,
}

impl Default for ComponentWeights {
    fn default() -> Self {
        Self {
            skill_overlap: WEIGHT_SKILL_OVERLAP,
            evidence_verification: WEIGHT_EVIDENCE,
            market_trend: WEIGHT_MARKET,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

/// Forward-looking projection under automation pressure.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Projection {
    pub projected_score: f64,
    pub delta: f64,
    pub risk_level: RiskLevel,
    pub at_risk_skills: Vec<String>,
    pub growth_skills: Vec<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Citation {
    pub source: String,
    pub signal: String,
    pub value: Value,
    pub note: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StressTestResult {
    pub score: f64,
    pub formula: String,
    pub formula_version: String,
    pub computed_at: DateTime<Utc>,
    pub components: ComponentScores,
    pub weights: ComponentWeights,
    pub required_skills_count: usize,
    pub matched_skills_count: usize,
    pub missing_skills: Vec<String>,
    pub salary_average: Option<f64>,
    pub salary_percentile_local: Option<f64>,
    pub top_hiring_companies: Vec<HiringCompany>,
    pub vacancy_growth_percent: f64,
    pub volatility_score: f64,
    pub trend_label: TrendLabel,
    pub volatility_points: Vec<SeriesPoint>,
    /// Blend of vacancy momentum with salary and trend slope signals.
    pub stability_outlook: f64,
    pub query_mode: QueryMode,
    pub role_query_used: String,
    pub location_used: String,
    pub evidence_counts: EvidenceCounts,
    pub projection: Projection,
    pub citations: Vec<Citation>,
    pub source_mode: SourceMode,
    pub snapshot_age_minutes: Option<f64>,
    pub provider_status: BTreeMap<String, String>,
}

/// Result of a repository verification pass over the required skills.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RepoProofReport {
    pub repo_url: String,
    pub required_skills_count: usize,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub match_count: usize,
    pub confidence: f64,
    pub files_checked: Vec<String>,
    pub repos_checked: Vec<String>,
    pub languages_detected: Vec<String>,
    pub trend_label: TrendLabel,
    /// The evidence record that was annotated, when one was requested and found.
    pub annotated_proof: Option<Uuid>,
}

pub struct MarketStressOrchestrator {
    skills: SkillRequirementResolver,
    benchmarks: MarketBenchmarkResolver,
    verifier: RepositorySkillVerifier,
    store: Arc<dyn DataStore>,
    snapshots: SnapshotStore,
    stress_ttl: Duration,
}

impl MarketStressOrchestrator {
    pub fn new(
        skills: SkillRequirementResolver,
        benchmarks: MarketBenchmarkResolver,
        verifier: RepositorySkillVerifier,
        store: Arc<dyn DataStore>,
        snapshots: SnapshotStore,
    ) -> Self {
        Self {
            skills,
            benchmarks,
            verifier,
            store,
            snapshots,
            stress_ttl: Duration::hours(24),
        }
    }

    pub fn with_stress_ttl(mut self, ttl: Duration) -> Self {
        self.stress_ttl = ttl;
        self
    }

    /// Compute the full stress test for `user_id` targeting `(target_role,
    /// location)`. Requires both skills and benchmarks to resolve, live or
    /// from their snapshots; a previously computed composite is served when
    /// neither input can be produced at all.
    pub async fn run(
        &self,
        user_id: &str,
        target_role: &str,
        location: &str,
    ) -> Result<StressTestResult> {
        let key = cache_key(&[user_id, target_role, location]);

        let skills_result = self.skills.resolve(target_role).await;
        let benchmark_result = self.benchmarks.resolve(target_role, location).await;

        let (skills, resolved_benchmark) = match (skills_result, benchmark_result) {
            (Ok(skills), Ok(benchmark)) => (skills, benchmark),
            (Err(e), _) | (_, Err(e)) => {
                if e.is_provider_unavailable()
                    && let Some(result) = self.from_snapshot(&key).await
                {
                    return Ok(result);
                }
                return Err(e);
            }
        };
        let benchmark = &resolved_benchmark.benchmark;

        let verified: HashSet<String> = self
            .store
            .verified_skill_names(user_id)
            .await?
            .iter()
            .map(|name| normalize_skill(name))
            .filter(|name| !name.is_empty())
            .collect();

        let required: Vec<String> = skills
            .skills
            .iter()
            .map(|s| s.canonical_name.clone())
            .collect();
        let matched_skills_count = required.iter().filter(|s| verified.contains(*s)).count();
        let skill_overlap = if required.is_empty() {
            0.0
        } else {
            round2(matched_skills_count as f64 / required.len() as f64 * 100.0)
        };

        let proofs = self.store.proofs_for_user(user_id).await?;
        let (evidence_score, evidence_counts) = score_evidence(&proofs);
        let market_trend = round2(clamp_score(benchmark.vacancy_index));

        let score = round2(clamp_score(
            WEIGHT_SKILL_OVERLAP * skill_overlap
                + WEIGHT_EVIDENCE * evidence_score
                + WEIGHT_MARKET * market_trend,
        ));

        let projection = build_projection(score, &required, &verified, market_trend);
        let stability_outlook =
            stability_outlook(market_trend, benchmark.salary_average, benchmark.trend_label);

        let missing_skills: Vec<String> = required
            .iter()
            .filter(|s| !verified.contains(*s))
            .take(MISSING_SKILLS_LIMIT)
            .cloned()
            .collect();

        let mut provider_status = BTreeMap::new();
        provider_status.insert(
            "careeronestop".to_string(),
            status_label(skills.source_mode),
        );
        provider_status.insert(
            "adzuna".to_string(),
            status_label(resolved_benchmark.source_mode),
        );

        let (source_mode, snapshot_age_minutes) = combined_freshness(
            skills.source_mode,
            skills.snapshot_age_minutes,
            resolved_benchmark.source_mode,
            resolved_benchmark.snapshot_age_minutes,
        );

        let citations = vec![
            Citation {
                source: "CareerOneStop Skills Matcher".into(),
                signal: "required_skill_overlap".into(),
                value: json!(format!("{matched_skills_count}/{}", required.len())),
                note: "Federal skill-standard overlap for the target role.".into(),
            },
            Citation {
                source: "Adzuna History/Histogram".into(),
                signal: "market_trend_score".into(),
                value: json!(market_trend),
                note: "Local vacancy momentum and salary signal.".into(),
            },
            Citation {
                source: "Proof + repository verification".into(),
                signal: "proof_density".into(),
                value: json!(evidence_score),
                note: "Evidence quality from verified submissions and repo checks.".into(),
            },
        ];

        let result = StressTestResult {
            score,
            formula: STRESS_FORMULA.to_string(),
            formula_version: STRESS_FORMULA_VERSION.to_string(),
            computed_at: Utc::now(),
            components: ComponentScores {
                skill_overlap,
                evidence_verification: evidence_score,
                market_trend,
            },
            weights: ComponentWeights::default(),
            required_skills_count: required.len(),
            matched_skills_count,
            missing_skills,
            salary_average: benchmark.salary_average,
            salary_percentile_local: benchmark.salary_percentile_local,
            top_hiring_companies: benchmark.top_hiring_companies.clone(),
            vacancy_growth_percent: benchmark.vacancy_growth_percent,
            volatility_score: benchmark.volatility_score,
            trend_label: benchmark.trend_label,
            volatility_points: benchmark.volatility_points.clone(),
            stability_outlook,
            query_mode: benchmark.query_mode,
            role_query_used: benchmark.role_query_used.clone(),
            location_used: benchmark.location_used.clone(),
            evidence_counts,
            projection,
            citations,
            source_mode,
            snapshot_age_minutes,
            provider_status,
        };

        if let Err(e) = self
            .snapshots
            .put(SnapshotKind::StressResult, &key, &result)
            .await
        {
            tracing::warn!(user_id, target_role, "failed to snapshot stress result: {e}");
        }

        Ok(result)
    }

    async fn from_snapshot(&self, key: &str) -> Option<StressTestResult> {
        let hit = self
            .snapshots
            .get::<StressTestResult>(SnapshotKind::StressResult, key, self.stress_ttl)
            .await?;
        tracing::info!(key, age_minutes = hit.age_minutes, "serving stress result from snapshot");

        let mut result = hit.value;
        result.source_mode = SourceMode::SnapshotFallback;
        result.snapshot_age_minutes = Some(hit.age_minutes);
        for status in result.provider_status.values_mut() {
            *status = SourceMode::SnapshotFallback.to_string();
        }
        Some(result)
    }

    /// Verify a repository against the role's required skills and, when a
    /// proof id is given, annotate that record with the findings.
    pub async fn check_repository(
        &self,
        user_id: &str,
        target_role: &str,
        location: &str,
        repo_url: &str,
        proof_id: Option<Uuid>,
    ) -> Result<RepoProofReport> {
        let skills = self.skills.resolve(target_role).await?;
        let required: Vec<String> = skills
            .skills
            .iter()
            .map(|s| s.canonical_name.clone())
            .collect();

        let verification = self.verifier.verify(repo_url, &required).await;

        let mut annotated_proof = None;
        if let Some(proof_id) = proof_id {
            let mut patch = Map::new();
            patch.insert("repo_url".into(), json!(repo_url));
            patch.insert("repo_verified".into(), json!(!verification.matched_skills.is_empty()));
            patch.insert("repo_matched_skills".into(), json!(verification.matched_skills));
            patch.insert("repo_confidence".into(), json!(verification.confidence));
            patch.insert("repo_files_checked".into(), json!(verification.files_checked));
            if self.store.annotate_proof(user_id, proof_id, patch).await? {
                annotated_proof = Some(proof_id);
            } else {
                tracing::warn!(user_id, %proof_id, "proof to annotate was not found");
            }
        }

        let benchmark = self.benchmarks.resolve(target_role, location).await?;
        let matched: HashSet<&str> = verification
            .matched_skills
            .iter()
            .map(String::as_str)
            .collect();
        let missing_skills: Vec<String> = required
            .iter()
            .filter(|s| !matched.contains(s.as_str()))
            .take(REPO_MISSING_LIMIT)
            .cloned()
            .collect();

        Ok(RepoProofReport {
            repo_url: repo_url.to_string(),
            required_skills_count: required.len(),
            match_count: verification.matched_skills.len(),
            matched_skills: verification.matched_skills,
            missing_skills,
            confidence: verification.confidence,
            files_checked: verification.files_checked,
            repos_checked: verification.repos_checked,
            languages_detected: verification.languages_detected,
            trend_label: benchmark.benchmark.trend_label,
            annotated_proof,
        })
    }
}

/// Per-skill resilience-weighted projection.
fn build_projection(
    current_score: f64,
    required: &[String],
    verified: &HashSet<String>,
    market_trend: f64,
) -> Projection {
    let mut total_weight = 0.0;
    let mut weighted_value = 0.0;
    let mut at_risk = Vec::new();
    let mut growth = Vec::new();

    for skill in required {
        let multiplier = resilience_multiplier(skill);
        let base = if verified.contains(skill) { 1.0 } else { 0.35 };
        total_weight += 1.0;
        weighted_value += base * multiplier;

        if multiplier <= 0.6 && verified.contains(skill) && !at_risk.contains(skill) {
            at_risk.push(skill.clone());
        }
        if multiplier >= 1.5 && !growth.contains(skill) {
            growth.push(skill.clone());
        }
    }

    let skill_component = if total_weight > 0.0 {
        weighted_value / total_weight * 50.0
    } else {
        0.0
    };
    let market_component = clamp_score(market_trend) * 0.5;
    let projected_score = round1(clamp_score(skill_component + market_component));
    let delta = round1(projected_score - current_score);

    let risk_level = if projected_score < 60.0 {
        RiskLevel::High
    } else if projected_score < 78.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    at_risk.truncate(PROJECTION_LIST_LIMIT);
    growth.truncate(PROJECTION_LIST_LIMIT);
    Projection {
        projected_score,
        delta,
        risk_level,
        at_risk_skills: at_risk,
        growth_skills: growth,
    }
}

fn stability_outlook(
    market_trend: f64,
    salary_average: Option<f64>,
    trend_label: TrendLabel,
) -> f64 {
    let salary_momentum = match salary_average {
        Some(salary) if salary >= 60_000.0 => 55.0,
        Some(salary) if salary > 0.0 => 45.0,
        _ => 50.0,
    };
    let slope = match trend_label {
        TrendLabel::HeatingUp => 100.0,
        TrendLabel::CoolingDown => 20.0,
        TrendLabel::Neutral => 55.0,
    };
    round2(clamp_score(
        0.7 * market_trend + 0.3 * ((salary_momentum + slope) / 2.0),
    ))
}

fn status_label(mode: SourceMode) -> String {
    match mode {
        SourceMode::Live => "ok".to_string(),
        SourceMode::SnapshotFallback => SourceMode::SnapshotFallback.to_string(),
    }
}

fn combined_freshness(
    skills_mode: SourceMode,
    skills_age: Option<f64>,
    benchmark_mode: SourceMode,
    benchmark_age: Option<f64>,
) -> (SourceMode, Option<f64>) {
    if skills_mode == SourceMode::Live && benchmark_mode == SourceMode::Live {
        (SourceMode::Live, None)
    } else {
        let age = match (skills_age, benchmark_age) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (age, None) | (None, age) => age,
        };
        (SourceMode::SnapshotFallback, age)
    }
}
