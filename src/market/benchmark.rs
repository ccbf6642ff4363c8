//! Resolves (role, location) to vacancy/salary benchmarks through a
//! five-stage degradation ladder, with a 24-hour snapshot as the last rung.

use crate::error::{ProviderError, ReadyError, Result};
use crate::market::ladder::{Attempt, run_ladder};
use crate::providers::vacancy::{SalaryBucket, SeriesPoint, VacancyProvider};
use crate::scoring::{clamp_score, coefficient_of_variation, mean, round2, std_dev};
use crate::snapshot::{SnapshotKind, SnapshotStore, SourceMode, cache_key};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Which rung of the ladder produced the benchmark.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QueryMode {
    Exact,
    RoleRewrite,
    GeoWiden,
    ProxyFromSearch,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TrendLabel {
    HeatingUp,
    Neutral,
    CoolingDown,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HiringCompany {
    pub name: String,
    pub open_roles: u32,
}

/// Benchmark for one (role, location) pair, as actually resolved.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MarketBenchmarkSnapshot {
    /// Role string the winning query actually used.
    pub role_query_used: String,
    /// Location string the winning query actually used.
    pub location_used: String,
    pub query_mode: QueryMode,
    pub vacancy_index: f64,
    pub vacancy_growth_percent: f64,
    pub volatility_score: f64,
    pub trend_label: TrendLabel,
    pub salary_average: Option<f64>,
    pub salary_percentile_local: Option<f64>,
    pub top_hiring_companies: Vec<HiringCompany>,
    pub volatility_points: Vec<SeriesPoint>,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ResolvedBenchmark {
    pub benchmark: MarketBenchmarkSnapshot,
    pub source_mode: SourceMode,
    pub snapshot_age_minutes: Option<f64>,
}

/// Curated role synonyms tried when the exact role has no history coverage.
const ROLE_REWRITES: &[(&str, &[&str])] = &[
    ("backend engineer", &["backend developer", "software developer"]),
    ("frontend engineer", &["frontend developer", "web developer"]),
    ("software engineer", &["software developer", "developer"]),
    ("full stack engineer", &["full stack developer", "software developer"]),
    ("data scientist", &["data analyst", "machine learning engineer"]),
    ("devops engineer", &["site reliability engineer", "platform engineer"]),
    ("security engineer", &["security analyst", "cybersecurity analyst"]),
];

const NATIONWIDE: &str = "United States";
const MIN_HISTORY_POINTS: usize = 2;
const PROXY_WINDOWS_DAYS: [u32; 5] = [30, 14, 7, 3, 1];
const POSTING_SAMPLE: usize = 50;
const TOP_COMPANIES: usize = 5;

/// One rung of the history ladder.
#[derive(Debug, Clone)]
struct QueryPlan {
    mode: QueryMode,
    role: String,
    location: String,
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?} @ {:?})", self.mode, self.role, self.location)
    }
}

pub struct MarketBenchmarkResolver {
    vacancy: Arc<dyn VacancyProvider>,
    snapshots: SnapshotStore,
    ttl: Duration,
}

impl MarketBenchmarkResolver {
    pub fn new(vacancy: Arc<dyn VacancyProvider>, snapshots: SnapshotStore) -> Self {
        Self {
            vacancy,
            snapshots,
            ttl: Duration::hours(24),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Resolve benchmarks for the requested pair. Live ladder first; a valid
    /// snapshot for the same request when every rung fails; otherwise
    /// `ProviderUnavailable`.
    pub async fn resolve(&self, role: &str, location: &str) -> Result<ResolvedBenchmark> {
        let role = if role.trim().is_empty() { "software engineer" } else { role.trim() };
        let location = if location.trim().is_empty() { NATIONWIDE } else { location.trim() };
        let key = cache_key(&[role, location]);

        match self.resolve_live(role, location).await {
            Ok(Some(benchmark)) => {
                if let Err(e) = self
                    .snapshots
                    .put(SnapshotKind::MarketBenchmark, &key, &benchmark)
                    .await
                {
                    tracing::warn!(role, location, "failed to snapshot benchmark: {e}");
                }
                Ok(ResolvedBenchmark {
                    benchmark,
                    source_mode: SourceMode::Live,
                    snapshot_age_minutes: None,
                })
            }
            Ok(None) => self.from_snapshot(&key).await.ok_or_else(|| {
                ReadyError::Provider(ProviderError::NoBenchmarkFound {
                    provider: self.vacancy.name().to_string(),
                    role: role.to_string(),
                    location: location.to_string(),
                })
            }),
            Err(e) => {
                tracing::warn!(role, location, "live benchmark resolution failed: {e:#}");
                self.from_snapshot(&key).await.ok_or_else(|| {
                    ReadyError::Provider(ProviderError::Unavailable {
                        provider: self.vacancy.name().to_string(),
                        message: format!("{e:#}"),
                    })
                })
            }
        }
    }

    async fn from_snapshot(&self, key: &str) -> Option<ResolvedBenchmark> {
        let hit = self
            .snapshots
            .get::<MarketBenchmarkSnapshot>(SnapshotKind::MarketBenchmark, key, self.ttl)
            .await?;
        tracing::info!(key, age_minutes = hit.age_minutes, "serving benchmark from snapshot");
        Some(ResolvedBenchmark {
            benchmark: hit.value,
            source_mode: SourceMode::SnapshotFallback,
            snapshot_age_minutes: Some(hit.age_minutes),
        })
    }

    async fn resolve_live(
        &self,
        role: &str,
        location: &str,
    ) -> anyhow::Result<Option<MarketBenchmarkSnapshot>> {
        let plans = build_plans(role, location);
        let vacancy = Arc::clone(&self.vacancy);

        let history_win = run_ladder(plans, |plan| {
            let vacancy = Arc::clone(&vacancy);
            async move {
                match vacancy.history(&plan.role, &plan.location).await {
                    Ok(points) if points.len() >= MIN_HISTORY_POINTS => Attempt::Success(points),
                    Ok(points) => {
                        Attempt::Soft(format!("{} history points", points.len()))
                    }
                    Err(e) if is_configuration_error(&e) => Attempt::Hard(e),
                    Err(e) => Attempt::Soft(format!("{e:#}")),
                }
            }
        })
        .await?;

        let core = match history_win {
            Some((plan, points)) => Some((plan, history_metrics(&points), points)),
            None => self.proxy_from_search(role, location).await?,
        };

        let Some((plan, metrics, points)) = core else {
            return Ok(None);
        };

        let (salary_average, salary_percentile_local) =
            self.salary_signal(&plan.role, &plan.location).await;
        let top_hiring_companies = self.top_companies(&plan.role, &plan.location).await;

        Ok(Some(MarketBenchmarkSnapshot {
            role_query_used: plan.role,
            location_used: plan.location,
            query_mode: plan.mode,
            vacancy_index: metrics.vacancy_index,
            vacancy_growth_percent: metrics.growth_percent,
            volatility_score: metrics.volatility_score,
            trend_label: trend_for(metrics.vacancy_index),
            salary_average,
            salary_percentile_local,
            top_hiring_companies,
            volatility_points: points,
            captured_at: Utc::now(),
        }))
    }

    /// Last live rung: no pair has history coverage, so trend the pair with
    /// the deepest 30-day posting pool across shrinking recency windows.
    async fn proxy_from_search(
        &self,
        role: &str,
        location: &str,
    ) -> anyhow::Result<Option<(QueryPlan, SeriesMetrics, Vec<SeriesPoint>)>> {
        let mut best: Option<(String, String, f64)> = None;
        for (candidate_role, candidate_location) in candidate_pairs(role, location) {
            let count = match self
                .vacancy
                .search_count(&candidate_role, &candidate_location, PROXY_WINDOWS_DAYS[0])
                .await
            {
                Ok(count) => count,
                Err(e) if is_configuration_error(&e) => return Err(e),
                Err(e) => {
                    tracing::debug!(
                        role = %candidate_role,
                        location = %candidate_location,
                        "proxy count failed: {e:#}"
                    );
                    continue;
                }
            };
            if count > best.as_ref().map_or(0.0, |(_, _, c)| *c) {
                best = Some((candidate_role, candidate_location, count));
            }
        }

        let Some((proxy_role, proxy_location, _)) = best else {
            return Ok(None);
        };

        let mut rates = Vec::with_capacity(PROXY_WINDOWS_DAYS.len());
        for days in PROXY_WINDOWS_DAYS {
            let count = self
                .vacancy
                .search_count(&proxy_role, &proxy_location, days)
                .await
                .unwrap_or(0.0);
            rates.push(count / f64::from(days));
        }

        let base_rate = rates[0].max(f64::EPSILON);
        let last_rate = *rates.last().expect("windows are non-empty");
        let metrics = SeriesMetrics {
            vacancy_index: round2(clamp_score(last_rate / base_rate * 50.0)),
            growth_percent: round2((last_rate - base_rate) / base_rate * 100.0),
            volatility_score: round2(clamp_score(coefficient_of_variation(&rates) * 100.0)),
        };
        let points = rates
            .iter()
            .enumerate()
            .map(|(idx, rate)| SeriesPoint { x: idx as f64, y: round2(*rate) })
            .collect();

        Ok(Some((
            QueryPlan {
                mode: QueryMode::ProxyFromSearch,
                role: proxy_role,
                location: proxy_location,
            },
            metrics,
            points,
        )))
    }

    async fn salary_signal(&self, role: &str, location: &str) -> (Option<f64>, Option<f64>) {
        let buckets = match self.vacancy.salary_histogram(role, location).await {
            Ok(buckets) => buckets,
            Err(e) => {
                tracing::debug!(role, location, "salary histogram failed: {e:#}");
                return (None, None);
            }
        };
        salary_from_histogram(&buckets)
    }

    async fn top_companies(&self, role: &str, location: &str) -> Vec<HiringCompany> {
        let postings = match self.vacancy.postings(role, location, POSTING_SAMPLE).await {
            Ok(postings) => postings,
            Err(e) => {
                tracing::debug!(role, location, "posting sample failed: {e:#}");
                return Vec::new();
            }
        };

        let mut counts: HashMap<String, u32> = HashMap::new();
        for posting in postings {
            let Some(name) = posting.company.filter(|n| !n.trim().is_empty()) else {
                continue;
            };
            *counts.entry(name).or_insert(0) += 1;
        }

        let mut companies: Vec<HiringCompany> = counts
            .into_iter()
            .map(|(name, open_roles)| HiringCompany { name, open_roles })
            .collect();
        companies.sort_by(|a, b| b.open_roles.cmp(&a.open_roles).then(a.name.cmp(&b.name)));
        companies.truncate(TOP_COMPANIES);
        companies
    }
}

struct SeriesMetrics {
    vacancy_index: f64,
    growth_percent: f64,
    volatility_score: f64,
}

fn history_metrics(points: &[SeriesPoint]) -> SeriesMetrics {
    let first = points[0].y.max(1.0);
    let last = points[points.len() - 1].y;
    let nonzero: Vec<f64> = points.iter().map(|p| p.y).filter(|y| *y > 0.0).collect();
    let volatility = if mean(&nonzero) > 0.0 {
        std_dev(&nonzero) / mean(&nonzero) * 100.0
    } else {
        0.0
    };
    SeriesMetrics {
        vacancy_index: round2(clamp_score(last / first * 50.0)),
        growth_percent: round2((last - first) / first * 100.0),
        volatility_score: round2(clamp_score(volatility)),
    }
}

fn trend_for(vacancy_index: f64) -> TrendLabel {
    if vacancy_index >= 60.0 {
        TrendLabel::HeatingUp
    } else if vacancy_index <= 40.0 {
        TrendLabel::CoolingDown
    } else {
        TrendLabel::Neutral
    }
}

fn salary_from_histogram(buckets: &[SalaryBucket]) -> (Option<f64>, Option<f64>) {
    let total: f64 = buckets.iter().map(|b| b.count).sum();
    if total <= 0.0 {
        return (None, None);
    }
    let average = buckets
        .iter()
        .map(|b| b.lower_bound * b.count)
        .sum::<f64>()
        / total;
    let below: f64 = buckets
        .iter()
        .filter(|b| b.lower_bound <= average)
        .map(|b| b.count)
        .sum();
    (Some(round2(average)), Some(round2(below / total * 100.0)))
}

fn rewrites_for(role: &str) -> Vec<String> {
    let normalized = crate::skills::normalize_skill(role);
    ROLE_REWRITES
        .iter()
        .find(|(from, _)| *from == normalized)
        .map(|(_, to)| to.iter().map(ToString::to_string).collect())
        .unwrap_or_default()
}

/// Broader regions to retry in: the part after the last comma (state or
/// country), then nationwide. The original location is excluded.
fn widened_locations(location: &str) -> Vec<String> {
    let mut widened = Vec::new();
    if let Some((_, region)) = location.rsplit_once(',') {
        let region = region.trim();
        if !region.is_empty() && !region.eq_ignore_ascii_case(location) {
            widened.push(region.to_string());
        }
    }
    if !location.eq_ignore_ascii_case(NATIONWIDE) {
        widened.push(NATIONWIDE.to_string());
    }
    widened
}

fn build_plans(role: &str, location: &str) -> Vec<QueryPlan> {
    let rewrites = rewrites_for(role);
    let widened = widened_locations(location);
    let mut plans = vec![QueryPlan {
        mode: QueryMode::Exact,
        role: role.to_string(),
        location: location.to_string(),
    }];
    for rewrite in &rewrites {
        plans.push(QueryPlan {
            mode: QueryMode::RoleRewrite,
            role: rewrite.clone(),
            location: location.to_string(),
        });
    }
    for wide in &widened {
        plans.push(QueryPlan {
            mode: QueryMode::GeoWiden,
            role: role.to_string(),
            location: wide.clone(),
        });
    }
    for rewrite in &rewrites {
        for wide in &widened {
            plans.push(QueryPlan {
                mode: QueryMode::GeoWiden,
                role: rewrite.clone(),
                location: wide.clone(),
            });
        }
    }
    plans
}

fn candidate_pairs(role: &str, location: &str) -> Vec<(String, String)> {
    let mut roles = vec![role.to_string()];
    roles.extend(rewrites_for(role));
    let mut locations = vec![location.to_string()];
    locations.extend(widened_locations(location));

    let mut pairs = Vec::new();
    for r in &roles {
        for l in &locations {
            pairs.push((r.clone(), l.clone()));
        }
    }
    pairs
}

fn is_configuration_error(error: &anyhow::Error) -> bool {
    error.to_string().contains("credentials not set")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::vacancy::PostingRecord;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeVacancy {
        histories: HashMap<(String, String), Vec<f64>>,
        counts: HashMap<(String, String, u32), f64>,
        buckets: Vec<SalaryBucket>,
        postings: Vec<PostingRecord>,
        history_calls: Mutex<Vec<(String, String)>>,
    }

    impl FakeVacancy {
        fn with_history(mut self, role: &str, location: &str, counts: &[f64]) -> Self {
            self.histories
                .insert((role.into(), location.into()), counts.to_vec());
            self
        }

        fn with_count(mut self, role: &str, location: &str, days: u32, count: f64) -> Self {
            self.counts.insert((role.into(), location.into(), days), count);
            self
        }
    }

    #[async_trait]
    impl VacancyProvider for FakeVacancy {
        async fn history(&self, role: &str, location: &str) -> anyhow::Result<Vec<SeriesPoint>> {
            self.history_calls
                .lock()
                .unwrap()
                .push((role.to_string(), location.to_string()));
            Ok(self
                .histories
                .get(&(role.to_string(), location.to_string()))
                .map(|counts| {
                    counts
                        .iter()
                        .enumerate()
                        .map(|(idx, y)| SeriesPoint { x: idx as f64, y: *y })
                        .collect()
                })
                .unwrap_or_default())
        }

        async fn search_count(
            &self,
            role: &str,
            location: &str,
            max_days_old: u32,
        ) -> anyhow::Result<f64> {
            Ok(*self
                .counts
                .get(&(role.to_string(), location.to_string(), max_days_old))
                .unwrap_or(&0.0))
        }

        async fn salary_histogram(
            &self,
            _role: &str,
            _location: &str,
        ) -> anyhow::Result<Vec<SalaryBucket>> {
            Ok(self.buckets.clone())
        }

        async fn postings(
            &self,
            _role: &str,
            _location: &str,
            _limit: usize,
        ) -> anyhow::Result<Vec<PostingRecord>> {
            Ok(self.postings.clone())
        }
    }

    fn resolver(vacancy: FakeVacancy) -> MarketBenchmarkResolver {
        MarketBenchmarkResolver::new(Arc::new(vacancy), SnapshotStore::in_memory())
    }

    #[tokio::test]
    async fn exact_pair_with_enough_history_wins() {
        let fake =
            FakeVacancy::default().with_history("software engineer", "United States", &[100.0, 110.0, 130.0]);
        let resolved = resolver(fake)
            .resolve("software engineer", "United States")
            .await
            .unwrap();

        let b = &resolved.benchmark;
        assert_eq!(b.query_mode, QueryMode::Exact);
        assert_eq!(b.role_query_used, "software engineer");
        assert_eq!(b.location_used, "United States");
        assert_eq!(b.vacancy_index, round2(130.0 / 100.0 * 50.0));
        assert_eq!(b.vacancy_growth_percent, 30.0);
        assert_eq!(b.trend_label, TrendLabel::HeatingUp);
        assert_eq!(resolved.source_mode, SourceMode::Live);
    }

    #[tokio::test]
    async fn role_rewrite_recovers_when_exact_has_no_coverage() {
        let fake =
            FakeVacancy::default().with_history("backend developer", "United States", &[80.0, 95.0, 105.0]);
        let resolved = resolver(fake)
            .resolve("backend engineer", "United States")
            .await
            .unwrap();

        let b = &resolved.benchmark;
        assert_eq!(b.query_mode, QueryMode::RoleRewrite);
        assert_eq!(b.role_query_used, "backend developer");
        assert_eq!(b.location_used, "United States");
    }

    #[tokio::test]
    async fn geo_widen_recovers_through_region_then_nationwide() {
        let fake =
            FakeVacancy::default().with_history("software engineer", "United States", &[100.0, 102.0, 106.0]);
        let resolved = resolver(fake)
            .resolve("software engineer", "Roswell, GA")
            .await
            .unwrap();

        let b = &resolved.benchmark;
        assert_eq!(b.query_mode, QueryMode::GeoWiden);
        assert_eq!(b.role_query_used, "software engineer");
        assert_eq!(b.location_used, "United States");
    }

    #[tokio::test]
    async fn single_point_history_is_not_a_win() {
        let fake = FakeVacancy::default()
            .with_history("software engineer", "Roswell, GA", &[100.0])
            .with_history("software engineer", "United States", &[90.0, 99.0]);
        let resolved = resolver(fake)
            .resolve("software engineer", "Roswell, GA")
            .await
            .unwrap();
        assert_eq!(resolved.benchmark.query_mode, QueryMode::GeoWiden);
    }

    #[tokio::test]
    async fn ladder_respects_order_and_short_circuits() {
        let fake = Arc::new(
            FakeVacancy::default()
                .with_history("software engineer", "Atlanta, GA", &[100.0, 120.0])
                .with_history("software developer", "Atlanta, GA", &[500.0, 900.0]),
        );
        let r = MarketBenchmarkResolver::new(Arc::clone(&fake) as _, SnapshotStore::in_memory());
        let resolved = r.resolve("software engineer", "Atlanta, GA").await.unwrap();
        assert_eq!(resolved.benchmark.query_mode, QueryMode::Exact);
        // The exact rung won, so no later rung was ever queried.
        assert_eq!(fake.history_calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn proxy_from_search_picks_deepest_posting_pool() {
        let fake = FakeVacancy::default()
            .with_count("backend developer", "United States", 30, 3000.0)
            .with_count("backend developer", "United States", 14, 1700.0)
            .with_count("backend developer", "United States", 7, 980.0)
            .with_count("backend developer", "United States", 3, 510.0)
            .with_count("backend developer", "United States", 1, 180.0)
            .with_count("backend engineer", "Roswell, GA", 30, 40.0);
        let resolved = resolver(fake)
            .resolve("backend engineer", "Roswell, GA")
            .await
            .unwrap();

        let b = &resolved.benchmark;
        assert_eq!(b.query_mode, QueryMode::ProxyFromSearch);
        assert_eq!(b.role_query_used, "backend developer");
        assert_eq!(b.location_used, "United States");
        // base rate 3000/30 = 100/day, last rate 180/1 = 180/day.
        assert_eq!(b.vacancy_index, 90.0);
        assert_eq!(b.vacancy_growth_percent, 80.0);
        assert_eq!(b.volatility_points.len(), 5);
    }

    #[tokio::test]
    async fn total_failure_without_snapshot_is_unavailable() {
        let err = resolver(FakeVacancy::default())
            .resolve("backend engineer", "Roswell, GA")
            .await
            .unwrap_err();
        assert!(err.is_provider_unavailable());
    }

    #[tokio::test]
    async fn total_failure_with_valid_snapshot_serves_identical_payload() {
        let snapshots = SnapshotStore::in_memory();
        let live = MarketBenchmarkResolver::new(
            Arc::new(
                FakeVacancy::default()
                    .with_history("software engineer", "United States", &[100.0, 120.0]),
            ),
            snapshots.clone(),
        );
        let first = live.resolve("software engineer", "United States").await.unwrap();

        let dark = MarketBenchmarkResolver::new(Arc::new(FakeVacancy::default()), snapshots);
        let second = dark.resolve("software engineer", "United States").await.unwrap();

        assert_eq!(second.source_mode, SourceMode::SnapshotFallback);
        assert!(second.snapshot_age_minutes.is_some());
        assert_eq!(second.benchmark.vacancy_index, first.benchmark.vacancy_index);
        assert_eq!(second.benchmark.captured_at, first.benchmark.captured_at);
    }

    #[tokio::test]
    async fn expired_snapshot_is_treated_as_absent() {
        let snapshots = SnapshotStore::in_memory();
        let live = MarketBenchmarkResolver::new(
            Arc::new(
                FakeVacancy::default()
                    .with_history("software engineer", "United States", &[100.0, 120.0]),
            ),
            snapshots.clone(),
        );
        live.resolve("software engineer", "United States").await.unwrap();

        let dark = MarketBenchmarkResolver::new(Arc::new(FakeVacancy::default()), snapshots)
            .with_ttl(Duration::seconds(-1));
        let err = dark
            .resolve("software engineer", "United States")
            .await
            .unwrap_err();
        assert!(err.is_provider_unavailable());
    }

    #[tokio::test]
    async fn salary_and_companies_enrich_the_winning_pair() {
        let mut fake = FakeVacancy::default()
            .with_history("software engineer", "United States", &[100.0, 120.0]);
        fake.buckets = vec![
            SalaryBucket { lower_bound: 60000.0, count: 10.0 },
            SalaryBucket { lower_bound: 90000.0, count: 4.0 },
            SalaryBucket { lower_bound: 120000.0, count: 2.0 },
        ];
        fake.postings = vec![
            PostingRecord { title: "a".into(), description: String::new(), company: Some("Acme".into()) },
            PostingRecord { title: "b".into(), description: String::new(), company: Some("Acme".into()) },
            PostingRecord { title: "c".into(), description: String::new(), company: Some("Globex".into()) },
            PostingRecord { title: "d".into(), description: String::new(), company: None },
        ];

        let resolved = resolver(fake)
            .resolve("software engineer", "United States")
            .await
            .unwrap();
        let b = &resolved.benchmark;

        let expected_avg = (60000.0 * 10.0 + 90000.0 * 4.0 + 120000.0 * 2.0) / 16.0;
        assert_eq!(b.salary_average, Some(round2(expected_avg)));
        // Only the 60k bucket sits at or below the 75k average: 10 of 16.
        assert_eq!(b.salary_percentile_local, Some(62.5));
        assert_eq!(
            b.top_hiring_companies,
            vec![
                HiringCompany { name: "Acme".into(), open_roles: 2 },
                HiringCompany { name: "Globex".into(), open_roles: 1 },
            ]
        );
    }

    #[test]
    fn widening_strips_to_region_then_nationwide() {
        assert_eq!(widened_locations("Roswell, GA"), vec!["GA", NATIONWIDE]);
        assert_eq!(widened_locations("United States"), Vec::<String>::new());
        assert_eq!(widened_locations("Berlin"), vec![NATIONWIDE]);
    }

    #[test]
    fn trend_thresholds() {
        assert_eq!(trend_for(60.0), TrendLabel::HeatingUp);
        assert_eq!(trend_for(50.0), TrendLabel::Neutral);
        assert_eq!(trend_for(40.0), TrendLabel::CoolingDown);
    }
}
