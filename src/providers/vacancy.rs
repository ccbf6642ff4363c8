use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Job-vacancy and salary data contract.
#[async_trait]
pub trait VacancyProvider: Send + Sync {
    /// Monthly vacancy-count history for the last six months. An empty or
    /// single-point series means the pair has too little coverage to trend.
    async fn history(&self, role: &str, location: &str) -> anyhow::Result<Vec<SeriesPoint>>;

    /// Point-in-time posting count for postings at most `max_days_old` old.
    async fn search_count(
        &self,
        role: &str,
        location: &str,
        max_days_old: u32,
    ) -> anyhow::Result<f64>;

    /// Salary histogram: (bucket lower bound, posting count).
    async fn salary_histogram(
        &self,
        role: &str,
        location: &str,
    ) -> anyhow::Result<Vec<SalaryBucket>>;

    /// Sample of current postings, newest first.
    async fn postings(
        &self,
        role: &str,
        location: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<PostingRecord>>;

    fn name(&self) -> &'static str {
        "adzuna"
    }
}

/// One point of a vacancy time series; `x` is the series index.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SeriesPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SalaryBucket {
    pub lower_bound: f64,
    pub count: f64,
}

#[derive(Debug, Clone)]
pub struct PostingRecord {
    pub title: String,
    pub description: String,
    pub company: Option<String>,
}

// ─── Wire payloads ──────────────────────────────────────────────────────────

/// The history endpoint has returned both a keyed month map and a row list;
/// accept either.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HistoryRows {
    Map(BTreeMap<String, f64>),
    List(Vec<CountRow>),
}

#[derive(Debug, Deserialize)]
struct HistoryPayload {
    #[serde(alias = "month", alias = "results", default)]
    rows: Option<HistoryRows>,
}

#[derive(Debug, Deserialize)]
struct CountRow {
    #[serde(alias = "count", alias = "vacancies", default)]
    count: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SearchCountPayload {
    #[serde(default)]
    count: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct HistogramPayload {
    #[serde(alias = "histogram", alias = "results", default)]
    buckets: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Deserialize)]
struct SearchPayload {
    #[serde(default)]
    results: Vec<PostingRow>,
}

#[derive(Debug, Deserialize)]
struct PostingRow {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    company: Option<CompanyRow>,
}

#[derive(Debug, Deserialize)]
struct CompanyRow {
    #[serde(default)]
    display_name: Option<String>,
}

// ─── HTTP client ────────────────────────────────────────────────────────────

pub struct AdzunaClient {
    base_url: String,
    country: String,
    credentials: Option<(String, String)>,
    client: Client,
}

impl AdzunaClient {
    pub fn new(
        app_id: Option<&str>,
        app_key: Option<&str>,
        country: &str,
        timeout_secs: u64,
    ) -> Self {
        Self::with_base_url(app_id, app_key, country, timeout_secs, None)
    }

    pub fn with_base_url(
        app_id: Option<&str>,
        app_key: Option<&str>,
        country: &str,
        timeout_secs: u64,
        base_url: Option<&str>,
    ) -> Self {
        let base = base_url
            .map_or("https://api.adzuna.com/v1/api/jobs", |u| u.trim_end_matches('/'))
            .to_string();
        let credentials = match (app_id, app_key) {
            (Some(id), Some(key)) if !id.trim().is_empty() && !key.trim().is_empty() => {
                Some((id.trim().to_string(), key.trim().to_string()))
            }
            _ => None,
        };
        Self {
            base_url: base,
            country: country.to_string(),
            credentials,
            client: super::build_client(timeout_secs),
        }
    }

    fn auth_params(&self) -> anyhow::Result<[(&'static str, String); 2]> {
        let (id, key) = self.credentials.as_ref().ok_or_else(|| {
            anyhow::anyhow!("Adzuna credentials not set. Provide an app id and app key.")
        })?;
        Ok([("app_id", id.clone()), ("app_key", key.clone())])
    }
}

#[async_trait]
impl VacancyProvider for AdzunaClient {
    async fn history(&self, role: &str, location: &str) -> anyhow::Result<Vec<SeriesPoint>> {
        let auth = self.auth_params()?;
        let url = format!("{}/{}/history", self.base_url, self.country);
        let response = self
            .client
            .get(&url)
            .query(&auth)
            .query(&[("what", role), ("where", location)])
            .query(&[("months", "6")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(super::api_error("Adzuna", response).await);
        }

        let payload: HistoryPayload = response.json().await?;
        let points = match payload.rows {
            Some(HistoryRows::Map(map)) => map
                .values()
                .enumerate()
                .map(|(idx, count)| SeriesPoint { x: idx as f64, y: *count })
                .collect(),
            Some(HistoryRows::List(rows)) => rows
                .iter()
                .enumerate()
                .map(|(idx, row)| SeriesPoint {
                    x: idx as f64,
                    y: row.count.unwrap_or(0.0),
                })
                .collect(),
            None => Vec::new(),
        };
        Ok(points)
    }

    async fn search_count(
        &self,
        role: &str,
        location: &str,
        max_days_old: u32,
    ) -> anyhow::Result<f64> {
        let auth = self.auth_params()?;
        let url = format!("{}/{}/search/1", self.base_url, self.country);
        let response = self
            .client
            .get(&url)
            .query(&auth)
            .query(&[("what", role), ("where", location)])
            .query(&[("max_days_old", max_days_old.to_string())])
            .query(&[("results_per_page", "1")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(super::api_error("Adzuna", response).await);
        }

        let payload: SearchCountPayload = response.json().await?;
        Ok(payload.count.unwrap_or(0.0))
    }

    async fn salary_histogram(
        &self,
        role: &str,
        location: &str,
    ) -> anyhow::Result<Vec<SalaryBucket>> {
        let auth = self.auth_params()?;
        let url = format!("{}/{}/histogram", self.base_url, self.country);
        let response = self
            .client
            .get(&url)
            .query(&auth)
            .query(&[("what", role), ("where", location)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(super::api_error("Adzuna", response).await);
        }

        let payload: HistogramPayload = response.json().await?;
        let mut buckets: Vec<SalaryBucket> = payload
            .buckets
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(key, count)| {
                // Keys arrive as "20000" or "20000-29999"; the lower bound is
                // what the weighted average uses.
                let lower = key.split('-').next()?.trim().parse().ok()?;
                Some(SalaryBucket { lower_bound: lower, count })
            })
            .collect();
        buckets.sort_by(|a, b| a.lower_bound.total_cmp(&b.lower_bound));
        Ok(buckets)
    }

    async fn postings(
        &self,
        role: &str,
        location: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<PostingRecord>> {
        let auth = self.auth_params()?;
        let url = format!("{}/{}/search/1", self.base_url, self.country);
        let response = self
            .client
            .get(&url)
            .query(&auth)
            .query(&[("what", role), ("where", location)])
            .query(&[("results_per_page", limit.clamp(1, 50).to_string())])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(super::api_error("Adzuna", response).await);
        }

        let payload: SearchPayload = response.json().await?;
        Ok(payload
            .results
            .into_iter()
            .map(|row| PostingRecord {
                title: row.title.unwrap_or_default(),
                description: row.description.unwrap_or_default(),
                company: row.company.and_then(|c| c.display_name),
            })
            .collect())
    }
}
