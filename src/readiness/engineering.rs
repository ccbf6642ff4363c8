//! Scores a public code-hosting profile for engineering signal.
//!
//! Results are cached per identity for 15 minutes in a bounded cache. A
//! provider failure yields — and caches — a zero-valued default instead of an
//! error, so a failing provider is not hammered on every request.

use crate::cache::TtlCache;
use crate::providers::codehost::{CodeHostProvider, ReadmeProbe};
use crate::scoring::{clamp_score, round1, round3};
use chrono::{Duration, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

const CACHE_TTL_SECS: u64 = 15 * 60;
const CACHE_CAPACITY: usize = 1000;
const RECENT_WINDOW_DAYS: i64 = 90;
const README_SAMPLE_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EngineeringMetrics {
    pub repo_count: u32,
    pub recent_repo_count: u32,
    pub star_total: u64,
    pub language_count: u32,
    pub readme_ratio: f64,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EngineeringSignalResult {
    pub score: f64,
    pub metrics: EngineeringMetrics,
}

pub struct EngineeringSignalAnalyzer {
    codehost: Arc<dyn CodeHostProvider>,
    cache: Mutex<TtlCache<String, EngineeringSignalResult>>,
}

impl EngineeringSignalAnalyzer {
    pub fn new(codehost: Arc<dyn CodeHostProvider>) -> Self {
        Self {
            codehost,
            cache: Mutex::new(TtlCache::new(
                std::time::Duration::from_secs(CACHE_TTL_SECS),
                CACHE_CAPACITY,
            )),
        }
    }

    /// Analyze `identity`'s public profile. Never fails: provider errors
    /// produce the zero default, which is cached like any other result.
    pub async fn analyze(&self, identity: &str) -> EngineeringSignalResult {
        let username = identity.trim().to_lowercase();
        if username.is_empty() {
            return EngineeringSignalResult::default();
        }

        if let Some(cached) = self.cache.lock().expect("signal cache lock").get(&username) {
            return cached;
        }

        let result = match self.compute(&username).await {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(username, "engineering signal fetch failed: {e:#}");
                EngineeringSignalResult::default()
            }
        };

        self.cache
            .lock()
            .expect("signal cache lock")
            .insert(username, result.clone());
        result
    }

    async fn compute(&self, username: &str) -> anyhow::Result<EngineeringSignalResult> {
        let profile = self.codehost.profile(username).await?;
        let repos = self.codehost.repositories(username).await?;

        let recent_threshold = Utc::now() - Duration::days(RECENT_WINDOW_DAYS);
        let mut recent_repo_count = 0u32;
        let mut star_total = 0u64;
        let mut languages: HashSet<String> = HashSet::new();
        for repo in &repos {
            if repo.updated_at.is_some_and(|updated| updated >= recent_threshold) {
                recent_repo_count += 1;
            }
            star_total += repo.stars;
            if let Some(language) = &repo.language {
                languages.insert(language.to_lowercase());
            }
        }

        let repo_count = if profile.public_repos > 0 {
            profile.public_repos
        } else {
            repos.len() as u32
        };

        let mut found = 0usize;
        let mut checked = 0usize;
        for repo in repos.iter().take(README_SAMPLE_LIMIT) {
            checked += 1;
            match self.codehost.readme_probe(username, &repo.name).await {
                ReadmeProbe::Found => found += 1,
                ReadmeProbe::Missing => {}
                // Stop sampling and score with what was checked so far.
                ReadmeProbe::RateLimited => break,
            }
        }
        let readme_ratio = if checked > 0 {
            round3(found as f64 / checked as f64)
        } else {
            0.0
        };

        let metrics = EngineeringMetrics {
            repo_count,
            recent_repo_count,
            star_total,
            language_count: languages.len() as u32,
            readme_ratio,
        };
        Ok(EngineeringSignalResult {
            score: compute_score(&metrics),
            metrics,
        })
    }
}

fn compute_score(metrics: &EngineeringMetrics) -> f64 {
    let repo_component = f64::from(metrics.repo_count.min(30)) / 30.0 * 25.0;
    let recent_component = f64::from(metrics.recent_repo_count.min(20)) / 20.0 * 25.0;
    let star_component = ((metrics.star_total as f64).ln_1p() / 200.0_f64.ln_1p()).min(1.0) * 20.0;
    let language_component = f64::from(metrics.language_count.min(10)) / 10.0 * 15.0;
    let readme_component = metrics.readme_ratio.clamp(0.0, 1.0) * 15.0;

    round1(clamp_score(
        repo_component + recent_component + star_component + language_component + readme_component,
    ))
}
