//! HTTP clients for the three outbound data providers.
//!
//! Each provider is a trait so scoring can run against fakes; the shipped
//! implementations talk to CareerOneStop (occupational skill standards),
//! Adzuna (vacancies and salaries), and GitHub (code hosting). Loosely-typed
//! payloads are deserialized into the boundary structs defined next to each
//! client and converted to validated value objects before scoring sees them.

pub mod codehost;
pub mod occupation;
pub mod vacancy;

pub use codehost::{CodeHostProvider, GitHubClient, ReadmeProbe, RepoInfo};
pub use occupation::{CareerOneStopClient, OccupationProvider, OccupationSummary, RankedElement};
pub use vacancy::{AdzunaClient, PostingRecord, SeriesPoint, VacancyProvider};

use std::time::Duration;

/// Shared `reqwest` client construction: explicit request and connect
/// timeouts, falling back to defaults if the builder fails.
pub(crate) fn build_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Turn a non-success response into an error carrying status and body.
pub(crate) async fn api_error(provider: &str, response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read provider error body>".to_string());
    let truncated: String = body.chars().take(300).collect();
    anyhow::anyhow!("{provider} API error ({status}): {truncated}")
}
