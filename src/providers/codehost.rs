use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

const USER_AGENT: &str = "MarketReadyEngineeringSignal/1.0";

/// Code-hosting contract: identity → profile and repository metadata,
/// language breakdown, raw file content.
#[async_trait]
pub trait CodeHostProvider: Send + Sync {
    async fn profile(&self, login: &str) -> anyhow::Result<ProfileInfo>;

    /// Repositories owned by `login`, most recently updated first.
    async fn repositories(&self, login: &str) -> anyhow::Result<Vec<RepoInfo>>;

    /// Declared languages for one repository.
    async fn languages(&self, owner: &str, repo: &str) -> anyhow::Result<Vec<String>>;

    /// Raw file content at the repository head. `None` covers both "file not
    /// present" and transient fetch failures: repository introspection treats
    /// each file as best-effort evidence, never a hard dependency.
    async fn raw_file(&self, owner: &str, repo: &str, path: &str) -> Option<String>;

    async fn readme_probe(&self, owner: &str, repo: &str) -> ReadmeProbe;

    fn name(&self) -> &'static str {
        "github"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadmeProbe {
    Found,
    Missing,
    /// Abuse-prevention response; callers stop sampling and keep what they have.
    RateLimited,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileInfo {
    pub public_repos: u32,
}

#[derive(Debug, Clone)]
pub struct RepoInfo {
    pub name: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub stars: u64,
    pub language: Option<String>,
}

// ─── Wire payloads ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ProfileRow {
    #[serde(default)]
    public_repos: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RepoRow {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    stargazers_count: Option<u64>,
    #[serde(default)]
    language: Option<String>,
}

// ─── HTTP client ────────────────────────────────────────────────────────────

pub struct GitHubClient {
    api_base: String,
    raw_base: String,
    token: Option<String>,
    client: Client,
}

impl GitHubClient {
    pub fn new(token: Option<&str>, timeout_secs: u64) -> Self {
        Self::with_base_urls(token, timeout_secs, None, None)
    }

    pub fn with_base_urls(
        token: Option<&str>,
        timeout_secs: u64,
        api_base: Option<&str>,
        raw_base: Option<&str>,
    ) -> Self {
        Self {
            api_base: api_base
                .map_or("https://api.github.com", |u| u.trim_end_matches('/'))
                .to_string(),
            raw_base: raw_base
                .map_or("https://raw.githubusercontent.com", |u| u.trim_end_matches('/'))
                .to_string(),
            token: token.map(str::trim).filter(|t| !t.is_empty()).map(String::from),
            client: super::build_client(timeout_secs),
        }
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        request
    }

    fn parse_updated_at(raw: Option<&str>) -> Option<DateTime<Utc>> {
        raw.and_then(|value| DateTime::parse_from_rfc3339(value).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

#[async_trait]
impl CodeHostProvider for GitHubClient {
    async fn profile(&self, login: &str) -> anyhow::Result<ProfileInfo> {
        let url = format!("{}/users/{login}", self.api_base);
        let response = self.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(super::api_error("GitHub", response).await);
        }
        let row: ProfileRow = response.json().await?;
        Ok(ProfileInfo {
            public_repos: row.public_repos.unwrap_or(0),
        })
    }

    async fn repositories(&self, login: &str) -> anyhow::Result<Vec<RepoInfo>> {
        let url = format!("{}/users/{login}/repos", self.api_base);
        let response = self
            .get(&url)
            .query(&[
                ("per_page", "100"),
                ("sort", "updated"),
                ("direction", "desc"),
                ("type", "owner"),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(super::api_error("GitHub", response).await);
        }

        let rows: Vec<RepoRow> = response.json().await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let name = row.name?;
                if name.trim().is_empty() {
                    return None;
                }
                Some(RepoInfo {
                    updated_at: Self::parse_updated_at(row.updated_at.as_deref()),
                    stars: row.stargazers_count.unwrap_or(0),
                    language: row.language.filter(|l| !l.trim().is_empty()),
                    name,
                })
            })
            .collect())
    }

    async fn languages(&self, owner: &str, repo: &str) -> anyhow::Result<Vec<String>> {
        let url = format!("{}/repos/{owner}/{repo}/languages", self.api_base);
        let response = self.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(super::api_error("GitHub", response).await);
        }
        let map: std::collections::BTreeMap<String, serde_json::Value> = response.json().await?;
        Ok(map.into_keys().map(|name| name.to_lowercase()).collect())
    }

    async fn raw_file(&self, owner: &str, repo: &str, path: &str) -> Option<String> {
        let url = format!("{}/{owner}/{repo}/HEAD/{path}", self.raw_base);
        let response = self
            .client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.text().await.ok().filter(|text| !text.is_empty())
    }

    async fn readme_probe(&self, owner: &str, repo: &str) -> ReadmeProbe {
        let url = format!("{}/repos/{owner}/{repo}/readme", self.api_base);
        match self.get(&url).send().await {
            Ok(response) if response.status().is_success() => ReadmeProbe::Found,
            Ok(response) if matches!(response.status().as_u16(), 403 | 429) => {
                ReadmeProbe::RateLimited
            }
            _ => ReadmeProbe::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GitHubClient {
        GitHubClient::with_base_urls(None, 5, Some(&server.uri()), Some(&server.uri()))
    }

    #[tokio::test]
    async fn profile_reads_public_repo_count() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/octocat"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"public_repos": 8})),
            )
            .mount(&server)
            .await;

        let profile = client(&server).profile("octocat").await.unwrap();
        assert_eq!(profile.public_repos, 8);
    }

    #[tokio::test]
    async fn repositories_parse_and_skip_nameless_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/octocat/repos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": "widgets", "updated_at": "2026-07-01T00:00:00Z",
                 "stargazers_count": 12, "language": "Rust"},
                {"stargazers_count": 99},
                {"name": "notes", "language": ""}
            ])))
            .mount(&server)
            .await;

        let repos = client(&server).repositories("octocat").await.unwrap();
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].name, "widgets");
        assert_eq!(repos[0].stars, 12);
        assert!(repos[0].updated_at.is_some());
        assert!(repos[1].language.is_none());
    }

    #[tokio::test]
    async fn languages_lowercases_keys() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/widgets/languages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Rust": 1000, "TypeScript": 400
            })))
            .mount(&server)
            .await;

        let langs = client(&server).languages("octocat", "widgets").await.unwrap();
        assert_eq!(langs, vec!["rust".to_string(), "typescript".to_string()]);
    }

    #[tokio::test]
    async fn raw_file_returns_none_on_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/octocat/widgets/HEAD/README.md"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let content = client(&server).raw_file("octocat", "widgets", "README.md").await;
        assert!(content.is_none());
    }

    #[tokio::test]
    async fn raw_file_returns_body_on_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/octocat/widgets/HEAD/README.md"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# widgets\nbuilt with rust"))
            .mount(&server)
            .await;

        let content = client(&server)
            .raw_file("octocat", "widgets", "README.md")
            .await
            .unwrap();
        assert!(content.contains("rust"));
    }

    #[tokio::test]
    async fn readme_probe_distinguishes_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/a/readme"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/b/readme"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/c/readme"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let c = client(&server);
        assert_eq!(c.readme_probe("octocat", "a").await, ReadmeProbe::Found);
        assert_eq!(c.readme_probe("octocat", "b").await, ReadmeProbe::Missing);
        assert_eq!(c.readme_probe("octocat", "c").await, ReadmeProbe::RateLimited);
    }
}
