//! Matches a code repository's observable content against required skills.

use crate::providers::codehost::CodeHostProvider;
use crate::scoring::{clamp_score, round2};
use crate::skills::canonical::{normalize_skill, text_mentions_skill};
use std::sync::Arc;
use url::Url;

/// Well-known manifest and readme names probed at the repository head.
const MANIFEST_FILES: &[&str] = &[
    "README.md",
    "readme.md",
    "package.json",
    "requirements.txt",
    "pyproject.toml",
];

/// When only an owner is given, at most this many recently-updated
/// repositories are inspected.
const OWNER_REPO_LIMIT: usize = 8;

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RepoVerification {
    pub matched_skills: Vec<String>,
    pub confidence: f64,
    pub files_checked: Vec<String>,
    pub repos_checked: Vec<String>,
    pub languages_detected: Vec<String>,
}

pub struct RepositorySkillVerifier {
    codehost: Arc<dyn CodeHostProvider>,
}

impl RepositorySkillVerifier {
    pub fn new(codehost: Arc<dyn CodeHostProvider>) -> Self {
        Self { codehost }
    }

    /// Verify `required_skills` against the repository (or owner) behind
    /// `repo_url`. A malformed URL yields an empty result, not an error.
    pub async fn verify(&self, repo_url: &str, required_skills: &[String]) -> RepoVerification {
        let Some((owner, repo)) = parse_repo_url(repo_url) else {
            return RepoVerification::default();
        };

        let target_repos = match repo {
            Some(repo) => vec![repo],
            None => match self.codehost.repositories(&owner).await {
                Ok(repos) => repos
                    .into_iter()
                    .take(OWNER_REPO_LIMIT)
                    .map(|r| r.name)
                    .collect(),
                Err(e) => {
                    tracing::debug!(%owner, "repository enumeration failed: {e:#}");
                    Vec::new()
                }
            },
        };

        let mut result = RepoVerification::default();
        let mut corpus: Vec<String> = Vec::new();
        let mut languages: Vec<String> = Vec::new();

        for repo_name in &target_repos {
            result.repos_checked.push(repo_name.clone());
            for language in self
                .codehost
                .languages(&owner, repo_name)
                .await
                .unwrap_or_default()
            {
                if !languages.contains(&language) {
                    languages.push(language);
                }
            }
            for file_name in MANIFEST_FILES {
                if let Some(content) = self.codehost.raw_file(&owner, repo_name, file_name).await {
                    result.files_checked.push(format!("{repo_name}/{file_name}"));
                    corpus.push(content.to_lowercase());
                }
            }
        }

        corpus.extend(languages.iter().cloned());
        let combined = corpus.join("\n");

        for skill in required_skills {
            let token = normalize_skill(skill);
            if token.is_empty() || result.matched_skills.contains(&token) {
                continue;
            }
            if text_mentions_skill(&combined, &token) {
                result.matched_skills.push(token);
            }
        }

        languages.sort();
        result.languages_detected = languages;
        result.confidence = round2(clamp_score(
            result.matched_skills.len() as f64 / required_skills.len().max(1) as f64 * 100.0,
        ));
        result
    }
}

/// Extract `(owner, Some(repo))` or `(owner, None)` from a repository URL.
fn parse_repo_url(repo_url: &str) -> Option<(String, Option<String>)> {
    let cleaned = repo_url.trim().trim_end_matches('/');
    if cleaned.is_empty() {
        return None;
    }
    let with_scheme = if cleaned.contains("://") {
        cleaned.to_string()
    } else {
        format!("https://{cleaned}")
    };

    let parsed = Url::parse(&with_scheme).ok()?;
    let host = parsed.host_str()?;
    if host != "github.com" && !host.ends_with(".github.com") {
        return None;
    }

    let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());
    let owner = segments.next()?.to_string();
    let repo = segments
        .next()
        .map(|r| r.trim_end_matches(".git").to_string())
        .filter(|r| !r.is_empty());
    Some((owner, repo))
}
