//! Resolves a target role into a ranked list of canonical required skills.

use crate::error::{ProviderError, ReadyError, Result};
use crate::providers::occupation::{OccupationProvider, OccupationSummary};
use crate::skills::canonical::{
    SKILL_ALIASES, canonical_token, content_tokens, normalize_skill,
};
use crate::snapshot::{SnapshotKind, SnapshotStore, SourceMode, cache_key};
use chrono::Duration;
use std::collections::HashSet;
use std::sync::Arc;

const DEFAULT_ROLE: &str = "software developer";
const MAX_SKILLS: usize = 40;
const ALIAS_FALLBACK_IMPORTANCE: f64 = 10.0;

/// One canonical required skill for a role.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SkillRequirement {
    pub canonical_name: String,
    pub importance_weight: f64,
    pub source_role: String,
}

#[derive(Debug, Clone)]
pub struct ResolvedSkills {
    pub skills: Vec<SkillRequirement>,
    pub source_mode: SourceMode,
    pub snapshot_age_minutes: Option<f64>,
}

pub struct SkillRequirementResolver {
    provider: Arc<dyn OccupationProvider>,
    snapshots: SnapshotStore,
    ttl: Duration,
}

impl SkillRequirementResolver {
    pub fn new(provider: Arc<dyn OccupationProvider>, snapshots: SnapshotStore) -> Self {
        Self {
            provider,
            snapshots,
            // Occupational skill standards move slowly; a week of staleness
            // is acceptable.
            ttl: Duration::hours(7 * 24),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Resolve `role` to its ranked required skills, live first, snapshot on
    /// provider failure, `ProviderUnavailable` when neither works.
    pub async fn resolve(&self, role: &str) -> Result<ResolvedSkills> {
        let role = if role.trim().is_empty() { DEFAULT_ROLE } else { role.trim() };
        let key = cache_key(&[role]);

        match self.resolve_live(role).await {
            Ok(skills) if !skills.is_empty() => {
                if let Err(e) = self
                    .snapshots
                    .put(SnapshotKind::SkillRequirements, &key, &skills)
                    .await
                {
                    tracing::warn!(role, "failed to snapshot skill requirements: {e}");
                }
                Ok(ResolvedSkills {
                    skills,
                    source_mode: SourceMode::Live,
                    snapshot_age_minutes: None,
                })
            }
            Ok(_) => self
                .from_snapshot(&key)
                .await
                .ok_or_else(|| {
                    ReadyError::Provider(ProviderError::NoSkillsFound {
                        provider: self.provider.name().to_string(),
                        role: role.to_string(),
                    })
                }),
            Err(e) => {
                tracing::warn!(role, "live skill resolution failed: {e:#}");
                self.from_snapshot(&key).await.ok_or_else(|| {
                    ReadyError::Provider(ProviderError::Unavailable {
                        provider: self.provider.name().to_string(),
                        message: format!("{e:#}"),
                    })
                })
            }
        }
    }

    async fn from_snapshot(&self, key: &str) -> Option<ResolvedSkills> {
        let hit = self
            .snapshots
            .get::<Vec<SkillRequirement>>(SnapshotKind::SkillRequirements, key, self.ttl)
            .await?;
        tracing::info!(key, age_minutes = hit.age_minutes, "serving skill requirements from snapshot");
        Some(ResolvedSkills {
            skills: hit.value,
            source_mode: SourceMode::SnapshotFallback,
            snapshot_age_minutes: Some(hit.age_minutes),
        })
    }

    async fn resolve_live(&self, role: &str) -> anyhow::Result<Vec<SkillRequirement>> {
        let occupations = self.provider.search(role).await?;
        if occupations.is_empty() {
            anyhow::bail!("occupation search returned no results for {role:?}");
        }

        let best = pick_best_occupation(role, &occupations);
        let mut ranked: Vec<(f64, String)> = Vec::new();

        if !best.code.is_empty() {
            for element in self.provider.skills_for(&best.code).await? {
                let name = normalize_skill(&element.name);
                if !name.is_empty() {
                    ranked.push((element.importance, name));
                }
            }
        }

        // Some occupations come back with no skill elements at all; fall back
        // to spotting known skills in the occupation text.
        if ranked.is_empty() {
            ranked = alias_fallback(&occupations);
        }

        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
        let mut seen = HashSet::new();
        let mut skills = Vec::new();
        for (importance, name) in ranked {
            if !seen.insert(name.clone()) {
                continue;
            }
            skills.push(SkillRequirement {
                canonical_name: name,
                importance_weight: importance,
                source_role: best.title.clone(),
            });
            if skills.len() >= MAX_SKILLS {
                break;
            }
        }
        Ok(skills)
    }
}

/// Best match = 2×token overlap with the role, +1 when the title starts with
/// the role's lead token.
fn pick_best_occupation<'a>(role: &str, occupations: &'a [OccupationSummary]) -> &'a OccupationSummary {
    let normalized_role = normalize_skill(role);
    let role_tokens: HashSet<String> = content_tokens(&normalized_role).into_iter().collect();
    let lead_token = normalized_role.split_whitespace().next().unwrap_or_default();

    let mut best = &occupations[0];
    let mut best_score = -1.0;
    for occupation in occupations {
        let title = normalize_skill(&occupation.title);
        if title.is_empty() {
            continue;
        }
        let title_tokens: HashSet<String> = title.split_whitespace().map(canonical_token).collect();
        let overlap = role_tokens.intersection(&title_tokens).count() as f64;
        let direct = if !lead_token.is_empty() && title.starts_with(lead_token) { 1.0 } else { 0.0 };
        let score = overlap * 2.0 + direct;
        if score > best_score {
            best_score = score;
            best = occupation;
        }
    }
    best
}

fn alias_fallback(occupations: &[OccupationSummary]) -> Vec<(f64, String)> {
    let mut found = Vec::new();
    for occupation in occupations {
        let text = format!("{} {}", occupation.title, occupation.description).to_lowercase();
        for (canonical, aliases) in SKILL_ALIASES {
            let mentioned = std::iter::once(*canonical)
                .chain(aliases.iter().copied())
                .any(|alias| !alias.is_empty() && text.contains(alias));
            if mentioned {
                found.push((ALIAS_FALLBACK_IMPORTANCE, (*canonical).to_string()));
            }
        }
    }
    found
}
