//! Append-only TTL cache of provider results.
//!
//! Every successful provider resolution is written here as an immutable
//! timestamped record. When a live fetch later fails, the most recent record
//! within its TTL is served instead; a record older than the TTL is treated
//! as absent, never as valid data. Records are indexed by
//! `(source kind, cache key)` so lookup cost does not grow with unrelated
//! writes.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Whether a result came from a live provider call or a snapshot fallback.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SourceMode {
    Live,
    SnapshotFallback,
}

/// Which provider family a snapshot row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SnapshotKind {
    SkillRequirements,
    MarketBenchmark,
    StressResult,
}

/// One immutable snapshot row.
#[derive(Debug, Clone)]
pub struct SnapshotRecord {
    pub kind: SnapshotKind,
    pub cache_key: String,
    pub captured_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

/// Persistence contract: append rows, read back the newest row per key.
#[async_trait]
pub trait SnapshotBackend: Send + Sync {
    async fn append(&self, record: SnapshotRecord) -> anyhow::Result<()>;
    async fn latest(&self, kind: SnapshotKind, cache_key: &str)
    -> anyhow::Result<Option<SnapshotRecord>>;
}

/// In-memory backend keyed by `(kind, cache_key)`.
#[derive(Default)]
pub struct InMemorySnapshotBackend {
    rows: RwLock<HashMap<(SnapshotKind, String), Vec<SnapshotRecord>>>,
}

impl InMemorySnapshotBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotBackend for InMemorySnapshotBackend {
    async fn append(&self, record: SnapshotRecord) -> anyhow::Result<()> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| anyhow::anyhow!("snapshot lock poisoned"))?;
        rows.entry((record.kind, record.cache_key.clone()))
            .or_default()
            .push(record);
        Ok(())
    }

    async fn latest(
        &self,
        kind: SnapshotKind,
        cache_key: &str,
    ) -> anyhow::Result<Option<SnapshotRecord>> {
        let rows = self
            .rows
            .read()
            .map_err(|_| anyhow::anyhow!("snapshot lock poisoned"))?;
        Ok(rows
            .get(&(kind, cache_key.to_string()))
            .and_then(|records| records.iter().max_by_key(|r| r.captured_at))
            .cloned())
    }
}

/// A snapshot hit, decoded and annotated with its age.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub value: T,
    pub captured_at: DateTime<Utc>,
    pub age_minutes: f64,
}

/// Typed facade over a [`SnapshotBackend`].
#[derive(Clone)]
pub struct SnapshotStore {
    backend: Arc<dyn SnapshotBackend>,
}

impl SnapshotStore {
    pub fn new(backend: Arc<dyn SnapshotBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemorySnapshotBackend::new()))
    }

    /// Append a timestamped record for `(kind, key)`.
    pub async fn put<T: Serialize>(
        &self,
        kind: SnapshotKind,
        key: &str,
        payload: &T,
    ) -> anyhow::Result<DateTime<Utc>> {
        let captured_at = Utc::now();
        self.backend
            .append(SnapshotRecord {
                kind,
                cache_key: key.to_string(),
                captured_at,
                payload: serde_json::to_value(payload)?,
            })
            .await?;
        tracing::debug!(kind = %kind, key, "snapshot stored");
        Ok(captured_at)
    }

    /// Most recent record for `(kind, key)` with age ≤ `max_age`, else `None`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        kind: SnapshotKind,
        key: &str,
        max_age: Duration,
    ) -> Option<Snapshot<T>> {
        let record = match self.backend.latest(kind, key).await {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(kind = %kind, key, "snapshot lookup failed: {e}");
                return None;
            }
        };

        let age = Utc::now() - record.captured_at;
        if age > max_age {
            return None;
        }

        match serde_json::from_value(record.payload) {
            Ok(value) => Some(Snapshot {
                value,
                captured_at: record.captured_at,
                age_minutes: age.num_seconds() as f64 / 60.0,
            }),
            Err(e) => {
                tracing::warn!(kind = %kind, key, "snapshot payload undecodable: {e}");
                None
            }
        }
    }
}

/// Normalize key parts into a stable cache key: lowercased, whitespace
/// collapsed, joined with `|`.
pub fn cache_key(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| part.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase())
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Payload {
        score: f64,
        label: String,
    }

    fn payload() -> Payload {
        Payload {
            score: 72.5,
            label: "heating_up".into(),
        }
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = SnapshotStore::in_memory();
        store
            .put(SnapshotKind::MarketBenchmark, "software engineer|us", &payload())
            .await
            .unwrap();

        let hit: Snapshot<Payload> = store
            .get(SnapshotKind::MarketBenchmark, "software engineer|us", Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(hit.value, payload());
        assert!(hit.age_minutes < 1.0);
    }

    #[tokio::test]
    async fn expired_snapshot_is_absent() {
        let store = SnapshotStore::in_memory();
        store
            .put(SnapshotKind::SkillRequirements, "software engineer", &payload())
            .await
            .unwrap();

        let hit: Option<Snapshot<Payload>> = store
            .get(SnapshotKind::SkillRequirements, "software engineer", Duration::seconds(-1))
            .await;
        assert!(hit.is_none());
    }

    #[tokio::test]
    async fn most_recent_record_wins() {
        let store = SnapshotStore::in_memory();
        store
            .put(SnapshotKind::MarketBenchmark, "k", &Payload { score: 1.0, label: "old".into() })
            .await
            .unwrap();
        store
            .put(SnapshotKind::MarketBenchmark, "k", &Payload { score: 2.0, label: "new".into() })
            .await
            .unwrap();

        let hit: Snapshot<Payload> = store
            .get(SnapshotKind::MarketBenchmark, "k", Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(hit.value.label, "new");
    }

    #[tokio::test]
    async fn keys_do_not_collide_across_kinds() {
        let store = SnapshotStore::in_memory();
        store
            .put(SnapshotKind::MarketBenchmark, "k", &payload())
            .await
            .unwrap();

        let miss: Option<Snapshot<Payload>> = store
            .get(SnapshotKind::StressResult, "k", Duration::hours(1))
            .await;
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn repeated_reads_within_ttl_are_identical() {
        let store = SnapshotStore::in_memory();
        store
            .put(SnapshotKind::MarketBenchmark, "k", &payload())
            .await
            .unwrap();

        let first: Snapshot<Payload> = store
            .get(SnapshotKind::MarketBenchmark, "k", Duration::hours(1))
            .await
            .unwrap();
        let second: Snapshot<Payload> = store
            .get(SnapshotKind::MarketBenchmark, "k", Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(first.value, second.value);
        assert_eq!(first.captured_at, second.captured_at);
    }

    #[test]
    fn cache_key_normalizes_case_and_whitespace() {
        assert_eq!(
            cache_key(&["  Software   Engineer ", "Atlanta, GA"]),
            "software engineer|atlanta, ga"
        );
    }
}
