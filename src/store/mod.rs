//! Read-mostly gateway to checklist, proof, and market-signal persistence.
//!
//! Scoring never owns these records: proofs and checklist items belong to the
//! surrounding application and are read-only here, with one exception — the
//! repository verification pass may annotate a proof's metadata with what it
//! found. The in-memory implementation backs tests and embedded use.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

// ─── Records ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EvidenceStatus {
    Submitted,
    Verified,
    Rejected,
    NeedsMoreEvidence,
}

/// A proof submission owned by the user.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EvidenceRecord {
    pub id: Uuid,
    pub checklist_item_id: Option<Uuid>,
    pub status: EvidenceStatus,
    pub proof_type: String,
    pub proficiency_level: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl EvidenceRecord {
    /// Whether a repository verification pass has vouched for this proof.
    pub fn repo_verified(&self) -> bool {
        self.metadata
            .get("repo_verified")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistTier {
    NonNegotiable,
    StrongSignal,
}

#[derive(Debug, Clone)]
pub struct ChecklistItem {
    pub id: Uuid,
    pub title: String,
    pub tier: ChecklistTier,
    pub is_critical: bool,
    pub skill_name: Option<String>,
}

/// One observed demand signal for a skill within a pathway.
#[derive(Debug, Clone)]
pub struct MarketSignalRecord {
    pub id: Uuid,
    pub pathway_id: Uuid,
    pub skill_id: Option<String>,
    pub skill_name: Option<String>,
    pub role_family: Option<String>,
    /// Share of extracted tokens this skill accounted for in its batch.
    pub frequency: f64,
    /// Raw number of postings the skill appeared in.
    pub source_count: u32,
    pub window_end: Option<DateTime<Utc>>,
    pub metadata: Value,
}

/// Signal row produced by ingestion, before the store assigns identifiers.
#[derive(Debug, Clone)]
pub struct NewMarketSignal {
    pub pathway_id: Uuid,
    pub skill_name: String,
    pub role_family: Option<String>,
    pub frequency: f64,
    pub source_count: u32,
    pub metadata: Value,
}

#[derive(Debug, Clone)]
pub struct Pathway {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
}

/// Audit row written once per ingestion batch or automation cycle.
#[derive(Debug, Clone)]
pub struct IngestionRecord {
    pub source: String,
    pub fetched_at: DateTime<Utc>,
    pub metadata: Value,
}

// ─── Gateway contract ───────────────────────────────────────────────────────

#[async_trait]
pub trait DataStore: Send + Sync {
    async fn proofs_for_user(&self, user_id: &str) -> anyhow::Result<Vec<EvidenceRecord>>;

    async fn checklist_for_user(&self, user_id: &str) -> anyhow::Result<Vec<ChecklistItem>>;

    /// Raw skill names and item titles behind the user's verified proofs.
    /// Callers canonicalize; the store does not.
    async fn verified_skill_names(&self, user_id: &str) -> anyhow::Result<Vec<String>>;

    async fn signals_for_pathway(
        &self,
        pathway_id: Uuid,
    ) -> anyhow::Result<Vec<MarketSignalRecord>>;

    async fn active_pathways(&self) -> anyhow::Result<Vec<Pathway>>;

    /// Merge `patch` into the metadata of the named proof. Returns `false`
    /// when no such proof exists for the user.
    async fn annotate_proof(
        &self,
        user_id: &str,
        proof_id: Uuid,
        patch: Map<String, Value>,
    ) -> anyhow::Result<bool>;

    async fn record_signals(&self, rows: Vec<NewMarketSignal>) -> anyhow::Result<usize>;

    async fn record_ingestion(&self, source: &str, metadata: Value) -> anyhow::Result<()>;

    async fn latest_ingestion(&self, source: &str) -> anyhow::Result<Option<IngestionRecord>>;
}

// ─── In-memory implementation ───────────────────────────────────────────────

#[derive(Default)]
struct MemoryInner {
    proofs: HashMap<String, Vec<EvidenceRecord>>,
    checklists: HashMap<String, Vec<ChecklistItem>>,
    signals: Vec<MarketSignalRecord>,
    pathways: Vec<Pathway>,
    ingestions: Vec<IngestionRecord>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_pathway(&self, pathway: Pathway) {
        self.inner.write().expect("store lock").pathways.push(pathway);
    }

    pub fn seed_checklist(&self, user_id: &str, items: Vec<ChecklistItem>) {
        self.inner
            .write()
            .expect("store lock")
            .checklists
            .insert(user_id.to_string(), items);
    }

    pub fn seed_proof(&self, user_id: &str, proof: EvidenceRecord) {
        self.inner
            .write()
            .expect("store lock")
            .proofs
            .entry(user_id.to_string())
            .or_default()
            .push(proof);
    }

    pub fn seed_signal(&self, signal: MarketSignalRecord) {
        self.inner.write().expect("store lock").signals.push(signal);
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn proofs_for_user(&self, user_id: &str) -> anyhow::Result<Vec<EvidenceRecord>> {
        let inner = self.inner.read().expect("store lock");
        Ok(inner.proofs.get(user_id).cloned().unwrap_or_default())
    }

    async fn checklist_for_user(&self, user_id: &str) -> anyhow::Result<Vec<ChecklistItem>> {
        let inner = self.inner.read().expect("store lock");
        Ok(inner.checklists.get(user_id).cloned().unwrap_or_default())
    }

    async fn verified_skill_names(&self, user_id: &str) -> anyhow::Result<Vec<String>> {
        let inner = self.inner.read().expect("store lock");
        let proofs = inner.proofs.get(user_id).map(Vec::as_slice).unwrap_or(&[]);
        let items = inner
            .checklists
            .get(user_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let verified_items: Vec<Uuid> = proofs
            .iter()
            .filter(|p| p.status == EvidenceStatus::Verified)
            .filter_map(|p| p.checklist_item_id)
            .collect();

        let mut names = Vec::new();
        for item in items {
            if !verified_items.contains(&item.id) {
                continue;
            }
            if let Some(skill) = &item.skill_name {
                names.push(skill.clone());
            }
            names.push(item.title.clone());
        }
        Ok(names)
    }

    async fn signals_for_pathway(
        &self,
        pathway_id: Uuid,
    ) -> anyhow::Result<Vec<MarketSignalRecord>> {
        let inner = self.inner.read().expect("store lock");
        Ok(inner
            .signals
            .iter()
            .filter(|s| s.pathway_id == pathway_id)
            .cloned()
            .collect())
    }

    async fn active_pathways(&self) -> anyhow::Result<Vec<Pathway>> {
        let inner = self.inner.read().expect("store lock");
        Ok(inner.pathways.iter().filter(|p| p.is_active).cloned().collect())
    }

    async fn annotate_proof(
        &self,
        user_id: &str,
        proof_id: Uuid,
        patch: Map<String, Value>,
    ) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().expect("store lock");
        let Some(proofs) = inner.proofs.get_mut(user_id) else {
            return Ok(false);
        };
        let Some(proof) = proofs.iter_mut().find(|p| p.id == proof_id) else {
            return Ok(false);
        };
        for (key, value) in patch {
            proof.metadata.insert(key, value);
        }
        Ok(true)
    }

    async fn record_signals(&self, rows: Vec<NewMarketSignal>) -> anyhow::Result<usize> {
        let mut inner = self.inner.write().expect("store lock");
        let created = rows.len();
        for row in rows {
            inner.signals.push(MarketSignalRecord {
                id: Uuid::new_v4(),
                pathway_id: row.pathway_id,
                skill_id: Some(row.skill_name.clone()),
                skill_name: Some(row.skill_name),
                role_family: row.role_family,
                frequency: row.frequency,
                source_count: row.source_count,
                window_end: Some(Utc::now()),
                metadata: row.metadata,
            });
        }
        Ok(created)
    }

    async fn record_ingestion(&self, source: &str, metadata: Value) -> anyhow::Result<()> {
        let mut inner = self.inner.write().expect("store lock");
        inner.ingestions.push(IngestionRecord {
            source: source.to_string(),
            fetched_at: Utc::now(),
            metadata,
        });
        Ok(())
    }

    async fn latest_ingestion(&self, source: &str) -> anyhow::Result<Option<IngestionRecord>> {
        let inner = self.inner.read().expect("store lock");
        Ok(inner
            .ingestions
            .iter()
            .filter(|r| r.source == source)
            .max_by_key(|r| r.fetched_at)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proof(item: Option<Uuid>, status: EvidenceStatus) -> EvidenceRecord {
        EvidenceRecord {
            id: Uuid::new_v4(),
            checklist_item_id: item,
            status,
            proof_type: "repo_url".into(),
            proficiency_level: None,
            metadata: Map::new(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn verified_skill_names_include_skill_and_title() {
        let store = MemoryStore::new();
        let item_id = Uuid::new_v4();
        store.seed_checklist(
            "u1",
            vec![ChecklistItem {
                id: item_id,
                title: "Build a REST API".into(),
                tier: ChecklistTier::NonNegotiable,
                is_critical: true,
                skill_name: Some("REST API".into()),
            }],
        );
        store.seed_proof("u1", proof(Some(item_id), EvidenceStatus::Verified));
        store.seed_proof("u1", proof(Some(item_id), EvidenceStatus::Rejected));

        let names = store.verified_skill_names("u1").await.unwrap();
        assert!(names.contains(&"REST API".to_string()));
        assert!(names.contains(&"Build a REST API".to_string()));
    }

    #[tokio::test]
    async fn unverified_proofs_contribute_nothing() {
        let store = MemoryStore::new();
        let item_id = Uuid::new_v4();
        store.seed_checklist(
            "u1",
            vec![ChecklistItem {
                id: item_id,
                title: "SQL".into(),
                tier: ChecklistTier::StrongSignal,
                is_critical: false,
                skill_name: None,
            }],
        );
        store.seed_proof("u1", proof(Some(item_id), EvidenceStatus::Submitted));

        assert!(store.verified_skill_names("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn annotate_proof_merges_metadata() {
        let store = MemoryStore::new();
        let record = proof(None, EvidenceStatus::Verified);
        let id = record.id;
        store.seed_proof("u1", record);

        let mut patch = Map::new();
        patch.insert("repo_verified".into(), Value::Bool(true));
        assert!(store.annotate_proof("u1", id, patch).await.unwrap());

        let proofs = store.proofs_for_user("u1").await.unwrap();
        assert!(proofs[0].repo_verified());
    }

    #[tokio::test]
    async fn annotate_missing_proof_returns_false() {
        let store = MemoryStore::new();
        let found = store
            .annotate_proof("u1", Uuid::new_v4(), Map::new())
            .await
            .unwrap();
        assert!(!found);
    }

    #[tokio::test]
    async fn record_signals_assigns_ids_and_scopes_by_pathway() {
        let store = MemoryStore::new();
        let pathway = Uuid::new_v4();
        let other = Uuid::new_v4();
        store
            .record_signals(vec![NewMarketSignal {
                pathway_id: pathway,
                skill_name: "python".into(),
                role_family: None,
                frequency: 0.5,
                source_count: 3,
                metadata: Value::Null,
            }])
            .await
            .unwrap();

        assert_eq!(store.signals_for_pathway(pathway).await.unwrap().len(), 1);
        assert!(store.signals_for_pathway(other).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn latest_ingestion_picks_newest() {
        let store = MemoryStore::new();
        store
            .record_ingestion("auto:cycle", serde_json::json!({"n": 1}))
            .await
            .unwrap();
        store
            .record_ingestion("auto:cycle", serde_json::json!({"n": 2}))
            .await
            .unwrap();

        let latest = store.latest_ingestion("auto:cycle").await.unwrap().unwrap();
        assert_eq!(latest.metadata["n"], 2);
    }
}
