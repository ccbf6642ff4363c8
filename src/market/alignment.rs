//! Scores how well verified skills cover the top-demand skills of a pathway.

use crate::scoring::{round1, round3};
use crate::store::DataStore;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

/// Share of ranked skills considered "high demand".
const HIGH_DEMAND_SHARE: f64 = 0.30;

#[derive(Debug, Clone, serde::Serialize)]
pub struct TopDemandSkill {
    pub skill_id: String,
    pub skill_name: Option<String>,
    pub weight: f64,
    pub normalized_weight: f64,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct MarketAlignmentResult {
    pub score: f64,
    pub coverage_ratio: f64,
    pub top_demand_skills: Vec<TopDemandSkill>,
    pub high_demand_skill_ids: Vec<String>,
}

pub struct MarketAlignmentAnalyzer {
    store: Arc<dyn DataStore>,
}

impl MarketAlignmentAnalyzer {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Aggregate demand per skill from the pathway's signal records, take the
    /// top 30 % (at least one) as the high-demand set, and score coverage of
    /// that set by `verified_skill_ids`.
    pub async fn align(
        &self,
        pathway_id: Uuid,
        verified_skill_ids: &HashSet<String>,
    ) -> crate::error::Result<MarketAlignmentResult> {
        let signals = self.store.signals_for_pathway(pathway_id).await?;

        let mut weights: HashMap<String, f64> = HashMap::new();
        let mut names: HashMap<String, String> = HashMap::new();
        for signal in &signals {
            let Some(skill_id) = signal.skill_id.as_deref().filter(|id| !id.is_empty()) else {
                continue;
            };
            let weight = f64::from(signal.source_count) + signal.frequency.max(0.0) * 50.0;
            *weights.entry(skill_id.to_string()).or_insert(0.0) += weight;
            if let Some(name) = &signal.skill_name {
                names.entry(skill_id.to_string()).or_insert_with(|| name.clone());
            }
        }

        if weights.is_empty() {
            return Ok(MarketAlignmentResult::default());
        }

        let max_weight = weights.values().copied().fold(0.0_f64, f64::max);
        let normalized: HashMap<&str, f64> = weights
            .iter()
            .map(|(id, w)| {
                let n = if max_weight > 0.0 { w / max_weight } else { 0.0 };
                (id.as_str(), n)
            })
            .collect();

        let mut ordered: Vec<&str> = weights.keys().map(String::as_str).collect();
        ordered.sort_by(|a, b| {
            normalized[b]
                .total_cmp(&normalized[a])
                .then(weights[*b].total_cmp(&weights[*a]))
                .then(b.cmp(a))
        });

        let top_count = ((ordered.len() as f64 * HIGH_DEMAND_SHARE).ceil() as usize).max(1);
        let high_demand: Vec<String> = ordered[..top_count].iter().map(|s| s.to_string()).collect();

        let matched = high_demand
            .iter()
            .filter(|id| verified_skill_ids.contains(*id))
            .count();
        let coverage_ratio = matched as f64 / top_count as f64;

        let top_demand_skills = high_demand
            .iter()
            .map(|id| TopDemandSkill {
                skill_id: id.clone(),
                skill_name: names.get(id).cloned(),
                weight: round3(weights[id]),
                normalized_weight: round3(normalized[id.as_str()]),
            })
            .collect();

        Ok(MarketAlignmentResult {
            score: round1(coverage_ratio * 100.0),
            coverage_ratio: round3(coverage_ratio),
            top_demand_skills,
            high_demand_skill_ids: high_demand,
        })
    }
}
