//! Periodic market-signal ingestion across active pathways.
//!
//! One logical cycle sweeps every active pathway's role queries against the
//! configured providers, turning posting and occupation text into demand
//! signals for the alignment analyzer. Cycles are serialized by an atomic
//! try-acquire guard: a second invocation while one is in flight fails
//! immediately with `ConcurrentRunRejected` instead of queuing. The scheduler
//! is an explicit service with a start/stop lifecycle and a status accessor.

use crate::config::AutomationConfig;
use crate::error::{AutomationError, ReadyError, Result};
use crate::providers::occupation::OccupationProvider;
use crate::providers::vacancy::VacancyProvider;
use crate::scoring::round4;
use crate::store::{DataStore, NewMarketSignal, Pathway};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

const CYCLE_AUDIT_SOURCE: &str = "auto:market-cycle";
const NATIONWIDE: &str = "United States";
const TOP_SIGNALS_PER_BATCH: usize = 25;

/// Skills worth counting when they appear in posting or occupation text.
const CURATED_TOKENS: &[&str] = &[
    "python",
    "sql",
    "java",
    "javascript",
    "react",
    "aws",
    "docker",
    "kubernetes",
    "power bi",
    "tableau",
    "machine learning",
    "data analysis",
    "api",
    "full stack",
    "cybersecurity",
];

#[derive(Debug, Clone, serde::Serialize)]
pub struct RunSummary {
    pub ok: bool,
    pub trigger: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub pathways_considered: usize,
    pub ingestions: usize,
    pub signals_created: usize,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct AutomationStatus {
    pub enabled: bool,
    pub scheduler_running: bool,
    pub interval_minutes: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

struct SchedulerHandle {
    task: JoinHandle<()>,
    stop: watch::Sender<bool>,
}

struct AutomationInner {
    occupation: Arc<dyn OccupationProvider>,
    vacancy: Arc<dyn VacancyProvider>,
    store: Arc<dyn DataStore>,
    config: AutomationConfig,
    run_guard: AtomicBool,
    last_error: Mutex<Option<String>>,
}

#[derive(Clone)]
pub struct MarketAutomation {
    inner: Arc<AutomationInner>,
    scheduler: Arc<Mutex<Option<SchedulerHandle>>>,
}

impl MarketAutomation {
    pub fn new(
        occupation: Arc<dyn OccupationProvider>,
        vacancy: Arc<dyn VacancyProvider>,
        store: Arc<dyn DataStore>,
        config: AutomationConfig,
    ) -> Self {
        Self {
            inner: Arc::new(AutomationInner {
                occupation,
                vacancy,
                store,
                config,
                run_guard: AtomicBool::new(false),
                last_error: Mutex::new(None),
            }),
            scheduler: Arc::new(Mutex::new(None)),
        }
    }

    /// Run one ingestion cycle now. Fails with `ConcurrentRunRejected` when a
    /// cycle is already in flight.
    pub async fn run_cycle(&self, trigger: &str) -> Result<RunSummary> {
        if self
            .inner
            .run_guard
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ReadyError::Automation(AutomationError::ConcurrentRunRejected));
        }

        let result = run_cycle_inner(&self.inner, trigger).await;
        self.inner.run_guard.store(false, Ordering::SeqCst);

        let mut last_error = self.inner.last_error.lock().await;
        match &result {
            Ok(summary) if summary.errors.is_empty() => *last_error = None,
            Ok(summary) => *last_error = summary.errors.first().cloned(),
            Err(e) => *last_error = Some(e.to_string()),
        }
        result
    }

    /// Start the periodic scheduler. Idempotent: a second start while the
    /// task is alive does nothing.
    pub async fn start(&self) {
        let mut scheduler = self.scheduler.lock().await;
        if scheduler.as_ref().is_some_and(|s| !s.task.is_finished()) {
            return;
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let inner = Arc::clone(&self.inner);
        let interval = std::time::Duration::from_secs(inner.config.interval_minutes.max(5) * 60);
        let run_on_start = inner.config.run_on_start;

        let task = tokio::spawn(async move {
            if run_on_start {
                run_and_record(&inner, "startup").await;
            }
            loop {
                tokio::select! {
                    _ = stop_rx.changed() => {
                        if *stop_rx.borrow() {
                            break;
                        }
                    }
                    () = tokio::time::sleep(interval) => {
                        run_and_record(&inner, "schedule").await;
                    }
                }
            }
        });

        tracing::info!(
            interval_minutes = self.inner.config.interval_minutes,
            "market automation scheduler started"
        );
        *scheduler = Some(SchedulerHandle { task, stop: stop_tx });
    }

    /// Stop the scheduler, waiting briefly for a clean exit.
    pub async fn stop(&self) {
        let Some(handle) = self.scheduler.lock().await.take() else {
            return;
        };
        let _ = handle.stop.send(true);
        if tokio::time::timeout(std::time::Duration::from_secs(5), handle.task)
            .await
            .is_err()
        {
            tracing::warn!("scheduler did not stop in time; detaching");
        }
    }

    pub async fn status(&self) -> AutomationStatus {
        let scheduler_running = self
            .scheduler
            .lock()
            .await
            .as_ref()
            .is_some_and(|s| !s.task.is_finished());
        let last_cycle_at = self
            .inner
            .store
            .latest_ingestion(CYCLE_AUDIT_SOURCE)
            .await
            .ok()
            .flatten()
            .map(|r| r.fetched_at);

        AutomationStatus {
            enabled: self.inner.config.enabled,
            scheduler_running,
            interval_minutes: self.inner.config.interval_minutes,
            last_cycle_at,
            last_error: self.inner.last_error.lock().await.clone(),
        }
    }
}

async fn run_and_record(inner: &Arc<AutomationInner>, trigger: &str) {
    let automation = MarketAutomation {
        inner: Arc::clone(inner),
        scheduler: Arc::new(Mutex::new(None)),
    };
    match automation.run_cycle(trigger).await {
        Ok(summary) => {
            tracing::info!(
                trigger,
                signals = summary.signals_created,
                ingestions = summary.ingestions,
                "automation cycle finished"
            );
        }
        Err(e) => tracing::warn!(trigger, "automation cycle failed: {e}"),
    }
}

async fn run_cycle_inner(inner: &AutomationInner, trigger: &str) -> Result<RunSummary> {
    let started_at = Utc::now();
    let mut summary = RunSummary {
        ok: true,
        trigger: trigger.to_string(),
        started_at,
        finished_at: started_at,
        duration_seconds: 0.0,
        pathways_considered: 0,
        ingestions: 0,
        signals_created: 0,
        warnings: Vec::new(),
        errors: Vec::new(),
    };

    let pathways = inner.store.active_pathways().await?;
    summary.pathways_considered = pathways.len();
    if pathways.is_empty() {
        summary.warnings.push("No active pathways found for automation run".into());
        return finish(inner, summary).await;
    }

    for pathway in &pathways {
        for role_query in role_queries(&inner.config, pathway) {
            ingest_vacancy_signals(inner, pathway, &role_query, &mut summary).await;
            ingest_occupation_signals(inner, pathway, &role_query, &mut summary).await;
        }
    }

    finish(inner, summary).await
}

async fn finish(inner: &AutomationInner, mut summary: RunSummary) -> Result<RunSummary> {
    summary.finished_at = Utc::now();
    summary.duration_seconds =
        (summary.finished_at - summary.started_at).num_milliseconds() as f64 / 1000.0;
    summary.ok = summary.errors.is_empty();

    // Compact run-level audit trail for status and troubleshooting.
    inner
        .store
        .record_ingestion(
            CYCLE_AUDIT_SOURCE,
            json!({
                "trigger": summary.trigger,
                "pathways_considered": summary.pathways_considered,
                "ingestions": summary.ingestions,
                "signals_created": summary.signals_created,
                "errors": summary.errors.iter().take(20).collect::<Vec<_>>(),
                "warnings": summary.warnings.iter().take(20).collect::<Vec<_>>(),
                "duration_seconds": summary.duration_seconds,
            }),
        )
        .await?;
    Ok(summary)
}

fn role_queries(config: &AutomationConfig, pathway: &Pathway) -> Vec<String> {
    if config.role_families.is_empty() {
        vec![pathway.name.clone()]
    } else {
        config.role_families.clone()
    }
}

async fn ingest_vacancy_signals(
    inner: &AutomationInner,
    pathway: &Pathway,
    role_query: &str,
    summary: &mut RunSummary,
) {
    let postings = match inner
        .vacancy
        .postings(role_query, NATIONWIDE, inner.config.signal_limit)
        .await
    {
        Ok(postings) => postings,
        Err(e) => {
            summary
                .errors
                .push(format!("{}:{}:{role_query} -> {e:#}", inner.vacancy.name(), pathway.name));
            return;
        }
    };

    let records: Vec<String> = postings
        .iter()
        .map(|p| format!("{} {}", p.title, p.description))
        .collect();
    record_batch(inner, pathway.id, role_query, inner.vacancy.name(), &records, summary).await;
}

async fn ingest_occupation_signals(
    inner: &AutomationInner,
    pathway: &Pathway,
    role_query: &str,
    summary: &mut RunSummary,
) {
    let occupations = match inner.occupation.search(role_query).await {
        Ok(occupations) => occupations,
        Err(e) => {
            summary.errors.push(format!(
                "{}:{}:{role_query} -> {e:#}",
                inner.occupation.name(),
                pathway.name
            ));
            return;
        }
    };

    let records: Vec<String> = occupations
        .iter()
        .take(inner.config.signal_limit)
        .map(|o| format!("{} {}", o.title, o.description))
        .collect();
    record_batch(inner, pathway.id, role_query, inner.occupation.name(), &records, summary).await;
}

async fn record_batch(
    inner: &AutomationInner,
    pathway_id: Uuid,
    role_query: &str,
    provider: &str,
    records: &[String],
    summary: &mut RunSummary,
) {
    let rows = to_signal_rows(provider, records, pathway_id, role_query);
    if rows.is_empty() {
        return;
    }

    let trigger = summary.trigger.clone();
    let row_count = rows.len();
    let recorded = async {
        inner
            .store
            .record_ingestion(
                &format!("auto:{provider}"),
                json!({
                    "trigger": trigger,
                    "query": role_query,
                    "pathway_id": pathway_id.to_string(),
                    "signal_rows": row_count,
                }),
            )
            .await?;
        inner.store.record_signals(rows).await
    }
    .await;

    match recorded {
        Ok(created) => {
            summary.ingestions += 1;
            summary.signals_created += created;
        }
        Err(e) => summary.errors.push(format!("{provider}:{role_query} -> {e:#}")),
    }
}

/// Curated skill tokens found in `text`; when none match, the first eight
/// distinct plain words are counted instead so sparse providers still
/// produce a signal.
fn extract_skill_tokens(text: &str) -> Vec<String> {
    let normalized = text.to_lowercase();
    let curated: Vec<String> = CURATED_TOKENS
        .iter()
        .filter(|token| normalized.contains(*token))
        .map(ToString::to_string)
        .collect();
    if !curated.is_empty() {
        return curated;
    }

    let mut words = Vec::new();
    for word in normalized.split(|c: char| !(c.is_ascii_alphanumeric() || "_+.-".contains(c))) {
        let word = word.trim_matches(|c: char| !c.is_ascii_alphanumeric());
        if word.len() < 3 || !word.starts_with(|c: char| c.is_ascii_alphabetic()) {
            continue;
        }
        if !words.contains(&word.to_string()) {
            words.push(word.to_string());
        }
        if words.len() >= 8 {
            break;
        }
    }
    words
}

/// Count token occurrences across a record batch and keep the top 25 as
/// signal rows with their frequency share.
fn to_signal_rows(
    provider: &str,
    records: &[String],
    pathway_id: Uuid,
    role_family: &str,
) -> Vec<NewMarketSignal> {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for record in records {
        for token in extract_skill_tokens(record) {
            *counts.entry(token).or_insert(0) += 1;
        }
    }

    let total: u32 = counts.values().sum::<u32>().max(1);
    let mut ranked: Vec<(String, u32)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(TOP_SIGNALS_PER_BATCH);

    ranked
        .into_iter()
        .map(|(skill, count)| NewMarketSignal {
            pathway_id,
            skill_name: skill,
            role_family: Some(role_family.to_string()),
            frequency: round4(f64::from(count) / f64::from(total)),
            source_count: count,
            metadata: json!({
                "provider": provider,
                "record_count": records.len(),
            }),
        })
        .collect()
}
