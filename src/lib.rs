#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

//! MarketReady: a market-readiness scoring engine.
//!
//! Combines required-skill overlap from an occupational skill-standards
//! provider, vacancy/salary benchmarks from a job-market provider, evidence
//! density from verified proof submissions, and an optional code-repository
//! verification pass into deterministic, clamped composite scores — and keeps
//! producing them when either provider is degraded or down, through a
//! cascading query ladder and time-boxed snapshots.

pub mod automation;
pub mod cache;
pub mod config;
pub mod error;
pub mod market;
pub mod observability;
pub mod providers;
pub mod readiness;
pub mod scoring;
pub mod skills;
pub mod snapshot;
pub mod store;

pub use config::Config;
pub use error::{ReadyError, Result};
pub use market::{
    MarketAlignmentAnalyzer, MarketBenchmarkResolver, MarketStressOrchestrator, StressTestResult,
};
pub use readiness::{EngineeringSignalAnalyzer, ReadinessAggregator, ReadinessResult};
pub use skills::{RepositorySkillVerifier, SkillRequirementResolver};
pub use snapshot::{SnapshotStore, SourceMode};
