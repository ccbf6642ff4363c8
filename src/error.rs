use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `MarketReady`.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum ReadyError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── External data providers ─────────────────────────────────────────
    #[error("provider: {0}")]
    Provider(#[from] ProviderError),

    // ── Persistence gateway ─────────────────────────────────────────────
    #[error("store: {0}")]
    Store(#[from] StoreError),

    // ── Automation scheduler ────────────────────────────────────────────
    #[error("automation: {0}")]
    Automation(#[from] AutomationError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Provider errors ─────────────────────────────────────────────────────────

/// Failures of the occupational and job-market data providers.
///
/// `Unavailable` means the live fetch failed AND no valid snapshot existed —
/// the caller cannot compute now. Serving stale data is not an error: a
/// snapshot hit is reported through `SourceMode::SnapshotFallback` on the
/// result instead.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} unavailable: {message}")]
    Unavailable { provider: String, message: String },

    #[error("{provider} returned no required skills for role {role:?}")]
    NoSkillsFound { provider: String, role: String },

    #[error("{provider} returned no usable benchmarks for {role:?} in {location:?}")]
    NoBenchmarkFound {
        provider: String,
        role: String,
        location: String,
    },

    #[error("{provider} credentials not configured")]
    NotConfigured { provider: String },
}

// ─── Store errors ────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("query failed: {0}")]
    Query(String),
}

// ─── Automation errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("ingestion cycle is already running")]
    ConcurrentRunRejected,

    #[error("scheduler: {0}")]
    Scheduler(String),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, ReadyError>;

impl ReadyError {
    /// `true` when the error means a live provider failed with no valid
    /// snapshot to fall back on.
    pub fn is_provider_unavailable(&self) -> bool {
        matches!(
            self,
            ReadyError::Provider(
                ProviderError::Unavailable { .. }
                    | ProviderError::NoSkillsFound { .. }
                    | ProviderError::NoBenchmarkFound { .. }
                    | ProviderError::NotConfigured { .. }
            )
        )
    }
}
