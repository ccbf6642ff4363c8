//! TOML-backed configuration schema.
//!
//! Every field has a serde default so a partial (or empty) config file loads
//! cleanly; validation catches values that would misbehave at runtime.

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub occupation: OccupationConfig,
    #[serde(default)]
    pub vacancy: VacancyConfig,
    #[serde(default)]
    pub codehost: CodeHostConfig,
    #[serde(default)]
    pub snapshots: SnapshotConfig,
    #[serde(default)]
    pub automation: AutomationConfig,
}

/// Occupational skill-standards provider (CareerOneStop-compatible).
#[derive(Debug, Clone, Deserialize)]
pub struct OccupationConfig {
    pub api_key: Option<String>,
    pub user_id: Option<String>,
    #[serde(default = "default_occupation_timeout_secs")]
    pub timeout_secs: u64,
}

/// Job-vacancy/salary provider (Adzuna-compatible).
#[derive(Debug, Clone, Deserialize)]
pub struct VacancyConfig {
    pub app_id: Option<String>,
    pub app_key: Option<String>,
    #[serde(default = "default_vacancy_country")]
    pub country: String,
    #[serde(default = "default_vacancy_timeout_secs")]
    pub timeout_secs: u64,
}

/// Code-hosting provider (GitHub-compatible).
#[derive(Debug, Clone, Deserialize)]
pub struct CodeHostConfig {
    pub token: Option<String>,
    #[serde(default = "default_codehost_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_skills_ttl_hours")]
    pub skills_ttl_hours: i64,
    #[serde(default = "default_benchmark_ttl_hours")]
    pub benchmark_ttl_hours: i64,
    #[serde(default = "default_stress_ttl_hours")]
    pub stress_ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AutomationConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_automation_interval_minutes")]
    pub interval_minutes: u64,
    #[serde(default)]
    pub run_on_start: bool,
    /// Role queries swept per pathway; the pathway name is used when empty.
    #[serde(default)]
    pub role_families: Vec<String>,
    #[serde(default = "default_signal_limit")]
    pub signal_limit: usize,
}

fn default_occupation_timeout_secs() -> u64 {
    20
}

fn default_vacancy_country() -> String {
    "us".to_string()
}

fn default_vacancy_timeout_secs() -> u64 {
    12
}

fn default_codehost_timeout_secs() -> u64 {
    3
}

fn default_skills_ttl_hours() -> i64 {
    7 * 24
}

fn default_benchmark_ttl_hours() -> i64 {
    24
}

fn default_stress_ttl_hours() -> i64 {
    24
}

fn default_automation_interval_minutes() -> u64 {
    360
}

fn default_signal_limit() -> usize {
    25
}

impl Default for OccupationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            user_id: None,
            timeout_secs: default_occupation_timeout_secs(),
        }
    }
}

impl Default for VacancyConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            app_key: None,
            country: default_vacancy_country(),
            timeout_secs: default_vacancy_timeout_secs(),
        }
    }
}

impl Default for CodeHostConfig {
    fn default() -> Self {
        Self {
            token: None,
            timeout_secs: default_codehost_timeout_secs(),
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            skills_ttl_hours: default_skills_ttl_hours(),
            benchmark_ttl_hours: default_benchmark_ttl_hours(),
            stress_ttl_hours: default_stress_ttl_hours(),
        }
    }
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_minutes: default_automation_interval_minutes(),
            run_on_start: false,
            role_families: Vec::new(),
            signal_limit: default_signal_limit(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Config =
            toml::from_str(&raw).map_err(|e| ConfigError::Load(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.occupation.timeout_secs == 0
            || self.vacancy.timeout_secs == 0
            || self.codehost.timeout_secs == 0
        {
            return Err(ConfigError::Validation(
                "provider timeouts must be at least one second".into(),
            ));
        }
        if self.snapshots.skills_ttl_hours <= 0
            || self.snapshots.benchmark_ttl_hours <= 0
            || self.snapshots.stress_ttl_hours <= 0
        {
            return Err(ConfigError::Validation(
                "snapshot TTLs must be positive".into(),
            ));
        }
        if self.automation.interval_minutes < 5 {
            return Err(ConfigError::Validation(
                "automation interval must be at least 5 minutes".into(),
            ));
        }
        if self.automation.signal_limit == 0 || self.automation.signal_limit > 50 {
            return Err(ConfigError::Validation(
                "automation signal limit must be within 1..=50".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.occupation.timeout_secs, 20);
        assert_eq!(config.vacancy.country, "us");
        assert_eq!(config.vacancy.timeout_secs, 12);
        assert_eq!(config.codehost.timeout_secs, 3);
        assert_eq!(config.snapshots.skills_ttl_hours, 168);
        assert_eq!(config.automation.interval_minutes, 360);
        assert!(!config.automation.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_config_overrides_defaults() {
        let config: Config = toml::from_str(
            r#"
            [vacancy]
            app_id = "id"
            app_key = "key"
            country = "gb"

            [automation]
            enabled = true
            interval_minutes = 30
            role_families = ["backend engineer"]
            "#,
        )
        .unwrap();
        assert_eq!(config.vacancy.country, "gb");
        assert_eq!(config.vacancy.app_id.as_deref(), Some("id"));
        assert!(config.automation.enabled);
        assert_eq!(config.automation.role_families, vec!["backend engineer"]);
    }

    #[test]
    fn validation_rejects_zero_timeouts_and_tiny_intervals() {
        let mut config = Config::default();
        config.codehost.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.automation.interval_minutes = 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.snapshots.benchmark_ttl_hours = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reads_a_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[occupation]\napi_key = \"k\"\nuser_id = \"u\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.occupation.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn load_rejects_malformed_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not toml [[").unwrap();
        assert!(Config::load(file.path()).is_err());
    }
}
