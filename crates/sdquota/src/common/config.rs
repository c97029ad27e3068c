//! Configuration of the quota policy, read from a TOML file.
//!
//! Every key is optional, a missing configuration file means that all defaults apply.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tally::decision::DEFAULT_DEMOTION_SUFFIX;
use tally::table::weight::DEFAULT_PARTITION_WEIGHT;
use tally::usage::{DEFAULT_QUERY_RETRIES, DEFAULT_QUERY_TIMEOUT, MAX_QUERY_RETRIES};
use tally::{BackendFailurePolicy, DemotionPolicy, EngineConfig, USAGE_WINDOW_SECONDS};

use crate::common::error::error;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/slurm/sdquota.toml";
pub const DEFAULT_WEIGHTS_PATH: &str = "/etc/slurm/sdquota/weights.csv";
pub const DEFAULT_QUOTAS_PATH: &str = "/etc/slurm/sdquota/quotas.csv";

/// How over-quota jobs are demoted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Move the job into the lower-priority twin of its partition.
    #[default]
    Partition,
    /// Halve the priority of the job.
    Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct QuotaConfig {
    /// File with `partition,weight` lines.
    pub weights: PathBuf,
    /// File with `account,quota` lines.
    pub quotas: PathBuf,
    pub policy: PolicyKind,
    /// Suffix of lower-priority partitions.
    pub suffix: String,
    /// Weight of partitions missing from the weight table.
    pub default_weight: f64,
    #[serde(with = "humantime_serde_duration")]
    pub window: Duration,
    #[serde(with = "humantime_serde_duration")]
    pub query_timeout: Duration,
    pub query_retries: u32,
    pub on_backend_failure: BackendFailurePolicy,
    /// Keep the tables in memory instead of reading them for every job. Only useful when one
    /// engine evaluates many jobs, every CLI invocation reads the tables anew.
    pub cache_tables: bool,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            weights: PathBuf::from(DEFAULT_WEIGHTS_PATH),
            quotas: PathBuf::from(DEFAULT_QUOTAS_PATH),
            policy: PolicyKind::default(),
            suffix: DEFAULT_DEMOTION_SUFFIX.to_string(),
            default_weight: DEFAULT_PARTITION_WEIGHT,
            window: Duration::from_secs(USAGE_WINDOW_SECONDS),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            query_retries: DEFAULT_QUERY_RETRIES,
            on_backend_failure: BackendFailurePolicy::default(),
            cache_tables: false,
        }
    }
}

impl QuotaConfig {
    /// Loads the configuration from `path` and applies overrides from the environment.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let config = if path.exists() {
            let text = std::fs::read_to_string(path)?;
            Self::parse(&text)?
        } else {
            log::debug!(
                "Configuration file {} not found, using defaults",
                path.display()
            );
            Self::default()
        };
        let config = config.with_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn parse(text: &str) -> crate::Result<Self> {
        let config: QuotaConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `SDQUOTA_QUERY_TIMEOUT_MS` and `SDQUOTA_QUERY_RETRIES`, if `lookup` returns them.
    pub fn with_overrides<F: Fn(&str) -> Option<String>>(mut self, lookup: F) -> Self {
        if let Some(timeout) = get_duration_from_env(&lookup, "SDQUOTA_QUERY_TIMEOUT_MS") {
            self.query_timeout = timeout;
        }
        if let Some(retries) = lookup("SDQUOTA_QUERY_RETRIES").and_then(|v| v.parse().ok()) {
            self.query_retries = retries;
        }
        self
    }

    fn validate(&self) -> crate::Result<()> {
        if !self.default_weight.is_finite() || self.default_weight < 0.0 {
            return error(format!(
                "default-weight must be a non-negative number, not {}",
                self.default_weight
            ));
        }
        if self.policy == PolicyKind::Partition && self.suffix.is_empty() {
            return error("suffix cannot be empty with the partition policy".to_string());
        }
        if self.query_timeout.is_zero() {
            return error("query-timeout must be larger than zero".to_string());
        }
        if self.query_retries > MAX_QUERY_RETRIES {
            return error(format!(
                "query-retries must be at most {MAX_QUERY_RETRIES}, not {}",
                self.query_retries
            ));
        }
        Ok(())
    }

    pub fn demotion_policy(&self) -> DemotionPolicy {
        match self.policy {
            PolicyKind::Partition => DemotionPolicy::SwitchPartition {
                suffix: self.suffix.clone(),
            },
            PolicyKind::Priority => DemotionPolicy::HalvePriority,
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            policy: self.demotion_policy(),
            window: self.window,
            on_backend_failure: self.on_backend_failure,
        }
    }
}

fn get_duration_from_env<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str) -> Option<Duration> {
    lookup(key)
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// (De)serializes durations in humantime format (`10s`, `30days`).
mod humantime_serde_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let value = String::deserialize(deserializer)?;
        humantime::parse_duration(&value).map_err(serde::de::Error::custom)
    }
}
