// ==========================================
// EEU Ingest - runtime settings
// ==========================================
// Source: process environment (EEU_INGEST_*)
// Tests inject a lookup closure instead.
// ==========================================

use crate::config::crosswalk::CrosswalkConfig;
use crate::config::error::{ConfigError, ConfigResult};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Environment keys read by [`IngestConfig::from_env`].
pub mod config_keys {
    /// Directory holding field_list.csv / column_mapping.csv / energy_codes.csv
    pub const DEPENDENCIES_DIR: &str = "EEU_INGEST_DEPENDENCIES_DIR";
    /// SQLite file used by the record repository
    pub const DB_PATH: &str = "EEU_INGEST_DB_PATH";
    /// Whole-request timeout for HTTP fetches, seconds
    pub const FETCH_TIMEOUT_SECS: &str = "EEU_INGEST_FETCH_TIMEOUT_SECS";
    /// Relative tolerance of the total-row sum check
    pub const SUM_CHECK_TOLERANCE: &str = "EEU_INGEST_SUM_CHECK_TOLERANCE";
    /// User-Agent header sent by the HTTP fetcher
    pub const USER_AGENT: &str = "EEU_INGEST_USER_AGENT";
}

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_SUM_CHECK_RELATIVE: f64 = 0.0;

// ==========================================
// SumCheckTolerance
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SumCheckTolerance {
    /// Extra allowance as a share of the published total; 0 means print rounding only.
    pub relative: f64,
}

impl Default for SumCheckTolerance {
    fn default() -> Self {
        Self {
            relative: DEFAULT_SUM_CHECK_RELATIVE,
        }
    }
}

impl SumCheckTolerance {
    /// # Arguments
    /// - rounding: largest gap the printed precision of the figures can explain
    pub fn accepts(&self, rows_sum: f64, published: f64, rounding: f64) -> bool {
        let allowed = (published.abs() * self.relative).max(rounding);
        (rows_sum - published).abs() <= allowed
    }
}

// ==========================================
// IngestConfig
// ==========================================
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub dependencies_dir: Option<PathBuf>,
    pub db_path: String,
    pub fetch_timeout: Duration,
    pub sum_check: SumCheckTolerance,
    pub user_agent: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            dependencies_dir: None,
            db_path: default_db_path(),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            sum_check: SumCheckTolerance::default(),
            user_agent: format!("eeu-ingest/{}", crate::VERSION),
        }
    }
}

impl IngestConfig {
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup; unset or blank keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        if let Some(dir) = get(config_keys::DEPENDENCIES_DIR) {
            config.dependencies_dir = Some(PathBuf::from(dir));
        }
        if let Some(path) = get(config_keys::DB_PATH) {
            config.db_path = path;
        }
        if let Some(raw) = get(config_keys::FETCH_TIMEOUT_SECS) {
            let secs: u64 = raw.parse().map_err(|_| invalid(config_keys::FETCH_TIMEOUT_SECS, &raw, "expected whole seconds"))?;
            if secs == 0 {
                return Err(invalid(config_keys::FETCH_TIMEOUT_SECS, &raw, "must be positive"));
            }
            config.fetch_timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = get(config_keys::SUM_CHECK_TOLERANCE) {
            let relative: f64 = raw
                .parse()
                .map_err(|_| invalid(config_keys::SUM_CHECK_TOLERANCE, &raw, "expected a number"))?;
            if !(0.0..1.0).contains(&relative) {
                return Err(invalid(config_keys::SUM_CHECK_TOLERANCE, &raw, "must be in [0, 1)"));
            }
            config.sum_check.relative = relative;
        }
        if let Some(agent) = get(config_keys::USER_AGENT) {
            config.user_agent = agent;
        }

        debug!(?config, "ingest config resolved");
        Ok(config)
    }

    /// Crosswalk from the configured directory, or the bundled tables.
    pub fn load_crosswalk(&self) -> ConfigResult<CrosswalkConfig> {
        match &self.dependencies_dir {
            Some(dir) => CrosswalkConfig::load_from_dir(dir),
            None => CrosswalkConfig::bundled(),
        }
    }
}

fn invalid(key: &str, value: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    }
}

/// Default SQLite path under the user data directory.
pub fn default_db_path() -> String {
    dirs::data_dir()
        .map(|dir| dir.join("eeu-ingest").join("eeu_ingest.db"))
        .unwrap_or_else(|| PathBuf::from("eeu_ingest.db"))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = IngestConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.fetch_timeout, Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS));
        assert!(config.dependencies_dir.is_none());
        assert_eq!(config.sum_check, SumCheckTolerance::default());
    }

    #[test]
    fn test_overrides_from_lookup() {
        let config = IngestConfig::from_lookup(lookup_from(&[
            (config_keys::FETCH_TIMEOUT_SECS, "15"),
            (config_keys::SUM_CHECK_TOLERANCE, "0.01"),
            (config_keys::DB_PATH, "/tmp/x.db"),
        ]))
        .unwrap();
        assert_eq!(config.fetch_timeout, Duration::from_secs(15));
        assert_eq!(config.sum_check.relative, 0.01);
        assert_eq!(config.db_path, "/tmp/x.db");
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let err = IngestConfig::from_lookup(lookup_from(&[(config_keys::FETCH_TIMEOUT_SECS, "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_sum_check_tolerance() {
        let tol = SumCheckTolerance::default();
        assert!(tol.accepts(1000.4, 1000.0, 0.5));
        assert!(!tol.accepts(1000.4, 1000.0, 0.05));
        assert!(!tol.accepts(5.0, 5.45, 0.015));

        let loose = SumCheckTolerance { relative: 0.1 };
        assert!(loose.accepts(5.0, 5.45, 0.015));
    }
}
