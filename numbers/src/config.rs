use std::path::PathBuf;
use std::time::Duration;

use anyhow::ensure;
use numbers_lib::upstream::{EvaluationConfig, DEFAULT_BASE_URL};
use numbers_lib::window::DEFAULT_WINDOW_CAPACITY;
use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};
use tracing::level_filters::LevelFilter;

#[serde_as]
#[derive(Deserialize, Debug, Clone)]
pub struct ServiceConfig {
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default = "default_rust_log")]
    pub rust_log: LevelFilter,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_evaluation_base_url")]
    pub evaluation_base_url: String,
    pub evaluation_auth_token: Option<String>,
    #[serde(default = "default_upstream_timeout_ms")]
    pub upstream_timeout_ms: u64,
    #[serde(default = "default_window_capacity")]
    pub window_capacity: usize,
    /// Daily rolling log files are written here when set
    pub log_dir: Option<PathBuf>,
}

fn default_rust_log() -> LevelFilter {
    LevelFilter::INFO
}

fn default_bind_address() -> String {
    "0.0.0.0:9876".to_string()
}

fn default_evaluation_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_upstream_timeout_ms() -> u64 {
    500
}

fn default_window_capacity() -> usize {
    DEFAULT_WINDOW_CAPACITY
}

impl ServiceConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.window_capacity > 0, "WINDOW_CAPACITY must be positive");
        ensure!(
            self.upstream_timeout_ms > 0,
            "UPSTREAM_TIMEOUT_MS must be positive"
        );
        Ok(())
    }

    pub fn evaluation(&self) -> EvaluationConfig {
        EvaluationConfig {
            base_url: self.evaluation_base_url.clone(),
            auth_token: self.evaluation_auth_token.clone(),
            timeout: Duration::from_millis(self.upstream_timeout_ms),
        }
    }
}

pub fn get_service_config() -> anyhow::Result<ServiceConfig> {
    let config = envy::from_env::<ServiceConfig>()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> envy::Result<ServiceConfig> {
        envy::from_iter(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        )
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.rust_log, LevelFilter::INFO);
        assert_eq!(config.bind_address, "0.0.0.0:9876");
        assert_eq!(config.evaluation_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.evaluation_auth_token, None);
        assert_eq!(config.upstream_timeout_ms, 500);
        assert_eq!(config.window_capacity, 10);
        assert!(config.log_dir.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("RUST_LOG", "debug"),
            ("EVALUATION_AUTH_TOKEN", "token"),
            ("UPSTREAM_TIMEOUT_MS", "1500"),
            ("WINDOW_CAPACITY", "4"),
        ])
        .unwrap();

        assert_eq!(config.rust_log, LevelFilter::DEBUG);
        let evaluation = config.evaluation();
        assert_eq!(evaluation.auth_token.as_deref(), Some("token"));
        assert_eq!(evaluation.timeout, Duration::from_millis(1500));
        assert_eq!(config.window_capacity, 4);
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let config = from_pairs(&[("WINDOW_CAPACITY", "0")]).unwrap();
        assert!(config.validate().is_err());
    }
}
