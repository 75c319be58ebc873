use std::time::Duration;

use numbers_lib::upstream::{EvaluationConfig, DEFAULT_BASE_URL};
use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};
use tracing::level_filters::LevelFilter;

#[serde_as]
#[derive(Deserialize, Debug, Clone)]
pub struct CliConfig {
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default = "default_rust_log")]
    pub rust_log: LevelFilter,
    #[serde(default = "default_evaluation_base_url")]
    pub evaluation_base_url: String,
    pub evaluation_auth_token: Option<String>,
    #[serde(default = "default_upstream_timeout_ms")]
    pub upstream_timeout_ms: u64,
    #[serde(default = "default_numbers_server_url")]
    pub numbers_server_url: String,
}

fn default_rust_log() -> LevelFilter {
    LevelFilter::WARN
}

fn default_evaluation_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_upstream_timeout_ms() -> u64 {
    5_000
}

fn default_numbers_server_url() -> String {
    "http://localhost:9876".to_string()
}

impl CliConfig {
    pub fn evaluation(&self) -> EvaluationConfig {
        EvaluationConfig {
            base_url: self.evaluation_base_url.clone(),
            auth_token: self.evaluation_auth_token.clone(),
            timeout: Duration::from_millis(self.upstream_timeout_ms),
        }
    }
}

pub fn get_cli_config() -> anyhow::Result<CliConfig> {
    Ok(envy::from_env::<CliConfig>()?)
}
