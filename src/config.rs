use std::collections::HashMap;
use std::env;
use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};
use validator::Validate;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";

/// Logistics-center provider settings. Injected into the dispatcher and
/// reconciler so per-provider instances can coexist and tests can run
/// against isolated configs.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct ProviderConfig {
    /// Provider name as it appears in the webhook path.
    #[validate(length(min = 1))]
    pub name: String,

    /// Endpoint receiving purchase-order (inbound) payloads.
    #[validate(length(min = 1))]
    pub inbound_url: String,

    /// Endpoint receiving customer-order (outbound) payloads.
    #[validate(length(min = 1))]
    pub outbound_url: String,

    /// Consignee code identifying us to the provider.
    #[validate(length(min = 1))]
    pub consignee: String,

    /// Prefix segment for external ids (see `external_id`).
    #[serde(default)]
    pub id_prefix: String,

    /// IANA zone name for the provider's zone-less local timestamps.
    #[serde(default = "default_timezone_name")]
    pub timezone_name: String,

    /// Outbound HTTP timeout in seconds.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Log full payloads sent to the provider.
    #[serde(default)]
    pub verbose: bool,

    /// Bearer token -> provider name, used by the webhook ingress.
    #[serde(default)]
    pub webhook_tokens: HashMap<String, String>,
}

impl ProviderConfig {
    pub fn timezone(&self) -> chrono_tz::Tz {
        self.timezone_name.parse().unwrap_or_else(|_| {
            warn!(
                "Unknown provider timezone '{}', falling back to UTC",
                self.timezone_name
            );
            chrono_tz::UTC
        })
    }
}

/// Application configuration with validation.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// DB pool sizing
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,

    /// Number of queue worker tasks
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Per-job re-delivery budget before dead-lettering
    #[serde(default = "default_queue_max_retries")]
    pub queue_max_retries: u32,

    /// Base backoff in seconds, doubled per attempt
    #[serde(default = "default_queue_backoff_secs")]
    pub queue_backoff_secs: u64,

    #[validate]
    pub provider: ProviderConfig,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_worker_count() -> usize {
    4
}
fn default_queue_max_retries() -> u32 {
    5
}
fn default_queue_backoff_secs() -> u64 {
    30
}
fn default_timezone_name() -> String {
    "UTC".to_string()
}
fn default_http_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Loads layered configuration: built-in defaults, `config/default`,
/// `config/{RUN_ENV}`, then `APP__`-prefixed environment variables.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("database_url", "sqlite://giftflow.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;
    app_config.validate()?;

    Ok(app_config)
}

/// Initializes the tracing subscriber. `RUST_LOG` overrides the configured
/// level when set.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("giftflow_logistics={},tower_http=info", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> ProviderConfig {
        ProviderConfig {
            name: "pickandpack".into(),
            inbound_url: "http://provider.test/inbound".into(),
            outbound_url: "http://provider.test/outbound".into(),
            consignee: "GFL".into(),
            id_prefix: "7".into(),
            timezone_name: "Asia/Jerusalem".into(),
            http_timeout_secs: 5,
            verbose: false,
            webhook_tokens: HashMap::new(),
        }
    }

    #[test]
    fn provider_timezone_parses_iana_names() {
        assert_eq!(provider().timezone(), chrono_tz::Asia::Jerusalem);
    }

    #[test]
    fn unknown_timezone_falls_back_to_utc() {
        let mut p = provider();
        p.timezone_name = "Not/AZone".into();
        assert_eq!(p.timezone(), chrono_tz::UTC);
    }

    #[test]
    fn empty_urls_fail_validation() {
        let mut p = provider();
        p.inbound_url = String::new();
        assert!(p.validate().is_err());
    }
}
