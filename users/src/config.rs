//! Engine configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::services::ServiceOptions;
use crate::UsersError;

/// Configuration for the users engine and the daemon around it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UsersConfig {
    /// Data directory for the LMDB document store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// How long a `connection-fail` result stays indexed after the last
    /// successful check.
    #[serde(default = "default_grace_period_secs")]
    pub grace_period_secs: u64,

    /// Results older than this are due for a re-check.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,

    /// Results whose last successful check is older than this are no longer
    /// re-checked by the sweep.
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,

    /// Timeout for a single proof check.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// User-Agent sent with proof requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Bearer token for the twitter API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter_bearer_token: Option<String>,

    /// Default and maximum number of search results.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Seconds between expired-result sweeps in the daemon.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./keyproof_data")
}

fn default_grace_period_secs() -> u64 {
    2 * 24 * 60 * 60
}

fn default_stale_after_secs() -> u64 {
    24 * 60 * 60
}

fn default_max_age_secs() -> u64 {
    60 * 24 * 60 * 60
}

fn default_http_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("keyproof/{}", env!("CARGO_PKG_VERSION"))
}

fn default_search_limit() -> usize {
    100
}

fn default_sweep_interval_secs() -> u64 {
    60 * 60
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl UsersConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, UsersError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| UsersError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, UsersError> {
        toml::from_str(s).map_err(|e| UsersError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, UsersError> {
        toml::to_string_pretty(self).map_err(|e| UsersError::Config(e.to_string()))
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn service_options(&self) -> ServiceOptions {
        ServiceOptions {
            twitter_bearer_token: self.twitter_bearer_token.clone(),
        }
    }
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            grace_period_secs: default_grace_period_secs(),
            stale_after_secs: default_stale_after_secs(),
            max_age_secs: default_max_age_secs(),
            http_timeout_secs: default_http_timeout_secs(),
            user_agent: default_user_agent(),
            twitter_bearer_token: None,
            search_limit: default_search_limit(),
            sweep_interval_secs: default_sweep_interval_secs(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = UsersConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = UsersConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.grace_period_secs, config.grace_period_secs);
        assert_eq!(parsed.search_limit, config.search_limit);
        assert_eq!(parsed.twitter_bearer_token, None);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = UsersConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.grace_period(), Duration::from_secs(172_800));
        assert_eq!(config.stale_after(), Duration::from_secs(86_400));
        assert_eq!(config.max_age(), Duration::from_secs(60 * 86_400));
        assert_eq!(config.http_timeout(), Duration::from_secs(10));
        assert_eq!(config.log_format, "human");
        assert!(config.user_agent.starts_with("keyproof/"));
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            grace_period_secs = 60
            twitter_bearer_token = "abc"
        "#;
        let config = UsersConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.grace_period_secs, 60);
        assert_eq!(
            config.service_options().twitter_bearer_token.as_deref(),
            Some("abc")
        );
        assert_eq!(config.search_limit, 100);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        assert!(matches!(
            UsersConfig::from_toml_str("grace_period_secs = \"soon\""),
            Err(UsersError::Config(_))
        ));
    }
}
