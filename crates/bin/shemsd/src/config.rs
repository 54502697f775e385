//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `shems.toml` in the working directory. Every field has a
//! default so the file is optional. `SHEMS_*` environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Control loop settings.
    pub simulation: SimulationConfig,
    /// Outbound notification settings.
    pub notify: NotifyConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Tick scheduling and bounds.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seconds between scheduled ticks.
    pub period_secs: u64,
    /// Upper bound on each store call during a tick.
    pub store_timeout_secs: u64,
    /// Upper bound on each notification.
    pub notify_timeout_secs: u64,
    /// Fixed seed for reproducible runs; entropy when unset.
    pub seed: Option<u64>,
}

/// Webhook relay for transition notifications.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Relay endpoint. Only the live stream is fed when unset.
    pub webhook_url: Option<String>,
    /// Per-request timeout.
    pub webhook_timeout_secs: u64,
}

impl Config {
    /// Load configuration from `shems.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("shems.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    /// Apply overrides looked up by variable name. Unparsable numbers are ignored.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("SHEMS_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("SHEMS_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("SHEMS_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Some(val) = var("SHEMS_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("SHEMS_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(secs) = var("SHEMS_SIMULATION_PERIOD_SECS").and_then(|val| val.parse().ok()) {
            self.simulation.period_secs = secs;
        }
        if let Some(secs) = var("SHEMS_STORE_TIMEOUT_SECS").and_then(|val| val.parse().ok()) {
            self.simulation.store_timeout_secs = secs;
        }
        if let Some(secs) = var("SHEMS_NOTIFY_TIMEOUT_SECS").and_then(|val| val.parse().ok()) {
            self.simulation.notify_timeout_secs = secs;
        }
        if let Some(seed) = var("SHEMS_SEED").and_then(|val| val.parse().ok()) {
            self.simulation.seed = Some(seed);
        }
        if let Some(val) = var("SHEMS_WEBHOOK_URL") {
            self.notify.webhook_url = Some(val).filter(|url| !url.is_empty());
        }
        if let Some(secs) = var("SHEMS_WEBHOOK_TIMEOUT_SECS").and_then(|val| val.parse().ok()) {
            self.notify.webhook_timeout_secs = secs;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Validation(
                "max_connections must be non-zero".to_string(),
            ));
        }
        for (name, secs) in [
            ("period_secs", self.simulation.period_secs),
            ("store_timeout_secs", self.simulation.store_timeout_secs),
            ("notify_timeout_secs", self.simulation.notify_timeout_secs),
            ("webhook_timeout_secs", self.notify.webhook_timeout_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::Validation(format!("{name} must be non-zero")));
            }
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl SimulationConfig {
    #[must_use]
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }

    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    #[must_use]
    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs)
    }
}

impl NotifyConfig {
    #[must_use]
    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:shems.db".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "shemsd=info,shems_app=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            period_secs: 3600,
            store_timeout_secs: 10,
            notify_timeout_secs: 30,
            seed: None,
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            webhook_timeout_secs: 10,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.url, "sqlite:shems.db");
        assert_eq!(config.simulation.period(), Duration::from_secs(3600));
        assert_eq!(config.simulation.seed, None);
        assert_eq!(config.notify.webhook_url, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.simulation.store_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [server]
            host = '127.0.0.1'
            port = 9090

            [database]
            url = 'sqlite:test.db'
            max_connections = 2

            [logging]
            filter = 'debug'

            [simulation]
            period_secs = 60
            store_timeout_secs = 3
            notify_timeout_secs = 5
            seed = 42

            [notify]
            webhook_url = 'http://relay.local/send'
            webhook_timeout_secs = 4
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
        assert_eq!(config.database.url, "sqlite:test.db");
        assert_eq!(config.database.max_connections, 2);
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.simulation.period(), Duration::from_secs(60));
        assert_eq!(config.simulation.notify_timeout(), Duration::from_secs(5));
        assert_eq!(config.simulation.seed, Some(42));
        assert_eq!(
            config.notify.webhook_url.as_deref(),
            Some("http://relay.local/send")
        );
        assert_eq!(config.notify.webhook_timeout(), Duration::from_secs(4));
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }

    #[test]
    fn should_apply_environment_overrides() {
        let mut config = Config::default();
        config.apply_overrides(vars(&[
            ("SHEMS_BIND", "127.0.0.1:8081"),
            ("SHEMS_DATABASE_URL", "sqlite::memory:"),
            ("SHEMS_SIMULATION_PERIOD_SECS", "5"),
            ("SHEMS_SEED", "7"),
            ("SHEMS_WEBHOOK_URL", "http://relay.local/send"),
        ]));
        assert_eq!(config.bind_addr(), "127.0.0.1:8081");
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.simulation.period_secs, 5);
        assert_eq!(config.simulation.seed, Some(7));
        assert!(config.notify.webhook_url.is_some());
    }

    #[test]
    fn should_prefer_rust_log_over_shems_log() {
        let mut config = Config::default();
        config.apply_overrides(vars(&[("SHEMS_LOG", "info"), ("RUST_LOG", "trace")]));
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_ignore_unparsable_numeric_overrides() {
        let mut config = Config::default();
        config.apply_overrides(vars(&[("SHEMS_PORT", "http"), ("SHEMS_SEED", "x")]));
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.simulation.seed, None);
    }

    #[test]
    fn should_disable_webhook_with_empty_override() {
        let mut config = Config::default();
        config.notify.webhook_url = Some("http://relay.local/send".to_string());
        config.apply_overrides(vars(&[("SHEMS_WEBHOOK_URL", "")]));
        assert_eq!(config.notify.webhook_url, None);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_zero_period() {
        let mut config = Config::default();
        config.simulation.period_secs = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: period_secs must be non-zero"
        );
    }

    #[test]
    fn should_reject_zero_timeouts() {
        let mut config = Config::default();
        config.simulation.store_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.notify.webhook_timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
