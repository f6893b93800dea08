use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// CORS allowed origins, comma separated
    pub cors_origins: Option<String>,

    /// Database URL. Without it documents and users live in memory only.
    pub db_url: Option<String>,

    #[serde(default = "default_db_max_open_conns")]
    pub db_max_open_conns: u32,

    /// Connections kept open even when idle
    #[serde(default = "default_db_min_conns")]
    pub db_min_conns: u32,

    #[serde(default = "default_db_max_idle_time_secs")]
    pub db_max_idle_time_secs: u64,

    /// JWT secret key
    pub auth_jwt_secret: Option<String>,

    /// Token lifetime in hours
    #[serde(default = "default_jwt_exp_hours")]
    pub auth_jwt_exp_hours: i64,

    /// Token issuer (`iss` claim)
    #[serde(default = "default_jwt_issuer")]
    pub auth_jwt_issuer: String,

    /// Capacity of each connection's outbound mailbox
    #[serde(default = "default_outbound_capacity")]
    pub outbound_capacity: usize,

    /// Capacity of each room's inbound mailboxes
    #[serde(default = "default_room_mailbox_capacity")]
    pub room_mailbox_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            // Fallback to .env file
            dotenvy::dotenv().ok();
        }

        match envy::from_env::<Config>() {
            Ok(config) => {
                info!("Configuration loaded successfully");
                Ok(config)
            }
            Err(e) => {
                error!("Failed to load configuration: {}", e);
                Err(ConfigError::EnvError(e))
            }
        }
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment.to_lowercase() == "dev" || self.environment.to_lowercase() == "development"
    }

    /// Allowed CORS origins, parsed from the comma separated setting
    pub fn allowed_origins(&self) -> Vec<String> {
        self.cors_origins
            .as_deref()
            .unwrap_or("http://localhost:3000")
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn db_max_idle_time(&self) -> Duration {
        Duration::from_secs(self.db_max_idle_time_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            cors_origins: None,
            db_url: None,
            db_max_open_conns: default_db_max_open_conns(),
            db_min_conns: default_db_min_conns(),
            db_max_idle_time_secs: default_db_max_idle_time_secs(),
            auth_jwt_secret: None,
            auth_jwt_exp_hours: default_jwt_exp_hours(),
            auth_jwt_issuer: default_jwt_issuer(),
            outbound_capacity: default_outbound_capacity(),
            room_mailbox_capacity: default_room_mailbox_capacity(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    EnvError(envy::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::EnvError(e) => write!(f, "Environment variable error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_db_max_open_conns() -> u32 {
    30
}

fn default_db_min_conns() -> u32 {
    2
}

fn default_db_max_idle_time_secs() -> u64 {
    15 * 60
}

fn default_jwt_exp_hours() -> i64 {
    72
}

fn default_jwt_issuer() -> String {
    "doc-collab".to_string()
}

fn default_outbound_capacity() -> usize {
    256
}

fn default_room_mailbox_capacity() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.server_address(), "0.0.0.0:8080");
        assert_eq!(config.outbound_capacity, 256);
        assert!(config.is_development());
        assert!(config.db_url.is_none());
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let config = Config {
            cors_origins: Some("http://a.test, http://b.test,,".to_string()),
            ..Config::default()
        };
        assert_eq!(config.allowed_origins(), vec!["http://a.test", "http://b.test"]);

        let config = Config::default();
        assert_eq!(config.allowed_origins(), vec!["http://localhost:3000"]);
    }

    #[test]
    fn envy_fills_missing_fields_with_defaults() {
        let vars = vec![
            ("PORT".to_string(), "9001".to_string()),
            ("OUTBOUND_CAPACITY".to_string(), "8".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.port, 9001);
        assert_eq!(config.outbound_capacity, 8);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.room_mailbox_capacity, 64);
    }
}
