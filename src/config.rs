use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub exchange: ExchangeConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

/// Exchange-rate provider settings. Credentials live here and are passed
/// into the client at construction, never held in shared mutable state.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExchangeConfig {
    pub api_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
    pub cache_ttl_secs: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.freecurrencyapi.com/v1/latest".to_string(),
            api_key: String::new(),
            timeout_secs: 5,
            cache_ttl_secs: 60,
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::Read(config_path.clone(), e))?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse(config_path, e))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Read(String, #[source] std::io::Error),

    #[error("failed to parse config file {0}: {1}")]
    Parse(String, #[source] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_defaults_apply_when_section_missing() {
        let yaml = r#"
log_level: info
log_dir: ./logs
log_file: bank-ledger.log
use_json: false
rotation: daily
database:
  url: postgres://localhost/bank
"#;
        let cfg: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.database.max_connections, 10);
        assert_eq!(cfg.exchange.timeout_secs, 5);
        assert_eq!(cfg.exchange.cache_ttl_secs, 60);
    }

    #[test]
    fn full_config_round_trips() {
        let cfg = AppConfig {
            log_level: "debug".into(),
            log_dir: "./logs".into(),
            log_file: "bank.log".into(),
            use_json: true,
            rotation: "hourly".into(),
            database: DatabaseConfig {
                url: "postgres://localhost/bank".into(),
                max_connections: 4,
            },
            exchange: ExchangeConfig {
                api_url: "https://rates.test/v1/latest".into(),
                api_key: "k".into(),
                timeout_secs: 2,
                cache_ttl_secs: 30,
            },
        };
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let back: AppConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.exchange.api_url, cfg.exchange.api_url);
        assert_eq!(back.database.max_connections, 4);
    }
}
