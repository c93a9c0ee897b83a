//! Configuration management with YAML support

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub pacing: PacingConfig,

    #[serde(default)]
    pub client: ClientConfig,

    /// Print every normalized story while ingesting
    #[serde(default)]
    pub verbose: bool,
}

/// Where crawl state and batch files live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_seen_db")]
    pub seen_db: String,

    #[serde(default = "default_degree_db")]
    pub degree_db: String,

    #[serde(default = "default_geo_db")]
    pub geo_db: String,

    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

/// Randomized delay between consecutive fetches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

/// Feed client settings. Headers are passed through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

// Default value functions
fn default_seen_db() -> String {
    "~/.local/share/storyscout/seen.db".to_string()
}

fn default_degree_db() -> String {
    "~/.local/share/storyscout/degree.db".to_string()
}

fn default_geo_db() -> String {
    "~/.local/share/storyscout/users.db".to_string()
}

fn default_output_dir() -> String {
    "~/.local/share/storyscout/batches".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_min_delay_ms() -> u64 {
    800
}

fn default_max_delay_ms() -> u64 {
    1700
}

fn default_base_url() -> String {
    "https://i.instagram.com/api/v1".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            seen_db: default_seen_db(),
            degree_db: default_degree_db(),
            geo_db: default_geo_db(),
            output_dir: default_output_dir(),
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
            headers: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    /// Searches in order:
    /// 1. Provided path
    /// 2. ./storyscout.yaml (current directory)
    /// 3. ~/.config/storyscout/storyscout.yaml
    pub fn load(path: &str) -> Result<Self> {
        let search_paths = vec![
            shellexpand::tilde(path).to_string(),
            "storyscout.yaml".to_string(),
            shellexpand::tilde("~/.config/storyscout/storyscout.yaml").to_string(),
        ];

        for search_path in &search_paths {
            if std::path::Path::new(search_path).exists() {
                let content = std::fs::read_to_string(search_path)?;
                let config: Config = serde_yaml::from_str(&content)?;
                config.validate()?;
                return Ok(config);
            }
        }

        // No config file found, use defaults
        Ok(Config::default())
    }

    pub fn validate(&self) -> Result<()> {
        if self.pacing.min_delay_ms > self.pacing.max_delay_ms {
            bail!(
                "pacing.min_delay_ms ({}) is greater than pacing.max_delay_ms ({})",
                self.pacing.min_delay_ms,
                self.pacing.max_delay_ms
            );
        }
        if self.client.base_url.trim().is_empty() {
            bail!("client.base_url must not be empty");
        }
        Ok(())
    }

    pub fn seen_db_path(&self) -> PathBuf {
        expand(&self.storage.seen_db)
    }

    pub fn degree_db_path(&self) -> PathBuf {
        expand(&self.storage.degree_db)
    }

    pub fn geo_db_path(&self) -> PathBuf {
        expand(&self.storage.geo_db)
    }

    pub fn output_dir(&self) -> PathBuf {
        expand(&self.storage.output_dir)
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.pacing.enabled);
        assert_eq!(config.pacing.min_delay_ms, 800);
        assert_eq!(config.pacing.max_delay_ms, 1700);
        assert_eq!(config.client.timeout_secs, None);
        assert!(!config.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
storage:
  seen_db: /tmp/storyscout/seen.db
  output_dir: /tmp/storyscout/out

pacing:
  enabled: false

client:
  timeout_secs: 30
  headers:
    cookie: "sessionid=abc"
    user-agent: "Instagram 10.3.2"

verbose: true
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.seen_db_path(), PathBuf::from("/tmp/storyscout/seen.db"));
        assert_eq!(config.output_dir(), PathBuf::from("/tmp/storyscout/out"));
        // unspecified fields keep their defaults
        assert_eq!(config.storage.degree_db, default_degree_db());
        assert!(!config.pacing.enabled);
        assert_eq!(config.pacing.max_delay_ms, 1700);
        assert_eq!(config.client.timeout_secs, Some(30));
        assert_eq!(config.client.headers["cookie"], "sessionid=abc");
        assert_eq!(config.client.base_url, default_base_url());
        assert!(config.verbose);
    }

    #[test]
    fn test_inverted_pacing_is_rejected() {
        let mut config = Config::default();
        config.pacing.min_delay_ms = 2000;
        assert!(config.validate().is_err());
    }
}
