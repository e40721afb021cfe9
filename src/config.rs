use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub ipstack: IpstackConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/geodex.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            cors_allowed_origins: vec![
                "http://localhost:8000".to_string(),
                "http://127.0.0.1:8000".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IpstackConfig {
    pub base_url: String,

    /// Lookup credential for the ingest command. Overridable via the
    /// IPSTACK_ACCESS_KEY environment variable so it can stay out of the
    /// config file.
    pub access_key: String,

    /// Request timeout in seconds (default: 30)
    pub request_timeout_seconds: u32,
}

impl Default for IpstackConfig {
    fn default() -> Self {
        Self {
            base_url: "http://api.ipstack.com".to_string(),
            access_key: String::new(),
            request_timeout_seconds: 30,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            ipstack: IpstackConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                let mut config = Self::load_from_path(path)?;
                config.apply_env_overrides();
                return Ok(config);
            }
        }

        info!("No config file found, using defaults");
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("IPSTACK_ACCESS_KEY") {
            self.ipstack.access_key = key;
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::default_config_path();
        self.save_to_path(&path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("geodex").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".geodex").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.database_path.is_empty() {
            anyhow::bail!("Database path cannot be empty");
        }

        if self.general.min_db_connections > self.general.max_db_connections {
            anyhow::bail!("min_db_connections cannot exceed max_db_connections");
        }

        if self.ipstack.base_url.is_empty() {
            anyhow::bail!("ipstack base URL cannot be empty");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.general.database_path, "sqlite:data/geodex.db");
        assert_eq!(config.ipstack.base_url, "http://api.ipstack.com");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[ipstack]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [server]
            port = 9000
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.server.port, 9000);

        assert_eq!(config.ipstack.base_url, "http://api.ipstack.com");
    }

    #[test]
    fn test_validate_rejects_bad_pool_bounds() {
        let mut config = Config::default();
        config.general.min_db_connections = 10;
        config.general.max_db_connections = 2;
        assert!(config.validate().is_err());
    }
}
