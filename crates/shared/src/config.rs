//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Receipt image storage configuration (optional; uploads disabled without it).
    pub storage: Option<StorageSettings>,
    /// Vision model configuration (optional; receipt analysis disabled without it).
    pub vision: Option<VisionSettings>,
    /// Known owner profile tags. Empty means any non-empty tag is accepted.
    #[serde(default)]
    pub profiles: Vec<String>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

/// Receipt image storage settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Provider name: "s3", "azblob" or "fs".
    pub provider: String,
    /// S3 endpoint (s3 only).
    #[serde(default)]
    pub endpoint: String,
    /// Bucket or container name.
    #[serde(default)]
    pub bucket: String,
    /// Region (s3 only).
    #[serde(default)]
    pub region: String,
    /// Access key id (s3) or account name (azblob).
    #[serde(default)]
    pub access_key: String,
    /// Secret access key (s3) or account key (azblob).
    #[serde(default)]
    pub secret_key: String,
    /// Root directory (fs only).
    #[serde(default)]
    pub root: String,
    /// Maximum accepted image size in bytes.
    #[serde(default = "default_max_image_size")]
    pub max_image_size: u64,
}

fn default_max_image_size() -> u64 {
    10 * 1024 * 1024
}

/// Vision model settings for receipt field extraction.
#[derive(Debug, Clone, Deserialize)]
pub struct VisionSettings {
    /// OpenAI-compatible chat completions endpoint.
    pub endpoint: String,
    /// API key.
    pub api_key: String,
    /// Model name.
    #[serde(default = "default_vision_model")]
    pub model: String,
}

fn default_vision_model() -> String {
    "gpt-4o-mini".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("KVITTO").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Whether the given owner tag is acceptable under the configured profiles.
    #[must_use]
    pub fn is_known_profile(&self, owner: &str) -> bool {
        if owner.is_empty() {
            return false;
        }
        self.profiles.is_empty() || self.profiles.iter().any(|p| p == owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config(profiles: Vec<String>) -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/kvitto".to_string(),
                max_connections: default_max_connections(),
            },
            storage: None,
            vision: None,
            profiles,
        }
    }

    #[test]
    fn test_any_profile_accepted_when_unconfigured() {
        let config = base_config(vec![]);
        assert!(config.is_known_profile("alice"));
        assert!(!config.is_known_profile(""));
    }

    #[test]
    fn test_profile_list_is_exact() {
        let config = base_config(vec!["alice".to_string(), "bob".to_string()]);
        assert!(config.is_known_profile("alice"));
        assert!(config.is_known_profile("bob"));
        assert!(!config.is_known_profile("carol"));
        assert!(!config.is_known_profile("Alice"));
    }
}
