// ABOUTME: Configuration management for chferry
// ABOUTME: Handles ClickHouse connection profiles with extensible JSON format

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Config directory not found")]
    NoDirFound,
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),
}

/// Connection settings for one ClickHouse server.
///
/// Exactly one of `password`/`jwt_token` is used when authenticating; the
/// token wins when both are set. Both empty means anonymous access is
/// attempted and the server decides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database")]
    pub database: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(rename = "jwtToken", default)]
    pub jwt_token: String,
}

fn default_port() -> u16 {
    8123
}

fn default_database() -> String {
    "default".to_string()
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8123,
            database: "default".to_string(),
            username: "default".to_string(),
            password: String::new(),
            jwt_token: String::new(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_active_profile")]
    pub active_profile: String,
    #[serde(default)]
    pub profiles: HashMap<String, ConnectionConfig>,
}

fn default_version() -> u32 {
    1
}

fn default_active_profile() -> String {
    "default".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut profiles = HashMap::new();
        profiles.insert("default".to_string(), ConnectionConfig::default());

        Self {
            version: 1,
            active_profile: "default".to_string(),
            profiles,
        }
    }
}

impl AppConfig {
    /// Get the config file path based on OS
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoDirFound)?;
        let app_dir = config_dir.join("chferry");
        Ok(app_dir.join("config.json"))
    }

    /// Load config from file, or create default if not exists
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;

        if !path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let contents = fs::read_to_string(&path)?;
        let config: AppConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path()?;

        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        Ok(())
    }

    /// Get the active connection profile
    pub fn active_profile(&self) -> Result<&ConnectionConfig, ConfigError> {
        self.profiles
            .get(&self.active_profile)
            .ok_or_else(|| ConfigError::ProfileNotFound(self.active_profile.clone()))
    }

    /// Add or update a profile
    pub fn set_profile(&mut self, key: String, profile: ConnectionConfig) {
        self.profiles.insert(key, profile);
    }

    /// Remove a profile (cannot remove if it's the only one)
    pub fn remove_profile(&mut self, key: &str) -> Result<(), ConfigError> {
        if self.profiles.len() <= 1 {
            return Err(ConfigError::ProfileNotFound(
                "Cannot remove the last profile".to_string(),
            ));
        }
        self.profiles.remove(key);

        // If we removed the active profile, switch to another one
        if self.active_profile == key {
            if let Some(first_key) = self.profiles.keys().next() {
                self.active_profile = first_key.clone();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.version, 1);
        assert_eq!(config.active_profile, "default");
        assert!(config.profiles.contains_key("default"));
    }

    #[test]
    fn test_serialization() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.version, config.version);
    }

    #[test]
    fn test_connection_config_wire_names() {
        let json = r#"{
            "host": "ch.internal",
            "port": 8443,
            "database": "analytics",
            "username": "loader",
            "jwtToken": "abc"
        }"#;
        let config: ConnectionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.port, 8443);
        assert_eq!(config.jwt_token, "abc");
        assert_eq!(config.password, "");
    }

    #[test]
    fn test_remove_last_profile_rejected() {
        let mut config = AppConfig::default();
        assert!(config.remove_profile("default").is_err());
    }
}
