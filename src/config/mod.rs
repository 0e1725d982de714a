//! Configuration management
//!
//! This module handles loading and parsing configuration for minilog.
//! Configuration can be loaded from:
//! - a YAML settings file (path taken from the MINILOG_SETTINGS environment
//!   variable, falling back to config.yml)
//! - MINILOG_* environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming the settings file.
pub const SETTINGS_ENV_VAR: &str = "MINILOG_SETTINGS";

/// Default settings file path when MINILOG_SETTINGS is unset.
pub const DEFAULT_SETTINGS_PATH: &str = "config.yml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Upload configuration
    #[serde(default)]
    pub upload: UploadConfig,
    /// Facebook OAuth application configuration
    #[serde(default)]
    pub facebook: FacebookConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration (SQLite)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file path or connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/minilog.db".to_string()
}

/// Upload configuration for item images
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Upload directory path
    #[serde(default = "default_upload_path")]
    pub path: PathBuf,
    /// Maximum file size in bytes (default: 2MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Allowed image MIME types
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            path: default_upload_path(),
            max_file_size: default_max_file_size(),
            allowed_types: default_allowed_types(),
        }
    }
}

fn default_upload_path() -> PathBuf {
    PathBuf::from("static/uploads")
}

fn default_max_file_size() -> u64 {
    2 * 1024 * 1024 // 2MB
}

fn default_allowed_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/gif".to_string(),
        "image/webp".to_string(),
    ]
}

impl UploadConfig {
    /// Check if a MIME type is allowed
    pub fn is_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == mime_type)
    }
}

/// Facebook OAuth application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacebookConfig {
    /// OAuth application id
    #[serde(default)]
    pub app_id: String,
    /// OAuth application secret
    #[serde(default)]
    pub app_secret: String,
    /// Graph API base URL (overridable for testing)
    #[serde(default = "default_graph_url")]
    pub graph_url: String,
}

impl Default for FacebookConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            app_secret: String::new(),
            graph_url: default_graph_url(),
        }
    }
}

fn default_graph_url() -> String {
    "https://graph.facebook.com/v2.8".to_string()
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
}

impl Config {
    /// Load configuration from a settings file.
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: format_yaml_error(&e),
        })?;

        Ok(config)
    }

    /// Load configuration from the environment.
    ///
    /// The settings file path is taken from MINILOG_SETTINGS (default
    /// config.yml); individual values are then overridden by:
    /// - MINILOG_SERVER_HOST
    /// - MINILOG_SERVER_PORT
    /// - MINILOG_DATABASE_URL
    /// - MINILOG_UPLOAD_PATH
    /// - MINILOG_UPLOAD_MAX_FILE_SIZE
    /// - MINILOG_FACEBOOK_APP_ID
    /// - MINILOG_FACEBOOK_APP_SECRET
    /// - MINILOG_FACEBOOK_GRAPH_URL
    pub fn load_from_env() -> anyhow::Result<Self> {
        let path = std::env::var(SETTINGS_ENV_VAR)
            .unwrap_or_else(|_| DEFAULT_SETTINGS_PATH.to_string());
        Self::load_with_env(std::path::Path::new(&path))
    }

    /// Load configuration from a file with environment variable overrides.
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("MINILOG_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("MINILOG_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }

        if let Ok(url) = std::env::var("MINILOG_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(path) = std::env::var("MINILOG_UPLOAD_PATH") {
            self.upload.path = PathBuf::from(path);
        }
        if let Ok(size) = std::env::var("MINILOG_UPLOAD_MAX_FILE_SIZE") {
            if let Ok(size) = size.parse::<u64>() {
                self.upload.max_file_size = size;
            }
        }

        if let Ok(app_id) = std::env::var("MINILOG_FACEBOOK_APP_ID") {
            self.facebook.app_id = app_id;
        }
        if let Ok(app_secret) = std::env::var("MINILOG_FACEBOOK_APP_SECRET") {
            self.facebook.app_secret = app_secret;
        }
        if let Ok(graph_url) = std::env::var("MINILOG_FACEBOOK_GRAPH_URL") {
            self.facebook.graph_url = graph_url;
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
