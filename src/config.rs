//! Configuration management for pdf-shelf
//!
//! Values come from an optional `config.toml` with `PDF_SHELF_*` environment
//! overrides layered on top. Everything here is read once at startup; changing
//! any value requires a restart.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Locations searched for the configuration file, first match wins.
const CONFIG_PATHS: [&str; 2] = [
    "pdf-shelf/config", // Container layout: /app/pdf-shelf/config.toml
    "config",           // Local development: ./config.toml
];

const ENV_PREFIX: &str = "PDF_SHELF";

/// Complete application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    // ═══ NETWORK ═══
    /// IP address the HTTP listener binds to
    pub bind_address: String,

    /// HTTP port
    pub port: u16,

    // ═══ STORAGE ═══
    /// Root directory every user-facing path is confined to
    pub upload_folder: String,

    /// Comma-separated `user:password` pairs
    pub admin_users: String,

    /// Largest accepted upload in MB
    pub max_upload_size_mb: u64,

    /// Comma-separated lowercase extensions, without the dot
    pub allowed_extensions: String,

    // ═══ EVENT LOG ═══
    pub log_dir: String,
    pub log_rotation_hours: u64,

    // ═══ BROWSING ═══
    pub items_per_page: usize,
}

impl AppConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Self::defaults()?;
        for path in CONFIG_PATHS {
            builder = builder.add_source(File::with_name(path).required(false));
        }

        let config: AppConfig = builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a single explicit file, without environment overrides
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = Self::defaults()?
            .add_source(File::with_name(path))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("bind_address", "0.0.0.0")?
            .set_default("port", 5000)?
            .set_default("upload_folder", "pdf_notes")?
            .set_default("admin_users", "admin:password")?
            .set_default("max_upload_size_mb", 16)?
            .set_default("allowed_extensions", "pdf")?
            .set_default("log_dir", "logs")?
            .set_default("log_rotation_hours", 48)?
            .set_default("items_per_page", 20)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Message("port cannot be 0".into()));
        }

        if self.upload_folder.trim().is_empty() {
            return Err(ConfigError::Message("upload_folder cannot be empty".into()));
        }

        if self.max_upload_size_mb == 0 {
            return Err(ConfigError::Message(
                "max_upload_size_mb must be greater than 0".into(),
            ));
        }

        if self.items_per_page == 0 {
            return Err(ConfigError::Message(
                "items_per_page must be greater than 0".into(),
            ));
        }

        if self.log_rotation_hours == 0 {
            return Err(ConfigError::Message(
                "log_rotation_hours must be greater than 0".into(),
            ));
        }

        if self.allowed_extension_set().is_empty() {
            return Err(ConfigError::Message(
                "allowed_extensions must name at least one extension".into(),
            ));
        }

        Ok(())
    }

    /// Bind address and port as a socket address string
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn upload_folder_path(&self) -> PathBuf {
        PathBuf::from(&self.upload_folder)
    }

    pub fn log_dir_path(&self) -> PathBuf {
        PathBuf::from(&self.log_dir)
    }

    /// Maximum upload size in bytes
    pub fn max_upload_size_bytes(&self) -> u64 {
        self.max_upload_size_mb * 1024 * 1024
    }

    pub fn log_rotation_interval(&self) -> Duration {
        Duration::from_secs(self.log_rotation_hours * 60 * 60)
    }

    /// Allowed extensions, lowercased and stripped of any leading dot
    pub fn allowed_extension_set(&self) -> HashSet<String> {
        self.allowed_extensions
            .split(',')
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_config(body: &str) -> (tempfile::TempDir, String) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shelf.toml");
        fs::write(&path, body).unwrap();
        let path = path.to_string_lossy().into_owned();
        (dir, path)
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let (_dir, path) = write_config("port = 8080\n");
        let config = AppConfig::load_from_file(&path).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.upload_folder, "pdf_notes");
        assert_eq!(config.items_per_page, 20);
        assert_eq!(config.max_upload_size_bytes(), 16 * 1024 * 1024);
        assert_eq!(config.log_rotation_interval(), Duration::from_secs(48 * 3600));
    }

    #[test]
    fn extension_set_is_normalized() {
        let (_dir, path) = write_config("allowed_extensions = \"PDF, .Djvu,,\"\n");
        let config = AppConfig::load_from_file(&path).unwrap();

        let set = config.allowed_extension_set();
        assert_eq!(set.len(), 2);
        assert!(set.contains("pdf"));
        assert!(set.contains("djvu"));
    }

    #[test]
    fn zero_port_is_rejected() {
        let (_dir, path) = write_config("port = 0\n");
        assert!(AppConfig::load_from_file(&path).is_err());
    }

    #[test]
    fn empty_extension_list_is_rejected() {
        let (_dir, path) = write_config("allowed_extensions = \" , \"\n");
        assert!(AppConfig::load_from_file(&path).is_err());
    }
}
