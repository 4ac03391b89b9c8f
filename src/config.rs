//! Configuration types for the carport gateway.
//!
//! This module provides configuration structs for loading and validating
//! gateway settings from TOML files. It includes:
//!
//! - [`Config`] - Root configuration struct
//! - [`ServerConfig`] - HTTP server settings
//! - [`BucketsConfig`] - On-disk roots for the archive buckets
//!
//! All configuration types support serde deserialization and provide
//! sensible defaults suitable for development use.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default listen address.
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Default request timeout in seconds. Zero disables the timeout layer.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Non-fatal warnings that should be logged but don't prevent operation.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns true if there are any warnings.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// carport.toml configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub buckets: BucketsConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Listen address.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served under `/static`.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// Per-request timeout in seconds. Zero disables the timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            static_dir: default_static_dir(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// On-disk roots for the three archive buckets.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BucketsConfig {
    /// Root directory of the forest bucket (diff and lite snapshots).
    #[serde(default = "default_forest_dir")]
    pub forest: PathBuf,
    /// Root directory of the snapshot bucket (`latest/` pointers).
    #[serde(default = "default_snapshot_dir")]
    pub snapshot: PathBuf,
    /// Root directory of the snapshot-v2 bucket (`latest-v1/`, `latest-v2/`).
    #[serde(default = "default_snapshot_v2_dir", rename = "snapshot-v2")]
    pub snapshot_v2: PathBuf,
}

impl Default for BucketsConfig {
    fn default() -> Self {
        Self {
            forest: default_forest_dir(),
            snapshot: default_snapshot_dir(),
            snapshot_v2: default_snapshot_v2_dir(),
        }
    }
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_forest_dir() -> PathBuf {
    archive_dir("forest")
}

fn default_snapshot_dir() -> PathBuf {
    archive_dir("snapshot")
}

fn default_snapshot_v2_dir() -> PathBuf {
    archive_dir("snapshot-v2")
}

/// Get the carport base directory.
///
/// Resolution order:
/// 1. `CARPORT_HOME` environment variable (if set)
/// 2. `~/.carport/` (default)
///
/// CI/CD systems can override the location by setting `CARPORT_HOME`.
pub fn carport_home() -> PathBuf {
    if let Ok(home) = std::env::var("CARPORT_HOME")
        && !home.is_empty()
    {
        return PathBuf::from(home);
    }

    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".carport")
}

fn archive_dir(bucket: &str) -> PathBuf {
    carport_home().join("archive").join(bucket)
}

impl Config {
    /// Load configuration from the specified path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read (IO error)
    /// - The file contains invalid TOML syntax
    /// - Fields have invalid types or unknown names
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration from an optional explicit path.
    ///
    /// With an explicit path, a missing file is an error. Without one,
    /// `$CARPORT_HOME/carport.toml` is used when it exists; defaults
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given file cannot be loaded.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let default_path = carport_home().join("carport.toml");
                if default_path.exists() {
                    Self::load_from(&default_path)
                } else {
                    Ok(Self::default())
                }
            },
        }
    }

    /// Validate configuration with comprehensive checks.
    ///
    /// Returns a `ValidationResult` containing any non-fatal warnings.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails with one or more errors:
    /// - Port 0 or empty bind address
    /// - A bucket root that exists but is not a directory
    pub fn validate(&self) -> Result<ValidationResult> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if self.server.bind.is_empty() {
            errors.push("server.bind cannot be empty".to_string());
        }

        if self.server.port == 0 {
            errors.push(
                "Server port cannot be 0. Use a valid port number (1-65535)\n  \
                 Common ports: 3000 (default), 8080, 8000"
                    .to_string(),
            );
        }

        if self.server.port < 1024 && self.server.port > 0 {
            warnings.push(format!(
                "Server port {} is a system/privileged port (< 1024)\n  \
                 Recommendation: Use ports >= 1024 (e.g., 3000, 8080, 8000) to avoid permission issues",
                self.server.port
            ));
        }

        if self.server.request_timeout_secs == 0 {
            warnings.push(
                "server.request_timeout_secs is 0: request timeouts are disabled\n  \
                 Large archive downloads will never be cut off, but neither will stuck requests"
                    .to_string(),
            );
        }

        for (name, dir) in [
            ("buckets.forest", &self.buckets.forest),
            ("buckets.snapshot", &self.buckets.snapshot),
            ("buckets.snapshot-v2", &self.buckets.snapshot_v2),
        ] {
            // The bucket directory itself is created at startup; a missing
            // parent usually means a typo in the path.
            if let Some(parent) = dir.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                warnings.push(format!(
                    "{name} parent directory does not exist: {}\n  \
                     It will be created at startup; check the path if this is unexpected",
                    parent.display()
                ));
            }
            if dir.exists() && !dir.is_dir() {
                errors.push(format!(
                    "{name} is not a directory: {}",
                    dir.display()
                ));
            }
        }

        if !errors.is_empty() {
            anyhow::bail!("Configuration validation failed:\n  - {}", errors.join("\n  - "));
        }

        Ok(ValidationResult { warnings })
    }
}
