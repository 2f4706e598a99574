//! Configuration management for EventZen.
//!
//! Loads configuration from ${EVENTZEN_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Where the current device position comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LocationSourceKind {
    /// No geolocation capability.
    None,
    /// Coordinates taken from `[location] latitude/longitude`.
    Fixed,
    /// Approximate position from an IP geolocation lookup.
    #[default]
    Ip,
}

impl LocationSourceKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            LocationSourceKind::None => "none",
            LocationSourceKind::Fixed => "fixed",
            LocationSourceKind::Ip => "ip",
        }
    }
}

/// Reverse-geocoding service settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

/// Identity gateway settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// Port for the local redirect listener used by federated sign-in (0 = any free port).
    pub callback_port: u16,
    /// How long federated sign-in waits for the browser redirect, in seconds.
    pub callback_timeout_secs: u64,
}

impl IdentityConfig {
    const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 120;

    /// Redirect wait limit as a `Duration` (0 is treated as the default).
    pub fn callback_timeout(&self) -> Duration {
        let secs = if self.callback_timeout_secs == 0 {
            Self::DEFAULT_CALLBACK_TIMEOUT_SECS
        } else {
            self.callback_timeout_secs
        };
        Duration::from_secs(secs)
    }
}

/// Geolocation settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub source: LocationSourceKind,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub ip_lookup_url: Option<String>,
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Timeout for outbound HTTP requests, in seconds.
    pub http_timeout_secs: u64,
    pub geocoding: GeocodingConfig,
    pub identity: IdentityConfig,
    pub location: LocationConfig,
}

pub mod paths {
    //! Path resolution for EventZen configuration and data directories.
    //!
    //! `EVENTZEN_HOME` resolution order:
    //! 1. `EVENTZEN_HOME` environment variable (if set)
    //! 2. ~/.config/eventzen (default)
    //! 3. ./.eventzen when no home directory can be determined

    use std::path::PathBuf;

    /// Returns the EventZen home directory.
    pub fn eventzen_home() -> PathBuf {
        if let Ok(home) = std::env::var("EVENTZEN_HOME")
            && !home.trim().is_empty()
        {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".eventzen"),
            |h| h.join(".config").join("eventzen"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        eventzen_home().join("config.toml")
    }

    /// Returns the directory holding rolling log files.
    pub fn logs_dir() -> PathBuf {
        eventzen_home().join("logs")
    }
}

fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

impl Config {
    const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Writes the commented default config to `path`.
    ///
    /// # Errors
    /// Fails if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// HTTP request timeout as a `Duration` (0 is treated as the default).
    pub fn http_timeout(&self) -> Duration {
        let secs = if self.http_timeout_secs == 0 {
            Self::DEFAULT_HTTP_TIMEOUT_SECS
        } else {
            self.http_timeout_secs
        };
        Duration::from_secs(secs)
    }

    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_timeout_secs: Self::DEFAULT_HTTP_TIMEOUT_SECS,
            geocoding: GeocodingConfig::default(),
            identity: IdentityConfig::default(),
            location: LocationConfig::default(),
        }
    }
}
