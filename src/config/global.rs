//! User configuration for tsupdate.
//!
//! The configuration file is optional. Every key has a default matching the
//! public Tailscale package server, so most installs never create one.
//!
//! # Configuration File Location
//!
//! - **Unix/macOS**: `~/.tsupdate/config.toml`
//! - **Windows**: `%LOCALAPPDATA%\tsupdate\config.toml`
//!
//! The `--config` flag wins over `TSUPDATE_CONFIG`, which wins over the
//! default location.
//!
//! # File Format
//!
//! ```toml
//! [distribution]
//! base_url = "https://pkgs.tailscale.com"
//! package = "tailscale"
//! display_name = "Tailscale"
//!
//! [paths]
//! apt_sources = "/etc/apt/sources.list.d/tailscale.list"
//! yum_repo = "/etc/yum.repos.d/tailscale.repo"
//!
//! [network]
//! metadata_timeout_secs = 30
//!
//! [download]
//! progress_interval_secs = 2
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Environment variable that points at an alternate configuration file.
pub const CONFIG_ENV: &str = "TSUPDATE_CONFIG";

/// Top-level configuration loaded from `config.toml`.
///
/// # Examples
///
/// ```rust,no_run
/// use tsupdate::config::UpdateConfig;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = UpdateConfig::load_with_optional(None).await?;
/// println!("Packages come from {}", config.distribution.base_url());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct UpdateConfig {
    /// Where packages are published and what they are called
    pub distribution: DistributionConfig,
    /// Package-manager source files managed by the rewriter
    pub paths: PathsConfig,
    /// Metadata request settings
    pub network: NetworkConfig,
    /// Artifact transfer settings
    pub download: DownloadConfig,
}

/// Package server and naming.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DistributionConfig {
    /// Scheme and host of the package server, without a trailing slash
    pub base_url: String,
    /// Package name used in package-manager commands and artifact names
    pub package: String,
    /// Human-readable product name used in prompts and yum `name=` lines
    pub display_name: String,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://pkgs.tailscale.com".to_string(),
            package: "tailscale".to_string(),
            display_name: "Tailscale".to_string(),
        }
    }
}

impl DistributionConfig {
    /// The base URL with any trailing `/` removed.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Fixed locations of the package-manager source files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    /// apt list file
    pub apt_sources: PathBuf,
    /// yum/dnf repo file
    pub yum_repo: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            apt_sources: PathBuf::from("/etc/apt/sources.list.d/tailscale.list"),
            yum_repo: PathBuf::from("/etc/yum.repos.d/tailscale.repo"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Timeout applied to the version lookup, HEAD probe, and checksum fetch
    pub metadata_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            metadata_timeout_secs: 30,
        }
    }
}

impl NetworkConfig {
    #[must_use]
    pub const fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DownloadConfig {
    /// Minimum seconds between two progress lines
    pub progress_interval_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            progress_interval_secs: 2,
        }
    }
}

impl DownloadConfig {
    #[must_use]
    pub const fn progress_interval(&self) -> Duration {
        Duration::from_secs(self.progress_interval_secs)
    }
}

impl UpdateConfig {
    /// Load configuration from an optional explicit path.
    ///
    /// Falls back to `TSUPDATE_CONFIG`, then to [`Self::default_path`]. A
    /// missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => Some(path),
            None => match std::env::var_os(CONFIG_ENV) {
                Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
                _ => Self::default_path().ok(),
            },
        };

        match path {
            Some(path) if path.exists() => Self::load_from(&path).await,
            Some(path) => {
                tracing::debug!("No config file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Platform-appropriate default location of the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the home (or local data) directory is unknown.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("tsupdate")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".tsupdate")
        };

        Ok(config_dir.join("config.toml"))
    }
}
