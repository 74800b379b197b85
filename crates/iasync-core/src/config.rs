//! Configuration for sync runs.

use crate::classifier::DEFAULT_FILE_PATTERN;
use crate::SyncError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Directory holding the progress file and item snapshots
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Remote collection to harvest
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Naming convention for recorded files (regex)
    #[serde(default = "default_file_pattern")]
    pub file_pattern: String,

    /// Remote archive settings
    #[serde(default)]
    pub archive: ArchiveConfig,
}

/// Remote archive settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Base URL of the archive
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Identifiers requested per search page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("iasync"))
        .unwrap_or_else(|| PathBuf::from("data"))
}

fn default_collection() -> String {
    "archivebot".to_string()
}

fn default_file_pattern() -> String {
    DEFAULT_FILE_PATTERN.to_string()
}

fn default_base_url() -> String {
    "https://archive.org".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_page_size() -> usize {
    1000
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("iasync")
        .join("config.yaml")
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            collection: default_collection(),
            file_pattern: default_file_pattern(),
            archive: ArchiveConfig::default(),
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            page_size: default_page_size(),
        }
    }
}

impl SyncConfig {
    /// Load configuration from the default location, falling back to defaults
    pub fn load() -> Self {
        let config_path = default_config_path();

        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config file: {}", e);
                }
            }
        }

        Self::default()
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, SyncError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("{}: {}", path.display(), e)))?;
        serde_yaml::from_str(&content)
            .map_err(|e| SyncError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Path of the progress file
    pub fn progress_path(&self) -> PathBuf {
        self.data_dir.join("last-update")
    }

    /// Directory of per-item snapshots
    pub fn items_dir(&self) -> PathBuf {
        self.data_dir.join("items")
    }

    /// Ensure data directories exist
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(self.items_dir())?;
        Ok(())
    }
}
