//! Persisted tab settings.
//!
//! A tab pairs a set of download roots with a set of library roots and
//! remembers how they should be compared. Settings live in a single pretty
//! JSON file; a missing or corrupt file yields the default tabs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::config::ScanConfig;
use crate::error::ConfigError;
use crate::record::ColumnSelector;

/// Environment variable overriding the settings location.
pub const SETTINGS_ENV: &str = "LINKSCOPE_CONFIG";

/// Settings path used when the environment does not name one.
pub const DEFAULT_SETTINGS_PATH: &str = "config/settings.json";

/// Resolve the settings file location.
pub fn default_settings_path() -> PathBuf {
    std::env::var_os(SETTINGS_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH))
}

/// How a tab is compared.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScanMode {
    /// Every file must be linked individually.
    #[default]
    File,
    /// A folder counts as linked once any file in it is linked.
    Folder,
}

/// One saved comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub scan_mode: ScanMode,
    /// Only used in folder mode.
    #[serde(default)]
    pub check_column: ColumnSelector,
    pub paths_a: Vec<PathBuf>,
    pub paths_b: Vec<PathBuf>,
    #[serde(default = "default_name_a")]
    pub name_a: String,
    #[serde(default = "default_name_b")]
    pub name_b: String,
}

fn default_name_a() -> String {
    "Downloads".to_string()
}

fn default_name_b() -> String {
    "Media".to_string()
}

impl TabConfig {
    /// Create an empty tab.
    pub fn new(id: impl Into<String>, name: impl Into<String>, scan_mode: ScanMode) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            scan_mode,
            check_column: ColumnSelector::A,
            paths_a: Vec::new(),
            paths_b: Vec::new(),
            name_a: default_name_a(),
            name_b: default_name_b(),
        }
    }

    /// Build the scan configuration for this tab.
    pub fn scan_config(&self, max_depth: Option<u32>) -> Result<ScanConfig, ConfigError> {
        if self.paths_a.is_empty() || self.paths_b.is_empty() {
            return Err(ConfigError::EmptyTab {
                id: self.id.clone(),
            });
        }
        Ok(ScanConfig::new(self.paths_a.clone(), self.paths_b.clone()).with_max_depth(max_depth))
    }
}

/// All saved tabs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    pub tabs: Vec<TabConfig>,
}

impl Default for AppSettings {
    fn default() -> Self {
        let movies = TabConfig::new("movies", "Movies", ScanMode::File);
        let series = TabConfig::new("series", "Series", ScanMode::Folder);
        Self {
            tabs: vec![movies, series],
        }
    }
}

impl AppSettings {
    /// Load settings, falling back to the defaults when the file is missing
    /// or unreadable.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(settings) => settings,
            Err(ConfigError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file, using defaults");
                Self::default()
            }
            Err(err) => {
                tracing::warn!(%err, "falling back to default settings");
                Self::default()
            }
        }
    }

    /// Load settings, reporting any failure.
    pub fn try_load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save settings as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Invalid {
            message: e.to_string(),
        })?;
        fs::write(path, json).map_err(io_err)?;
        tracing::info!(path = %path.display(), tabs = self.tabs.len(), "settings saved");
        Ok(())
    }

    /// Find a tab by id.
    pub fn tab(&self, id: &str) -> Result<&TabConfig, ConfigError> {
        self.tabs
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| ConfigError::UnknownTab { id: id.to_string() })
    }
}
