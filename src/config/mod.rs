/// TOML parsing and validation
pub mod parser;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::DEFAULT_MANIFEST_NAME;
use crate::storage::DEFAULT_MMAP_THRESHOLD;

/// User configuration, loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// `[core]` section
    #[serde(default)]
    pub core: CoreConfig,

    /// `[performance]` section
    #[serde(default)]
    pub performance: PerformanceConfig,

    /// `[tracking]` section
    #[serde(default)]
    pub tracking: TrackingConfig,
}

/// Manifest naming.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoreConfig {
    /// File name of the manifest inside the tracked directory
    #[serde(default = "default_manifest_name")]
    pub manifest_name: String,
}

/// File reading tunables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PerformanceConfig {
    /// Files of at least this many bytes are memory-mapped
    #[serde(default = "default_mmap_threshold")]
    pub mmap_threshold: usize,
}

/// Which directory entries `update` records.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TrackingConfig {
    /// Glob patterns for file names that `update` never records
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

fn default_manifest_name() -> String {
    DEFAULT_MANIFEST_NAME.to_string()
}

const fn default_mmap_threshold() -> usize {
    DEFAULT_MMAP_THRESHOLD
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            manifest_name: default_manifest_name(),
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            mmap_threshold: default_mmap_threshold(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    ///
    /// A missing file yields the defaults; nothing is written to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file exists but cannot be read
    /// - The file contains invalid TOML
    /// - A value fails validation
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        parser::parse_config_file(path)
    }

    /// Override the manifest name (e.g. from the environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the name cannot be used as a manifest file name.
    pub fn set_manifest_name(&mut self, name: String) -> Result<()> {
        parser::validate_manifest_name(&name)?;
        self.core.manifest_name = name;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_uses_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");

        let config = Config::load(&path)?;
        assert_eq!(config, Config::default());
        assert_eq!(config.core.manifest_name, "CRCS");
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn test_serialized_config_loads_back() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.core.manifest_name = "CHECKSUMS".to_string();
        config.performance.mmap_threshold = 4096;
        config.tracking.ignore_patterns = vec!["*.part".to_string()];
        std::fs::write(&path, toml::to_string_pretty(&config)?)?;

        assert_eq!(Config::load(&path)?, config);
        Ok(())
    }

    #[test]
    fn test_set_manifest_name_validates() {
        let mut config = Config::default();
        assert!(config.set_manifest_name("sub/CRCS".to_string()).is_err());
        assert!(config.set_manifest_name("SUMS".to_string()).is_ok());
        assert_eq!(config.core.manifest_name, "SUMS");
    }
}
