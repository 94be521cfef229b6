#![warn(missing_docs)]
#![allow(clippy::arithmetic_side_effects)] // Simple counters and size calculations cannot overflow
#![allow(clippy::float_arithmetic)] // Required for throughput formatting
#![allow(clippy::indexing_slicing)] // Bounds checked by logic

//! # crcs - Directory Integrity Tracker
//!
//! crcs records a CRC-32C checksum for every regular file in a directory in a
//! plain-text manifest, and later re-verifies the files against it to detect
//! silent corruption, modification or disappearance.
//!
//! ## Features
//!
//! - **Hardware CRC-32C**: SSE4.2 `crc32` on x86_64, bit-identical slicing-by-8 elsewhere
//! - **Incremental Updates**: files whose inode and mtime are unchanged reuse their checksum
//! - **Memory-Mapped Reads**: large files are mapped instead of copied
//! - **Plain Manifest**: one `crc mtime<TAB>name` line per file, easy to diff and edit
//!
//! ## Architecture
//!
//! - [`checksum`]: CRC-32C engine
//! - [`storage`]: file reader, manifest codec, change-detection index
//! - [`scanner`]: directory listing and stat
//! - [`commands`]: the `calc`, `update` and `check` operations
//! - [`config`]: configuration parsing and validation
//! - [`output`]: terminal output with verbosity control
//! - [`utils`]: formatting helpers
//!
//! ## Example Usage
//!
//! ```no_run
//! use crcs::CrcsContext;
//! use crcs::commands::{check, update};
//!
//! # fn main() -> anyhow::Result<()> {
//! let ctx = CrcsContext::new("/srv/photos".into())?;
//!
//! update::execute(&ctx)?;
//! let outcome = check::execute(&ctx);
//! std::process::exit(outcome.exit_code());
//! # }
//! ```

#[cfg(not(unix))]
compile_error!("crcs identifies files by inode number and only supports Unix platforms");

/// CRC-32C checksum engine.
pub mod checksum;

/// Command-line interface definitions (argument parsing structures).
pub mod cli;

/// The `calc`, `update` and `check` operations.
pub mod commands;

/// Configuration parsing, validation, and management.
pub mod config;

/// Output formatting with verbosity control.
pub mod output;

/// Directory listing, file metadata and entry filtering.
pub mod scanner;

/// File reading, the manifest format and the change-detection index.
pub mod storage;

/// Utility functions and helpers.
pub mod utils;

use anyhow::Result;
use std::path::PathBuf;

/// Current version of the crcs binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default manifest file name inside the tracked directory.
pub const DEFAULT_MANIFEST_NAME: &str = "CRCS";

/// Configuration file path relative to the user's config directory.
pub const DEFAULT_CONFIG_PATH: &str = "crcs/config.toml";

/// Environment variable overriding the configuration file path.
pub const CONFIG_PATH_ENV: &str = "CRCS_CONFIG_PATH";

/// Environment variable overriding `core.manifest_name`.
pub const MANIFEST_NAME_ENV: &str = "CRCS_MANIFEST";

/// Central context for all crcs operations.
///
/// Holds the directory being tracked and the loaded configuration. Every
/// operation takes its root from here; nothing reads the process working
/// directory implicitly.
///
/// # Examples
///
/// ```no_run
/// use crcs::CrcsContext;
///
/// # fn main() -> anyhow::Result<()> {
/// // Configuration from $CRCS_CONFIG_PATH or the user config directory
/// let ctx = CrcsContext::new(".".into())?;
///
/// // Explicit configuration file (for testing)
/// let ctx = CrcsContext::new_explicit("/tmp/data".into(), "/tmp/crcs.toml".into())?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CrcsContext {
    /// Directory whose files are tracked.
    pub root: PathBuf,

    /// Path the configuration was loaded from (`None` if no config location exists).
    pub config_path: Option<PathBuf>,

    /// Loaded configuration settings.
    pub config: config::Config,
}

impl CrcsContext {
    /// Creates a context for `root`, loading configuration from the default location.
    ///
    /// `$CRCS_CONFIG_PATH` takes precedence over the user config directory, and
    /// `$CRCS_MANIFEST` overrides the configured manifest name.
    ///
    /// # Errors
    /// Returns an error if the configuration file exists but cannot be read,
    /// parsed or validated.
    pub fn new(root: PathBuf) -> Result<Self> {
        let config_path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|dir| dir.join(DEFAULT_CONFIG_PATH)));

        let mut config = match &config_path {
            Some(path) => config::Config::load(path)?,
            None => config::Config::default(),
        };

        if let Ok(name) = std::env::var(MANIFEST_NAME_ENV) {
            config.set_manifest_name(name)?;
        }

        Ok(Self {
            root,
            config_path,
            config,
        })
    }

    /// Creates a context with an explicit configuration file, ignoring the environment.
    ///
    /// # Errors
    /// Returns an error if the configuration file exists but cannot be loaded.
    pub fn new_explicit(root: PathBuf, config_path: PathBuf) -> Result<Self> {
        let config = config::Config::load(&config_path)?;
        Ok(Self {
            root,
            config_path: Some(config_path),
            config,
        })
    }

    /// Creates a context from an already-built configuration.
    #[must_use]
    pub const fn with_config(root: PathBuf, config: config::Config) -> Self {
        Self {
            root,
            config_path: None,
            config,
        }
    }

    /// Full path of the manifest for this context.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(&self.config.core.manifest_name)
    }

    /// Entry filter for `update`, built from the manifest name and ignore patterns.
    ///
    /// # Errors
    /// Returns an error if an ignore pattern is not a valid glob.
    pub fn scan_filter(&self) -> Result<scanner::ScanFilter> {
        scanner::ScanFilter::new(self.config.core.manifest_name.clone())
            .with_ignore_patterns(&self.config.tracking.ignore_patterns)
    }
}
