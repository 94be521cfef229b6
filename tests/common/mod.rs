#![allow(dead_code)]

use anyhow::Result;
use assert_cmd::Command;
use crcs::CrcsContext;
use crcs::config::Config;
use filetime::FileTime;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test directory fixture with a context rooted at a fresh temporary directory
pub struct TestDir {
    pub temp_dir: TempDir,
    pub ctx: CrcsContext,
}

impl TestDir {
    /// Create an empty tracked directory with default configuration
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let ctx = CrcsContext::with_config(temp_dir.path().to_path_buf(), Config::default());
        Ok(Self { temp_dir, ctx })
    }

    /// Get the temporary directory path
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path of a file inside the directory
    pub fn file(&self, name: &str) -> PathBuf {
        self.path().join(name)
    }

    /// Write a file and pin its mtime so tests do not depend on clock granularity
    pub fn write(&self, name: &str, contents: &[u8], mtime: i64) -> Result<()> {
        let path = self.file(name);
        fs::write(&path, contents)?;
        set_file_mtime(&path, mtime)
    }

    /// Current manifest contents
    pub fn manifest_text(&self) -> Result<String> {
        Ok(fs::read_to_string(self.ctx.manifest_path())?)
    }

    /// `crcs` binary invocation isolated from the user's environment
    pub fn cmd(&self) -> Result<Command> {
        let mut cmd = Command::cargo_bin("crcs")?;
        cmd.env("CRCS_CONFIG_PATH", self.path().join("no-such-config.toml"))
            .env("NO_COLOR", "1")
            .env_remove("CRCS_MANIFEST")
            .env_remove("CRCS_DIR")
            .env_remove("CRCS_LOG")
            .arg("-C")
            .arg(self.path());
        Ok(cmd)
    }
}

/// Set a file's modification time to `secs` since the epoch
pub fn set_file_mtime(path: &Path, secs: i64) -> Result<()> {
    filetime::set_file_mtime(path, FileTime::from_unix_time(secs, 0))?;
    Ok(())
}
