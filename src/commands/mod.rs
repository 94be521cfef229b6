//! The `calc`, `update` and `check` operations.
//!
//! Every operation works on a [`TrackedDir`]: an explicit root directory plus
//! the collaborators used to list it and checksum its files.

pub mod calc;
pub mod check;
pub mod update;

use crate::CrcsContext;
use crate::checksum::{ChecksumEngine, ChecksumValue, Crc32c};
use crate::scanner::{DirectorySource, LocalDirectory};
use crate::storage::{DEFAULT_MMAP_THRESHOLD, FileError, file_ops};
use crate::utils::formatters::format_throughput;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// A directory tracked by a manifest, with the collaborators that act on it.
#[derive(Clone, Copy)]
pub struct TrackedDir<'a> {
    /// Directory whose regular files are tracked
    pub root: &'a Path,
    /// File name of the manifest inside `root`
    pub manifest_name: &'a str,
    /// Files of at least this many bytes are memory-mapped
    pub mmap_threshold: usize,
    /// Directory listing and stat provider
    pub source: &'a dyn DirectorySource,
    /// Checksum implementation
    pub engine: &'a dyn ChecksumEngine,
}

impl<'a> TrackedDir<'a> {
    /// Tracks `root` with the local filesystem and the CRC-32C engine.
    #[must_use]
    pub fn new(root: &'a Path, manifest_name: &'a str) -> Self {
        Self {
            root,
            manifest_name,
            mmap_threshold: DEFAULT_MMAP_THRESHOLD,
            source: &LocalDirectory,
            engine: &Crc32c,
        }
    }

    /// Tracks the context's root directory using its configuration.
    #[must_use]
    pub fn from_context(ctx: &'a CrcsContext) -> Self {
        Self::new(&ctx.root, &ctx.config.core.manifest_name)
            .with_mmap_threshold(ctx.config.performance.mmap_threshold)
    }

    /// Replaces the directory collaborator.
    #[must_use]
    pub fn with_source(mut self, source: &'a dyn DirectorySource) -> Self {
        self.source = source;
        self
    }

    /// Replaces the checksum engine.
    #[must_use]
    pub fn with_engine(mut self, engine: &'a dyn ChecksumEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Sets the mmap threshold.
    #[must_use]
    pub const fn with_mmap_threshold(mut self, mmap_threshold: usize) -> Self {
        self.mmap_threshold = mmap_threshold;
        self
    }

    /// Full path of the manifest.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(self.manifest_name)
    }

    /// Reads `file_name` (relative to the root) and computes its checksum.
    ///
    /// # Errors
    ///
    /// Returns the [`FileError`] from the read; the file is never retried.
    pub fn checksum_file(&self, file_name: &str) -> Result<HashedFile, FileError> {
        let start = Instant::now();
        let contents = file_ops::read_whole(&self.root.join(file_name), self.mmap_threshold)?;
        let checksum = self.engine.checksum(&contents);
        let elapsed = start.elapsed();

        Ok(HashedFile {
            checksum,
            bytes: contents.len() as u64,
            elapsed,
        })
    }
}

/// Result of reading and checksumming one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashedFile {
    /// Checksum of the full contents
    pub checksum: ChecksumValue,
    /// Number of bytes read
    pub bytes: u64,
    /// Wall-clock time spent reading and checksumming
    pub elapsed: Duration,
}

impl HashedFile {
    /// Throughput prefix for per-file lines, if the elapsed time is measurable.
    #[must_use]
    pub fn throughput(&self) -> Option<String> {
        format_throughput(self.bytes, self.elapsed)
    }
}
