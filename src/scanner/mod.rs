//! Directory enumeration and file metadata.
//!
//! The [`DirectorySource`] trait is the seam between the tracking logic and
//! the filesystem; [`LocalDirectory`] is the real implementation. Only the
//! immediate children of a directory are listed, never nested ones.

use anyhow::{Context, Result};
use glob::Pattern;
use std::ffi::OsString;
use std::fs::Metadata;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::storage::IdentityKey;

/// Metadata the tracker needs about a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// Filesystem-assigned inode number
    pub inode: u64,
    /// Modification time, seconds since the Unix epoch
    pub mtime: u64,
    /// Size in bytes
    pub size: u64,
    /// Whether the path is a regular file (after following symlinks)
    pub is_regular_file: bool,
}

impl FileStat {
    /// Extracts the tracked fields from std metadata.
    ///
    /// Modification times before the epoch are clamped to zero.
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            inode: metadata.ino(),
            mtime: u64::try_from(metadata.mtime()).unwrap_or(0),
            size: metadata.len(),
            is_regular_file: metadata.is_file(),
        }
    }
}

/// One child of a scanned directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// File name, relative to the scanned directory
    pub name: String,
    /// Filesystem-assigned inode number
    pub inode: u64,
    /// Modification time, seconds since the Unix epoch
    pub mtime: u64,
    /// Size in bytes
    pub size: u64,
    /// Whether the entry is a regular file (after following symlinks)
    pub is_regular_file: bool,
}

impl DirectoryEntry {
    /// Builds an entry from a name and its metadata.
    pub fn new(name: impl Into<String>, stat: FileStat) -> Self {
        Self {
            name: name.into(),
            inode: stat.inode,
            mtime: stat.mtime,
            size: stat.size,
            is_regular_file: stat.is_regular_file,
        }
    }

    /// Identity used to decide whether a cached checksum still applies.
    #[must_use]
    pub const fn identity(&self) -> IdentityKey {
        IdentityKey {
            inode: self.inode,
            mtime: self.mtime,
        }
    }
}

/// A directory child that could not be turned into a [`DirectoryEntry`].
#[derive(Debug, Error)]
pub enum ScanError {
    /// The entry's metadata could not be read (e.g. a dangling symlink).
    #[error("{}: {source}", path.display())]
    Stat {
        /// Path of the entry
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// The entry's name is not valid UTF-8 and cannot be stored in a manifest.
    #[error("{}: file name is not valid UTF-8", name.to_string_lossy())]
    NonUtf8Name {
        /// Raw file name
        name: OsString,
    },
}

/// Filesystem operations the tracker depends on.
pub trait DirectorySource {
    /// Lists the immediate children of `dir`.
    ///
    /// Children whose metadata cannot be read are returned as errors so the
    /// caller can report them and carry on.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` itself cannot be read.
    fn list_entries(&self, dir: &Path) -> Result<Vec<Result<DirectoryEntry, ScanError>>>;

    /// Reads metadata for `path`, following symlinks.
    ///
    /// # Errors
    ///
    /// Returns the OS error; `io::ErrorKind::NotFound` means nothing exists
    /// at `path`.
    fn stat(&self, path: &Path) -> io::Result<FileStat>;
}

/// [`DirectorySource`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDirectory;

impl DirectorySource for LocalDirectory {
    fn list_entries(&self, dir: &Path) -> Result<Vec<Result<DirectoryEntry, ScanError>>> {
        let mut entries = Vec::new();

        for item in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match item {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(err)
                        .with_context(|| format!("Failed to read directory {}", dir.display()));
                }
                Err(err) => {
                    let path = err.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf);
                    let source = err
                        .into_io_error()
                        .unwrap_or_else(|| io::Error::other("symlink loop"));
                    entries.push(Err(ScanError::Stat { path, source }));
                    continue;
                }
            };

            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                entries.push(Err(ScanError::NonUtf8Name {
                    name: entry.file_name().to_owned(),
                }));
                continue;
            };

            match entry.metadata() {
                Ok(metadata) => {
                    entries.push(Ok(DirectoryEntry::new(name, FileStat::from_metadata(&metadata))));
                }
                Err(err) => {
                    let source = err
                        .into_io_error()
                        .unwrap_or_else(|| io::Error::other("symlink loop"));
                    entries.push(Err(ScanError::Stat {
                        path: entry.path().to_path_buf(),
                        source,
                    }));
                }
            }
        }

        Ok(entries)
    }

    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        std::fs::metadata(path).map(|m| FileStat::from_metadata(&m))
    }
}

/// Decides which directory entries are tracked.
///
/// The manifest itself, anything that is not a regular file, and names
/// matching an ignore pattern are excluded.
#[derive(Debug, Clone)]
pub struct ScanFilter {
    /// Name of the manifest file inside the scanned directory
    manifest_name: String,
    /// Glob patterns matched against entry names
    ignore_patterns: Vec<Pattern>,
}

impl ScanFilter {
    /// Creates a filter that excludes only the manifest and non-regular files.
    pub fn new(manifest_name: impl Into<String>) -> Self {
        Self {
            manifest_name: manifest_name.into(),
            ignore_patterns: Vec::new(),
        }
    }

    /// Adds ignore patterns.
    ///
    /// # Errors
    ///
    /// Returns an error if any pattern is not a valid glob.
    pub fn with_ignore_patterns<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self> {
        for pattern in patterns {
            let pattern = pattern.as_ref();
            self.ignore_patterns.push(
                Pattern::new(pattern)
                    .with_context(|| format!("Invalid ignore pattern: {pattern}"))?,
            );
        }
        Ok(self)
    }

    /// Whether `entry` should be tracked.
    #[must_use]
    pub fn accepts(&self, entry: &DirectoryEntry) -> bool {
        entry.is_regular_file
            && entry.name != self.manifest_name
            && !self.ignore_patterns.iter().any(|p| p.matches(&entry.name))
    }
}
