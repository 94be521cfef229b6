//! Change-detection index.
//!
//! Maps a file's identity (inode plus recorded mtime) to the checksum stored
//! for it in the previous manifest. A hit means the file has not been
//! replaced or touched since it was last hashed, so its bytes need not be read
//! again. An inode reused with a byte-identical mtime for different content
//! will produce a wrong hit; that is a known limitation of the heuristic.

use crate::checksum::ChecksumValue;
use crate::scanner::DirectorySource;
use crate::storage::Manifest;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Identity of a file for cache purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    /// Filesystem-assigned inode number
    pub inode: u64,
    /// Modification time, seconds since the Unix epoch
    pub mtime: u64,
}

impl IdentityKey {
    /// Creates an identity key.
    #[must_use]
    pub const fn new(inode: u64, mtime: u64) -> Self {
        Self { inode, mtime }
    }
}

/// Lookup from [`IdentityKey`] to a previously computed checksum.
#[derive(Debug, Clone, Default)]
pub struct ChangeIndex {
    entries: HashMap<IdentityKey, ChecksumValue>,
}

impl ChangeIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the index for `manifest`, whose file names are relative to `root`.
    ///
    /// Each recorded file is stat'ed to learn its current inode; the key pairs
    /// that inode with the mtime stored in the record. Records whose file
    /// cannot be stat'ed are left out.
    pub fn build(manifest: &Manifest, root: &Path, source: &dyn DirectorySource) -> Self {
        let mut index = Self::new();

        for record in manifest {
            match source.stat(&root.join(&record.file_name)) {
                Ok(stat) => {
                    index.insert(IdentityKey::new(stat.inode, record.mtime), record.checksum);
                }
                Err(e) => {
                    debug!(file = %record.file_name, error = %e, "dropping record from change index");
                }
            }
        }

        debug!(records = manifest.len(), indexed = index.len(), "built change index");
        index
    }

    /// Records a checksum for `key`.
    pub fn insert(&mut self, key: IdentityKey, checksum: ChecksumValue) {
        self.entries.insert(key, checksum);
    }

    /// Returns the cached checksum if both inode and mtime match exactly.
    #[must_use]
    pub fn lookup(&self, key: &IdentityKey) -> Option<ChecksumValue> {
        self.entries.get(key).copied()
    }

    /// Number of indexed identities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
