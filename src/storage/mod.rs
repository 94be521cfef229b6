//! On-disk state: reading tracked files, the manifest format, and the
//! identity index used to skip rehashing unchanged files.

/// Whole-file reads for checksumming (buffered or memory-mapped)
pub mod file_ops;
/// Identity-keyed lookup of previously computed checksums
pub mod index;
/// Manifest records and the line-oriented manifest codec
pub mod manifest;

pub use file_ops::{FileContents, FileError};
pub use index::{ChangeIndex, IdentityKey};
pub use manifest::{Manifest, ManifestRecord};

/// Default size at which files are memory-mapped instead of read into a buffer.
pub const DEFAULT_MMAP_THRESHOLD: usize = 1_048_576;
