//! File Reader: maps a file's full contents into memory for checksumming.
//!
//! Files below the mmap threshold are read into a buffer; larger files are
//! memory-mapped. Both paths expose the same immutable byte view, and the
//! descriptor (and mapping) is released when the returned value is dropped.

use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::io::{self, Read};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A recoverable failure to read a single file.
#[derive(Debug, Error)]
pub enum FileError {
    /// Nothing exists at the path.
    #[error("{}: No such file or directory", path.display())]
    NotFound {
        /// Path that was opened
        path: PathBuf,
    },

    /// The file exists but could not be opened, mapped or read.
    #[error("{}: {source}", path.display())]
    NotReadable {
        /// Path that was opened
        path: PathBuf,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },

    /// The file was opened but its metadata could not be retrieved.
    #[error("{}: stat failed: {source}", path.display())]
    StatFailed {
        /// Path that was opened
        path: PathBuf,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },
}

impl FileError {
    fn open(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::not_readable(path, source)
        }
    }

    fn not_readable(path: &Path, source: io::Error) -> Self {
        Self::NotReadable {
            path: path.to_path_buf(),
            source,
        }
    }

    /// The failure without the path prefix.
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::NotFound { .. } => "No such file or directory".to_string(),
            Self::NotReadable { source, .. } => source.to_string(),
            Self::StatFailed { source, .. } => format!("stat failed: {source}"),
        }
    }
}

/// Entire contents of a file.
#[derive(Debug)]
pub enum FileContents {
    /// Small files, read with a single `read_to_end`
    Buffered(Vec<u8>),
    /// Large files, mapped read-only
    Mapped(Mmap),
}

impl Deref for FileContents {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Buffered(buf) => buf,
            Self::Mapped(map) => map,
        }
    }
}

/// Reads the whole file at `path`.
///
/// Files of at least `mmap_threshold` bytes are memory-mapped.
///
/// # Errors
///
/// Returns [`FileError::NotFound`] if the path does not exist,
/// [`FileError::StatFailed`] if its metadata cannot be read and
/// [`FileError::NotReadable`] for any other open, map or read failure.
pub fn read_whole(path: &Path, mmap_threshold: usize) -> Result<FileContents, FileError> {
    let mut file = File::open(path).map_err(|e| FileError::open(path, e))?;
    let metadata = file.metadata().map_err(|source| FileError::StatFailed {
        path: path.to_path_buf(),
        source,
    })?;
    if !metadata.is_file() {
        return Err(FileError::not_readable(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
        ));
    }
    let size = metadata.len();

    // Mapping a zero-length file fails on most platforms
    if size == 0 {
        return Ok(FileContents::Buffered(Vec::new()));
    }

    if size < mmap_threshold as u64 {
        let mut buf = Vec::with_capacity(usize::try_from(size).unwrap_or(0));
        file.read_to_end(&mut buf)
            .map_err(|e| FileError::not_readable(path, e))?;
        return Ok(FileContents::Buffered(buf));
    }

    // SAFETY: the mapping is read-only and private to this process; concurrent
    // truncation by another process is outside what this tool guards against.
    let map = unsafe { MmapOptions::new().map(&file) }
        .map_err(|e| FileError::not_readable(path, e))?;
    Ok(FileContents::Mapped(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn test_read_small_file_is_buffered() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("small.txt");
        std::fs::write(&path, b"hello")?;

        let contents = read_whole(&path, 1024)?;
        assert!(matches!(contents, FileContents::Buffered(_)));
        assert_eq!(&*contents, b"hello");
        Ok(())
    }

    #[test]
    fn test_read_large_file_is_mapped() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("large.bin");
        let data = vec![0xABu8; 4096];
        std::fs::write(&path, &data)?;

        let contents = read_whole(&path, 1024)?;
        assert!(matches!(contents, FileContents::Mapped(_)));
        assert_eq!(contents.len(), 4096);
        assert_eq!(&*contents, data.as_slice());
        Ok(())
    }

    #[test]
    fn test_read_empty_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("empty");
        std::fs::write(&path, b"")?;

        let contents = read_whole(&path, 1)?;
        assert!(contents.is_empty());
        Ok(())
    }

    #[test]
    fn test_missing_file_is_not_found() -> Result<()> {
        let dir = tempdir()?;
        let err = read_whole(&dir.path().join("missing"), 1024).unwrap_err();
        assert!(matches!(err, FileError::NotFound { .. }));
        Ok(())
    }

    #[test]
    fn test_directory_is_not_readable() -> Result<()> {
        let dir = tempdir()?;
        let err = read_whole(dir.path(), 1024).unwrap_err();
        assert!(!matches!(err, FileError::NotFound { .. }));
        assert_eq!(err.reason(), "not a regular file");
        assert!(err.to_string().starts_with(&dir.path().display().to_string()));
        Ok(())
    }
}
