use crate::CrcsContext;
use crate::checksum::ChecksumValue;
use crate::commands::TrackedDir;
use crate::storage::FileError;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Computes the checksum of a single file, relative to the tracked root.
///
/// # Errors
///
/// Returns the [`FileError`] if the file cannot be read.
pub fn run(dir: &TrackedDir<'_>, file: &Path) -> Result<ChecksumValue, FileError> {
    let path = dir.root.join(file);
    let contents = crate::storage::file_ops::read_whole(&path, dir.mmap_threshold)?;
    Ok(dir.engine.checksum(&contents))
}

/// Execute calc command - print the checksum of one file
///
/// Prints exactly eight lowercase hex digits with no trailing newline.
///
/// # Errors
///
/// Returns an error if the file cannot be read or stdout cannot be written.
pub fn execute(ctx: &CrcsContext, file: &Path) -> Result<()> {
    let dir = TrackedDir::from_context(ctx);
    let checksum = run(&dir, file)?;

    let mut stdout = std::io::stdout().lock();
    write!(stdout, "{checksum:08x}").context("Failed to write checksum")?;
    stdout.flush().context("Failed to flush stdout")?;
    Ok(())
}
