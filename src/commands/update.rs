use crate::CrcsContext;
use crate::commands::TrackedDir;
use crate::output;
use crate::scanner::{ScanError, ScanFilter};
use crate::storage::{ChangeIndex, Manifest, ManifestRecord};
use crate::utils::format_size;
use crate::utils::formatters::{format_computed, format_reused};
use anyhow::Result;
use std::time::{Duration, Instant};
use tracing::{Level, debug, span, warn};

/// Counts from one `update` run, along with the manifest it wrote.
#[derive(Debug, Clone, Default)]
pub struct UpdateSummary {
    /// The manifest written to disk
    pub manifest: Manifest,
    /// Files whose checksum was taken from the change index
    pub reused: usize,
    /// Files that were read and checksummed
    pub computed: usize,
    /// Entries left out because they could not be stat'ed or read
    pub skipped: usize,
    /// Total bytes read for computed checksums
    pub bytes_hashed: u64,
    /// Wall-clock duration of the whole run
    pub elapsed: Duration,
}

/// Reconciles the directory with its previous manifest and writes a new one.
///
/// Files whose inode and mtime match a previous record reuse that record's
/// checksum without being read. Everything else is read and checksummed.
/// Entries that cannot be stat'ed or read, or whose names contain a tab or
/// newline or exceed the manifest's name limit, are reported and left out of
/// the new manifest. The new manifest replaces the old one wholesale.
///
/// # Errors
///
/// Returns an error if the root directory cannot be listed or the new
/// manifest cannot be written. Per-file failures are never errors.
pub fn run(dir: &TrackedDir<'_>, filter: &ScanFilter) -> Result<UpdateSummary> {
    let span = span!(Level::INFO, "update", root = %dir.root.display());
    let _enter = span.enter();
    let start = Instant::now();

    let manifest_path = dir.manifest_path();
    let previous = match Manifest::load(&manifest_path) {
        Ok(Some(manifest)) => manifest,
        Ok(None) => {
            debug!("no previous manifest");
            Manifest::new()
        }
        Err(e) => {
            warn!(error = %e, "previous manifest unreadable");
            output::warning(&format!("{e:#}; rehashing every file"));
            Manifest::new()
        }
    };
    let index = ChangeIndex::build(&previous, dir.root, dir.source);

    let mut summary = UpdateSummary::default();
    for item in dir.source.list_entries(dir.root)? {
        let entry = match item {
            Ok(entry) => entry,
            Err(e @ ScanError::NonUtf8Name { .. }) => {
                output::warning(&e.to_string());
                summary.skipped += 1;
                continue;
            }
            Err(e) => {
                output::error(&e.to_string());
                summary.skipped += 1;
                continue;
            }
        };

        if !filter.accepts(&entry) {
            debug!(file = %entry.name, "excluded");
            continue;
        }

        if !ManifestRecord::is_valid_file_name(&entry.name) {
            output::warning(&format!(
                "{:?}: file name cannot be stored in the manifest",
                entry.name
            ));
            summary.skipped += 1;
            continue;
        }

        if let Some(checksum) = index.lookup(&entry.identity()) {
            let record = ManifestRecord::new(checksum, entry.mtime, entry.name);
            output::file_ok(&format_reused(&record));
            summary.manifest.push(record);
            summary.reused += 1;
            continue;
        }

        match dir.checksum_file(&entry.name) {
            Ok(hashed) => {
                let record = ManifestRecord::new(hashed.checksum, entry.mtime, entry.name);
                output::file_ok(&format_computed(hashed.throughput().as_deref(), &record));
                summary.manifest.push(record);
                summary.computed += 1;
                summary.bytes_hashed += hashed.bytes;
            }
            Err(e) => {
                output::error(&e.to_string());
                summary.skipped += 1;
            }
        }
    }

    summary.manifest.save(&manifest_path)?;
    summary.elapsed = start.elapsed();

    debug!(
        reused = summary.reused,
        computed = summary.computed,
        skipped = summary.skipped,
        "manifest written"
    );
    Ok(summary)
}

/// Execute update command - rewrite the manifest for the context's root
///
/// # Errors
///
/// Returns an error if:
/// - An ignore pattern in the configuration is invalid
/// - The root directory cannot be listed
/// - The manifest cannot be written
pub fn execute(ctx: &CrcsContext) -> Result<UpdateSummary> {
    let dir = TrackedDir::from_context(ctx);
    let filter = ctx.scan_filter()?;
    let summary = run(&dir, &filter)?;

    output::info(&format!(
        "Updated {}: {} files ({} computed, {} reused, {} skipped), {} hashed in {}",
        dir.manifest_name,
        summary.manifest.len(),
        summary.computed,
        summary.reused,
        summary.skipped,
        format_size(summary.bytes_hashed),
        crate::utils::format_elapsed(summary.elapsed),
    ));
    Ok(summary)
}
