use crate::CrcsContext;
use crate::commands::TrackedDir;
use crate::output;
use crate::storage::{FileError, Manifest, ManifestRecord};
use crate::utils::formatters::format_label;
use colored::Colorize;
use std::fmt;
use std::io;
use std::path::PathBuf;
use tracing::{Level, debug, span, warn};

/// Exit code for a clean check.
pub const EXIT_CLEAN: i32 = 0;
/// Exit code when any file is missing, modified, broken or unreadable.
pub const EXIT_DIRTY: i32 = 1;
/// Exit code when the manifest cannot be opened.
pub const EXIT_NO_MANIFEST: i32 = 2;

/// Classification of one manifest record against the live filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// File exists, mtime and checksum match
    Ok,
    /// No file with the recorded name exists
    NotFound,
    /// The mtime differs from the record; content is not re-read
    Modified,
    /// The mtime matches but the recomputed checksum does not
    Broken,
    /// The file could not be stat'ed or read
    Error(String),
}

impl CheckStatus {
    /// Short label used in per-file output.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::NotFound => "NFOUND",
            Self::Modified => "MODIFIED",
            Self::Broken => "BROKEN",
            Self::Error(_) => "ERROR",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedFile {
    /// File name from the manifest
    pub file_name: String,
    /// How the file compared against its record
    pub status: CheckStatus,
}

/// Per-category counts across a check run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// Files that passed
    pub ok: usize,
    /// Files that no longer exist
    pub not_found: usize,
    /// Files whose mtime changed
    pub modified: usize,
    /// Files whose content no longer matches
    pub broken: usize,
    /// Files that could not be read
    pub errors: usize,
}

impl Tally {
    /// Counts one outcome.
    pub fn record(&mut self, status: &CheckStatus) {
        match status {
            CheckStatus::Ok => self.ok += 1,
            CheckStatus::NotFound => self.not_found += 1,
            CheckStatus::Modified => self.modified += 1,
            CheckStatus::Broken => self.broken += 1,
            CheckStatus::Error(_) => self.errors += 1,
        }
    }

    /// Whether every non-OK count is zero.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.not_found == 0 && self.modified == 0 && self.broken == 0 && self.errors == 0
    }
}

/// Overall pass/fail for a check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Every record is OK
    Clean,
    /// At least one record is not OK
    Dirty,
}

/// All per-file outcomes of a check run, in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// Outcome per manifest record
    pub files: Vec<CheckedFile>,
    /// Counts per category
    pub tally: Tally,
}

impl CheckReport {
    /// Clean iff no file is missing, modified, broken or unreadable.
    #[must_use]
    pub const fn verdict(&self) -> Verdict {
        if self.tally.is_clean() {
            Verdict::Clean
        } else {
            Verdict::Dirty
        }
    }

    /// Status of a file by name.
    #[must_use]
    pub fn status_of(&self, file_name: &str) -> Option<&CheckStatus> {
        self.files
            .iter()
            .find(|f| f.file_name == file_name)
            .map(|f| &f.status)
    }
}

/// Result of a check run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The manifest could not be opened; no file was examined
    NoManifest {
        /// Path that was tried
        path: PathBuf,
    },
    /// The manifest was read and every record classified
    Checked(CheckReport),
}

impl CheckOutcome {
    /// Process exit code for this outcome.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::NoManifest { .. } => EXIT_NO_MANIFEST,
            Self::Checked(report) => match report.verdict() {
                Verdict::Clean => EXIT_CLEAN,
                Verdict::Dirty => EXIT_DIRTY,
            },
        }
    }
}

/// Verifies every manifest record against the filesystem.
///
/// Records are classified in manifest order. A changed mtime is reported as
/// [`CheckStatus::Modified`] without reading the file; only files whose mtime
/// still matches are checksummed.
#[must_use]
pub fn run(dir: &TrackedDir<'_>) -> CheckOutcome {
    let span = span!(Level::INFO, "check", root = %dir.root.display());
    let _enter = span.enter();

    let path = dir.manifest_path();
    let manifest = match Manifest::load(&path) {
        Ok(Some(manifest)) => manifest,
        Ok(None) => return CheckOutcome::NoManifest { path },
        Err(e) => {
            warn!(error = %e, "cannot open manifest");
            return CheckOutcome::NoManifest { path };
        }
    };
    debug!(records = manifest.len(), "loaded manifest");

    let mut report = CheckReport::default();
    for record in &manifest {
        let status = check_record(dir, record);
        report.tally.record(&status);
        report.files.push(CheckedFile {
            file_name: record.file_name.clone(),
            status,
        });
    }

    CheckOutcome::Checked(report)
}

fn check_record(dir: &TrackedDir<'_>, record: &ManifestRecord) -> CheckStatus {
    let name = &record.file_name;

    let stat = match dir.source.stat(&dir.root.join(name)) {
        Ok(stat) => stat,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            output::file_problem(&format!("{} {name}", format_label("NFOUND")));
            return CheckStatus::NotFound;
        }
        Err(e) => {
            let reason = e.to_string();
            output::file_problem(&format!("{} {name}: {reason}", format_label("ERROR")));
            return CheckStatus::Error(reason);
        }
    };

    if stat.mtime != record.mtime {
        output::file_problem(&format!("{} {name}", format_label("MODIFIED")));
        return CheckStatus::Modified;
    }

    match dir.checksum_file(name) {
        Ok(hashed) => {
            let throughput = hashed.throughput().unwrap_or_default();
            if hashed.checksum == record.checksum {
                output::file_ok(&format!("{throughput}{} {name}", format_label("OK")));
                CheckStatus::Ok
            } else {
                debug!(
                    file = %name,
                    expected = record.checksum,
                    actual = hashed.checksum,
                    "checksum mismatch"
                );
                output::file_problem(&format!("{throughput}{} {name}", format_label("BROKEN")));
                CheckStatus::Broken
            }
        }
        // Deleted between stat and open
        Err(FileError::NotFound { .. }) => {
            output::file_problem(&format!("{} {name}", format_label("NFOUND")));
            CheckStatus::NotFound
        }
        Err(e) => {
            let reason = e.reason();
            output::file_problem(&format!("{} {name}: {reason}", format_label("ERROR")));
            CheckStatus::Error(reason)
        }
    }
}

/// Prints the end-of-run summary for a report.
pub fn print_summary(report: &CheckReport) {
    let tally = &report.tally;
    if tally.is_clean() {
        output::summary(&"All Files OK".green().bold().to_string());
        return;
    }

    output::summary(&format!("{} Files not found", tally.not_found));
    output::summary(&format!("{} Files changed", tally.modified));
    output::summary(&format!("{} Files broken", tally.broken));
    output::summary(&format!("{} Other Errors", tally.errors));
}

/// Execute check command - verify the context's root against its manifest
///
/// Never fails: an unopenable manifest is reported as
/// [`CheckOutcome::NoManifest`].
pub fn execute(ctx: &CrcsContext) -> CheckOutcome {
    let dir = TrackedDir::from_context(ctx);
    let outcome = run(&dir);

    match &outcome {
        CheckOutcome::NoManifest { path } => {
            output::error(&format!("Cannot open manifest {}", path.display()));
        }
        CheckOutcome::Checked(report) => print_summary(report),
    }

    outcome
}
