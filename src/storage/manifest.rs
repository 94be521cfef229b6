//! Manifest records and the on-disk manifest codec.
//!
//! The manifest is a line-oriented text file with one record per tracked file:
//!
//! ```text
//! <8 hex digit checksum> <10 digit zero-padded mtime>\t<file name>\n
//! ```
//!
//! Parsing is lenient: lines that do not match this shape are skipped, so a
//! trailing blank line or a hand-edited stray line never aborts a run.

use crate::checksum::ChecksumValue;
use anyhow::{Context, Result};
use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Longest file name the manifest format can carry.
pub const MAX_FILE_NAME_LEN: usize = 255;

/// Last-known state of one tracked file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ManifestRecord {
    /// CRC-32C of the file contents
    pub checksum: ChecksumValue,
    /// Modification time, seconds since the Unix epoch
    pub mtime: u64,
    /// Name of the file inside the tracked directory
    pub file_name: String,
}

impl ManifestRecord {
    /// Creates a record.
    pub fn new(checksum: ChecksumValue, mtime: u64, file_name: impl Into<String>) -> Self {
        Self {
            checksum,
            mtime,
            file_name: file_name.into(),
        }
    }

    /// Returns whether `name` can be stored in a manifest line.
    #[must_use]
    pub fn is_valid_file_name(name: &str) -> bool {
        !name.is_empty() && name.len() <= MAX_FILE_NAME_LEN && !name.contains(['\t', '\n'])
    }

    /// Parses one manifest line (without its terminator).
    ///
    /// Returns `None` for anything that is not exactly
    /// `<8 hex> <digits>\t<name>`.
    #[must_use]
    pub fn parse_line(line: &str) -> Option<Self> {
        let (head, file_name) = line.split_once('\t')?;
        let (checksum, mtime) = head.split_once(' ')?;

        if checksum.len() != 8 || !checksum.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        if mtime.is_empty() || !mtime.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if !Self::is_valid_file_name(file_name) {
            return None;
        }

        Some(Self {
            checksum: u32::from_str_radix(checksum, 16).ok()?,
            mtime: mtime.parse().ok()?,
            file_name: file_name.to_string(),
        })
    }
}

impl fmt::Display for ManifestRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x} {:010}\t{}", self.checksum, self.mtime, self.file_name)
    }
}

/// Parses manifest text, skipping malformed lines.
#[must_use]
pub fn parse(text: &str) -> Vec<ManifestRecord> {
    parse_bytes(text.as_bytes())
}

/// Parses raw manifest bytes, skipping malformed or non-UTF-8 lines.
#[must_use]
pub fn parse_bytes(data: &[u8]) -> Vec<ManifestRecord> {
    data.split(|&b| b == b'\n')
        .filter_map(|line| std::str::from_utf8(line).ok())
        .filter_map(ManifestRecord::parse_line)
        .collect()
}

/// Renders records in manifest format, one newline-terminated line each.
#[must_use]
pub fn format(records: &[ManifestRecord]) -> String {
    use std::fmt::Write as _;

    let mut out = String::with_capacity(records.len() * 32);
    for record in records {
        // Writing into a String cannot fail
        let _ = writeln!(out, "{record}");
    }
    out
}

/// Ordered sequence of records, one per tracked file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    records: Vec<ManifestRecord>,
}

impl Manifest {
    /// Creates an empty manifest.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Builds a manifest from records in the given order.
    #[must_use]
    pub const fn from_records(records: Vec<ManifestRecord>) -> Self {
        Self { records }
    }

    /// Parses manifest text.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self::from_records(parse(text))
    }

    /// Appends a record.
    pub fn push(&mut self, record: ManifestRecord) {
        self.records.push(record);
    }

    /// Records in manifest order.
    #[must_use]
    pub fn records(&self) -> &[ManifestRecord] {
        &self.records
    }

    /// Iterates records in manifest order.
    pub fn iter(&self) -> std::slice::Iter<'_, ManifestRecord> {
        self.records.iter()
    }

    /// Looks up a record by file name.
    #[must_use]
    pub fn get(&self, file_name: &str) -> Option<&ManifestRecord> {
        self.records.iter().find(|r| r.file_name == file_name)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the manifest has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Renders the manifest in its on-disk format.
    #[must_use]
    pub fn to_text(&self) -> String {
        format(&self.records)
    }

    /// Loads the manifest at `path`.
    ///
    /// Returns `Ok(None)` if no file exists at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        match std::fs::read(path) {
            Ok(data) => Ok(Some(Self::from_records(parse_bytes(&data)))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read manifest: {}", path.display())),
        }
    }

    /// Writes the manifest to `path`, fully replacing any previous content.
    ///
    /// The new content is written to a temporary file next to `path` and
    /// renamed over it, so readers never observe a half-written manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be created, written or
    /// renamed into place.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        tmp.write_all(self.to_text().as_bytes())
            .context("Failed to write manifest contents")?;
        tmp.as_file()
            .sync_all()
            .context("Failed to flush manifest to disk")?;
        tmp.persist(path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to write manifest: {}", path.display()))?;

        Ok(())
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a ManifestRecord;
    type IntoIter = std::slice::Iter<'a, ManifestRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_format_record() {
        let record = ManifestRecord::new(0x00ab_cdef, 1_700_000_000, "notes.txt");
        assert_eq!(format(&[record]), "00abcdef 1700000000\tnotes.txt\n");
    }

    #[test]
    fn test_format_pads_mtime() {
        let record = ManifestRecord::new(0, 42, "a");
        assert_eq!(record.to_string(), "00000000 0000000042\ta");
    }

    #[test]
    fn test_parse_line() {
        let record = ManifestRecord::parse_line("deadbeef 0000000042\tphoto one.jpg").unwrap();
        assert_eq!(record.checksum, 0xdead_beef);
        assert_eq!(record.mtime, 42);
        assert_eq!(record.file_name, "photo one.jpg");
    }

    #[test]
    fn test_parse_accepts_uppercase_and_unpadded_mtime() {
        let record = ManifestRecord::parse_line("DEADBEEF 7\tx").unwrap();
        assert_eq!(record.checksum, 0xdead_beef);
        assert_eq!(record.mtime, 7);
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let text = "\
deadbeef 0000000001\tgood
not a record
deadbee 0000000001\tshort-crc
deadbeef \tno-mtime
deadbeef +1\tsigned
deadbeef 0000000001 no-tab
deadbeef 0000000001\t

0badf00d 0000000002\talso good
";
        let records = parse(text);
        let names: Vec<_> = records.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, ["good", "also good"]);
    }

    #[test]
    fn test_parse_skips_overlong_names() {
        let long = "x".repeat(MAX_FILE_NAME_LEN + 1);
        assert!(ManifestRecord::parse_line(&format!("00000000 1\t{long}")).is_none());

        let max = "y".repeat(MAX_FILE_NAME_LEN);
        assert!(ManifestRecord::parse_line(&format!("00000000 1\t{max}")).is_some());
    }

    #[test]
    fn test_parse_skips_invalid_utf8_lines() {
        let mut data = b"00000001 1\tok\n".to_vec();
        data.extend_from_slice(b"00000002 2\t\xff\xfe\n");
        let records = parse_bytes(&data);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file_name, "ok");
    }

    #[test]
    fn test_round_trip_preserves_order() {
        let records = vec![
            ManifestRecord::new(3, 30, "c"),
            ManifestRecord::new(1, 10, "a"),
            ManifestRecord::new(u32::MAX, u64::MAX, "b"),
        ];
        assert_eq!(parse(&format(&records)), records);
    }

    #[test]
    fn test_load_missing_is_none() -> Result<()> {
        let dir = tempdir()?;
        assert!(Manifest::load(&dir.path().join("CRCS"))?.is_none());
        Ok(())
    }

    #[test]
    fn test_save_replaces_content() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("CRCS");
        std::fs::write(&path, "old content that is much longer than the new one\n")?;

        let mut manifest = Manifest::new();
        manifest.push(ManifestRecord::new(0x1234_5678, 99, "file"));
        manifest.save(&path)?;

        assert_eq!(std::fs::read_to_string(&path)?, "12345678 0000000099\tfile\n");
        assert_eq!(Manifest::load(&path)?, Some(manifest));
        Ok(())
    }

    #[test]
    fn test_save_leaves_no_temporary_files() -> Result<()> {
        let dir = tempdir()?;
        Manifest::new().save(&dir.path().join("CRCS"))?;

        let entries: Vec<_> = std::fs::read_dir(dir.path())?.collect::<Result<_, _>>()?;
        assert_eq!(entries.len(), 1);
        Ok(())
    }

    #[test]
    fn test_get_by_name() {
        let manifest = Manifest::parse("00000001 1\ta\n00000002 2\tb\n");
        assert_eq!(manifest.get("b").map(|r| r.checksum), Some(2));
        assert!(manifest.get("c").is_none());
    }
}
