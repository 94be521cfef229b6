use crate::storage::ManifestRecord;
use colored::Colorize;
use std::time::Duration;

/// Formats read+checksum throughput as `%6.1f MB/s ` (bytes per microsecond).
///
/// Returns `None` when the operation took less than a microsecond.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_throughput(bytes: u64, elapsed: Duration) -> Option<String> {
    let micros = elapsed.as_micros();
    if micros == 0 {
        return None;
    }
    Some(format!("{:6.1} MB/s ", bytes as f64 / micros as f64))
}

/// Line printed by `update` when a cached checksum is reused.
#[must_use]
pub fn format_reused(record: &ManifestRecord) -> String {
    format!("{} {record}", "      FOUND".dimmed())
}

/// Line printed by `update` when a checksum is freshly computed.
#[must_use]
pub fn format_computed(throughput: Option<&str>, record: &ManifestRecord) -> String {
    format!("{}{record}", throughput.unwrap_or_default())
}

/// Six-column label used by `check` for each outcome.
#[must_use]
pub fn format_label(label: &str) -> String {
    let padded = format!("{label:>6}");
    match label {
        "OK" => padded.green().to_string(),
        "BROKEN" | "ERROR" => padded.red().bold().to_string(),
        _ => padded.yellow().to_string(),
    }
}
