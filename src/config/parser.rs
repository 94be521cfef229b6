use super::Config;
use anyhow::{Context, Result};
use std::path::Path;

/// Read, parse and validate a config file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid TOML or fails validation.
pub fn parse_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config_str(&content)
}

/// Parse and validate config text.
///
/// # Errors
///
/// Returns an error if the text is not valid TOML or fails validation.
pub fn parse_config_str(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse TOML config")?;

    // Validate and return validation errors directly without wrapping
    validate_config(&config)?;
    Ok(config)
}

/// Check every value in `config`.
///
/// # Errors
///
/// Returns the first invalid value found.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_manifest_name(&config.core.manifest_name)?;

    if config.performance.mmap_threshold == 0 {
        anyhow::bail!("mmap_threshold must be at least 1");
    }

    for pattern in &config.tracking.ignore_patterns {
        glob::Pattern::new(pattern).with_context(|| format!("Invalid ignore pattern: {pattern}"))?;
    }

    Ok(())
}

/// A manifest name must be a single, plain path component.
///
/// # Errors
///
/// Returns an error describing why `name` is unusable.
pub fn validate_manifest_name(name: &str) -> Result<()> {
    if name.is_empty() {
        anyhow::bail!("Manifest name cannot be empty");
    }
    if name == "." || name == ".." || name.contains(['/', '\t', '\n', '\0']) {
        anyhow::bail!("Invalid manifest name: {name:?}");
    }
    Ok(())
}
