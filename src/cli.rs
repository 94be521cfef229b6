//! Command-line interface definitions for crcs.
//!
//! The CLI definitions are shared between the main binary and build tools
//! (like xtask) for man page generation.
//!
//! Note: Field-level documentation is provided via clap attributes,
//! so we allow missing_docs for this module to avoid redundant documentation.

#![allow(missing_docs)]

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Main CLI structure for crcs.
#[derive(Parser)]
#[command(
    name = "crcs",
    version = crate::VERSION,
    about = "Track and verify CRC-32C checksums of the files in a directory",
    long_about = "Records a CRC-32C checksum for every regular file in a directory and \
                  later verifies the files against that manifest"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Directory to operate on
    #[arg(short = 'C', long, global = true, default_value = ".", env = "CRCS_DIR")]
    pub dir: PathBuf,

    /// Show verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print problems and summaries
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// All available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Print the checksum of a single file
    Calc {
        /// File to checksum (relative to --dir)
        file: PathBuf,
    },

    /// Rewrite the manifest for the directory, reusing unchanged checksums
    Update,

    /// Verify every file in the manifest
    Check,

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
