//! Command-line interface definitions for docdiff.
//!
//! The CLI definitions are shared between the main binary and build tools (like xtask)
//! for man page generation. Validation beyond what clap can express (file existence,
//! flag combinations) lives in [`crate::resolve`].
//!
//! Note: Field-level documentation is provided via clap attributes,
//! so we allow missing_docs for this module to avoid redundant documentation.

#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

use clap::Parser;
use clap_complete::Shell;
use std::path::PathBuf;
use std::time::Duration;

/// Main CLI structure for docdiff.
#[derive(Parser, Debug)]
#[command(
    name = "docdiff",
    version = crate::VERSION,
    about = "Diff the text content of two documents",
    long_about = "Converts word-processor documents to text or HTML with an office suite \
                  and diffs the result. With --git, compares two revisions of one tracked file."
)]
pub struct Cli {
    /// First document (or the tracked document in --git mode)
    #[arg(value_name = "FILE1")]
    pub file1: Option<PathBuf>,

    /// Second document (not allowed with --git)
    #[arg(value_name = "FILE2")]
    pub file2: Option<PathBuf>,

    /// Compare two git revisions of FILE1
    #[arg(long)]
    pub git: bool,

    /// Revisions to compare in --git mode (use CURRENT for the working copy)
    #[arg(long = "ver", num_args = 2, value_names = ["LEFT", "RIGHT"])]
    pub ver: Option<Vec<String>>,

    /// Keep extracted revisions as <name>-<revision><ext> next to FILE1
    #[arg(long)]
    pub create: bool,

    /// Show a vertical diff instead of side by side
    #[arg(long)]
    pub vdiff: bool,

    /// Convert to HTML instead of plain text before diffing
    #[arg(long)]
    pub html: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Kill any external tool that runs longer than this (e.g. 90s, 5m)
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Print a shell completion script and exit
    #[arg(long, value_name = "SHELL", value_enum)]
    pub completions: Option<Shell>,

    /// Show verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress informational messages
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}
