#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # docdiff - Text Diffs for Word-Processor Documents
//!
//! docdiff converts two documents to plain text or HTML with an office suite
//! running headless, then hands the renderings to an external line-diff tool
//! and colors the result for the terminal. In git mode the two sides are
//! revisions of one tracked document.
//!
//! ## Architecture
//!
//! A run is a fixed sequence of stages, each in its own module:
//!
//! - [`resolve`]: Validate arguments into a comparison request
//! - [`revision`]: Extract git revisions of a document to disk
//! - [`convert`]: Render each side with the converter, into its own directory
//! - [`diff`]: Run the diff tool and color output it cannot color itself
//! - [`cleanup`]: Remove every temporary resource exactly once
//! - [`compare`]: Drive the stages in order
//!
//! Supporting modules: [`config`] for tool paths and timeouts, [`errors`] for
//! the failure taxonomy and exit codes, [`output`] for terminal messages.
//!
//! ## Example Usage
//!
//! ```no_run
//! use clap::Parser;
//! use docdiff::{CompareContext, cli::Cli, compare, resolve};
//!
//! # fn main() -> anyhow::Result<()> {
//! let cli = Cli::parse_from(["docdiff", "old.odt", "new.odt", "--vdiff"]);
//! let resolved = resolve::resolve(&cli)?;
//! let ctx = CompareContext::new()?;
//! compare::run(&ctx, &resolved, false, &mut std::io::stdout())?;
//! # Ok(())
//! # }
//! ```

/// Command-line interface definitions (argument parsing structures).
pub mod cli;

/// Scoped removal of temporary files and directories.
pub mod cleanup;

/// The end-to-end comparison pipeline.
pub mod compare;

/// Configuration parsing, validation, and tool discovery.
pub mod config;

/// Document conversion through the external office suite.
pub mod convert;

/// External diff invocation and output coloring.
pub mod diff;

/// Error taxonomy and process exit codes.
pub mod errors;

/// Terminal messages and color handling.
pub mod output;

/// Argument validation and comparison request building.
pub mod resolve;

/// Git revision selection and extraction.
pub mod revision;

/// Utility functions and helpers.
pub mod utils;

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Current version of the docdiff binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration file path relative to home directory.
pub const DEFAULT_CONFIG_PATH: &str = ".config/docdiff/config.toml";

/// Everything a comparison needs besides its arguments.
///
/// # Examples
///
/// ```no_run
/// use docdiff::CompareContext;
///
/// # fn main() -> anyhow::Result<()> {
/// // Load ~/.config/docdiff/config.toml (or $DOCDIFF_CONFIG_PATH)
/// let ctx = CompareContext::new()?;
///
/// // Or start from an in-memory configuration
/// let ctx = CompareContext::new_explicit(docdiff::config::Config::default());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CompareContext {
    /// Path the configuration was read from (it need not exist).
    pub config_path: PathBuf,

    /// Loaded configuration settings, environment overrides applied.
    pub config: config::Config,
}

impl CompareContext {
    /// Creates a new `CompareContext` from the default configuration path.
    ///
    /// `DOCDIFF_CONFIG_PATH` replaces the default path, and `DOCDIFF_*` tool
    /// variables override values from the file. A missing file is not an error.
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined or if the
    /// configuration file exists but is invalid.
    pub fn new() -> Result<Self> {
        let config_path = if let Ok(path) = std::env::var("DOCDIFF_CONFIG_PATH") {
            PathBuf::from(path)
        } else {
            let home = dirs::home_dir().context("Could not find home directory")?;
            home.join(DEFAULT_CONFIG_PATH)
        };

        let mut config = config::Config::load(&config_path)?;
        config
            .apply_env_overrides()
            .context("Invalid DOCDIFF_* environment override")?;

        let validator = config::validator::ConfigValidator::new();
        if let Err(e) = validator.warn_unknown_fields(&config_path) {
            output::warning(&format!("Configuration validation failed: {e}"));
        }

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Creates a `CompareContext` around an already built configuration.
    /// Nothing is read from disk or the environment.
    #[must_use]
    pub fn new_explicit(config: config::Config) -> Self {
        Self {
            config_path: PathBuf::new(),
            config,
        }
    }
}
