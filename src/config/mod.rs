//! Configuration loading for docdiff.
//!
//! The file is TOML, read from `~/.config/docdiff/config.toml` (or
//! `$DOCDIFF_CONFIG_PATH`) and never written. Every key is optional.

/// Detection of keys docdiff does not recognize
pub mod validator;

use crate::errors::CompareError;
use crate::utils::process::ToolCommand;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Converters searched for on `PATH`, in order, when none is configured.
pub const CONVERTER_CANDIDATES: &[&str] = &["soffice", "libreoffice", "lowriter"];

/// Column (0-indexed) where GNU diff places its side-by-side gutter marker at the default width.
pub const DEFAULT_MARKER_COLUMN: usize = 63;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// `[tools]` section
    #[serde(default)]
    pub tools: ToolsConfig,

    /// `[diff]` section
    #[serde(default)]
    pub diff: DiffConfig,

    /// `[process]` section
    #[serde(default)]
    pub process: ProcessConfig,
}

/// External commands, each in shell-words syntax
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsConfig {
    /// Document converter; auto-detected from [`CONVERTER_CANDIDATES`] when unset
    #[serde(default)]
    pub converter: Option<String>,
    /// Version-control command
    #[serde(default = "default_git")]
    pub git: String,
    /// Line-diff command
    #[serde(default = "default_diff")]
    pub diff: String,
}

/// Output coloring settings
#[derive(Debug, Clone, Deserialize)]
pub struct DiffConfig {
    /// Where the side-by-side colorizer looks for ` >` and ` |`
    #[serde(default = "default_marker_column")]
    pub marker_column: usize,
}

/// Limits applied to every external process
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProcessConfig {
    /// Per-process timeout in humantime syntax ("90s", "5m"); unset waits forever
    #[serde(default)]
    pub timeout: Option<String>,
}

fn default_git() -> String {
    "git".to_string()
}

fn default_diff() -> String {
    "diff".to_string()
}

const fn default_marker_column() -> usize {
    DEFAULT_MARKER_COLUMN
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            converter: None,
            git: default_git(),
            diff: default_diff(),
        }
    }
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            marker_column: DEFAULT_MARKER_COLUMN,
        }
    }
}

impl Config {
    /// Load configuration from a file, falling back to defaults when it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file exists but cannot be read
    /// - The file contains invalid TOML
    /// - A value fails validation
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or a value fails validation
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML config")?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `DOCDIFF_*` environment overrides on top of the file values
    ///
    /// # Errors
    ///
    /// Returns an error if an overridden value fails validation
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(converter) = std::env::var("DOCDIFF_CONVERTER") {
            self.tools.converter = Some(converter);
        }
        if let Ok(git) = std::env::var("DOCDIFF_GIT") {
            self.tools.git = git;
        }
        if let Ok(diff) = std::env::var("DOCDIFF_DIFF") {
            self.tools.diff = diff;
        }
        if let Ok(timeout) = std::env::var("DOCDIFF_TIMEOUT") {
            self.process.timeout = Some(timeout);
        }
        self.validate()
    }

    /// Check that every value is usable
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid value
    pub fn validate(&self) -> Result<()> {
        if let Some(converter) = &self.tools.converter {
            ToolCommand::parse(converter).context("Invalid tools.converter")?;
        }
        ToolCommand::parse(&self.tools.git).context("Invalid tools.git")?;
        ToolCommand::parse(&self.tools.diff).context("Invalid tools.diff")?;
        self.timeout()?;
        Ok(())
    }

    /// Configured per-process timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout is not a valid humantime duration
    pub fn timeout(&self) -> Result<Option<Duration>> {
        self.process
            .timeout
            .as_deref()
            .map(|raw| {
                humantime::parse_duration(raw)
                    .with_context(|| format!("Invalid process.timeout: {raw}"))
            })
            .transpose()
    }

    /// Converter command, detecting an installed office suite when none is configured
    ///
    /// # Errors
    ///
    /// Returns an error if no converter is configured and none is found on `PATH`
    pub fn converter_command(&self) -> Result<ToolCommand> {
        if let Some(converter) = &self.tools.converter {
            return ToolCommand::parse(converter);
        }

        for candidate in CONVERTER_CANDIDATES {
            if let Ok(path) = which::which(candidate) {
                debug!(converter = %path.display(), "Detected document converter");
                return Ok(ToolCommand::new(path.to_string_lossy(), ["--headless"]));
            }
        }

        Err(CompareError::tool(
            CONVERTER_CANDIDATES[0],
            format!(
                "no document converter found on PATH (tried {}). \
                 Install LibreOffice or set tools.converter / DOCDIFF_CONVERTER",
                CONVERTER_CANDIDATES.join(", ")
            ),
        )
        .into())
    }

    /// Git command
    ///
    /// # Errors
    ///
    /// Returns an error if the configured command is empty or malformed
    pub fn git_command(&self) -> Result<ToolCommand> {
        ToolCommand::parse(&self.tools.git)
    }

    /// Diff command
    ///
    /// # Errors
    ///
    /// Returns an error if the configured command is empty or malformed
    pub fn diff_command(&self) -> Result<ToolCommand> {
        ToolCommand::parse(&self.tools.diff)
    }
}
