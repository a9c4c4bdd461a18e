//! Turning parsed CLI arguments into a validated comparison request.
//!
//! Everything here runs before any external process is started, so a usage
//! error never leaves temporary files behind.

use crate::cli::Cli;
use crate::errors::CompareError;
use crate::revision::RevisionPair;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What the documents are converted to before diffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Plain text (`--convert-to txt`).
    #[default]
    Text,
    /// HTML (`--convert-to html`).
    Html,
}

impl OutputFormat {
    /// Converter format name, which is also the output file extension.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Html => "html",
        }
    }
}

/// How the diff tool lays out its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Two columns with a marker gutter.
    #[default]
    SideBySide,
    /// Classic `<` / `>` / `---` output.
    Vertical,
}

/// The two things being compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSpec {
    /// Two independent documents.
    Files {
        /// Left document.
        left: PathBuf,
        /// Right document.
        right: PathBuf,
    },
    /// Two revisions of one git-tracked document.
    Git {
        /// Tracked document.
        file: PathBuf,
        /// Explicit revisions, or `None` to pick them from the working copy state.
        revisions: Option<RevisionPair>,
    },
}

impl InputSpec {
    /// Whether this is a git revision comparison.
    #[must_use]
    pub const fn is_git(&self) -> bool {
        matches!(self, Self::Git { .. })
    }
}

/// A fully validated comparison request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Inputs and mode.
    pub input: InputSpec,
    /// Conversion target.
    pub format: OutputFormat,
    /// Diff layout.
    pub layout: Layout,
    /// Keep extracted revisions next to the document.
    pub persist: bool,
    /// Timeout given on the command line, if any.
    pub timeout: Option<Duration>,
    /// Non-fatal problems with the arguments, to be shown to the user.
    pub warnings: Vec<String>,
}

/// Validate `cli` and build the comparison request.
///
/// # Errors
///
/// Returns [`CompareError::Usage`] when a required file is missing or does not
/// exist, or when FILE2 is combined with `--git`.
pub fn resolve(cli: &Cli) -> Result<Resolved, CompareError> {
    let file1 = cli
        .file1
        .as_deref()
        .ok_or_else(|| CompareError::usage("FILE1 is required"))?;
    require_file(file1)?;

    let mut warnings = Vec::new();

    let input = if cli.git {
        if let Some(file2) = &cli.file2 {
            return Err(CompareError::usage(format!(
                "FILE2 ({}) cannot be used with --git; only FILE1 is compared against its history",
                file2.display()
            )));
        }
        let revisions = match cli.ver.as_deref() {
            None => None,
            Some([left, right]) => Some(RevisionPair::parse(left, right)),
            Some(other) => {
                return Err(CompareError::usage(format!(
                    "--ver takes exactly two revisions, got {}",
                    other.len()
                )));
            }
        };
        InputSpec::Git {
            file: file1.to_path_buf(),
            revisions,
        }
    } else {
        let file2 = cli
            .file2
            .as_deref()
            .ok_or_else(|| CompareError::usage("FILE2 is required unless --git is given"))?;
        require_file(file2)?;

        if cli.ver.is_some() {
            warnings.push("--ver has no effect without --git".to_string());
        }
        if cli.create {
            warnings.push("--create has no effect without --git".to_string());
        }

        InputSpec::Files {
            left: file1.to_path_buf(),
            right: file2.to_path_buf(),
        }
    };

    Ok(Resolved {
        input,
        format: if cli.html {
            OutputFormat::Html
        } else {
            OutputFormat::Text
        },
        layout: if cli.vdiff {
            Layout::Vertical
        } else {
            Layout::SideBySide
        },
        persist: cli.git && cli.create,
        timeout: cli.timeout,
        warnings,
    })
}

/// Usage error unless `path` exists
fn require_file(path: &Path) -> Result<(), CompareError> {
    if !path.exists() {
        return Err(CompareError::usage(format!(
            "No such file: {}",
            path.display()
        )));
    }
    if !path.is_file() {
        return Err(CompareError::usage(format!(
            "Not a file: {}",
            path.display()
        )));
    }
    Ok(())
}
