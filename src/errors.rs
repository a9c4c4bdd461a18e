use std::fmt;
use std::path::PathBuf;

/// Exit status for a successful comparison, with or without differences.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit status for usage errors and unexpected tool failures.
pub const EXIT_FAILURE: i32 = 1;
/// Exit status when either document fails to convert.
pub const EXIT_CONVERSION_FAILED: i32 = 2;
/// Exit status when git does not know the requested revision.
pub const EXIT_INVALID_REVISION: i32 = 3;

/// Categorized failures that decide the process exit status
#[derive(Debug)]
pub enum CompareError {
    /// Missing or nonexistent input file, or an invalid flag combination
    Usage(String),
    /// Git reported that the revision does not exist
    InvalidRevision {
        /// Revision as given by the user
        revision: String,
        /// Tracked file the revision was requested for
        path: PathBuf,
        /// Git's stderr, trimmed
        stderr: String,
    },
    /// The converter did not produce its expected output file
    Conversion {
        /// Input document that failed to convert
        input: PathBuf,
        /// Converter exit code (`None` when killed by a signal)
        exit_code: Option<i32>,
        /// Captured converter stdout
        stdout: String,
        /// Captured converter stderr
        stderr: String,
    },
    /// An external tool could not run, timed out, or failed unexpectedly
    Tool {
        /// Program name
        program: String,
        /// What went wrong
        message: String,
    },
}

impl CompareError {
    /// Build a usage error from any message
    #[must_use]
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    /// Build a tool error for `program`
    #[must_use]
    pub fn tool(program: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            program: program.into(),
            message: message.into(),
        }
    }

    /// Process exit status for this error
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Conversion { .. } => EXIT_CONVERSION_FAILED,
            Self::InvalidRevision { .. } => EXIT_INVALID_REVISION,
            Self::Usage(_) | Self::Tool { .. } => EXIT_FAILURE,
        }
    }

    /// Get a short description of the error type
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::Usage(_) => "Usage Error",
            Self::InvalidRevision { .. } => "Invalid Revision",
            Self::Conversion { .. } => "Conversion Failed",
            Self::Tool { .. } => "Tool Error",
        }
    }

    /// Get a user-friendly error message with actionable guidance
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Usage(msg) => format!("{msg}\n\nRun 'docdiff --help' for usage."),
            Self::InvalidRevision {
                revision,
                path,
                stderr,
            } => format!(
                "Invalid revision '{revision}' for {}\n{}\n\nSuggestions:\n\
                 - Check the revision with 'git log -- {}'\n\
                 - Use CURRENT for the working copy",
                path.display(),
                indent(stderr),
                path.display()
            ),
            Self::Conversion {
                input,
                exit_code,
                stdout,
                stderr,
            } => {
                let code = exit_code.map_or_else(|| "killed by signal".to_string(), |c| c.to_string());
                format!(
                    "Failed to convert {}\n  exit code: {code}\n  stdout:\n{}\n  stderr:\n{}",
                    input.display(),
                    indent(stdout),
                    indent(stderr)
                )
            }
            Self::Tool { program, message } => format!("{program}: {message}"),
        }
    }
}

impl fmt::Display for CompareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for CompareError {}

/// Maps any error chain to an exit status, looking for a [`CompareError`] anywhere in it
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<CompareError>())
        .map_or(EXIT_FAILURE, CompareError::exit_code)
}

/// Indent captured tool output so it reads as a block under its heading
fn indent(text: &str) -> String {
    let trimmed = text.trim_end();
    if trimmed.is_empty() {
        return "    (empty)".to_string();
    }
    trimmed
        .lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
