//! Rendering documents to text or HTML with an external office suite.

use crate::cleanup::Reaper;
use crate::errors::CompareError;
use crate::resolve::OutputFormat;
use crate::utils::process::{self, ToolCommand};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{Level, debug, span, warn};

/// A converted rendering and the temporary directory that holds it.
///
/// The directory is registered with the [`Reaper`] that created it, so the
/// file never outlives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOutput {
    /// The rendered `<stem>.<format>` file.
    pub file: PathBuf,
    /// Directory created for this conversion alone.
    pub dir: PathBuf,
}

/// Runs `<converter> --convert-to <format> --outdir <dir> <input>`.
pub struct Converter {
    /// Configured converter command.
    cmd: ToolCommand,
    /// Per-invocation timeout.
    timeout: Option<Duration>,
}

impl Converter {
    /// Create a converter.
    #[must_use]
    pub const fn new(cmd: ToolCommand, timeout: Option<Duration>) -> Self {
        Self { cmd, timeout }
    }

    /// Convert `input` into a fresh temporary directory.
    ///
    /// Each call gets its own directory, so two inputs sharing a file name
    /// never overwrite each other's output. Success needs both a zero exit
    /// status and the expected output file.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::Conversion`] with the converter's exit code and
    /// output when it exits non-zero or the expected file is missing, or a
    /// tool error if the converter cannot be run at all.
    pub fn convert(
        &self,
        input: &Path,
        format: OutputFormat,
        label: &str,
        reaper: &mut Reaper,
    ) -> Result<ConversionOutput> {
        let span = span!(Level::DEBUG, "convert", input = %input.display(), label);
        let _guard = span.enter();

        let dir = reaper.temp_dir(label)?;
        let file = expected_output(input, &dir, format);
        reaper.track_file(&file);

        let mut cmd = self.cmd.command();
        cmd.arg("--convert-to")
            .arg(format.extension())
            .arg("--outdir")
            .arg(&dir)
            .arg(input);

        let output = process::run(cmd, self.timeout)?;

        let produced = file.exists();
        if !produced || !output.status.success() {
            warn!(
                code = ?output.code(),
                produced,
                "Conversion failed"
            );
            return Err(CompareError::Conversion {
                input: input.to_path_buf(),
                exit_code: output.code(),
                stdout: output.stdout_lossy(),
                stderr: output.stderr_lossy(),
            }
            .into());
        }

        debug!(output = %file.display(), "Converted");
        Ok(ConversionOutput { file, dir })
    }
}

/// Where the converter writes `input` rendered as `format` inside `outdir`.
#[must_use]
pub fn expected_output(input: &Path, outdir: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    outdir.join(format!("{stem}.{}", format.extension()))
}
