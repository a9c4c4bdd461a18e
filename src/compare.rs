//! The comparison pipeline: extract, convert, diff, color, clean up.
//!
//! Stages run strictly in order and each blocks on its external tool. Every
//! temporary resource goes through one [`Reaper`], so a failure at any stage
//! unwinds through the same cleanup as a successful run.

use crate::CompareContext;
use crate::cleanup::Reaper;
use crate::convert::Converter;
use crate::diff::{self, DiffRunner};
use crate::output;
use crate::resolve::{InputSpec, Resolved};
use crate::revision::{GitCli, MaterializedFile, Ownership};
use anyhow::{Context, Result};
use std::io::Write;
use tracing::{Level, info, span};

/// Message printed instead of an empty diff.
pub const NO_DIFFERENCES: &str = "No differences found";

/// How a finished comparison came out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The converted renderings matched.
    Identical,
    /// The diff tool reported differences, which were written out.
    Different,
}

/// Run one comparison and write the result to `out`.
///
/// `color` says whether escape sequences are wanted at all. The diff tool is
/// only asked for them when it supports `--color`; any other output goes
/// through [`diff::colorize`], which also lays out vertical headers. Whether
/// that emits escapes follows the active [`crate::output::ColorScope`].
///
/// # Errors
///
/// Returns the first failure of any stage. Temporary files are removed before
/// the error reaches the caller.
pub fn run(
    ctx: &CompareContext,
    resolved: &Resolved,
    color: bool,
    out: &mut impl Write,
) -> Result<Outcome> {
    let span = span!(
        Level::DEBUG,
        "compare",
        format = resolved.format.extension(),
        layout = ?resolved.layout
    );
    let _guard = span.enter();

    let config = &ctx.config;
    let timeout = match resolved.timeout {
        Some(timeout) => Some(timeout),
        None => config.timeout()?,
    };

    // Resolve every tool up front so a missing one fails before any work
    let converter = Converter::new(config.converter_command()?, timeout);
    let runner = DiffRunner::new(config.diff_command()?, timeout);

    let mut reaper = Reaper::new();

    let (left, right) = match &resolved.input {
        InputSpec::Files { left, right } => (
            MaterializedFile::borrowed(left),
            MaterializedFile::borrowed(right),
        ),
        InputSpec::Git { file, revisions } => {
            let git = GitCli::new(config.git_command()?, timeout);
            let pair = match revisions {
                Some(pair) => pair.clone(),
                None => git.default_pair(file)?,
            };
            output::action(
                "Comparing",
                &format!("{} at {} with {}", file.display(), pair.left, pair.right),
            );

            let left = git.materialize(file, &pair.left, resolved.persist, &mut reaper)?;
            let right = git.materialize(file, &pair.right, resolved.persist, &mut reaper)?;
            report_persisted(&[&left, &right]);
            (left, right)
        }
    };

    let left_out = converter
        .convert(&left.path, resolved.format, "left", &mut reaper)
        .context("Left document")?;
    let right_out = converter
        .convert(&right.path, resolved.format, "right", &mut reaper)
        .context("Right document")?;

    let result = runner.run(&left_out.file, &right_out.file, resolved.layout, color)?;

    let outcome = if result.is_identical() {
        writeln!(out, "{NO_DIFFERENCES}")?;
        Outcome::Identical
    } else if result.native_color && color {
        out.write_all(result.output.as_bytes())?;
        Outcome::Different
    } else {
        let rendered = diff::colorize(&result.output, resolved.layout, config.diff.marker_column);
        out.write_all(rendered.as_bytes())?;
        Outcome::Different
    };
    out.flush()?;

    info!(?outcome, cleaned = reaper.len(), "Comparison finished");
    reaper.release()?;
    Ok(outcome)
}

/// Announce revisions written next to the document by `--create`
fn report_persisted(files: &[&MaterializedFile]) {
    for file in files.iter().filter(|f| f.ownership == Ownership::Persisted) {
        output::action("Saved", &file.path.display().to_string());
    }
}
