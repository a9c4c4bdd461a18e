//! Running the external line-diff tool over two converted renderings.
//!
//! The diff algorithm is entirely the tool's. This module only:
//! - Checks whether the tool can color its own output
//! - Builds the invocation for the requested layout
//! - Hands uncolored output to [`colorize`] when the tool cannot color it

/// Line classification and coloring for tools without `--color`
pub mod colorize;

pub use colorize::colorize;

use crate::errors::CompareError;
use crate::resolve::Layout;
use crate::utils::process::{self, ToolCommand};
use anyhow::Result;
use std::path::Path;
use std::time::Duration;
use tracing::{Level, debug, span};

/// Flag requesting inline color markup from the diff tool.
pub const COLOR_FLAG: &str = "--color=always";

/// Stderr fragments diff implementations print for a flag they do not know.
const UNKNOWN_OPTION_MARKERS: &[&str] = &[
    "unrecognized option",
    "unknown option",
    "illegal option",
];

/// Raw diff output plus whether the tool colored it itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffResult {
    /// Text exactly as the tool printed it.
    pub output: String,
    /// Whether the tool exited with status 1.
    pub differs: bool,
    /// Whether the installed tool supports `--color`.
    pub native_color: bool,
}

impl DiffResult {
    /// Whether the tool found no differences.
    ///
    /// Side-by-side output lists every line even for identical inputs, so the
    /// exit status decides; empty output also counts as identical.
    #[must_use]
    pub fn is_identical(&self) -> bool {
        !self.differs || self.output.is_empty()
    }
}

/// Wraps the configured diff command.
pub struct DiffRunner {
    /// Configured diff command.
    cmd: ToolCommand,
    /// Per-invocation timeout.
    timeout: Option<Duration>,
}

impl DiffRunner {
    /// Create a diff runner.
    #[must_use]
    pub const fn new(cmd: ToolCommand, timeout: Option<Duration>) -> Self {
        Self { cmd, timeout }
    }

    /// Run the tool once with [`COLOR_FLAG`] and report whether it accepted it.
    ///
    /// `sample` is compared with itself, so the check prints nothing on success.
    ///
    /// # Errors
    ///
    /// Returns a tool error only if the diff program cannot be run at all.
    pub fn supports_color(&self, sample: &Path) -> Result<bool> {
        let mut cmd = self.cmd.command();
        cmd.arg(COLOR_FLAG).arg(sample).arg(sample);
        let output = process::run(cmd, self.timeout)?;
        let supported = !mentions_unknown_option(&output.stderr_lossy());
        debug!(supported, "Checked diff color support");
        Ok(supported)
    }

    /// Diff `left` against `right`.
    ///
    /// Tabs are always expanded. Native coloring is requested only when
    /// `color` is set and [`DiffRunner::supports_color`] found support for it.
    ///
    /// # Errors
    ///
    /// Returns a tool error if the diff tool cannot run or exits with a status
    /// other than 0 (identical) or 1 (different).
    pub fn run(&self, left: &Path, right: &Path, layout: Layout, color: bool) -> Result<DiffResult> {
        let span = span!(Level::DEBUG, "diff", ?layout, color);
        let _guard = span.enter();

        let native_color = self.supports_color(left)?;

        let mut cmd = self.cmd.command();
        cmd.args(diff_args(layout, color && native_color));
        cmd.arg(left).arg(right);

        let output = process::run(cmd, self.timeout)?;
        match output.code() {
            Some(code @ (0 | 1)) => Ok(DiffResult {
                output: output.stdout_lossy(),
                differs: code == 1,
                native_color,
            }),
            _ => Err(CompareError::tool(
                self.cmd.name(),
                format!(
                    "failed with {}: {}",
                    output.describe_status(),
                    output.stderr_lossy().trim()
                ),
            )
            .into()),
        }
    }
}

/// Flags for one diff invocation, before the two file operands.
#[must_use]
pub fn diff_args(layout: Layout, native_color: bool) -> Vec<&'static str> {
    let mut args = vec!["--expand-tabs"];
    if layout == Layout::SideBySide {
        args.push("--side-by-side");
    }
    if native_color {
        args.push(COLOR_FLAG);
    }
    args
}

/// Whether `stderr` says an option was not recognized.
#[must_use]
pub fn mentions_unknown_option(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    UNKNOWN_OPTION_MARKERS.iter().any(|m| lower.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Layout::SideBySide, true, vec!["--expand-tabs", "--side-by-side", "--color=always"])]
    #[case(Layout::SideBySide, false, vec!["--expand-tabs", "--side-by-side"])]
    #[case(Layout::Vertical, true, vec!["--expand-tabs", "--color=always"])]
    #[case(Layout::Vertical, false, vec!["--expand-tabs"])]
    fn test_diff_args(#[case] layout: Layout, #[case] color: bool, #[case] expected: Vec<&str>) {
        assert_eq!(diff_args(layout, color), expected);
    }

    #[rstest]
    #[case("diff: unrecognized option '--color=always'", true)]
    #[case("diff: Unrecognized option: color", true)]
    #[case("diff: unknown option -- -", true)]
    #[case("diff: illegal option -- -", true)]
    #[case("", false)]
    #[case("diff: missing operand", false)]
    fn test_unknown_option_detection(#[case] stderr: &str, #[case] expected: bool) {
        assert_eq!(mentions_unknown_option(stderr), expected);
    }

    #[rstest]
    #[case("", false, true)]
    #[case("same    same\n", false, true)]
    #[case("", true, true)]
    #[case("1c1\n< a\n---\n> b\n", true, false)]
    fn test_identical(#[case] output: &str, #[case] differs: bool, #[case] expected: bool) {
        let result = DiffResult {
            output: output.to_string(),
            differs,
            native_color: true,
        };
        assert_eq!(result.is_identical(), expected);
    }

    #[cfg(unix)]
    mod with_scripts {
        use super::*;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        fn script(dir: &Path, body: &str) -> ToolCommand {
            let path = dir.join("fake-diff");
            fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            ToolCommand::new(path.to_string_lossy(), Vec::<String>::new())
        }

        #[test]
        fn test_tool_without_color_is_detected() {
            let dir = TempDir::new().unwrap();
            let runner = DiffRunner::new(
                script(
                    dir.path(),
                    r#"case "$*" in *--color*) echo "diff: unrecognized option '--color=always'" >&2; exit 2 ;; esac
echo "1c1"; exit 1"#,
                ),
                None,
            );
            let file = dir.path().join("a.txt");
            fs::write(&file, "x").unwrap();

            let result = runner.run(&file, &file, Layout::Vertical, true).unwrap();
            assert!(!result.native_color);
            assert_eq!(result.output, "1c1\n");
        }

        #[test]
        fn test_exit_status_two_is_tool_error() {
            let dir = TempDir::new().unwrap();
            let runner = DiffRunner::new(
                script(dir.path(), r#"case "$*" in *--color*) exit 0 ;; esac
echo "diff: b.txt: No such file or directory" >&2; exit 2"#),
                None,
            );
            let file = dir.path().join("a.txt");
            fs::write(&file, "x").unwrap();

            let err = runner
                .run(&file, &dir.path().join("b.txt"), Layout::SideBySide, false)
                .unwrap_err();
            assert!(matches!(
                err.downcast_ref::<CompareError>(),
                Some(CompareError::Tool { .. })
            ));
            assert!(err.to_string().contains("No such file"));
        }

        #[test]
        fn test_color_flag_only_sent_when_supported_and_wanted() {
            let dir = TempDir::new().unwrap();
            // Echo the flags back so the test can see them
            let runner = DiffRunner::new(script(dir.path(), r#"echo "$@"; exit 1"#), None);
            let file = dir.path().join("a.txt");
            fs::write(&file, "x").unwrap();

            let colored = runner.run(&file, &file, Layout::SideBySide, true).unwrap();
            assert!(colored.native_color);
            assert!(colored.output.contains("--color=always"));

            let plain = runner.run(&file, &file, Layout::SideBySide, false).unwrap();
            assert!(!plain.output.contains("--color"));
            assert!(plain.output.contains("--side-by-side"));
        }
    }
}
