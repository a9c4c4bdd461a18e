//! Materializing git revisions of a tracked document as standalone files.
//!
//! Git is always run from the document's own directory and handed
//! `./<file name>`, so `git show <rev>:./<name>` resolves regardless of where
//! docdiff was started or whether the user passed a bare file name.

use crate::cleanup::Reaper;
use crate::errors::CompareError;
use crate::utils::process::{self, ToolCommand};
use anyhow::{Context, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Sentinel revision meaning "the file as it is on disk".
pub const CURRENT: &str = "CURRENT";

/// Exit status git uses for an unknown revision or object.
pub const GIT_UNKNOWN_REVISION_STATUS: i32 = 128;

/// A point in history, or the working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revision {
    /// The on-disk file; never extracted.
    Current,
    /// Anything git understands: a hash, `HEAD`, `HEAD~1`, a tag...
    Named(String),
}

impl Revision {
    /// Parse a user-supplied token; `CURRENT` matches case-insensitively.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        if token.eq_ignore_ascii_case(CURRENT) {
            Self::Current
        } else {
            Self::Named(token.to_string())
        }
    }

    /// Whether this is the working-copy sentinel.
    #[must_use]
    pub const fn is_current(&self) -> bool {
        matches!(self, Self::Current)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Current => f.write_str(CURRENT),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// The two sides of a git-mode comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionPair {
    /// Older side, shown on the left.
    pub left: Revision,
    /// Newer side, shown on the right.
    pub right: Revision,
}

impl RevisionPair {
    /// Build a pair from two user tokens.
    #[must_use]
    pub fn parse(left: &str, right: &str) -> Self {
        Self {
            left: Revision::parse(left),
            right: Revision::parse(right),
        }
    }
}

/// Who owns a file that takes part in the comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// The user's own file; never modified or removed.
    Borrowed,
    /// Registered with the reaper and deleted when the run ends.
    Temporary,
    /// Written at the user's request and left in place.
    Persisted,
}

/// A concrete file on disk plus who is responsible for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedFile {
    /// Where the content lives.
    pub path: PathBuf,
    /// Whether cleanup owns it.
    pub ownership: Ownership,
}

impl MaterializedFile {
    /// Wrap a user-supplied file.
    #[must_use]
    pub fn borrowed(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ownership: Ownership::Borrowed,
        }
    }
}

/// Thin wrapper over the git executable.
pub struct GitCli {
    /// Configured git command.
    cmd: ToolCommand,
    /// Per-invocation timeout.
    timeout: Option<Duration>,
}

impl GitCli {
    /// Create a git wrapper.
    #[must_use]
    pub const fn new(cmd: ToolCommand, timeout: Option<Duration>) -> Self {
        Self { cmd, timeout }
    }

    /// Whether `file` has uncommitted changes (any `git status --porcelain` output).
    ///
    /// # Errors
    ///
    /// Returns a tool error if git fails, for example outside a repository.
    pub fn is_modified(&self, file: &Path) -> Result<bool> {
        let (dir, tracked) = tracked_path(file);
        let mut cmd = self.cmd.command();
        cmd.args(["status", "--porcelain", "--"])
            .arg(&tracked)
            .current_dir(&dir);

        let output = process::run(cmd, self.timeout)?;
        if !output.status.success() {
            return Err(CompareError::tool(
                self.cmd.name(),
                format!("status failed: {}", output.stderr_lossy().trim()),
            )
            .into());
        }

        let modified = !output.stdout.iter().all(u8::is_ascii_whitespace);
        debug!(file = %file.display(), modified, "Checked working copy status");
        Ok(modified)
    }

    /// Content of `file` at `revision` (`git show <revision>:./<name>`).
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::InvalidRevision`] when git exits with
    /// [`GIT_UNKNOWN_REVISION_STATUS`], and a tool error for any other failure.
    pub fn show(&self, file: &Path, revision: &str) -> Result<Vec<u8>> {
        let (dir, tracked) = tracked_path(file);
        let object = format!("{revision}:{tracked}");
        let mut cmd = self.cmd.command();
        cmd.arg("show").arg(&object).current_dir(&dir);

        let output = process::run(cmd, self.timeout)?;
        match output.code() {
            Some(0) => Ok(output.stdout),
            Some(GIT_UNKNOWN_REVISION_STATUS) => Err(CompareError::InvalidRevision {
                revision: revision.to_string(),
                path: file.to_path_buf(),
                stderr: output.stderr_lossy().trim().to_string(),
            }
            .into()),
            _ => Err(CompareError::tool(
                self.cmd.name(),
                format!(
                    "show {object} failed with {}: {}",
                    output.describe_status(),
                    output.stderr_lossy().trim()
                ),
            )
            .into()),
        }
    }

    /// Revisions to compare when the user gave none.
    ///
    /// A modified file compares `HEAD` with the working copy; an unmodified one
    /// compares `HEAD~1` with `HEAD`.
    ///
    /// # Errors
    ///
    /// Returns an error if the working copy status cannot be queried.
    pub fn default_pair(&self, file: &Path) -> Result<RevisionPair> {
        let pair = if self.is_modified(file)? {
            RevisionPair {
                left: Revision::Named("HEAD".to_string()),
                right: Revision::Current,
            }
        } else {
            RevisionPair {
                left: Revision::Named("HEAD~1".to_string()),
                right: Revision::Named("HEAD".to_string()),
            }
        };
        info!(left = %pair.left, right = %pair.right, "Selected default revisions");
        Ok(pair)
    }

    /// Make `revision` of `file` available as a file on disk.
    ///
    /// `CURRENT` returns `file` itself. Otherwise the content is written to a
    /// temporary file registered with `reaper`, or, when `persist` is set, to
    /// the sibling returned by [`persisted_path`].
    ///
    /// # Errors
    ///
    /// Returns an error if git cannot produce the revision or the file cannot be written.
    pub fn materialize(
        &self,
        file: &Path,
        revision: &Revision,
        persist: bool,
        reaper: &mut Reaper,
    ) -> Result<MaterializedFile> {
        let Revision::Named(name) = revision else {
            return Ok(MaterializedFile::borrowed(file));
        };

        let contents = self.show(file, name)?;

        if persist {
            let path = persisted_path(file, name);
            if path.exists() {
                warn!(path = %path.display(), "Overwriting existing extracted revision");
            }
            fs::write(&path, &contents)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Saved revision");
            return Ok(MaterializedFile {
                path,
                ownership: Ownership::Persisted,
            });
        }

        let stem = file_stem(file);
        let prefix = format!("{stem}-{}-", sanitize_revision(name));
        let suffix = extension_suffix(file);
        let path = reaper.temp_file(&prefix, &suffix, &contents)?;
        Ok(MaterializedFile {
            path,
            ownership: Ownership::Temporary,
        })
    }
}

/// Sibling file that `--create` writes: `<stem>-<revision><ext>` next to `file`.
///
/// Path separators in the revision become `_` so the result stays in the same directory.
#[must_use]
pub fn persisted_path(file: &Path, revision: &str) -> PathBuf {
    let name = format!(
        "{}-{}{}",
        file_stem(file),
        sanitize_revision(revision),
        extension_suffix(file)
    );
    file.with_file_name(name)
}

/// Split `file` into the directory git runs in and an explicit `./<name>` path.
fn tracked_path(file: &Path) -> (PathBuf, String) {
    let dir = match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    (dir, format!("./{name}"))
}

/// File name without its extension, or empty
fn file_stem(file: &Path) -> String {
    file.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `.ext` including the dot, or empty when `file` has no extension.
fn extension_suffix(file: &Path) -> String {
    file.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

/// Replace path separators so the revision fits in a file name
fn sanitize_revision(revision: &str) -> String {
    revision.replace(['/', '\\'], "_")
}
