//! RAII registry of temporary resources created during a comparison.
//!
//! Every temporary file or directory is pushed onto a [`Reaper`] at the moment it
//! is created. The reaper releases everything in reverse registration order when
//! [`Reaper::release`] is called or when it is dropped, whichever comes first, so
//! early returns (conversion failure, invalid revision) and panics clean up the
//! same way a successful run does.
//!
//! ## Release rules
//!
//! - Plain paths are checked for existence before removal, so a resource that is
//!   already gone (or was registered twice) is not an error.
//! - Release drains the registry; a second release is a no-op.
//! - Release continues past individual failures and reports them together.

use crate::output;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, warn};

/// A single resource owned by the reaper.
#[derive(Debug)]
enum Tracked {
    /// A file created by an external tool that must be deleted.
    File(PathBuf),
    /// An open temporary file (extracted revision), closed and deleted on release.
    TempFile(NamedTempFile),
    /// A temporary directory, removed recursively on release.
    TempDir(TempDir),
}

impl Tracked {
    /// Location on disk
    fn path(&self) -> &Path {
        match self {
            Self::File(path) => path,
            Self::TempFile(file) => file.path(),
            Self::TempDir(dir) => dir.path(),
        }
    }

    /// Remove from disk, ignoring entries that are already gone
    fn release(self) -> Result<()> {
        match self {
            Self::File(path) => {
                if path.exists() {
                    fs::remove_file(&path)
                        .with_context(|| format!("Failed to remove {}", path.display()))?;
                }
            }
            Self::TempFile(file) => {
                let path = file.path().to_path_buf();
                if path.exists() {
                    file.close()
                        .with_context(|| format!("Failed to remove {}", path.display()))?;
                }
            }
            Self::TempDir(dir) => {
                let path = dir.path().to_path_buf();
                if path.exists() {
                    dir.close()
                        .with_context(|| format!("Failed to remove {}", path.display()))?;
                }
            }
        }
        Ok(())
    }
}

/// Owns every temporary resource of a run and removes them exactly once.
///
/// ```
/// use docdiff::cleanup::Reaper;
///
/// # fn main() -> anyhow::Result<()> {
/// let mut reaper = Reaper::new();
/// let dir = reaper.temp_dir("left")?;
/// assert!(dir.exists());
/// reaper.release()?;
/// assert!(!dir.exists());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct Reaper {
    /// Resources in registration order.
    tracked: Vec<Tracked>,
}

impl Reaper {
    /// Create an empty reaper
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh temporary directory and register it
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created
    pub fn temp_dir(&mut self, label: &str) -> Result<PathBuf> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("docdiff-{label}-"))
            .tempdir()
            .context("Failed to create temporary directory")?;
        let path = dir.path().to_path_buf();
        debug!(path = %path.display(), "Registered temporary directory");
        self.tracked.push(Tracked::TempDir(dir));
        Ok(path)
    }

    /// Create a temporary file holding `contents` and register it.
    ///
    /// `suffix` is kept at the end of the name so tools that sniff the
    /// extension still recognize the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written
    pub fn temp_file(&mut self, prefix: &str, suffix: &str, contents: &[u8]) -> Result<PathBuf> {
        let file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile()
            .context("Failed to create temporary file")?;
        let path = file.path().to_path_buf();
        // Register before writing so a failed write is still cleaned up
        self.tracked.push(Tracked::TempFile(file));
        if let Some(Tracked::TempFile(file)) = self.tracked.last_mut() {
            file.write_all(contents)
                .and_then(|()| file.flush())
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        debug!(path = %path.display(), bytes = contents.len(), "Registered temporary file");
        Ok(path)
    }

    /// Register a file some other process created (e.g. converter output)
    pub fn track_file(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        debug!(path = %path.display(), "Registered output file");
        self.tracked.push(Tracked::File(path));
    }

    /// Paths currently registered, in registration order
    #[must_use]
    pub fn tracked_paths(&self) -> Vec<PathBuf> {
        self.tracked.iter().map(|t| t.path().to_path_buf()).collect()
    }

    /// Number of registered resources
    #[must_use]
    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    /// Whether nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    /// Remove every registered resource, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error listing every resource that could not be removed.
    /// All removals are attempted regardless.
    pub fn release(&mut self) -> Result<()> {
        let mut errors = Vec::new();

        while let Some(resource) = self.tracked.pop() {
            let path = resource.path().to_path_buf();
            match resource.release() {
                Ok(()) => debug!(path = %path.display(), "Released"),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Release failed");
                    errors.push(format!("{e:#}"));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(anyhow::anyhow!("Cleanup errors: {}", errors.join("; ")))
        }
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        if !self.tracked.is_empty()
            && let Err(e) = self.release()
        {
            output::error(&format!("{e}"));
        }
    }
}
