#![allow(dead_code)]

use anyhow::Result;
use assert_cmd::Command;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Stand-in for the office suite: copies the input to `<outdir>/<stem>.<format>`
pub const COPYING_CONVERTER: &str = r#"#!/bin/sh
while [ $# -gt 0 ]; do
  case "$1" in
    --convert-to) fmt="$2"; shift 2 ;;
    --outdir) out="$2"; shift 2 ;;
    *) src="$1"; shift ;;
  esac
done
base=$(basename "$src")
cp "$src" "$out/${base%.*}.$fmt"
"#;

/// Converter that fails for any input whose path contains `broken`
pub const PICKY_CONVERTER: &str = r#"#!/bin/sh
for last; do :; done
case "$last" in
  *broken*)
    echo "convert $last -> txt"
    echo "Error: source file could not be loaded" >&2
    exit 1 ;;
esac
while [ $# -gt 0 ]; do
  case "$1" in
    --convert-to) fmt="$2"; shift 2 ;;
    --outdir) out="$2"; shift 2 ;;
    *) src="$1"; shift ;;
  esac
done
base=$(basename "$src")
cp "$src" "$out/${base%.*}.$fmt"
"#;

/// Isolated environment for running the docdiff binary
pub struct TestEnv {
    pub temp_dir: TempDir,
    /// Passed to docdiff as `TMPDIR`; must be empty after every run
    pub tmp: PathBuf,
    converter: PathBuf,
    diff: PathBuf,
}

impl TestEnv {
    /// Create an environment using the copying converter and the system `diff`.
    /// Returns `None` when no `diff` is installed.
    pub fn new() -> Result<Option<Self>> {
        let Ok(diff) = which::which("diff") else {
            eprintln!("diff not found, skipping");
            return Ok(None);
        };

        let temp_dir = TempDir::new()?;
        let tmp = temp_dir.path().join("tmp");
        fs::create_dir_all(&tmp)?;

        let mut env = Self {
            converter: PathBuf::new(),
            diff,
            tmp,
            temp_dir,
        };
        env.converter = env.write_tool("convert", COPYING_CONVERTER)?;
        Ok(Some(env))
    }

    /// Get the temporary directory path
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a document (any text works with the fake converter)
    pub fn doc(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Install an executable script and return its path
    pub fn write_tool(&self, name: &str, body: &str) -> Result<PathBuf> {
        let path = self.path().join("bin").join(name);
        fs::create_dir_all(path.parent().unwrap_or(self.path()))?;
        fs::write(&path, body)?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        Ok(path)
    }

    /// Replace the converter for subsequent runs
    pub fn use_converter(&mut self, name: &str, body: &str) -> Result<()> {
        self.converter = self.write_tool(name, body)?;
        Ok(())
    }

    /// A docdiff command with tools, config and temp dir pinned to this environment
    pub fn cmd(&self) -> Result<Command> {
        let mut cmd = Command::cargo_bin("docdiff")?;
        cmd.current_dir(self.path())
            .env("HOME", self.path())
            .env("TMPDIR", &self.tmp)
            .env("DOCDIFF_CONFIG_PATH", self.path().join("config.toml"))
            .env("DOCDIFF_CONVERTER", &self.converter)
            .env("DOCDIFF_DIFF", &self.diff)
            .env_remove("DOCDIFF_GIT")
            .env_remove("DOCDIFF_TIMEOUT")
            .env_remove("DOCDIFF_LOG")
            .env_remove("NO_COLOR");
        Ok(cmd)
    }

    /// Entries left in the temp dir
    pub fn leftovers(&self) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.tmp)? {
            entries.push(entry?.path());
        }
        Ok(entries)
    }
}

/// Run git in `dir` with a fixed identity and no user or system config
pub fn git(dir: &Path, args: &[&str]) -> Result<()> {
    let status = std::process::Command::new("git")
        .args(["-c", "commit.gpgsign=false", "-c", "init.defaultBranch=main"])
        .args(args)
        .current_dir(dir)
        .env("HOME", dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_AUTHOR_NAME", "Test User")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "Test User")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .status()?;
    anyhow::ensure!(status.success(), "git {args:?} failed with {status}");
    Ok(())
}
