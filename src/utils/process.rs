use crate::errors::CompareError;
use anyhow::{Context, Result, anyhow};
use command_group::{CommandGroup, GroupChild};
use std::io::{self, Read};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{Level, debug, span, warn};

/// How often a child with a deadline is polled for exit
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// An external program plus the leading arguments configured for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// Executable name or path
    pub program: String,
    /// Arguments placed before any per-call arguments
    pub args: Vec<String>,
}

impl ToolCommand {
    /// Create a tool command from a program and fixed arguments
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a command string with shell-like quoting (no shell is involved when running it)
    ///
    /// # Errors
    ///
    /// Returns an error if the quoting is unbalanced or the command is empty
    pub fn parse(cmd: &str) -> Result<Self> {
        let mut words = shell_words::split(cmd)
            .with_context(|| format!("Failed to parse command: {cmd}"))?
            .into_iter();
        let program = words
            .next()
            .ok_or_else(|| anyhow!("Command cannot be empty"))?;
        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    /// Short name for messages (`/usr/bin/soffice` becomes `soffice`)
    #[must_use]
    pub fn name(&self) -> &str {
        Path::new(&self.program)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.program)
    }

    /// A [`Command`] for this tool with its fixed arguments already applied
    #[must_use]
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

/// Everything a finished child produced
#[derive(Debug)]
pub struct ProcessOutput {
    /// Exit status of the child
    pub status: ExitStatus,
    /// Raw stdout bytes
    pub stdout: Vec<u8>,
    /// Raw stderr bytes
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    /// Exit code, `None` if the child was killed by a signal
    #[must_use]
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    /// Human-readable exit status ("exit status 2", "killed by a signal")
    #[must_use]
    pub fn describe_status(&self) -> String {
        self.code()
            .map_or_else(|| "killed by a signal".to_string(), |c| format!("exit status {c}"))
    }

    /// Stdout decoded lossily as UTF-8
    #[must_use]
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Stderr decoded lossily as UTF-8
    #[must_use]
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Run `cmd` to completion, capturing stdout and stderr.
///
/// The child gets a null stdin and runs in its own process group so that a
/// timeout can kill helpers it forked (office suites do). Without a timeout
/// this blocks until the child exits.
///
/// # Errors
///
/// Returns [`CompareError::Tool`] if the program cannot be started or exceeds
/// `timeout`, and an I/O error if its output cannot be collected.
pub fn run(mut cmd: Command, timeout: Option<Duration>) -> Result<ProcessOutput> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    let span = span!(Level::DEBUG, "run_tool", program = %program);
    let _guard = span.enter();

    debug!(args = ?cmd.get_args().collect::<Vec<_>>(), ?timeout, "Spawning external tool");

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .group_spawn()
        .map_err(|e| CompareError::tool(&program, format!("failed to start: {e}")))?;

    let stdout = child
        .inner()
        .stdout
        .take()
        .context("Failed to open child stdout")?;
    let stderr = child
        .inner()
        .stderr
        .take()
        .context("Failed to open child stderr")?;

    // Drain both pipes concurrently so a chatty child never blocks on a full pipe
    let stdout_reader = spawn_reader(stdout);
    let stderr_reader = spawn_reader(stderr);

    let status = match timeout {
        None => child.wait().context("Failed to wait for child")?,
        Some(limit) => match wait_with_deadline(&mut child, limit)? {
            Some(status) => status,
            None => {
                warn!(?limit, "Tool timed out, killing its process group");
                if let Err(e) = child.kill() {
                    warn!(error = %e, "Failed to kill process group");
                }
                let _ = child.wait();
                let _ = join_reader(stdout_reader);
                let _ = join_reader(stderr_reader);
                return Err(CompareError::tool(
                    &program,
                    format!(
                        "timed out after {}",
                        humantime::format_duration(limit)
                    ),
                )
                .into());
            }
        },
    };

    let output = ProcessOutput {
        status,
        stdout: join_reader(stdout_reader)?,
        stderr: join_reader(stderr_reader)?,
    };

    debug!(
        code = ?output.code(),
        stdout_bytes = output.stdout.len(),
        stderr_bytes = output.stderr.len(),
        "External tool finished"
    );

    Ok(output)
}

/// Poll `child` until it exits or `limit` elapses (`Ok(None)` on timeout)
fn wait_with_deadline(child: &mut GroupChild, limit: Duration) -> Result<Option<ExitStatus>> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait().context("Failed to poll child")? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Read `pipe` to the end on a new thread
fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

/// Wait for a reader thread and return what it collected
fn join_reader(handle: JoinHandle<io::Result<Vec<u8>>>) -> Result<Vec<u8>> {
    handle
        .join()
        .map_err(|_| anyhow!("Output reader thread panicked"))?
        .context("Failed to read child output")
}
