//! Launching commands under a shell.
//!
//! This module resolves which shell runs the commands (`Shell`), spawns one
//! child per command (`launch`), and exposes the child's piped streams and its
//! eventual `TerminationOutcome` through a `ProcessHandle`.

use std::process::{ExitStatus, Stdio};

use anyhow::{Context, Result};
use tokio::process::{ChildStderr, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Environment variable naming the shell to run commands with.
pub const SHELL_ENV: &str = "SHELL";

/// Shell used when no override is configured.
pub const DEFAULT_SHELL: &str = "sh";

/// The shell program commands are handed to as `<shell> -c <command>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shell {
    program: String,
}

impl Shell {
    /// Picks the first non-empty of `configured`, `$SHELL`, then `sh`.
    pub fn resolve(configured: Option<&str>) -> Self {
        let from_env = std::env::var(SHELL_ENV).ok();
        Self::choose(configured, from_env.as_deref())
    }

    fn choose(configured: Option<&str>, from_env: Option<&str>) -> Self {
        let program = configured
            .into_iter()
            .chain(from_env)
            .map(str::trim)
            .find(|value| !value.is_empty())
            .unwrap_or(DEFAULT_SHELL);
        Self {
            program: program.to_string(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self, line: &str) -> Command {
        let mut command = Command::new(&self.program);
        command.arg("-c").arg(line);
        command
    }
}

/// How a launched command ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationOutcome {
    /// The process exited. `code` is `None` when it was killed by a signal.
    Exited { code: Option<i32> },
    /// The shell could not be started.
    LaunchFailed { reason: String },
}

impl TerminationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TerminationOutcome::Exited { code: Some(0) })
    }
}

enum Status {
    Running(JoinHandle<std::io::Result<ExitStatus>>),
    LaunchFailed(String),
}

/// One spawned command: its output streams plus a joinable exit status.
pub struct ProcessHandle {
    index: usize,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    status: Status,
}

impl ProcessHandle {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Takes the piped stdout; `None` if already taken or the launch failed.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.stdout.take()
    }

    /// Takes the piped stderr; `None` if already taken or the launch failed.
    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.stderr.take()
    }

    /// Waits for the process to terminate.
    ///
    /// An `Err` means the exit status itself could not be observed.
    pub async fn wait(self) -> Result<TerminationOutcome> {
        let index = self.index;
        let handle = match self.status {
            Status::LaunchFailed(reason) => {
                return Ok(TerminationOutcome::LaunchFailed { reason });
            }
            Status::Running(handle) => handle,
        };
        let status = handle
            .await
            .with_context(|| format!("exit watcher for command {} panicked", index))?
            .with_context(|| format!("failed to wait for command {}", index))?;
        let code = status.code();
        info!(index, ?code, success = status.success(), "command exited");
        Ok(TerminationOutcome::Exited { code })
    }
}

/// Spawns `line` under `shell` with stdout and stderr piped and stdin closed.
///
/// Never fails: a shell that cannot be started yields a handle whose outcome
/// is `LaunchFailed` and whose streams are absent. Must be called from within
/// a tokio runtime.
pub fn launch(index: usize, line: &str, shell: &Shell) -> ProcessHandle {
    let mut command = shell.command(line);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) => {
            warn!(index, shell = shell.program(), error = %err, "failed to launch command");
            return ProcessHandle {
                index,
                stdout: None,
                stderr: None,
                status: Status::LaunchFailed(format!("failed to spawn {}: {}", shell.program(), err)),
            };
        }
    };
    debug!(index, pid = ?child.id(), command = line, "command launched");

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let watcher = tokio::spawn(async move { child.wait().await });

    ProcessHandle {
        index,
        stdout,
        stderr,
        status: Status::Running(watcher),
    }
}
