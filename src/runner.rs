//! Running a set of commands side by side.
//!
//! `run` validates the request, launches every command up front, merges all
//! stdouts into one sink and all stderrs into another, and once both sinks are
//! drained reduces the per-command outcomes into a single `Verdict`.

use tokio::io::AsyncWrite;
use tracing::{debug, info, warn};

use crate::errors::RunError;
use crate::framing::{FramingPolicy, LineFramer};
use crate::multiplex::{drain, merge, MERGE_CAPACITY};
use crate::output::{resolve_prefixes, Decorator};
use crate::pipeline::Pipeline;
use crate::process::{launch, ProcessHandle, Shell};

/// What to run and how to present it.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    /// Shell command lines, in launch order.
    pub commands: Vec<String>,
    /// Optional labels, one per command.
    pub names: Option<Vec<String>>,
    /// Prefix every unit with the command's label or index.
    pub prefix: bool,
    pub framing: FramingPolicy,
    /// Remove ANSI escapes from command output.
    pub strip_ansi: bool,
    /// Shell override; falls back to `$SHELL`, then `sh`.
    pub shell: Option<String>,
}

/// Aggregate result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Every command exited with status 0.
    Success,
    /// Validation failed (`error` is set) or some command did not succeed.
    Failure { error: Option<RunError> },
}

impl Verdict {
    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::Success)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Validating,
    Launching,
    Streaming,
    Collecting,
    Done,
}

/// Runs every command of `request` concurrently.
///
/// Output is written to `stdout` and `stderr` as it arrives; the call returns
/// once every command has closed its streams and exited. Both sinks are shut
/// down at the end.
pub async fn run<O, E>(request: &RunRequest, stdout: &mut O, stderr: &mut E) -> Verdict
where
    O: AsyncWrite + Unpin + ?Sized,
    E: AsyncWrite + Unpin + ?Sized,
{
    debug!(phase = ?Phase::Validating);
    if let Err(error) = validate(request) {
        debug!(phase = ?Phase::Done, %error, "rejected run");
        return Verdict::Failure { error: Some(error) };
    }

    let prefixes = resolve_prefixes(
        request.commands.len(),
        request.names.as_deref(),
        request.prefix,
    );
    let shell = Shell::resolve(request.shell.as_deref());

    debug!(phase = ?Phase::Launching, shell = shell.program(), count = request.commands.len());
    let mut handles: Vec<ProcessHandle> = request
        .commands
        .iter()
        .enumerate()
        .map(|(index, line)| {
            info!(index, command = %line, "launching command");
            launch(index, line, &shell)
        })
        .collect();

    debug!(phase = ?Phase::Streaming);
    let mut out_sources = Vec::with_capacity(handles.len());
    let mut err_sources = Vec::with_capacity(handles.len());
    for (handle, prefix) in handles.iter_mut().zip(prefixes) {
        let framer = LineFramer::new(request.framing).with_strip_ansi(request.strip_ansi);
        let decorator = Decorator::new(prefix);
        out_sources.push(Pipeline::new(
            handle.take_stdout(),
            framer.clone(),
            decorator.clone(),
        ));
        err_sources.push(Pipeline::new(handle.take_stderr(), framer, decorator));
    }

    let (out_result, err_result) = tokio::join!(
        drain(merge(out_sources, MERGE_CAPACITY), stdout),
        drain(merge(err_sources, MERGE_CAPACITY), stderr),
    );
    let mut failed = false;
    for (stream, result) in [("stdout", out_result), ("stderr", err_result)] {
        if let Err(err) = result {
            warn!(stream, error = %err, "output stream failed");
            failed = true;
        }
    }

    debug!(phase = ?Phase::Collecting);
    for handle in handles {
        let index = handle.index();
        match handle.wait().await {
            Ok(outcome) if outcome.is_success() => {}
            Ok(outcome) => {
                debug!(index, ?outcome, "command did not succeed");
                failed = true;
            }
            Err(err) => {
                warn!(index, error = %err, "could not observe command exit");
                failed = true;
            }
        }
    }

    debug!(phase = ?Phase::Done, failed);
    if failed {
        Verdict::Failure { error: None }
    } else {
        Verdict::Success
    }
}

fn validate(request: &RunRequest) -> Result<(), RunError> {
    if request.commands.is_empty() {
        return Err(RunError::NoCommands);
    }
    if let Some(names) = &request.names {
        if names.len() != request.commands.len() {
            return Err(RunError::NameCountMismatch {
                names: names.len(),
                commands: request.commands.len(),
            });
        }
    }
    Ok(())
}
