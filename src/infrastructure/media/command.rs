use std::{
    ffi::OsStr,
    io,
    process::{ExitStatus, Output, Stdio},
    time::Duration,
};

use thiserror::Error;
use tokio::process::Command;

/// How much of a failing tool's stderr is kept for the logs.
const STDERR_TAIL: usize = 2048;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Required command {0} not found, make sure it exists in $PATH")]
    NotFound(String),

    #[error("Cannot run command {0} due to invalid permissions on binary")]
    PermissionDenied(String),

    #[error("{0} timed out after {1:?}")]
    Timeout(String, Duration),

    #[error("{command} failed with {status}: {stderr}")]
    Status {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Unknown process error")]
    Other(#[source] io::Error),
}

/// Runs `program` to completion, killing it if it outlives `timeout`.
///
/// The child is spawned with `kill_on_drop`, so cancelling the returned future
/// (timeout or a dropped request) also terminates the process.
#[tracing::instrument(skip(args), level = "debug")]
pub async fn run<T>(program: &str, args: &[T], timeout: Duration) -> Result<Output, CommandError>
where
    T: AsRef<OsStr> + std::fmt::Debug,
{
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => CommandError::NotFound(program.to_string()),
            io::ErrorKind::PermissionDenied => CommandError::PermissionDenied(program.to_string()),
            _ => CommandError::Other(e),
        })?;

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) if output.status.success() => Ok(output),
        Ok(Ok(output)) => Err(CommandError::Status {
            command: program.to_string(),
            status: output.status,
            stderr: stderr_tail(&output.stderr),
        }),
        Ok(Err(e)) => Err(CommandError::Other(e)),
        Err(_) => Err(CommandError::Timeout(program.to_string(), timeout)),
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let mut start = text.len().saturating_sub(STDERR_TAIL);
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}
