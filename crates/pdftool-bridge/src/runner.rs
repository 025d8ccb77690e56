//! Process runner
//!
//! Spawns the tool directly (no shell) with stdout and stderr attached to
//! the same pipe, so diagnostics interleave with regular output in the
//! order the tool wrote them. The timeout bounds the tool's own lifetime; on
//! expiry the child is killed and `BridgeError::Timeout` is returned. Output
//! is drained for a short grace period after exit, so a background process
//! still holding the pipe cannot turn a finished run into a timeout.

use std::io::Read;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::error::BridgeError;
use crate::invocation::Invocation;

/// How long to keep draining output once the tool has exited
const OUTPUT_GRACE: Duration = Duration::from_millis(250);

/// Outcome of a tool run that exited successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_code: i32,
    /// Combined stdout/stderr, split into lines
    pub output: Vec<String>,
}

/// Run `invocation`, failing with `NonZeroExit` unless the tool exits with 0.
pub async fn run(invocation: &Invocation, limit: Duration) -> Result<ExecutionResult, BridgeError> {
    let launch_error = |source: std::io::Error| BridgeError::ProcessLaunch {
        program: invocation.program.clone(),
        source,
    };

    let (reader, writer) = std::io::pipe().map_err(launch_error)?;
    let writer_for_stderr = writer.try_clone().map_err(launch_error)?;

    let mut command = Command::new(&invocation.program);
    command
        .args(invocation.args())
        .stdin(Stdio::null())
        .stdout(writer)
        .stderr(writer_for_stderr)
        .kill_on_drop(true);

    debug!("Spawning {}", invocation);
    let spawned = command.spawn();
    // The command still owns the parent's copies of the write end; the reader
    // only sees EOF once they are gone.
    drop(command);

    let mut child = match spawned {
        Ok(child) => child,
        Err(source) => {
            error!("Failed to launch {}: {}", invocation.program.display(), source);
            return Err(launch_error(source));
        }
    };

    // A plain thread rather than the blocking pool: a background process the
    // tool leaves behind can hold the pipe open long after the tool exits.
    let (tx, mut rx) = mpsc::unbounded_channel();
    std::thread::Builder::new()
        .name("pdftool-output".into())
        .spawn(move || forward_output(reader, tx))
        .map_err(launch_error)?;

    let status = match tokio::time::timeout(limit, child.wait()).await {
        Ok(status) => status.map_err(launch_error)?,
        Err(_elapsed) => {
            warn!("Tool exceeded {:?}, killing it", limit);
            if let Err(e) = child.start_kill() {
                warn!("Failed to kill tool: {}", e);
            }
            let _ = child.wait().await;
            return Err(BridgeError::Timeout(limit));
        }
    };

    let mut raw = Vec::new();
    let deadline = tokio::time::Instant::now() + OUTPUT_GRACE;
    loop {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Some(chunk)) => raw.extend_from_slice(&chunk),
            Ok(None) => break,
            Err(_elapsed) => {
                warn!("Output pipe still open after the tool exited; keeping what was read");
                break;
            }
        }
    }
    let output = split_lines(&raw);

    let exit_code = exit_code(status);
    debug!("Tool exited with {} ({} output lines)", exit_code, output.len());

    if exit_code != 0 {
        return Err(BridgeError::NonZeroExit { code: exit_code, output });
    }

    Ok(ExecutionResult { exit_code, output })
}

fn forward_output(mut reader: std::io::PipeReader, tx: mpsc::UnboundedSender<Vec<u8>>) {
    let mut buf = [0u8; 8192];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("Failed to read tool output: {}", e);
                break;
            }
        }
    }
}

fn split_lines(raw: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(raw)
        .lines()
        .map(str::to_string)
        .collect()
}

// Signal deaths are reported shell-style as 128 + signal number.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}
