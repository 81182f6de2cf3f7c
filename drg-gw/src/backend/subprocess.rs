//! Subprocess backend channel
//!
//! Spawns the configured research command with the question appended as
//! the final argument, and relays its stdout and stderr line-by-line.
//! The child is spawned kill-on-drop, so tearing down the channel (client
//! disconnect included) kills the process rather than orphaning it.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

use drg_common::{Error, Result};

use super::{BackendChannel, BackendEvent, LineOrigin, CHANNEL_CAPACITY};

pub(super) fn spawn(command: &[String], question: &str) -> Result<BackendChannel> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| Error::Config("subprocess command is empty".to_string()))?;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .arg(question)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|e| {
        Error::BackendUnreachable(format!("failed to spawn research process {}: {}", program, e))
    })?;
    let pid = child.id();

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| Error::Internal("child stdout was not piped".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| Error::Internal("child stderr was not piped".to_string()))?;

    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

    let out_task = tokio::spawn(read_lines(stdout, LineOrigin::Stdout, tx.clone()));
    let err_task = tokio::spawn(read_lines(stderr, LineOrigin::Stderr, tx.clone()));
    let out_abort = out_task.abort_handle();
    let err_abort = err_task.abort_handle();

    // The supervisor owns the child: it waits for both readers to drain
    // before reporting the exit status, so every output line precedes the
    // close event. Aborting the supervisor drops (and kills) the child.
    let supervisor = tokio::spawn(async move {
        let _ = out_task.await;
        let _ = err_task.await;
        let detail = match child.wait().await {
            Ok(status) if status.success() => None,
            Ok(status) => Some(format!("research process exited with {}", status)),
            Err(e) => Some(format!("failed to collect research process status: {}", e)),
        };
        let _ = tx.send(BackendEvent::Closed { detail }).await;
    });
    let super_abort = supervisor.abort_handle();

    tracing::debug!(program = %program, pid = ?pid, "spawned research process");

    Ok(BackendChannel::from_parts(
        rx,
        vec![out_abort, err_abort, super_abort],
        pid,
    ))
}

/// Relay complete lines from one child stream into the event queue
async fn read_lines<R>(reader: R, origin: LineOrigin, tx: mpsc::Sender<BackendEvent>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.is_empty() {
                    continue;
                }
                if tx
                    .send(BackendEvent::Line { origin, text: line })
                    .await
                    .is_err()
                {
                    // Receiver gone: the client disconnected
                    return;
                }
            }
            Ok(None) => return,
            Err(e) => {
                tracing::debug!(?origin, "backend stream read error: {}", e);
                return;
            }
        }
    }
}
