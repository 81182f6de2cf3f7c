//! Backend channel abstraction
//!
//! Exactly one backend channel exists per research request. Both backend
//! shapes — a spawned local research process and a streaming HTTP
//! connection to an upstream research service — are unified behind one
//! event interface (`Line` / `Closed`), so the relay's framing and
//! sentinel logic exists once.
//!
//! Reader tasks feed a bounded queue; when the client consumes slowly the
//! readers suspend on `send`, which is the relay's backpressure point.
//! Dropping the channel aborts the reader tasks, which kills the
//! kill-on-drop child or closes the upstream connection.

pub mod framing;
mod subprocess;
mod upstream;

use drg_common::config::{BackendConfig, BackendMode};
use drg_common::Result;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

/// Bounded per-job line queue capacity
const CHANNEL_CAPACITY: usize = 64;

/// Which backend stream a line came from
///
/// Stdout and stderr are each internally ordered; their relative
/// interleaving is best-effort, since they are independent OS streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOrigin {
    Stdout,
    Stderr,
}

/// One event observed on the backend channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    /// One complete, non-empty line of backend output
    Line { origin: LineOrigin, text: String },
    /// The channel closed; `detail` describes an abnormal ending
    /// (non-zero exit, mid-stream error), `None` means a clean close
    Closed { detail: Option<String> },
}

/// The relay's single connection to the research backend for one job
#[derive(Debug)]
pub struct BackendChannel {
    rx: mpsc::Receiver<BackendEvent>,
    aborts: Vec<AbortHandle>,
    pid: Option<u32>,
    closed: bool,
}

impl BackendChannel {
    /// Open the channel described by the configuration
    pub async fn open(
        config: &BackendConfig,
        http: &reqwest::Client,
        question: &str,
    ) -> Result<Self> {
        match config.mode {
            BackendMode::Subprocess => subprocess::spawn(&config.command, question),
            BackendMode::Upstream => upstream::connect(http, &config.upstream_url, question).await,
        }
    }

    /// Spawn a local research process (subprocess mode)
    pub fn spawn_subprocess(command: &[String], question: &str) -> Result<Self> {
        subprocess::spawn(command, question)
    }

    /// Connect to an upstream research service (upstream mode)
    pub async fn connect_upstream(
        client: &reqwest::Client,
        base_url: &str,
        question: &str,
    ) -> Result<Self> {
        upstream::connect(client, base_url, question).await
    }

    fn from_parts(
        rx: mpsc::Receiver<BackendEvent>,
        aborts: Vec<AbortHandle>,
        pid: Option<u32>,
    ) -> Self {
        Self {
            rx,
            aborts,
            pid,
            closed: false,
        }
    }

    /// Await the next event; `None` once the channel has closed
    ///
    /// `Closed` is always the final event, delivered exactly once.
    pub async fn next_event(&mut self) -> Option<BackendEvent> {
        if self.closed {
            return None;
        }
        match self.rx.recv().await {
            Some(event) => {
                if matches!(event, BackendEvent::Closed { .. }) {
                    self.closed = true;
                }
                Some(event)
            }
            None => {
                // Reader tasks died without sending a close event
                self.closed = true;
                Some(BackendEvent::Closed {
                    detail: Some("backend channel ended unexpectedly".to_string()),
                })
            }
        }
    }

    /// OS process id of the spawned child (subprocess mode only)
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }
}

impl Drop for BackendChannel {
    fn drop(&mut self) {
        for handle in &self.aborts {
            handle.abort();
        }
    }
}
