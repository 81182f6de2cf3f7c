//! Upstream backend channel
//!
//! Opens `GET <upstream>/api/research?q=...` against the configured
//! research service and relays its body. The body is re-chunked through
//! the gateway's own line framer rather than trusted to be well-formed
//! SSE; when the upstream *is* SSE-framed, a minimal decode is applied so
//! the relayed stream stays canonical: `data:` prefixes are stripped,
//! blank and comment lines are skipped, and an upstream `[DONE]` closes
//! the channel (the relay emits its own single sentinel).

use futures::StreamExt;
use tokio::sync::mpsc;

use drg_common::frame;
use drg_common::{Error, Result};

use super::framing::LineFramer;
use super::{BackendChannel, BackendEvent, LineOrigin, CHANNEL_CAPACITY};

pub(super) async fn connect(
    client: &reqwest::Client,
    base_url: &str,
    question: &str,
) -> Result<BackendChannel> {
    let url = format!("{}/api/research", base_url.trim_end_matches('/'));
    let response = client
        .get(&url)
        .query(&[("q", question)])
        .send()
        .await
        .map_err(|e| {
            Error::BackendUnreachable(format!("failed to reach research upstream: {}", e))
        })?;

    if !response.status().is_success() {
        return Err(Error::BackendUnreachable(format!(
            "research upstream returned {}",
            response.status()
        )));
    }

    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

    let task = tokio::spawn(async move {
        let mut framer = LineFramer::new();
        let mut stream = response.bytes_stream();
        let mut detail = None;
        let mut upstream_done = false;

        'read: while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    detail = Some(format!("research upstream stream error: {}", e));
                    break;
                }
            };
            for line in framer.push(&chunk) {
                match decode_line(&line) {
                    Decoded::Skip => {}
                    Decoded::Done => {
                        upstream_done = true;
                        break 'read;
                    }
                    Decoded::Payload(text) => {
                        if tx
                            .send(BackendEvent::Line {
                                origin: LineOrigin::Stdout,
                                text,
                            })
                            .await
                            .is_err()
                        {
                            return;
                        }
                    }
                }
            }
        }

        // Flush any buffered partial line before closing
        if !upstream_done {
            if let Some(tail) = framer.finish() {
                if let Decoded::Payload(text) = decode_line(&tail) {
                    if tx
                        .send(BackendEvent::Line {
                            origin: LineOrigin::Stdout,
                            text,
                        })
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
            }
        }
        let _ = tx.send(BackendEvent::Closed { detail }).await;
    });

    Ok(BackendChannel::from_parts(rx, vec![task.abort_handle()], None))
}

/// Result of decoding one upstream body line
enum Decoded {
    /// Structural line with no payload (blank, SSE comment)
    Skip,
    /// Upstream signalled end-of-stream
    Done,
    /// One content payload
    Payload(String),
}

fn decode_line(line: &str) -> Decoded {
    if line.is_empty() {
        return Decoded::Skip;
    }
    if line.starts_with(':') {
        return Decoded::Skip;
    }
    let payload = match line.strip_prefix("data:") {
        Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
        None => line,
    };
    if payload.is_empty() {
        return Decoded::Skip;
    }
    if payload == frame::DONE_SENTINEL {
        return Decoded::Done;
    }
    Decoded::Payload(payload.to_string())
}
