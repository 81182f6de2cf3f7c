//! Research stream relay
//!
//! One `GET /api/research?q=...` request opens exactly one backend
//! channel and relays its output as an SSE stream of content frames,
//! closed by exactly one `[DONE]` sentinel frame. Backend failures —
//! spawn/connect failure, non-zero exit, mid-stream errors — surface as
//! `ERR `-prefixed content frames before the sentinel; the closing
//! contract is the same for every outcome. If the client disconnects
//! first, dropping the stream tears the backend channel down and no
//! sentinel is written.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    Json,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use drg_common::frame::{self, FramePayload};

use crate::backend::{BackendChannel, BackendEvent, LineOrigin};
use crate::AppState;

/// Query parameters for the research stream
#[derive(Debug, Deserialize)]
pub struct ResearchQuery {
    pub q: Option<String>,
}

/// GET /api/research?q=<question>
///
/// A missing or empty question fails synchronously with 400 before any
/// backend channel is opened; only valid requests get a stream.
pub async fn research_stream(
    State(state): State<AppState>,
    Query(query): Query<ResearchQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ResearchError> {
    let question = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or(ResearchError::MissingQuestion)?
        .to_string();

    info!(mode = ?state.config.backend.mode, "starting research stream");

    let stream = async_stream::stream! {
        let mut channel =
            match BackendChannel::open(&state.config.backend, &state.http, &question).await {
                Ok(channel) => channel,
                Err(e) => {
                    // The stream still completes cleanly from the client's
                    // point of view: failure text, then the sentinel.
                    yield Ok::<_, Infallible>(Event::default().data(frame::mark_stderr(&e.to_string())));
                    yield Ok(Event::default().data(frame::DONE_SENTINEL));
                    return;
                }
            };

        let mut id_seen = false;
        while let Some(event) = channel.next_event().await {
            match event {
                BackendEvent::Line { origin, text } => {
                    if text.is_empty() {
                        continue;
                    }
                    let payload = match origin {
                        LineOrigin::Stdout => text,
                        LineOrigin::Stderr => frame::mark_stderr(&text),
                    };
                    // Only the first research identifier is authoritative;
                    // it is forwarded verbatim either way.
                    if !id_seen {
                        if let FramePayload::ResearchId(id) = FramePayload::parse(&payload) {
                            id_seen = true;
                            info!(research_id = %id, "research identifier assigned");
                        }
                    }
                    yield Ok::<_, Infallible>(Event::default().data(payload));
                }
                BackendEvent::Closed { detail } => {
                    if let Some(detail) = detail {
                        yield Ok(Event::default().data(frame::mark_stderr(&detail)));
                    }
                    break;
                }
            }
        }

        debug!("research stream complete");
        yield Ok(Event::default().data(frame::DONE_SENTINEL));
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    ))
}

/// Research stream request errors
#[derive(Debug)]
pub enum ResearchError {
    MissingQuestion,
}

impl IntoResponse for ResearchError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ResearchError::MissingQuestion => {
                (StatusCode::BAD_REQUEST, "Missing or empty q parameter")
            }
        };
        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
