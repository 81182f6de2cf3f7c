//! Integration tests for the drg-gw research stream relay
//!
//! Tests cover:
//! - Request validation (missing/empty question, no backend opened)
//! - Frame relay from a real spawned subprocess (stdout/stderr marking)
//! - Identifier frame forwarding
//! - Termination protocol: exactly one `[DONE]` sentinel, always last,
//!   for clean, failing, and unreachable backends
//! - Upstream mode: chunk re-framing and sentinel ownership
//! - Health endpoint

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::util::ServiceExt; // for `oneshot` method

use drg_common::config::{BackendMode, GatewayConfig};
use drg_gw::{build_router, AppState};

/// Test helper: gateway app in subprocess mode running a shell script
///
/// The question is appended as the final argument, which `sh -c` binds
/// to `$0`.
fn subprocess_app(script: &str) -> axum::Router {
    let mut config = GatewayConfig::default();
    config.backend.mode = BackendMode::Subprocess;
    config.backend.command = vec!["sh".to_string(), "-c".to_string(), script.to_string()];
    build_router(AppState::new(config))
}

/// Test helper: gateway app in upstream mode against a base URL
fn upstream_app(base_url: &str) -> axum::Router {
    let mut config = GatewayConfig::default();
    config.backend.mode = BackendMode::Upstream;
    config.backend.upstream_url = base_url.to_string();
    build_router(AppState::new(config))
}

fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn extract_body(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    String::from_utf8(bytes.to_vec()).expect("Body should be UTF-8")
}

async fn extract_json(body: Body) -> Value {
    let text = extract_body(body).await;
    serde_json::from_str(&text).expect("Should parse JSON")
}

/// Extract SSE frame payloads (`data: ...` blocks) in order
fn extract_frames(body: &str) -> Vec<String> {
    body.split("\n\n")
        .filter_map(|block| block.strip_prefix("data: "))
        .map(|payload| payload.to_string())
        .collect()
}

// =============================================================================
// Request validation
// =============================================================================

#[tokio::test]
async fn missing_question_fails_before_any_backend() {
    // A failing command proves no backend was opened: its output would
    // otherwise appear in a stream response
    let app = subprocess_app("echo should-not-run");

    let response = app
        .oneshot(test_request("GET", "/api/research"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("q parameter"));
}

#[tokio::test]
async fn blank_question_is_rejected() {
    let app = subprocess_app("echo should-not-run");

    let response = app
        .oneshot(test_request("GET", "/api/research?q=%20%20"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Subprocess relay
// =============================================================================

#[tokio::test]
async fn relays_stdout_lines_with_single_trailing_sentinel() {
    let app = subprocess_app("echo first; echo second");

    let response = app
        .oneshot(test_request("GET", "/api/research?q=test"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let body = extract_body(response.into_body()).await;
    let frames = extract_frames(&body);
    assert_eq!(frames, vec!["first", "second", "[DONE]"]);
}

#[tokio::test]
async fn stderr_lines_are_marked_not_fatal() {
    let app = subprocess_app("echo ok; echo warning 1>&2");

    let response = app
        .oneshot(test_request("GET", "/api/research?q=test"))
        .await
        .unwrap();
    let body = extract_body(response.into_body()).await;
    let frames = extract_frames(&body);

    assert!(frames.contains(&"ok".to_string()));
    assert!(frames.contains(&"ERR warning".to_string()));
    // stderr output alone does not disturb the closing contract
    assert_eq!(frames.last().unwrap(), "[DONE]");
    assert_eq!(frames.iter().filter(|f| *f == "[DONE]").count(), 1);
}

#[tokio::test]
async fn identifier_frame_is_forwarded_verbatim() {
    let app = subprocess_app("echo RESEARCH_ID:9b2d3a1e; echo body");

    let response = app
        .oneshot(test_request("GET", "/api/research?q=test"))
        .await
        .unwrap();
    let body = extract_body(response.into_body()).await;
    let frames = extract_frames(&body);

    assert_eq!(frames[0], "RESEARCH_ID:9b2d3a1e");
    assert_eq!(frames.last().unwrap(), "[DONE]");
}

#[tokio::test]
async fn question_reaches_the_subprocess() {
    // sh -c binds the appended question to $0
    let app = subprocess_app("echo \"question: $0\"");

    let response = app
        .oneshot(test_request("GET", "/api/research?q=what%20is%20rust"))
        .await
        .unwrap();
    let body = extract_body(response.into_body()).await;
    let frames = extract_frames(&body);
    assert_eq!(frames[0], "question: what is rust");
}

#[tokio::test]
async fn nonzero_exit_surfaces_as_error_content_before_sentinel() {
    let app = subprocess_app("echo partial; exit 7");

    let response = app
        .oneshot(test_request("GET", "/api/research?q=test"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_body(response.into_body()).await;
    let frames = extract_frames(&body);

    assert_eq!(frames[0], "partial");
    let exit_frame = &frames[frames.len() - 2];
    assert!(
        exit_frame.starts_with("ERR ") && exit_frame.contains("exited with"),
        "unexpected frame: {}",
        exit_frame
    );
    assert_eq!(frames.last().unwrap(), "[DONE]");
}

#[tokio::test]
async fn unreachable_backend_still_completes_the_stream() {
    let mut config = GatewayConfig::default();
    config.backend.mode = BackendMode::Subprocess;
    config.backend.command = vec!["nonexistent_command_12345".to_string()];
    let app = build_router(AppState::new(config));

    let response = app
        .oneshot(test_request("GET", "/api/research?q=test"))
        .await
        .unwrap();
    // The stream itself reports the failure; the response is not an error
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_body(response.into_body()).await;
    let frames = extract_frames(&body);
    assert_eq!(frames.len(), 2);
    assert!(frames[0].starts_with("ERR "));
    assert!(frames[0].contains("failed to spawn"));
    assert_eq!(frames[1], "[DONE]");
}

// =============================================================================
// Upstream relay
// =============================================================================

/// Serve a router on an ephemeral port, returning its base URL
async fn serve_ephemeral(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn upstream_body_is_reframed_and_resealed() {
    use axum::routing::get;

    // Chunks split the word "hello" mid-line; the upstream also sends its
    // own [DONE], which must not leak an extra sentinel through the relay
    let upstream = axum::Router::new().route(
        "/api/research",
        get(|| async {
            let chunks: Vec<Result<&'static [u8], std::convert::Infallible>> = vec![
                Ok(b"data: RESEARCH_ID:u-77\n\ndata: hel"),
                Ok(b"lo\n\n: keep-alive\n\ndata: [DONE]\n\n"),
            ];
            Body::from_stream(futures::stream::iter(chunks))
        }),
    );
    let base_url = serve_ephemeral(upstream).await;
    let app = upstream_app(&base_url);

    let response = app
        .oneshot(test_request("GET", "/api/research?q=test"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_body(response.into_body()).await;
    let frames = extract_frames(&body);
    assert_eq!(frames, vec!["RESEARCH_ID:u-77", "hello", "[DONE]"]);
}

#[tokio::test]
async fn question_is_forwarded_to_the_upstream() {
    use axum::extract::Query;
    use axum::routing::get;
    use std::collections::HashMap;

    let upstream = axum::Router::new().route(
        "/api/research",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            format!("got {}\n", params.get("q").cloned().unwrap_or_default())
        }),
    );
    let base_url = serve_ephemeral(upstream).await;
    let app = upstream_app(&base_url);

    let response = app
        .oneshot(test_request("GET", "/api/research?q=what%20is%20rust%3F"))
        .await
        .unwrap();
    let body = extract_body(response.into_body()).await;
    let frames = extract_frames(&body);
    assert_eq!(frames, vec!["got what is rust?", "[DONE]"]);
}

#[tokio::test]
async fn unreachable_upstream_still_completes_the_stream() {
    // Bind then drop a listener so the port is free (connection refused)
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let app = upstream_app(&format!("http://{}", addr));
    let response = app
        .oneshot(test_request("GET", "/api/research?q=test"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_body(response.into_body()).await;
    let frames = extract_frames(&body);
    assert_eq!(frames.len(), 2);
    assert!(frames[0].starts_with("ERR "));
    assert_eq!(frames[1], "[DONE]");
}

// =============================================================================
// Health endpoint
// =============================================================================

#[tokio::test]
async fn health_endpoint_reports_module_and_version() {
    let app = subprocess_app("true");

    let response = app.oneshot(test_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "drg-gw");
    assert!(body["version"].is_string());
}
