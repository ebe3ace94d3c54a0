//! Stand-in automation server that speaks the wire protocol with canned data.
//!
//! Usage: `operator-stub-server --port <n> [--exit-immediately <code>]`

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tokio::sync::Notify;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use operator_agent_tools::rpc::envelope::{
    API_KEY_HEADER, HEALTH_PATH, RPC_PATH, SHUTDOWN_PATH,
};
use operator_agent_tools::rpc::{Domain, RequestEnvelope, ResponseEnvelope};
use operator_agent_tools::server::supervisor::API_KEY_ENV;

/// 1x1 transparent PNG
const BLANK_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

struct StubState {
    api_key: Option<String>,
    shutdown: Notify,
}

struct Args {
    port: u16,
    exit_immediately: Option<i32>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut port = None;
    let mut exit_immediately = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--port" => {
                let value = args.next().ok_or_else(|| anyhow::anyhow!("--port needs a value"))?;
                port = Some(value.parse()?);
            }
            "--exit-immediately" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--exit-immediately needs a value"))?;
                exit_immediately = Some(value.parse()?);
            }
            other => tracing::warn!("Ignoring unknown argument {}", other),
        }
    }

    Ok(Args {
        port: port.ok_or_else(|| anyhow::anyhow!("--port is required"))?,
        exit_immediately,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = parse_args()?;

    if let Some(code) = args.exit_immediately {
        eprintln!("stub server exiting with code {}", code);
        std::process::exit(code);
    }

    let state = Arc::new(StubState {
        api_key: std::env::var(API_KEY_ENV).ok(),
        shutdown: Notify::new(),
    });

    let app = Router::new()
        .route(HEALTH_PATH, get(health_check))
        .route(SHUTDOWN_PATH, post(shutdown))
        .route(RPC_PATH, post(rpc))
        .with_state(state.clone());

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Stub automation server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { state.shutdown.notified().await })
        .await?;

    tracing::info!("Stub automation server stopped");
    Ok(())
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn shutdown(State(state): State<Arc<StubState>>) -> StatusCode {
    tracing::info!("Shutdown requested");
    state.shutdown.notify_one();
    StatusCode::OK
}

async fn rpc(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(request): Json<RequestEnvelope>,
) -> (StatusCode, Json<ResponseEnvelope>) {
    let presented = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    if let Some(ref expected) = state.api_key {
        if presented != Some(expected.as_str()) {
            let mut response = ResponseEnvelope::failure("invalid api key");
            response.request_id = Some(request.id);
            return (StatusCode::UNAUTHORIZED, Json(response));
        }
    }

    tracing::debug!("{} {:?}", request.qualified_name(), request.params);
    let mut response = canned_response(&request);
    response.request_id = Some(request.id);
    (StatusCode::OK, Json(response))
}

fn canned_response(request: &RequestEnvelope) -> ResponseEnvelope {
    match (request.domain, request.operation.as_str()) {
        (Domain::Screenshot, "take") => ResponseEnvelope::ok(Some(json!({
            "image_base64": BLANK_PNG_BASE64,
            "timestamp": Utc::now().to_rfc3339(),
            "width": 1,
            "height": 1,
        }))),
        (Domain::Screenshot, "find_ui_element") => ResponseEnvelope::ok(Some(json!({
            "status": "no_match",
            "message": "stub server cannot see the screen",
        }))),
        (Domain::System, "get_overview") => ResponseEnvelope::ok(Some(json!({}))),
        (Domain::System, "get_window_details") => ResponseEnvelope::ok(Some(json!({
            "window": { "id": request.params.get("window_id").cloned().unwrap_or(Value::Null) },
            "note": "stub server has no UI tree",
        }))),
        (Domain::Chrome, "explain_current_tab") => ResponseEnvelope::ok(Some(json!({
            "title": "about:blank",
            "url": "about:blank",
        }))),
        (Domain::Chrome, "execute_script") | (Domain::Chrome, "generate_and_execute_script") => {
            ResponseEnvelope::ok(Some(json!({ "result": null })))
        }
        (Domain::Code, _) => ResponseEnvelope::ok(Some(json!({}))),
        _ => ResponseEnvelope::ok(None),
    }
}
