#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use operator_agent_tools::rpc::envelope::{API_KEY_HEADER, HEALTH_PATH, RPC_PATH};
use operator_agent_tools::rpc::{RequestEnvelope, ResponseEnvelope};
use operator_agent_tools::{Client, ClientConfig};

pub const TEST_API_KEY: &str = "test-key";

type Handler = Arc<dyn Fn(&RequestEnvelope) -> ResponseEnvelope + Send + Sync>;

#[derive(Clone)]
struct MockState {
    handler: Handler,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<RequestEnvelope>>>,
    api_keys: Arc<Mutex<Vec<Option<String>>>>,
}

/// In-process automation server that records every envelope it receives
pub struct MockServer {
    pub port: u16,
    requests: Arc<Mutex<Vec<RequestEnvelope>>>,
    api_keys: Arc<Mutex<Vec<Option<String>>>>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl MockServer {
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&RequestEnvelope) -> ResponseEnvelope + Send + Sync + 'static,
    {
        Self::start_with_delay(handler, None).await
    }

    pub async fn start_with_delay<F>(handler: F, delay: Option<Duration>) -> Self
    where
        F: Fn(&RequestEnvelope) -> ResponseEnvelope + Send + Sync + 'static,
    {
        let state = MockState {
            handler: Arc::new(handler),
            delay,
            requests: Arc::new(Mutex::new(Vec::new())),
            api_keys: Arc::new(Mutex::new(Vec::new())),
        };
        let requests = state.requests.clone();
        let api_keys = state.api_keys.clone();

        let app = Router::new()
            .route(HEALTH_PATH, axum::routing::get(|| async { "ok" }))
            .route(RPC_PATH, post(rpc))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let port = listener.local_addr().unwrap().port();

        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            port,
            requests,
            api_keys,
            shutdown: Some(tx),
            task: Some(task),
        }
    }

    /// Everything received so far, in arrival order
    pub fn requests(&self) -> Vec<RequestEnvelope> {
        self.requests.lock().unwrap().clone()
    }

    /// `domain.operation` of everything received so far
    pub fn operations(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(RequestEnvelope::qualified_name)
            .collect()
    }

    pub fn api_keys(&self) -> Vec<Option<String>> {
        self.api_keys.lock().unwrap().clone()
    }

    /// Stop listening; later connections are refused
    pub async fn kill(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            tx.send(()).ok();
        }
        if let Some(task) = self.task.take() {
            let abort = task.abort_handle();
            if tokio::time::timeout(Duration::from_secs(2), task).await.is_err() {
                abort.abort();
            }
        }
    }

    /// Client bound to this server
    pub async fn client(&self) -> Client {
        let config = ClientConfig::new(TEST_API_KEY).with_start_timeout(Duration::from_secs(5));
        Client::attach(config, self.port).await.unwrap()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn rpc(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(request): Json<RequestEnvelope>,
) -> Json<ResponseEnvelope> {
    state.requests.lock().unwrap().push(request.clone());
    state.api_keys.lock().unwrap().push(
        headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );

    if let Some(delay) = state.delay {
        tokio::time::sleep(delay).await;
    }

    let mut response = (state.handler)(&request);
    if response.request_id.is_none() {
        response.request_id = Some(request.id);
    }
    Json(response)
}

/// Succeeds on everything with an empty payload
pub fn accept_all(_: &RequestEnvelope) -> ResponseEnvelope {
    ResponseEnvelope::ok(None)
}
