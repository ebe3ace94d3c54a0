use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};

use super::envelope::{FromEnvelope, RequestEnvelope, ResponseEnvelope, API_KEY_HEADER, RPC_PATH};
use super::request::Request;
use crate::config::ClientConfig;
use crate::error::{Error, Result, TimeoutStage};
use crate::server::Supervisor;

/// Sends typed requests to the supervised server.
///
/// Calls are serialized: the supervisor lock is held for the whole
/// round-trip, so at most one request per client is in flight and calls are
/// observed by the server in issuance order. Nothing is retried here, since a
/// replayed click is not harmless.
///
/// A [`Error::Timeout`] only means the client stopped waiting. The server may
/// still have performed the action.
pub struct RpcClient {
    supervisor: Mutex<Supervisor>,
    http: reqwest::Client,
    api_key: String,
    request_timeout: Duration,
    resolution_timeout: Duration,
}

impl RpcClient {
    pub fn new(supervisor: Supervisor, config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            supervisor: Mutex::new(supervisor),
            http,
            api_key: config.api_key.clone(),
            request_timeout: config.request_timeout,
            resolution_timeout: config.resolution_timeout,
        })
    }

    /// Exclusive access to the supervisor; blocks while a call is in flight
    pub async fn supervisor(&self) -> MutexGuard<'_, Supervisor> {
        self.supervisor.lock().await
    }

    /// Default wait for `request` when the caller gives none
    pub fn default_timeout(&self, request: &Request) -> Duration {
        if request.is_ai_assisted() {
            self.resolution_timeout
        } else {
            self.request_timeout
        }
    }

    pub async fn call<T: FromEnvelope>(
        &self,
        request: Request,
        timeout: Option<Duration>,
    ) -> Result<T> {
        let timeout = timeout.unwrap_or_else(|| self.default_timeout(&request));
        let stage = match &request {
            Request::ScreenshotFindUiElement { .. } => TimeoutStage::Resolution,
            _ => TimeoutStage::Rpc,
        };

        let mut server = self.supervisor.lock().await;
        let base_url = server.ensure_ready().await?;

        let envelope = request.into_envelope();
        tracing::debug!(
            request_id = %envelope.id,
            "-> {} {:?}",
            envelope.qualified_name(),
            timeout
        );

        let response = match self.send(&base_url, &envelope, timeout, stage).await {
            Ok(response) => response,
            Err(Error::Transport(detail)) => {
                // Tell a dead server apart from a one-off connection hiccup
                if server.is_alive().await {
                    return Err(Error::Transport(detail));
                }
                return Err(Error::ServerUnavailable(format!(
                    "{} failed, automation server is gone: {}",
                    envelope.qualified_name(),
                    detail
                )));
            }
            Err(e) => return Err(e),
        };
        drop(server);

        tracing::debug!(
            request_id = %envelope.id,
            "<- {} success={}",
            envelope.qualified_name(),
            response.success
        );
        response.into_result(&envelope)
    }

    async fn send(
        &self,
        base_url: &str,
        envelope: &RequestEnvelope,
        timeout: Duration,
        stage: TimeoutStage,
    ) -> Result<ResponseEnvelope> {
        let url = format!("{}{}", base_url, RPC_PATH);
        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                Error::Timeout {
                    stage,
                    after: timeout,
                }
            } else {
                Error::Transport(e.to_string())
            }
        };

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(envelope)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        let body = response.bytes().await.map_err(classify)?;

        serde_json::from_slice::<ResponseEnvelope>(&body).map_err(|e| {
            if status.is_success() {
                Error::Protocol(format!(
                    "Failed to parse response to {}: {}",
                    envelope.qualified_name(),
                    e
                ))
            } else {
                Error::Protocol(format!(
                    "{} returned HTTP {}: {}",
                    envelope.qualified_name(),
                    status,
                    String::from_utf8_lossy(&body)
                ))
            }
        })
    }
}
