use std::collections::VecDeque;
use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

use super::locator::ServerLocator;
use crate::config::ClientConfig;
use crate::error::{Error, Result, TimeoutStage};
use crate::rpc::envelope::{HEALTH_PATH, SHUTDOWN_PATH};

/// Environment variable the server reads its API key from
pub const API_KEY_ENV: &str = "OPERATOR_API_KEY";

const INITIAL_BACKOFF: Duration = Duration::from_millis(50);
const MAX_BACKOFF: Duration = Duration::from_secs(1);
const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(2);
const OUTPUT_TAIL_LINES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    NotStarted,
    Starting,
    Ready,
    Stopped,
    Crashed,
}

/// Exit details captured when the server dies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrashReport {
    pub exit_code: Option<i32>,
    /// Last lines the process wrote to stdout/stderr
    pub output: Vec<String>,
}

impl CrashReport {
    fn describe(&self) -> String {
        let code = match self.exit_code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        };
        if self.output.is_empty() {
            code
        } else {
            format!("{}; last output:\n{}", code, self.output.join("\n"))
        }
    }
}

/// Client-side view of the server process
#[derive(Debug, Clone)]
pub struct ServerHandle {
    pub path: Option<PathBuf>,
    pub port: Option<u16>,
    pub pid: Option<u32>,
    pub state: ServerState,
    pub crash: Option<CrashReport>,
    /// False when attached to a server this client did not launch
    pub owned: bool,
}

impl ServerHandle {
    fn not_started() -> Self {
        Self {
            path: None,
            port: None,
            pid: None,
            state: ServerState::NotStarted,
            crash: None,
            owned: true,
        }
    }

    pub fn base_url(&self) -> Option<String> {
        self.port.map(|port| format!("http://127.0.0.1:{}", port))
    }
}

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub port: Option<u16>,
    pub start_timeout: Duration,
    pub shutdown_grace: Duration,
    pub args: Vec<String>,
    pub api_key: String,
}

impl From<&ClientConfig> for SupervisorConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            port: config.server_port,
            start_timeout: config.start_timeout,
            shutdown_grace: config.shutdown_grace,
            args: config.server_args.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

/// Owns the server process: launch, readiness, liveness, shutdown.
///
/// Dropping the supervisor kills a process it launched.
pub struct Supervisor {
    locator: ServerLocator,
    config: SupervisorConfig,
    handle: ServerHandle,
    child: Option<Child>,
    output: Arc<Mutex<VecDeque<String>>>,
    readers: Vec<JoinHandle<()>>,
    http: reqwest::Client,
    /// Set once the current run answered its health probe
    reached_ready: bool,
}

impl Supervisor {
    pub fn new(locator: ServerLocator, config: SupervisorConfig) -> Self {
        Self {
            locator,
            config,
            handle: ServerHandle::not_started(),
            child: None,
            output: Arc::new(Mutex::new(VecDeque::with_capacity(OUTPUT_TAIL_LINES))),
            readers: Vec::new(),
            http: reqwest::Client::new(),
            reached_ready: false,
        }
    }

    pub fn handle(&self) -> &ServerHandle {
        &self.handle
    }

    pub fn state(&self) -> ServerState {
        self.handle.state
    }

    /// Launch the server and wait until its health endpoint answers.
    pub async fn start(&mut self) -> Result<&ServerHandle> {
        // Check if already running
        if self.handle.state == ServerState::Ready && self.is_alive().await {
            return Ok(&self.handle);
        }
        // Leftover from a crash or a detached server
        self.reap().await;

        let path = self.locator.ensure_installed().await?;
        let port = match self.config.port {
            Some(port) => port,
            None => pick_free_port()?,
        };

        self.handle = ServerHandle {
            path: Some(path.clone()),
            port: Some(port),
            pid: None,
            state: ServerState::Starting,
            crash: None,
            owned: true,
        };
        self.reached_ready = false;
        tracing::info!("Starting automation server {:?} on port {}", path, port);

        let mut cmd = Command::new(&path);

        // Prevent a console window from appearing on Windows
        #[cfg(target_os = "windows")]
        cmd.creation_flags(0x08000000); // CREATE_NO_WINDOW

        cmd.arg("--port")
            .arg(port.to_string())
            .args(&self.config.args)
            .env(API_KEY_ENV, &self.config.api_key)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                self.handle.state = ServerState::Crashed;
                return Err(Error::Lifecycle(format!(
                    "Failed to launch {:?}: {}",
                    path, e
                )));
            }
        };
        self.handle.pid = child.id();

        self.output.lock().await.clear();
        if let Some(stdout) = child.stdout.take() {
            self.readers.push(spawn_output_reader(stdout, self.output.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            self.readers.push(spawn_output_reader(stderr, self.output.clone()));
        }
        self.child = Some(child);

        match self.wait_for_ready(port).await {
            Ok(()) => {
                self.handle.state = ServerState::Ready;
                self.reached_ready = true;
                tracing::info!(
                    "Automation server ready on port {} (pid {:?})",
                    port,
                    self.handle.pid
                );
                Ok(&self.handle)
            }
            Err(e) => {
                tracing::error!("Automation server failed to start: {}", e);
                self.handle.state = ServerState::Crashed;
                self.reap().await;
                Err(e)
            }
        }
    }

    /// Bind to a server someone else launched. `stop` only detaches from it.
    pub async fn attach(&mut self, port: u16) -> Result<&ServerHandle> {
        self.reap().await;
        self.handle = ServerHandle {
            path: None,
            port: Some(port),
            pid: None,
            state: ServerState::Starting,
            crash: None,
            owned: false,
        };
        self.reached_ready = false;

        match self.wait_for_ready(port).await {
            Ok(()) => {
                self.handle.state = ServerState::Ready;
                self.reached_ready = true;
                tracing::info!("Attached to automation server on port {}", port);
                Ok(&self.handle)
            }
            Err(e) => {
                self.handle.state = ServerState::Crashed;
                Err(e)
            }
        }
    }

    /// Graceful shutdown, then force. Calling it again is a no-op.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(mut child) = self.child.take() {
            if let Some(base_url) = self.handle.base_url() {
                let result = self
                    .http
                    .post(format!("{}{}", base_url, SHUTDOWN_PATH))
                    .timeout(HEALTH_PROBE_TIMEOUT)
                    .send()
                    .await;
                if let Err(e) = result {
                    tracing::debug!("Shutdown request failed: {}", e);
                }
            }

            match tokio::time::timeout(self.config.shutdown_grace, child.wait()).await {
                Ok(Ok(status)) => tracing::info!("Automation server exited: {}", status),
                Ok(Err(e)) => tracing::warn!("Failed to wait for automation server: {}", e),
                Err(_) => {
                    tracing::warn!(
                        "Automation server still alive after {:?}, killing it",
                        self.config.shutdown_grace
                    );
                    child.kill().await.map_err(|e| {
                        Error::Lifecycle(format!("Failed to kill automation server: {}", e))
                    })?;
                }
            }
            self.join_readers().await;
        }

        if self.handle.state != ServerState::Stopped {
            tracing::debug!("Automation server handle {:?} -> Stopped", self.handle.state);
        }
        self.handle.state = ServerState::Stopped;
        self.handle.pid = None;
        Ok(())
    }

    /// Liveness probe. Flips a Ready handle to Crashed when the server is gone.
    ///
    /// Cheap for a launched process; an attached server needs a health request.
    pub async fn is_alive(&mut self) -> bool {
        let exited = if let Some(child) = self.child.as_mut() {
            match child.try_wait() {
                Ok(None) => return true,
                Ok(Some(status)) => Some(status),
                Err(e) => {
                    tracing::warn!("Failed to poll automation server: {}", e);
                    None
                }
            }
        } else if !self.handle.owned && self.handle.state == ServerState::Ready {
            let reachable = match self.handle.port {
                Some(port) => self.probe_health(port, HEALTH_PROBE_TIMEOUT).await,
                None => false,
            };
            if reachable {
                return true;
            }
            None
        } else {
            return false;
        };

        self.mark_crashed(exited).await;
        false
    }

    /// Gate in front of every call: Ready and not visibly dead.
    ///
    /// Returns the base URL to talk to. Sends nothing over the network.
    pub async fn ensure_ready(&mut self) -> Result<String> {
        match self.handle.state {
            ServerState::Ready => {}
            // Died mid-session: distinct from a run that never came up
            ServerState::Crashed if self.reached_ready => {
                return Err(Error::ServerUnavailable(self.crash_summary()));
            }
            ServerState::Crashed => {
                return Err(Error::Lifecycle(self.startup_failure_summary()));
            }
            other => {
                return Err(Error::Lifecycle(format!(
                    "Automation server is {:?}, not Ready",
                    other
                )));
            }
        }

        if let Some(status) = self.child_exit_status() {
            self.mark_crashed(Some(status)).await;
            return Err(Error::ServerUnavailable(self.crash_summary()));
        }

        self.handle
            .base_url()
            .ok_or_else(|| Error::Lifecycle("Automation server has no port".to_string()))
    }

    async fn wait_for_ready(&mut self, port: u16) -> Result<()> {
        let timeout = self.config.start_timeout;
        let deadline = Instant::now() + timeout;
        let mut delay = INITIAL_BACKOFF;
        let mut attempts = 0u32;

        loop {
            if let Some(status) = self.child_exit_status() {
                self.join_readers().await;
                let report = CrashReport {
                    exit_code: status.code(),
                    output: self.output_tail().await,
                };
                let message = format!(
                    "Automation server exited during startup ({})",
                    report.describe()
                );
                self.handle.crash = Some(report);
                return Err(Error::Lifecycle(message));
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            attempts += 1;
            if self
                .probe_health(port, remaining.min(HEALTH_PROBE_TIMEOUT))
                .await
            {
                tracing::debug!("Health probe succeeded after {} attempts", attempts);
                return Ok(());
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::error!(
                    "Automation server not ready after {} attempts ({:?})",
                    attempts,
                    timeout
                );
                return Err(Error::Timeout {
                    stage: TimeoutStage::Start,
                    after: timeout,
                });
            }

            sleep(delay.min(remaining)).await;
            delay = (delay * 2).min(MAX_BACKOFF);
        }
    }

    async fn probe_health(&self, port: u16, timeout: Duration) -> bool {
        if timeout.is_zero() {
            return false;
        }
        let url = format!("http://127.0.0.1:{}{}", port, HEALTH_PATH);
        match self.http.get(&url).timeout(timeout).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn child_exit_status(&mut self) -> Option<ExitStatus> {
        self.child.as_mut()?.try_wait().ok().flatten()
    }

    async fn mark_crashed(&mut self, status: Option<ExitStatus>) {
        if self.handle.state != ServerState::Ready {
            return;
        }
        self.join_readers().await;
        let report = CrashReport {
            exit_code: status.and_then(|s| s.code()),
            output: self.output_tail().await,
        };
        tracing::error!("Automation server crashed ({})", report.describe());
        self.handle.state = ServerState::Crashed;
        self.handle.crash = Some(report);
        self.handle.pid = None;
    }

    fn startup_failure_summary(&self) -> String {
        match self.handle.crash {
            Some(ref report) => format!("automation server failed to start ({})", report.describe()),
            None => "automation server failed to start".to_string(),
        }
    }

    fn crash_summary(&self) -> String {
        match self.handle.crash {
            Some(ref report) => format!("automation server crashed ({})", report.describe()),
            None => "automation server is no longer reachable".to_string(),
        }
    }

    /// Kill and forget any process left from a previous run
    async fn reap(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                tracing::debug!("Failed to kill stale automation server: {}", e);
            }
        }
        self.join_readers().await;
    }

    /// Readers end at EOF once the process is gone
    async fn join_readers(&mut self) {
        for reader in self.readers.drain(..) {
            let abort = reader.abort_handle();
            if tokio::time::timeout(Duration::from_secs(1), reader).await.is_err() {
                abort.abort();
            }
        }
    }

    async fn output_tail(&self) -> Vec<String> {
        self.output.lock().await.iter().cloned().collect()
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        if let Some(child) = self.child.as_mut() {
            if let Ok(None) = child.try_wait() {
                tracing::warn!("Supervisor dropped with a live automation server, killing it");
                let _ = child.start_kill();
            }
        }
        for reader in &self.readers {
            reader.abort();
        }
    }
}

/// Ask the OS for a free loopback port
pub fn pick_free_port() -> Result<u16> {
    let listener = TcpListener::bind(("127.0.0.1", 0))?;
    Ok(listener.local_addr()?.port())
}

fn spawn_output_reader<R>(stream: R, tail: Arc<Mutex<VecDeque<String>>>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            tracing::debug!(target: "operator_server", "{}", line);
            let mut tail = tail.lock().await;
            if tail.len() == OUTPUT_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        }
    })
}
