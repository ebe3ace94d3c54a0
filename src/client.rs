use std::sync::Arc;

use crate::api::{
    AutomationApi, CallContext, ChromeApi, CodeApi, KeyboardApi, MouseApi, ScreenshotApi,
    SystemApi,
};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::rpc::RpcClient;
use crate::server::{
    DownloadInstaller, ServerHandle, ServerLocator, ServerState, Supervisor, SupervisorConfig,
};

/// Entry point: owns the server lifecycle and hands out capability façades.
///
/// ```no_run
/// # async fn demo() -> operator_agent_tools::Result<()> {
/// use operator_agent_tools::{Client, ClientConfig};
///
/// let client = Client::new(ClientConfig::from_env()?).await?;
/// client.mouse().click_by_description("Submit button").await?;
/// client.stop_server().await?;
/// # Ok(())
/// # }
/// ```
///
/// A client that goes out of scope kills the server it launched.
pub struct Client {
    config: ClientConfig,
    rpc: RpcClient,
}

impl Client {
    /// Build a client over the default install locations.
    /// Starts the server when `config.auto_start` is set.
    ///
    /// With `download_url` configured, a missing server is downloaded first.
    pub async fn new(config: ClientConfig) -> Result<Self> {
        let mut locator = ServerLocator::with_default_locations(config.server_path.clone());
        if let Some(ref url) = config.download_url {
            locator = locator.with_installer(Arc::new(DownloadInstaller::new(url.clone())));
        }
        Self::with_locator(config, locator).await
    }

    /// Same as [`Client::new`] with a caller-supplied locator (custom paths or installer)
    pub async fn with_locator(config: ClientConfig, locator: ServerLocator) -> Result<Self> {
        let client = Self::build(config, locator)?;
        if client.config.auto_start {
            client.start_server().await?;
        }
        Ok(client)
    }

    /// Bind to a server already listening on `port`; `stop_server` leaves it running.
    pub async fn attach(config: ClientConfig, port: u16) -> Result<Self> {
        let client = Self::build(config, ServerLocator::new(Vec::new()))?;
        client.rpc.supervisor().await.attach(port).await?;
        Ok(client)
    }

    fn build(config: ClientConfig, locator: ServerLocator) -> Result<Self> {
        config.validate()?;
        let supervisor = Supervisor::new(locator, SupervisorConfig::from(&config));
        let rpc = RpcClient::new(supervisor, &config)?;
        Ok(Self { config, rpc })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Launch the server and wait for it to become Ready. A no-op when it already is.
    pub async fn start_server(&self) -> Result<ServerHandle> {
        let mut supervisor = self.rpc.supervisor().await;
        let handle = supervisor.start().await?.clone();
        Ok(handle)
    }

    /// Shut the server down. Safe to call more than once.
    pub async fn stop_server(&self) -> Result<()> {
        self.rpc.supervisor().await.stop().await
    }

    /// Snapshot of the server handle
    pub async fn server_handle(&self) -> ServerHandle {
        self.rpc.supervisor().await.handle().clone()
    }

    pub async fn server_state(&self) -> ServerState {
        self.rpc.supervisor().await.state()
    }

    /// Probe liveness; a Ready server found dead moves to Crashed
    pub async fn is_server_alive(&self) -> bool {
        self.rpc.supervisor().await.is_alive().await
    }

    fn ctx(&self) -> CallContext<'_> {
        CallContext::new(&self.rpc)
    }

    pub fn screenshot(&self) -> ScreenshotApi<'_> {
        ScreenshotApi::new(self.ctx())
    }

    pub fn system(&self) -> SystemApi<'_> {
        SystemApi::new(self.ctx())
    }

    pub fn mouse(&self) -> MouseApi<'_> {
        MouseApi::new(self.ctx())
    }

    pub fn keyboard(&self) -> KeyboardApi<'_> {
        KeyboardApi::new(self.ctx())
    }

    pub fn chrome(&self) -> ChromeApi<'_> {
        ChromeApi::new(self.ctx())
    }

    pub fn automation(&self) -> AutomationApi<'_> {
        AutomationApi::new(self.ctx())
    }

    pub fn code(&self) -> CodeApi<'_> {
        CodeApi::new(self.ctx())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[tokio::test]
    async fn test_invalid_config_is_rejected_before_anything_starts() {
        let err = Client::new(ClientConfig::new("")).await.err().unwrap();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_without_auto_start_calls_fail_fast() {
        let config = ClientConfig::new("test-key").with_auto_start(false);
        let client = Client::with_locator(config, ServerLocator::new(Vec::new()))
            .await
            .unwrap();
        assert_eq!(client.server_state().await, ServerState::NotStarted);

        let err = client.mouse().click(1, 1).await.unwrap_err();
        assert!(matches!(err, Error::Lifecycle(_)));
    }
}
