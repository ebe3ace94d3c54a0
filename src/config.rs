use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Resolution goes through the external vision service, so it gets more room.
pub const DEFAULT_RESOLUTION_TIMEOUT: Duration = Duration::from_secs(90);
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Client construction options.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Key for the vision / code-generation services, forwarded by the server
    pub api_key: String,
    /// Local port for the server; `None` picks a free one at start
    pub server_port: Option<u16>,
    pub start_timeout: Duration,
    /// Start the server as part of `Client::new`
    pub auto_start: bool,
    pub request_timeout: Duration,
    pub resolution_timeout: Duration,
    pub shutdown_grace: Duration,
    /// Explicit server binary, checked before the well-known install locations
    pub server_path: Option<PathBuf>,
    /// Extra arguments appended after `--port <n>`
    pub server_args: Vec<String>,
    /// Where to download the server from when no install is found
    pub download_url: Option<String>,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            server_port: None,
            start_timeout: DEFAULT_START_TIMEOUT,
            auto_start: true,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            resolution_timeout: DEFAULT_RESOLUTION_TIMEOUT,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            server_path: None,
            server_args: Vec::new(),
            download_url: None,
        }
    }

    /// Build from `OPERATOR_*` environment variables (a `.env` file is honored).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = env::var("OPERATOR_API_KEY")
            .map_err(|_| Error::Validation("OPERATOR_API_KEY is not set".to_string()))?;

        let mut config = Self::new(api_key);
        config.server_port = env::var("OPERATOR_SERVER_PORT")
            .ok()
            .and_then(|p| p.parse().ok());
        config.start_timeout = env_secs("OPERATOR_START_TIMEOUT_SECS").unwrap_or(DEFAULT_START_TIMEOUT);
        config.request_timeout =
            env_secs("OPERATOR_REQUEST_TIMEOUT_SECS").unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        config.auto_start = env::var("OPERATOR_AUTO_START")
            .ok()
            .and_then(|v| parse_bool(&v))
            .unwrap_or(true);
        config.server_path = env::var("OPERATOR_SERVER_PATH").ok().map(PathBuf::from);
        config.download_url = env::var("OPERATOR_SERVER_DOWNLOAD_URL").ok();

        Ok(config)
    }

    pub fn with_server_port(mut self, port: u16) -> Self {
        self.server_port = Some(port);
        self
    }

    pub fn with_start_timeout(mut self, timeout: Duration) -> Self {
        self.start_timeout = timeout;
        self
    }

    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_resolution_timeout(mut self, timeout: Duration) -> Self {
        self.resolution_timeout = timeout;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn with_server_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.server_path = Some(path.into());
        self
    }

    pub fn with_server_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.server_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = Some(url.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Validation("api_key must not be empty".to_string()));
        }
        if self.server_port == Some(0) {
            return Err(Error::Validation(
                "server_port must be non-zero; leave it unset to auto-select".to_string(),
            ));
        }
        for (name, value) in [
            ("start_timeout", self.start_timeout),
            ("request_timeout", self.request_timeout),
            ("resolution_timeout", self.resolution_timeout),
        ] {
            if value.is_zero() {
                return Err(Error::Validation(format!("{} must be greater than zero", name)));
            }
        }
        Ok(())
    }
}

fn env_secs(key: &str) -> Option<Duration> {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("key");
        assert_eq!(config.server_port, None);
        assert!(config.auto_start);
        assert_eq!(config.start_timeout, DEFAULT_START_TIMEOUT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_key() {
        let err = ClientConfig::new("  ").validate().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_validate_rejects_zero_port_and_timeouts() {
        let config = ClientConfig::new("key").with_server_port(0);
        assert!(matches!(config.validate(), Err(Error::Validation(_))));

        let config = ClientConfig::new("key").with_request_timeout(Duration::ZERO);
        assert!(matches!(config.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
