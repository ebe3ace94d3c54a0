//! Capability-scoped façades over the RPC client.
//!
//! Each method checks its arguments locally and fails with
//! [`Error::Validation`](crate::Error::Validation) before anything is sent.

pub mod automation;
pub mod chrome;
pub mod code;
pub mod keyboard;
pub mod mouse;
mod resolution;
pub mod screenshot;
pub mod system;

pub use automation::AutomationApi;
pub use chrome::ChromeApi;
pub use code::CodeApi;
pub use keyboard::KeyboardApi;
pub use mouse::MouseApi;
pub use screenshot::ScreenshotApi;
pub use system::SystemApi;

use std::time::Duration;

use crate::error::{Error, Result};
use crate::rpc::{FromEnvelope, Request, RpcClient};

/// What every façade call needs: the transport and an optional timeout override
#[derive(Clone, Copy)]
pub(crate) struct CallContext<'a> {
    rpc: &'a RpcClient,
    timeout: Option<Duration>,
}

impl<'a> CallContext<'a> {
    pub(crate) fn new(rpc: &'a RpcClient) -> Self {
        Self { rpc, timeout: None }
    }

    pub(crate) fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) async fn call<T: FromEnvelope>(&self, request: Request) -> Result<T> {
        self.rpc.call(request, self.timeout).await
    }
}

/// Non-empty after trimming
pub(crate) fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Non-empty; whitespace is meaningful (typed text)
pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Absolute URL
pub(crate) fn require_url(field: &str, value: &str) -> Result<()> {
    require_text(field, value)?;
    reqwest::Url::parse(value.trim())
        .map(|_| ())
        .map_err(|e| Error::Validation(format!("{} is not a valid URL ({}): {}", field, e, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text() {
        assert!(require_text("name", "notepad").is_ok());
        assert!(matches!(require_text("name", "   "), Err(Error::Validation(_))));
    }

    #[test]
    fn test_require_non_empty_keeps_whitespace() {
        assert!(require_non_empty("text", " ").is_ok());
        assert!(require_non_empty("text", "").is_err());
    }

    #[test]
    fn test_require_url() {
        assert!(require_url("url", "https://www.example.com").is_ok());
        assert!(require_url("url", "www.example.com").is_err());
        assert!(require_url("url", "").is_err());
    }
}
