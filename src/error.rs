use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Which bounded wait expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutStage {
    /// Waiting for the server to answer its health probe after launch
    Start,
    /// Waiting for a plain RPC response
    Rpc,
    /// Waiting for a description to be resolved by the vision service
    Resolution,
}

impl fmt::Display for TimeoutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimeoutStage::Start => "server start",
            TimeoutStage::Rpc => "rpc",
            TimeoutStage::Resolution => "element resolution",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Installation error: {0}")]
    Installation(String),

    #[error("Server lifecycle error: {0}")]
    Lifecycle(String),

    /// The supervised server died (or stopped answering) mid-session.
    /// Restarting is the only useful reaction, retrying against it is not.
    #[error("Server unavailable: {0}")]
    ServerUnavailable(String),

    #[error("Transport error: {0}")]
    Transport(String),

    /// A timeout never proves the server-side effect did not happen.
    #[error("Timed out during {stage} after {after:?}")]
    Timeout { stage: TimeoutStage, after: Duration },

    #[error("Server reported failure for {operation}: {message}")]
    ServerReported { operation: String, message: String },

    #[error("No confident match for \"{description}\"{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    ElementNotFound {
        description: String,
        message: Option<String>,
    },

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the caller should restart the server before trying again
    pub fn is_server_unavailable(&self) -> bool {
        matches!(self, Error::ServerUnavailable(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
