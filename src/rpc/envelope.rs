use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{Error, Result};
use crate::models::{
    ActionResponse, CSharpResponse, ChromeTabDetails, OverviewResponse, ResolutionResponse,
    ScreenshotResponse, ScriptResponse, WindowDetailsResponse,
};

pub const HEALTH_PATH: &str = "/health";
pub const RPC_PATH: &str = "/tools-api/rpc";
pub const SHUTDOWN_PATH: &str = "/shutdown";
pub const API_KEY_HEADER: &str = "X-Operator-Api-Key";

/// Capability domain of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Screenshot,
    System,
    Mouse,
    Keyboard,
    Chrome,
    Automation,
    Code,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Screenshot => "screenshot",
            Domain::System => "system",
            Domain::Mouse => "mouse",
            Domain::Keyboard => "keyboard",
            Domain::Chrome => "chrome",
            Domain::Automation => "automation",
            Domain::Code => "code",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What goes over the wire for a single call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Correlates the response with this request
    pub id: String,
    pub domain: Domain,
    pub operation: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl RequestEnvelope {
    /// `domain.operation`, used in logs and error messages
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.domain, self.operation)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ResponseEnvelope {
    pub fn ok(payload: Option<Value>) -> Self {
        Self {
            success: true,
            message: None,
            payload,
            request_id: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            payload: None,
            request_id: None,
        }
    }

    /// Check correlation and the success flag, then decode the typed payload.
    ///
    /// A failed response never yields a value, whatever payload came with it.
    pub fn into_result<T: FromEnvelope>(self, request: &RequestEnvelope) -> Result<T> {
        if let Some(ref echoed) = self.request_id {
            if echoed != &request.id {
                return Err(Error::Protocol(format!(
                    "response for request {} arrived on request {}",
                    echoed, request.id
                )));
            }
        }

        if !self.success {
            return Err(Error::ServerReported {
                operation: request.qualified_name(),
                message: self
                    .message
                    .unwrap_or_else(|| "server reported failure without a message".to_string()),
            });
        }

        T::from_envelope(self.message, self.payload).map_err(|e| {
            Error::Protocol(format!(
                "malformed payload for {}: {}",
                request.qualified_name(),
                e
            ))
        })
    }
}

/// Typed view of a successful response
pub trait FromEnvelope: Sized {
    fn from_envelope(message: Option<String>, payload: Option<Value>) -> std::result::Result<Self, String>;
}

fn decode_payload<T: DeserializeOwned>(payload: Option<Value>) -> std::result::Result<T, String> {
    let payload = payload.ok_or_else(|| "payload missing".to_string())?;
    serde_json::from_value(payload).map_err(|e| e.to_string())
}

macro_rules! payload_models {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromEnvelope for $ty {
                fn from_envelope(_message: Option<String>, payload: Option<Value>) -> std::result::Result<Self, String> {
                    decode_payload(payload)
                }
            }
        )*
    };
}

payload_models!(
    ScreenshotResponse,
    ResolutionResponse,
    OverviewResponse,
    WindowDetailsResponse,
    ChromeTabDetails,
    ScriptResponse,
    CSharpResponse,
);

impl FromEnvelope for ActionResponse {
    fn from_envelope(message: Option<String>, payload: Option<Value>) -> std::result::Result<Self, String> {
        let result_value = match payload {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => match map.get("result_value") {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
            },
            Some(other) => return Err(format!("expected an object, got {}", other)),
        };
        Ok(ActionResponse {
            success: true,
            message,
            result_value,
        })
    }
}
