//! Typed responses returned by the façades.
//!
//! Every model serializes to a canonical JSON string through [`JsonString`],
//! which is the form handed to a language model rather than consumed in code.

pub mod chrome;
pub mod code;
pub mod common;
pub mod screenshot;
pub mod system;

pub use chrome::*;
pub use code::*;
pub use common::*;
pub use screenshot::*;
pub use system::*;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Canonical JSON round-trip for response models
pub trait JsonString: Serialize + DeserializeOwned {
    fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

impl<T: Serialize + DeserializeOwned> JsonString for T {}
