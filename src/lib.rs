//! Client SDK for a local desktop automation server.
//!
//! The [`Client`] finds (or installs) the server executable, launches it on a
//! loopback port, waits for it to answer its health probe, and then exposes
//! typed façades per capability:
//!
//! - [`screenshot`](Client::screenshot): capture, natural-language element lookup
//! - [`system`](Client::system): windows, UI trees, launching applications
//! - [`mouse`](Client::mouse) and [`keyboard`](Client::keyboard): input
//! - [`chrome`](Client::chrome): the managed browser
//! - [`automation`](Client::automation): UI Automation on element ids
//! - [`code`](Client::code): C# execution
//!
//! Every call is one JSON request over HTTP. Calls on a client are serialized.
//! Errors are [`Error`] variants; a dead server is never retried silently.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod keys;
pub mod models;
pub mod rpc;
pub mod server;

pub use client::Client;
pub use config::ClientConfig;
pub use error::{Error, Result, TimeoutStage};
pub use keys::KeyCombo;
pub use models::{
    ActionResponse, Coordinate, ElementId, ElementInfo, JsonString, OverviewResponse, Rect,
    ResolvedTarget, ScreenshotResponse, WindowId, WindowInfo,
};
pub use server::{ServerHandle, ServerLocator, ServerState};
