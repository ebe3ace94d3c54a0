pub mod client;
pub mod envelope;
pub mod request;

pub use client::RpcClient;
pub use envelope::{Domain, FromEnvelope, RequestEnvelope, ResponseEnvelope};
pub use request::{Request, TargetKind};
