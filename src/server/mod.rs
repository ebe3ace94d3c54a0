//! Locating, installing and supervising the automation server process.

pub mod installer;
pub mod locator;
pub mod supervisor;

pub use installer::{DownloadInstaller, Installer};
pub use locator::{ServerLocator, SERVER_BINARY_NAME};
pub use supervisor::{
    pick_free_port, CrashReport, ServerHandle, ServerState, Supervisor, SupervisorConfig,
};
