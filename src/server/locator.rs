use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::installer::Installer;
use crate::error::{Error, Result};

#[cfg(target_os = "windows")]
pub const SERVER_BINARY_NAME: &str = "operator-server.exe";
#[cfg(not(target_os = "windows"))]
pub const SERVER_BINARY_NAME: &str = "operator-server";

const INSTALL_DIR_NAME: &str = "OperatorAgentTools";
const VERSION_FILE: &str = "version.txt";

/// Finds the automation server executable, installing it on a miss.
#[derive(Clone)]
pub struct ServerLocator {
    candidates: Vec<PathBuf>,
    installer: Option<Arc<dyn Installer>>,
    expected_version: Option<String>,
}

impl ServerLocator {
    /// Probe exactly `candidates`, in order
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self {
            candidates,
            installer: None,
            expected_version: None,
        }
    }

    /// Well-known locations: user-local data dir, then beside the current executable
    pub fn with_default_locations(explicit: Option<PathBuf>) -> Self {
        let mut candidates: Vec<PathBuf> = explicit.into_iter().collect();

        if let Some(dir) = user_install_dir() {
            candidates.push(dir.join(SERVER_BINARY_NAME));
        }

        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
        {
            candidates.push(exe_dir.join(SERVER_BINARY_NAME));
            candidates.push(exe_dir.join("server").join(SERVER_BINARY_NAME));
        }

        Self::new(candidates)
    }

    pub fn with_installer(mut self, installer: Arc<dyn Installer>) -> Self {
        self.installer = Some(installer);
        self
    }

    /// Installs whose `version.txt` differs count as missing
    pub fn with_expected_version(mut self, version: impl Into<String>) -> Self {
        self.expected_version = Some(version.into());
        self
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// First candidate that is an executable file at the expected version
    pub fn locate(&self) -> Option<PathBuf> {
        self.candidates
            .iter()
            .find(|path| self.is_usable(path))
            .cloned()
    }

    pub fn is_installed(&self) -> bool {
        self.locate().is_some()
    }

    /// Locate, or install into the user-local location and locate again.
    pub async fn ensure_installed(&self) -> Result<PathBuf> {
        if let Some(path) = self.locate() {
            return Ok(path);
        }

        let installer = self.installer.as_ref().ok_or_else(|| {
            Error::Installation(format!(
                "Automation server not found and no installer configured. Tried: {:?}",
                self.candidates
            ))
        })?;

        let target = self.install_target()?;
        tracing::info!("Automation server missing, installing to {:?}", target);

        installer
            .install(&target)
            .await
            .map_err(|e| Error::Installation(format!("{:#}", e)))?;

        self.locate().ok_or_else(|| {
            Error::Installation(format!(
                "Automation server still missing after install. Tried: {:?}",
                self.candidates
            ))
        })
    }

    /// Where an install lands: the user-local candidate if there is one
    fn install_target(&self) -> Result<PathBuf> {
        let user_dir = user_install_dir();
        self.candidates
            .iter()
            .find(|c| user_dir.as_ref().is_some_and(|d| c.starts_with(d)))
            .or_else(|| self.candidates.first())
            .cloned()
            .ok_or_else(|| Error::Installation("No install location available".to_string()))
    }

    fn is_usable(&self, path: &Path) -> bool {
        if !is_executable(path) {
            return false;
        }
        match self.expected_version {
            None => true,
            Some(ref expected) => match read_version_marker(path) {
                Some(found) if &found == expected => true,
                found => {
                    tracing::debug!(
                        "Ignoring {:?}: version {:?}, expected {}",
                        path,
                        found,
                        expected
                    );
                    false
                }
            },
        }
    }
}

impl Default for ServerLocator {
    fn default() -> Self {
        Self::with_default_locations(None)
    }
}

fn user_install_dir() -> Option<PathBuf> {
    Some(dirs::data_local_dir()?.join(INSTALL_DIR_NAME).join("server"))
}

fn is_executable(path: &Path) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

fn version_marker_path(binary: &Path) -> PathBuf {
    binary.with_file_name(VERSION_FILE)
}

fn read_version_marker(binary: &Path) -> Option<String> {
    std::fs::read_to_string(version_marker_path(binary))
        .ok()
        .map(|s| s.trim().to_string())
}

pub(crate) async fn write_version_marker(binary: &Path, version: &str) -> anyhow::Result<()> {
    tokio::fs::write(version_marker_path(binary), version).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn make_executable(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"#!/bin/sh\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
    }

    struct FakeInstaller {
        calls: AtomicUsize,
        produce: bool,
    }

    #[async_trait]
    impl Installer for FakeInstaller {
        async fn install(&self, target: &Path) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.produce {
                make_executable(target);
            }
            Ok(())
        }
    }

    #[test]
    fn test_locate_returns_first_present_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a").join(SERVER_BINARY_NAME);
        let second = dir.path().join("b").join(SERVER_BINARY_NAME);
        make_executable(&second);

        let locator = ServerLocator::new(vec![first.clone(), second.clone()]);
        assert_eq!(locator.locate(), Some(second));

        make_executable(&first);
        assert_eq!(locator.locate(), Some(first));
        assert!(locator.is_installed());
    }

    #[test]
    fn test_directories_are_not_executables() {
        let dir = tempfile::tempdir().unwrap();
        let locator = ServerLocator::new(vec![dir.path().to_path_buf()]);
        assert_eq!(locator.locate(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_executable_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SERVER_BINARY_NAME);
        std::fs::write(&path, b"data").unwrap();
        assert!(!ServerLocator::new(vec![path]).is_installed());
    }

    #[test]
    fn test_version_mismatch_counts_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SERVER_BINARY_NAME);
        make_executable(&path);
        std::fs::write(dir.path().join(VERSION_FILE), "1.0.0\n").unwrap();

        let locator = ServerLocator::new(vec![path.clone()]);
        assert!(locator.clone().with_expected_version("1.0.0").is_installed());
        assert!(!locator.with_expected_version("2.0.0").is_installed());
    }

    #[tokio::test]
    async fn test_ensure_installed_skips_installer_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SERVER_BINARY_NAME);
        make_executable(&path);

        let installer = Arc::new(FakeInstaller {
            calls: AtomicUsize::new(0),
            produce: true,
        });
        let locator = ServerLocator::new(vec![path.clone()]).with_installer(installer.clone());

        assert_eq!(locator.ensure_installed().await.unwrap(), path);
        assert_eq!(installer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ensure_installed_runs_installer_once_on_miss() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("install").join(SERVER_BINARY_NAME);

        let installer = Arc::new(FakeInstaller {
            calls: AtomicUsize::new(0),
            produce: true,
        });
        let locator = ServerLocator::new(vec![path.clone()]).with_installer(installer.clone());

        assert_eq!(locator.ensure_installed().await.unwrap(), path);
        assert_eq!(installer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ensure_installed_fails_when_install_produces_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let installer = Arc::new(FakeInstaller {
            calls: AtomicUsize::new(0),
            produce: false,
        });
        let locator = ServerLocator::new(vec![dir.path().join(SERVER_BINARY_NAME)])
            .with_installer(installer);

        let err = locator.ensure_installed().await.unwrap_err();
        assert!(matches!(err, Error::Installation(_)));
    }

    #[tokio::test]
    async fn test_ensure_installed_without_installer() {
        let dir = tempfile::tempdir().unwrap();
        let locator = ServerLocator::new(vec![dir.path().join(SERVER_BINARY_NAME)]);
        let err = locator.ensure_installed().await.unwrap_err();
        assert!(matches!(err, Error::Installation(_)));
    }
}
