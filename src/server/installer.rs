use anyhow::Context;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Puts the server binary in place when no install is found.
#[async_trait]
pub trait Installer: Send + Sync {
    /// Install the server executable at `target`.
    async fn install(&self, target: &Path) -> anyhow::Result<()>;
}

/// Fetches the server executable from a fixed URL
pub struct DownloadInstaller {
    url: String,
    version: Option<String>,
    client: reqwest::Client,
}

impl DownloadInstaller {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            version: None,
            client: reqwest::Client::new(),
        }
    }

    /// Record `version` beside the binary so the locator can check it
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

#[async_trait]
impl Installer for DownloadInstaller {
    async fn install(&self, target: &Path) -> anyhow::Result<()> {
        tracing::info!("Downloading automation server from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .timeout(Duration::from_secs(300))
            .send()
            .await
            .with_context(|| format!("Failed to download {}", self.url))?
            .error_for_status()
            .context("Server download rejected")?;

        let bytes = response.bytes().await.context("Failed to read download")?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }
        tokio::fs::write(target, &bytes)
            .await
            .with_context(|| format!("Failed to write {:?}", target))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(target, std::fs::Permissions::from_mode(0o755))
                .await
                .context("Failed to mark server executable")?;
        }

        if let Some(ref version) = self.version {
            super::locator::write_version_marker(target, version).await?;
        }

        tracing::info!("Installed automation server at {:?} ({} bytes)", target, bytes.len());
        Ok(())
    }
}
