use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::info;

use crate::core::UpdateError;
use crate::update::capabilities::PlatformCapabilities;
use crate::update::download::Downloader;
use crate::update::fetch::Fetch;
use crate::update::handoff::{self, MsiNaming};
use crate::update::{UpdateOutcome, Updater};

impl<F: Fetch, C: PlatformCapabilities> Updater<F, C> {
    /// Downloads and verifies the MSI, then hands it to a copy of this
    /// executable. The caller must exit on [`UpdateOutcome::HandedOff`].
    pub(crate) async fn update_windows(&mut self) -> Result<UpdateOutcome> {
        let version = self.target_version().await?;
        let naming = MsiNaming {
            base_url: self.config.distribution.base_url(),
            package: &self.config.distribution.package,
            arch: &self.arch,
        };
        let url = naming.url(self.track, &version);

        if let Some(outcome) = self.current_or_dry_run(&version) {
            return Ok(outcome);
        }
        self.require_elevation().await?;

        let data_dir = data_dir(
            std::env::var_os("ProgramData"),
            &self.config.distribution.display_name,
        )?;
        let metadata = tokio::fs::metadata(&data_dir)
            .await
            .with_context(|| format!("expected {} to exist", data_dir.display()))?;
        if !metadata.is_dir() {
            return Err(UpdateError::FileSystem {
                operation: "use data directory, which is not a directory".to_string(),
                path: data_dir.display().to_string(),
            }
            .into());
        }
        let msi_dir = data_dir.join("MSICache");
        tokio::fs::create_dir_all(&msi_dir).await.map_err(|_| UpdateError::FileSystem {
            operation: "create MSI cache directory".to_string(),
            path: msi_dir.display().to_string(),
        })?;

        self.confirm(&version)?;

        let file_name = url.rsplit('/').next().unwrap_or(&url);
        let msi = msi_dir.join(file_name);
        Downloader::new(
            &self.fetcher,
            self.config.network.metadata_timeout(),
            self.config.download.progress_interval(),
        )
        .download(&url, &msi)
        .await?;

        info!("verifying MSI authenticode...");
        self.caps
            .verify_signature(&msi)
            .await
            .with_context(|| format!("authenticode verification of {} failed", msi.display()))?;
        info!("authenticode verification succeeded");

        info!("making executable copy to switch to...");
        let self_copy = handoff::make_self_copy(&self.caps).await?;
        info!("running executable copy for final install...");
        handoff::spawn_installer_child(&self_copy, &msi)?;

        Ok(UpdateOutcome::HandedOff)
    }
}

/// `%ProgramData%\<display_name>`.
fn data_dir(program_data: Option<OsString>, display_name: &str) -> Result<PathBuf> {
    match program_data {
        Some(root) if !root.is_empty() => Ok(PathBuf::from(root).join(display_name)),
        _ => Err(UpdateError::FileSystem {
            operation: "locate data directory, ProgramData is not set".to_string(),
            path: display_name.to_string(),
        }
        .into()),
    }
}
