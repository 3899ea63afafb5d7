use anyhow::Result;

use crate::core::{UpdateError, with_remediation};
use crate::update::capabilities::PlatformCapabilities;
use crate::update::fetch::Fetch;
use crate::update::{UpdateOutcome, Updater};
use crate::utils::command::SystemCommand;
use crate::utils::progress::spinner_with_message;

impl<F: Fetch, C: PlatformCapabilities> Updater<F, C> {
    /// Arch family. pacman itself knows the latest version, and Arch ships
    /// a single variant, so explicit tracks and versions are rejected.
    ///
    /// Elevation comes first because refreshing the package database
    /// already needs root.
    pub(crate) async fn update_pacman(&mut self) -> Result<UpdateOutcome> {
        if self.request.pins_release() {
            return Err(UpdateError::validation(
                "--track and --version are not supported on Arch-based installs",
            )
            .into());
        }
        self.require_elevation().await?;

        let remediation = format!("pacman --sync --refresh {}", self.config.distribution.package);
        let result = self.update_pacman_inner().await;
        with_remediation(result, &remediation)
    }

    async fn update_pacman_inner(&mut self) -> Result<UpdateOutcome> {
        let package = self.config.distribution.package.clone();

        let spinner = spinner_with_message("Checking pacman for the latest version...");
        let info = SystemCommand::new("pacman")
            .args(["--sync", "--refresh", "--info"])
            .arg(&package)
            .execute()
            .await;
        spinner.finish_and_clear();

        let version = parse_pacman_version(&info?.combined())?;
        if let Some(outcome) = self.current_or_dry_run(&version) {
            return Ok(outcome);
        }
        self.confirm(&version)?;

        SystemCommand::new("pacman")
            .args(["--sync", "--noconfirm"])
            .arg(&package)
            .stream_output()
            .execute_success()
            .await?;

        Ok(UpdateOutcome::Updated {
            version,
        })
    }
}

/// Extracts the version from `pacman --sync --info` output.
///
/// The relevant line looks like `Version         : 1.44.2-1`; the Arch
/// package release after `-` is dropped.
fn parse_pacman_version(output: &str) -> Result<String> {
    let Some(line) = output.lines().find(|line| line.starts_with("Version")) else {
        return Err(UpdateError::Other {
            message: "could not find latest version via pacman".to_string(),
        }
        .into());
    };
    let version = line
        .split_once(':')
        .map(|(_, value)| value.trim())
        .and_then(|value| value.split('-').next())
        .unwrap_or_default();
    if version.is_empty() {
        return Err(UpdateError::Other {
            message: format!(
                "version output from pacman is malformed: {line:?}, cannot determine upgrade version"
            ),
        }
        .into());
    }
    Ok(version.to_string())
}
