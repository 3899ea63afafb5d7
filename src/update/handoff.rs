//! Windows installer handoff.
//!
//! A running executable cannot be overwritten, so the Windows update runs
//! in two phases:
//!
//! 1. The ordinary `update` command downloads and verifies the MSI, copies
//!    its own executable to a temporary path, and starts that copy with the
//!    MSI path in [`WIN_MSI_ENV`]. The parent exits as soon as the child
//!    has started.
//! 2. The copy sees [`WIN_MSI_ENV`] at startup, before any argument
//!    parsing, and runs `msiexec` directly via [`run_pending_install`].
//!
//! Nothing is persisted between the phases other than the environment
//! variable. If the child dies the operator has to re-run the command.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tracing::info;

use crate::config::UpdateConfig;
use crate::update::Track;
use crate::update::capabilities::PlatformCapabilities;
use crate::utils::command::SystemCommand;
use crate::utils::platform::arch_name;

/// Carries the absolute path of the downloaded MSI to the child process.
pub const WIN_MSI_ENV: &str = "TS_UPDATE_WIN_MSI";

/// Overrides the version uninstalled before the downgrade retry.
pub const UNINSTALL_VERSION_ENV: &str = "TS_DEBUG_UNINSTALL_VERSION";

const SELF_COPY_PREFIX: &str = "tsupdate-updater-";

const MSIEXEC: &str = "msiexec.exe";

/// Everything needed to name an MSI on the package server.
#[derive(Debug, Clone, Copy)]
pub struct MsiNaming<'a> {
    pub base_url: &'a str,
    pub package: &'a str,
    /// Server architecture name, e.g. `amd64` or `x86`
    pub arch: &'a str,
}

impl MsiNaming<'_> {
    /// `<base>/<track>/<pkg>-setup-<version>-<arch>.msi`
    #[must_use]
    pub fn url(&self, track: Track, version: &str) -> String {
        format!(
            "{}/{}/{}-setup-{}-{}.msi",
            self.base_url, track, self.package, version, self.arch
        )
    }

    /// Windows Installer product code of an installed `version`.
    ///
    /// The code is a name-based (SHA-1) UUID of the MSI's URL, upper-cased
    /// and wrapped in braces. A version whose track cannot be inferred is
    /// looked up on the unstable track.
    #[must_use]
    pub fn product_code(&self, version: &str) -> String {
        let track = Track::of_version(version).unwrap_or(Track::Unstable);
        let url = self.url(track, version);
        let id = uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_URL, url.as_bytes());
        format!("{{{}}}", id.to_string().to_uppercase())
    }
}

/// The MSI handed over by a parent process, if this is the child phase.
#[must_use]
pub fn pending_installer() -> Option<PathBuf> {
    std::env::var_os(WIN_MSI_ENV).filter(|value| !value.is_empty()).map(PathBuf::from)
}

/// Phase two: installs the MSI named by [`WIN_MSI_ENV`].
///
/// Returns `None` when no handoff is pending and normal command dispatch
/// should continue.
pub async fn run_pending_install(config: &UpdateConfig) -> Option<Result<()>> {
    let msi = pending_installer()?;
    let naming = MsiNaming {
        base_url: config.distribution.base_url(),
        package: &config.distribution.package,
        arch: arch_name(),
    };
    let current = std::env::var(UNINSTALL_VERSION_ENV)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    info!("installing {} ...", msi.display());
    let result = install_msi(&msi, naming, &current).await;
    match &result {
        Ok(()) => info!("success."),
        Err(e) => tracing::error!("MSI install failed: {:#}", e),
    }
    Some(result)
}

/// Installs `msi`, retrying once after uninstalling `current_version`.
///
/// `msiexec` refuses to downgrade in place, so a failed first attempt is
/// treated as a downgrade: the installed version is removed and the install
/// is attempted a second and last time.
///
/// # Errors
///
/// The error of the second install attempt.
pub async fn install_msi(msi: &Path, naming: MsiNaming<'_>, current_version: &str) -> Result<()> {
    install_msi_with(MSIEXEC, msi, naming, current_version).await
}

async fn install_msi_with(
    msiexec: &str,
    msi: &Path,
    naming: MsiNaming<'_>,
    current_version: &str,
) -> Result<()> {
    let Some(file_name) = msi.file_name() else {
        return Err(crate::core::UpdateError::validation(format!(
            "installer path {} has no file name",
            msi.display()
        ))
        .into());
    };
    let dir = msi.parent().unwrap_or_else(|| Path::new("."));
    let install = || {
        SystemCommand::new(msiexec)
            .arg("/i")
            .arg(file_name.to_string_lossy())
            .args(["/quiet", "/promptrestart", "/qn"])
            .current_dir(dir)
            .stream_output()
    };

    let Err(first) = install().execute_success().await else {
        return Ok(());
    };
    tracing::warn!("msiexec install failed: {:#}", first);

    info!("Uninstalling current version {:?} for downgrade...", current_version);
    let uninstall = SystemCommand::new(msiexec)
        .arg("/x")
        .arg(naming.product_code(current_version))
        .args(["/norestart", "/qn"])
        .stream_output()
        .execute_success()
        .await;
    match uninstall {
        Ok(()) => info!("msiexec uninstall: ok"),
        Err(e) => tracing::warn!("msiexec uninstall: {:#}", e),
    }

    install().execute_success().await
}

/// Copies the running executable to a fresh temporary `.exe`.
///
/// The copy is marked as temporary and left in place after the parent
/// exits, since the child is running from it.
pub async fn make_self_copy<C: PlatformCapabilities>(caps: &C) -> Result<PathBuf> {
    let self_exe = std::env::current_exe().context("Failed to locate the running executable")?;
    let temp = tempfile::Builder::new()
        .prefix(SELF_COPY_PREFIX)
        .suffix(".exe")
        .tempfile()
        .context("Failed to create temporary executable")?;
    let (_, path) = temp.keep().context("Failed to keep temporary executable")?;

    caps.mark_temp_file(&path).await?;
    tokio::fs::copy(&self_exe, &path)
        .await
        .with_context(|| format!("Failed to copy {} to {}", self_exe.display(), path.display()))?;
    Ok(path)
}

/// Starts `self_copy update` with the MSI path in [`WIN_MSI_ENV`].
///
/// The child's stdout goes to this process's stderr; stdin is shared.
pub fn spawn_installer_child(self_copy: &Path, msi: &Path) -> Result<()> {
    std::process::Command::new(self_copy)
        .arg("update")
        .env(WIN_MSI_ENV, msi)
        .stdin(Stdio::inherit())
        .stdout(Stdio::from(std::io::stderr()))
        .stderr(Stdio::inherit())
        .spawn()
        .with_context(|| format!("Failed to start {}", self_copy.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMING: MsiNaming<'static> = MsiNaming {
        base_url: "https://pkgs.tailscale.com",
        package: "tailscale",
        arch: "amd64",
    };

    #[test]
    fn test_msi_url() {
        assert_eq!(
            NAMING.url(Track::Stable, "1.44.0"),
            "https://pkgs.tailscale.com/stable/tailscale-setup-1.44.0-amd64.msi"
        );
    }

    #[test]
    fn test_product_code_shape() {
        let code = NAMING.product_code("1.44.0");
        assert_eq!(code.len(), 38);
        assert!(code.starts_with('{') && code.ends_with('}'));
        assert_eq!(code, code.to_uppercase());

        let expected = uuid::Uuid::new_v5(
            &uuid::Uuid::NAMESPACE_URL,
            b"https://pkgs.tailscale.com/stable/tailscale-setup-1.44.0-amd64.msi",
        );
        assert_eq!(code, format!("{{{}}}", expected.to_string().to_uppercase()));
    }

    #[test]
    fn test_product_code_depends_on_track_and_arch() {
        assert_ne!(NAMING.product_code("1.44.0"), NAMING.product_code("1.45.0"));
        let x86 = MsiNaming {
            arch: "x86",
            ..NAMING
        };
        assert_ne!(NAMING.product_code("1.44.0"), x86.product_code("1.44.0"));

        // Unknown stability falls back to the unstable URL.
        let expected = uuid::Uuid::new_v5(
            &uuid::Uuid::NAMESPACE_URL,
            b"https://pkgs.tailscale.com/unstable/tailscale-setup-dev-amd64.msi",
        );
        assert_eq!(NAMING.product_code("dev"), format!("{{{}}}", expected.to_string().to_uppercase()));
    }

    #[cfg(unix)]
    fn fake_msiexec(dir: &Path, exit_code: i32) -> (PathBuf, PathBuf) {
        use std::os::unix::fs::PermissionsExt;

        let log = dir.join("msiexec.log");
        let script = dir.join("msiexec.sh");
        std::fs::write(
            &script,
            format!("#!/bin/sh\necho \"$@\" >> '{}'\nexit {exit_code}\n", log.display()),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        (script, log)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_install_failure_uninstalls_and_retries_once() {
        let temp = tempfile::TempDir::new().unwrap();
        let (msiexec, log) = fake_msiexec(temp.path(), 1);
        let msi = temp.path().join("tailscale-setup-1.44.0-amd64.msi");

        let err = install_msi_with(&msiexec.to_string_lossy(), &msi, NAMING, "1.46.2")
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::core::UpdateError>(),
            Some(crate::core::UpdateError::Subprocess { .. })
        ));

        let calls = std::fs::read_to_string(&log).unwrap();
        let install = "/i tailscale-setup-1.44.0-amd64.msi /quiet /promptrestart /qn";
        let uninstall = format!("/x {} /norestart /qn", NAMING.product_code("1.46.2"));
        assert_eq!(calls.lines().collect::<Vec<_>>(), [install, uninstall.as_str(), install]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_install_runs_once() {
        let temp = tempfile::TempDir::new().unwrap();
        let (msiexec, log) = fake_msiexec(temp.path(), 0);
        let msi = temp.path().join("tailscale-setup-1.46.2-amd64.msi");

        install_msi_with(&msiexec.to_string_lossy(), &msi, NAMING, "1.44.0").await.unwrap();

        let calls = std::fs::read_to_string(&log).unwrap();
        assert_eq!(calls, "/i tailscale-setup-1.46.2-amd64.msi /quiet /promptrestart /qn\n");
    }
}
