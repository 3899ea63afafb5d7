//! OS capabilities the update strategies depend on.
//!
//! Code-signing verification and temp-file marking only exist on Windows.
//! Other platforms get an implementation that reports them as unsupported,
//! so strategies never check for a missing capability themselves.

use anyhow::Result;
use std::path::Path;

#[cfg(windows)]
use crate::utils::command::SystemCommand;

/// Privilege and file-level capabilities of the host OS.
#[allow(async_fn_in_trait)]
pub trait PlatformCapabilities {
    /// Whether the process can modify system-wide installed software.
    async fn is_elevated(&self) -> bool;

    /// Verifies the operating-system code signature of `path`.
    async fn verify_signature(&self, path: &Path) -> Result<()>;

    /// Marks `path` as temporary so backup and indexing tools skip it.
    async fn mark_temp_file(&self, path: &Path) -> Result<()>;
}

/// Capabilities on Unix-like systems: effective-uid check only.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct UnixCapabilities;

#[cfg(unix)]
impl PlatformCapabilities for UnixCapabilities {
    async fn is_elevated(&self) -> bool {
        // SAFETY: geteuid has no preconditions and cannot fail.
        unsafe { libc::geteuid() == 0 }
    }

    async fn verify_signature(&self, _path: &Path) -> Result<()> {
        Err(unsupported("code-signing verification"))
    }

    async fn mark_temp_file(&self, _path: &Path) -> Result<()> {
        Err(unsupported("temporary file marking"))
    }
}

#[cfg(unix)]
fn unsupported(capability: &str) -> anyhow::Error {
    crate::core::UpdateError::PlatformUnsupported {
        reason: format!("{capability} is only available on Windows"),
        docs_url: crate::update::dispatch::CLIENT_UPDATES_URL.to_string(),
    }
    .into()
}

/// Capabilities on Windows, backed by built-in system tools.
#[cfg(windows)]
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsCapabilities;

#[cfg(windows)]
impl PlatformCapabilities for WindowsCapabilities {
    async fn is_elevated(&self) -> bool {
        // `net session` only succeeds from an elevated process.
        SystemCommand::new("net").arg("session").execute_success().await.is_ok()
    }

    async fn verify_signature(&self, path: &Path) -> Result<()> {
        let literal = path.display().to_string().replace('\'', "''");
        let status = SystemCommand::new("powershell.exe")
            .args(["-NoProfile", "-NonInteractive", "-Command"])
            .arg(format!("(Get-AuthenticodeSignature -LiteralPath '{literal}').Status"))
            .execute_stdout()
            .await?;
        if status.trim() != "Valid" {
            return Err(crate::core::UpdateError::Integrity {
                reason: format!("authenticode status of {} is {:?}", path.display(), status.trim()),
            }
            .into());
        }
        Ok(())
    }

    async fn mark_temp_file(&self, path: &Path) -> Result<()> {
        SystemCommand::new("attrib").arg("+I").arg(path.display().to_string()).execute_success().await
    }
}

/// Capabilities of the platform this binary was built for.
#[cfg(unix)]
pub type NativeCapabilities = UnixCapabilities;

/// Capabilities of the platform this binary was built for.
#[cfg(windows)]
pub type NativeCapabilities = WindowsCapabilities;
