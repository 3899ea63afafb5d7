//! Platform dispatch.
//!
//! [`PlatformFacts::detect`] gathers everything the choice depends on once
//! at startup; [`select_strategy`] is a pure function of those facts, so the
//! whole decision table is testable on any host.

use anyhow::Result;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use crate::core::UpdateError;
use crate::utils::platform::command_exists;

/// Documentation pointer for platforms with no update path.
pub const CLIENT_UPDATES_URL: &str = "https://tailscale.com/s/client-updates";

/// Documentation pointer for macOS installs outside the App Store.
pub const MACOS_TAILSCALED_URL: &str =
    "https://github.com/tailscale/tailscale/wiki/Tailscaled-on-macOS/";

/// Suffix of `$HOME` inside the macOS system-extension container.
const MACSYS_HOME_SUFFIX: &str = "/io.tailscale.ipn.macsys/Data";

/// Package managers probed on Linux when the distribution declares none,
/// highest priority first.
pub const PROBE_ORDER: &[&str] = &["pacman", "apt-get", "dnf", "yum"];

/// Operating system family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Os {
    Linux,
    MacOs,
    Windows,
    Other(String),
}

impl Os {
    /// The OS this binary was compiled for.
    #[must_use]
    pub fn current() -> Self {
        match std::env::consts::OS {
            "linux" => Self::Linux,
            "macos" => Self::MacOs,
            "windows" => Self::Windows,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Linux distributions with a declared package manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distro {
    /// Debian, Ubuntu and derivatives
    Debian,
    /// Arch and derivatives
    Arch,
    /// Synology DSM
    Synology,
}

impl Distro {
    /// Maps `/etc/os-release` content to a known distribution.
    ///
    /// `ID` is checked before `ID_LIKE`.
    #[must_use]
    pub fn from_os_release(content: &str) -> Option<Self> {
        let mut id = None;
        let mut id_like = None;
        for line in content.lines() {
            if let Some((key, value)) = line.split_once('=') {
                let value = value.trim().trim_matches('"').trim_matches('\'');
                match key.trim() {
                    "ID" => id = Some(value.to_string()),
                    "ID_LIKE" => id_like = Some(value.to_string()),
                    _ => {}
                }
            }
        }

        let classify = |name: &str| match name {
            "debian" | "ubuntu" => Some(Self::Debian),
            "arch" | "archlinux" | "manjaro" | "endeavouros" => Some(Self::Arch),
            _ => None,
        };

        id.as_deref()
            .and_then(classify)
            .or_else(|| id_like.as_deref()?.split_whitespace().find_map(classify))
    }

    /// Detects the distribution from marker files under `root`.
    pub async fn detect(root: &Path) -> Option<Self> {
        if root.join("etc.defaults/VERSION").exists() {
            return Some(Self::Synology);
        }
        if let Ok(content) = tokio::fs::read_to_string(root.join("etc/os-release")).await {
            if let Some(distro) = Self::from_os_release(&content) {
                return Some(distro);
            }
        }
        if root.join("etc/debian_version").exists() {
            return Some(Self::Debian);
        }
        if root.join("etc/arch-release").exists() {
            return Some(Self::Arch);
        }
        None
    }
}

/// Everything the strategy choice depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformFacts {
    pub os: Os,
    /// Declared distribution (Linux only)
    pub distro: Option<Distro>,
    /// Probed package-manager executables found on the search path
    pub executables: BTreeSet<String>,
    /// The binary runs from inside a macOS application bundle
    pub sandboxed_macos: bool,
    /// The binary runs inside the macOS system-extension container
    pub macsys: bool,
}

impl PlatformFacts {
    /// Inspects the running system.
    pub async fn detect() -> Self {
        let os = Os::current();
        let distro = match os {
            Os::Linux => Distro::detect(Path::new("/")).await,
            _ => None,
        };
        let executables = match os {
            Os::Linux => PROBE_ORDER
                .iter()
                .filter(|name| command_exists(name))
                .map(|name| (*name).to_string())
                .collect(),
            _ => BTreeSet::new(),
        };
        let sandboxed_macos = os == Os::MacOs
            && std::env::current_exe()
                .map(|exe| exe.to_string_lossy().contains(".app/Contents/"))
                .unwrap_or(false);
        let macsys = os == Os::MacOs
            && std::env::var("HOME").is_ok_and(|home| home.ends_with(MACSYS_HOME_SUFFIX));

        let facts = Self {
            os,
            distro,
            executables,
            sandboxed_macos,
            macsys,
        };
        tracing::debug!("Detected platform: {:?}", facts);
        facts
    }
}

/// RPM-family package manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpmTool {
    Dnf,
    Yum,
}

impl RpmTool {
    #[must_use]
    pub const fn command(self) -> &'static str {
        match self {
            Self::Dnf => "dnf",
            Self::Yum => "yum",
        }
    }
}

/// How this system gets updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStrategy {
    Apt,
    RpmLike(RpmTool),
    Pacman,
    Synology,
    MacSys,
    MacAppStore,
    Windows,
}

impl fmt::Display for UpdateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apt => f.write_str("apt"),
            Self::RpmLike(tool) => f.write_str(tool.command()),
            Self::Pacman => f.write_str("pacman"),
            Self::Synology => f.write_str("synology"),
            Self::MacSys => f.write_str("macOS system extension"),
            Self::MacAppStore => f.write_str("macOS App Store"),
            Self::Windows => f.write_str("windows msi"),
        }
    }
}

/// Picks the update strategy for `facts`.
///
/// On Linux a declared distribution wins; otherwise the first executable of
/// [`PROBE_ORDER`] that is present is used.
///
/// # Errors
///
/// [`UpdateError::PlatformUnsupported`] when no strategy applies.
pub fn select_strategy(facts: &PlatformFacts, app_store_requested: bool) -> Result<UpdateStrategy> {
    match &facts.os {
        Os::Linux => {
            if let Some(distro) = facts.distro {
                return Ok(match distro {
                    Distro::Debian => UpdateStrategy::Apt,
                    Distro::Arch => UpdateStrategy::Pacman,
                    Distro::Synology => UpdateStrategy::Synology,
                });
            }
            PROBE_ORDER
                .iter()
                .find(|name| facts.executables.contains(**name))
                .map(|name| match *name {
                    "pacman" => UpdateStrategy::Pacman,
                    "apt-get" => UpdateStrategy::Apt,
                    "dnf" => UpdateStrategy::RpmLike(RpmTool::Dnf),
                    _ => UpdateStrategy::RpmLike(RpmTool::Yum),
                })
                .ok_or_else(|| unsupported("no supported package manager found"))
        }
        Os::MacOs => {
            if !app_store_requested && !facts.sandboxed_macos {
                return Err(UpdateError::PlatformUnsupported {
                    reason: "only App Store installs of macOS can be updated this way".to_string(),
                    docs_url: MACOS_TAILSCALED_URL.to_string(),
                }
                .into());
            }
            if !app_store_requested && facts.macsys {
                Ok(UpdateStrategy::MacSys)
            } else {
                Ok(UpdateStrategy::MacAppStore)
            }
        }
        Os::Windows => Ok(UpdateStrategy::Windows),
        Os::Other(name) => Err(unsupported(&format!("unsupported operating system {name:?}"))),
    }
}

fn unsupported(reason: &str) -> anyhow::Error {
    UpdateError::PlatformUnsupported {
        reason: reason.to_string(),
        docs_url: CLIENT_UPDATES_URL.to_string(),
    }
    .into()
}
