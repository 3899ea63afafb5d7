//! Self-update orchestration for the Tailscale client.
//!
//! # Architecture Overview
//!
//! An update runs strictly in sequence:
//!
//! ```text
//! 1. Request validation      (UpdateRequest::validate, before any I/O)
//! 2. Track resolution        (track::resolve_track)
//! 3. Strategy selection      (dispatch::select_strategy, once at startup)
//! 4. Strategy execution      (strategies::*)
//!    ├── version resolution  (version_check::VersionResolver)
//!    ├── up-to-date / dry-run short-circuit
//!    ├── elevation check     (capabilities::PlatformCapabilities)
//!    ├── source rewrite      (sources::apt / sources::yum)
//!    ├── confirmation        (confirm::confirm)
//!    └── install             (package manager, or download + handoff)
//! ```
//!
//! ## Core Components
//!
//! - [`Updater`]: carries the request, resolved track, and injected
//!   collaborators through one strategy run
//! - [`dispatch`]: pure selection of an [`UpdateStrategy`] from detected
//!   [`PlatformFacts`]
//! - [`sources`]: idempotent rewriting of apt and yum source files
//! - [`download`]: length-bounded, SHA-256 verified artifact downloads
//! - [`handoff`]: the two-phase Windows installer protocol
//!
//! Network access goes through [`fetch::Fetch`] and OS capabilities through
//! [`capabilities::PlatformCapabilities`], so every step up to the actual
//! package-manager invocation can run in tests.

pub mod capabilities;
pub mod confirm;
pub mod dispatch;
pub mod download;
pub mod fetch;
pub mod handoff;
pub mod request;
pub mod sources;
mod strategies;
pub mod track;
pub mod verification;
pub mod version_check;


use anyhow::Result;

pub use capabilities::{NativeCapabilities, PlatformCapabilities};
pub use confirm::{Prompt, StdinPrompt};
pub use dispatch::{Distro, Os, PlatformFacts, RpmTool, UpdateStrategy, select_strategy};
pub use fetch::{Fetch, HttpFetcher};
pub use request::UpdateRequest;
pub use track::{BuildInfo, Track, resolve_track};
pub use version_check::VersionResolver;

use crate::config::UpdateConfig;
use crate::core::UpdateError;
use crate::utils::platform::{ADMIN_REQUIRED_MESSAGE, arch_name, os_name, root_required_message};

/// How a strategy run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The running version already is the target
    AlreadyCurrent,
    /// `--dry-run`: the target was reported and nothing changed
    DryRun { current: String, latest: String },
    /// The package manager reported no candidate
    NoUpdateAvailable,
    /// The target version was installed
    Updated { version: String },
    /// The installer child is running; the caller must exit now
    HandedOff,
}

/// Runs one update with injected network and OS collaborators.
///
/// # Examples
///
/// ```rust,no_run
/// use tsupdate::config::UpdateConfig;
/// use tsupdate::update::{
///     BuildInfo, HttpFetcher, NativeCapabilities, PlatformFacts, UpdateRequest, Updater,
///     select_strategy,
/// };
///
/// # async fn example() -> anyhow::Result<()> {
/// let request = UpdateRequest::default();
/// let strategy = select_strategy(&PlatformFacts::detect().await, request.app_store_only)?;
/// let mut updater = Updater::new(
///     request,
///     BuildInfo::current(),
///     strategy,
///     UpdateConfig::default(),
///     HttpFetcher::new()?,
///     NativeCapabilities::default(),
/// )?;
/// updater.update().await?;
/// # Ok(())
/// # }
/// ```
pub struct Updater<F, C> {
    request: UpdateRequest,
    track: Track,
    build: BuildInfo,
    strategy: UpdateStrategy,
    config: UpdateConfig,
    fetcher: F,
    caps: C,
    prompt: Box<dyn Prompt>,
    os: String,
    arch: String,
}

impl<F: Fetch, C: PlatformCapabilities> Updater<F, C> {
    /// Validates `request` and resolves its track.
    ///
    /// # Errors
    ///
    /// [`UpdateError::Validation`] for conflicting flags, an unknown track,
    /// or a malformed explicit version. No I/O happens before this check.
    pub fn new(
        request: UpdateRequest,
        build: BuildInfo,
        strategy: UpdateStrategy,
        config: UpdateConfig,
        fetcher: F,
        caps: C,
    ) -> Result<Self> {
        request.validate()?;
        let track = resolve_track(&request, &build)?;
        Ok(Self {
            request,
            track,
            build,
            strategy,
            config,
            fetcher,
            caps,
            prompt: Box::new(StdinPrompt),
            os: os_name().to_string(),
            arch: arch_name().to_string(),
        })
    }

    /// Replaces the stdin prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: Box<dyn Prompt>) -> Self {
        self.prompt = prompt;
        self
    }

    /// Overrides the package-server OS and architecture names.
    #[must_use]
    pub fn with_platform(mut self, os: impl Into<String>, arch: impl Into<String>) -> Self {
        self.os = os.into();
        self.arch = arch.into();
        self
    }

    #[must_use]
    pub const fn track(&self) -> Track {
        self.track
    }

    #[must_use]
    pub const fn strategy(&self) -> UpdateStrategy {
        self.strategy
    }

    /// Runs the selected strategy.
    pub async fn update(&mut self) -> Result<UpdateOutcome> {
        tracing::debug!("Updating via {} on the {} track", self.strategy, self.track);
        match self.strategy {
            UpdateStrategy::Apt => self.update_apt().await,
            UpdateStrategy::RpmLike(tool) => self.update_rpm(tool).await,
            UpdateStrategy::Pacman => self.update_pacman().await,
            UpdateStrategy::Synology => Err(not_implemented("Synology")),
            UpdateStrategy::MacSys => Err(not_implemented("macOS")),
            UpdateStrategy::MacAppStore => self.update_mac_app_store().await,
            UpdateStrategy::Windows => self.update_windows().await,
        }
    }

    fn resolver(&self) -> VersionResolver<'_, F> {
        VersionResolver::new(
            &self.fetcher,
            self.config.distribution.base_url(),
            &self.os,
            self.config.network.metadata_timeout(),
        )
    }

    /// Explicit version, or the latest on the resolved track.
    async fn target_version(&self) -> Result<String> {
        self.resolver().resolve(self.request.explicit_version.as_deref(), self.track).await
    }

    /// Reports and returns the outcome when nothing should be installed.
    fn current_or_dry_run(&self, target: &str) -> Option<UpdateOutcome> {
        if self.build.version == target {
            println!("already running {target}; no update needed");
            return Some(UpdateOutcome::AlreadyCurrent);
        }
        if self.request.dry_run {
            println!("Current: {}, Latest: {}", self.build.version, target);
            return Some(UpdateOutcome::DryRun {
                current: self.build.version.clone(),
                latest: target.to_string(),
            });
        }
        None
    }

    async fn require_elevation(&self) -> Result<()> {
        if self.caps.is_elevated().await {
            return Ok(());
        }
        let message = if self.os == "windows" {
            ADMIN_REQUIRED_MESSAGE
        } else {
            root_required_message(&self.os)
        };
        Err(UpdateError::PermissionDenied {
            message: message.to_string(),
        }
        .into())
    }

    fn confirm(&mut self, target: &str) -> Result<()> {
        confirm::confirm(
            self.prompt.as_mut(),
            self.request.non_interactive,
            &self.config.distribution.display_name,
            &self.build.version,
            target,
        )
    }
}

fn not_implemented(platform: &str) -> anyhow::Error {
    UpdateError::NotImplemented {
        platform: platform.to_string(),
        docs_url: dispatch::CLIENT_UPDATES_URL.to_string(),
    }
    .into()
}
