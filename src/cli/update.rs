//! The `update` command.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use crate::config::UpdateConfig;
use crate::update::{
    BuildInfo, HttpFetcher, NativeCapabilities, PlatformFacts, UpdateOutcome, UpdateRequest, Updater,
    resolve_track, select_strategy,
};

/// Update Tailscale to the latest version on its track, or a chosen one.
///
/// ```bash
/// tsupdate update                    # latest on the current track
/// tsupdate update --track unstable   # switch tracks
/// tsupdate update --version 1.44.2   # pin (or downgrade to) a version
/// tsupdate update --dry-run          # report only
/// ```
#[derive(Args, Debug, Default)]
pub struct UpdateCommand {
    /// Update without interactive prompts
    #[arg(long)]
    yes: bool,

    /// Print what update would do without doing it
    #[arg(long)]
    dry_run: bool,

    /// Check the App Store even if this is not an App Store install
    #[arg(long, hide = true)]
    app_store: bool,

    /// Track to check for updates: "stable" or "unstable"; default is the
    /// current track
    #[arg(long, value_name = "TRACK")]
    track: Option<String>,

    /// Explicit version to update (or downgrade) to
    #[arg(long, value_name = "VERSION")]
    version: Option<String>,
}

impl UpdateCommand {
    /// The request described by the flags. Empty values count as unset.
    #[must_use]
    pub fn request(&self) -> UpdateRequest {
        let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());
        UpdateRequest {
            explicit_version: non_empty(&self.version),
            explicit_track: non_empty(&self.track),
            non_interactive: self.yes,
            dry_run: self.dry_run,
            app_store_only: self.app_store,
        }
    }

    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let request = self.request();
        let build = BuildInfo::current();
        request.validate()?;
        resolve_track(&request, &build)?;

        let config = UpdateConfig::load_with_optional(config_path).await?;
        let facts = PlatformFacts::detect().await;
        let strategy = select_strategy(&facts, request.app_store_only)?;

        let mut updater = Updater::new(
            request,
            build,
            strategy,
            config,
            HttpFetcher::new()?,
            NativeCapabilities::default(),
        )?;

        match updater.update().await? {
            UpdateOutcome::HandedOff => std::process::exit(0),
            UpdateOutcome::Updated {
                version,
            } => info!("Updated to {}", version),
            outcome => tracing::debug!("No update performed: {:?}", outcome),
        }
        Ok(())
    }
}
