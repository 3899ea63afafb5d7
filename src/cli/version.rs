//! The `version` command.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use crate::config::UpdateConfig;
use crate::update::{BuildInfo, HttpFetcher, Track, VersionResolver};
use crate::utils::platform::os_name;

/// Print the tsupdate version.
#[derive(Args, Debug, Default)]
pub struct VersionCommand {
    /// Output in JSON format
    #[arg(long)]
    json: bool,

    /// Include the latest released version on this build's track
    #[arg(long)]
    with_latest: bool,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct VersionReport {
    short: String,
    track: Track,
    #[serde(skip_serializing_if = "Option::is_none")]
    latest: Option<String>,
}

impl VersionReport {
    fn render_text(&self) -> String {
        match &self.latest {
            Some(latest) => format!("{}\n  latest: {}", self.short, latest),
            None => self.short.clone(),
        }
    }
}

impl VersionCommand {
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let build = BuildInfo::current();
        let latest = if self.with_latest {
            let config = UpdateConfig::load_with_optional(config_path).await?;
            let fetcher = HttpFetcher::new()?;
            let resolver = VersionResolver::new(
                &fetcher,
                config.distribution.base_url(),
                os_name(),
                config.network.metadata_timeout(),
            );
            Some(resolver.latest(build.track).await?)
        } else {
            None
        };

        let report = VersionReport {
            short: build.version,
            track: build.track,
            latest,
        };
        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("{}", report.render_text());
        }
        Ok(())
    }
}
