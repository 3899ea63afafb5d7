use anyhow::Result;
use std::path::Path;

use crate::update::capabilities::PlatformCapabilities;
use crate::update::fetch::Fetch;
use crate::update::sources::{rewrite_apt_sources, update_source_file};
use crate::update::{UpdateOutcome, Updater};
use crate::utils::command::SystemCommand;

impl<F: Fetch, C: PlatformCapabilities> Updater<F, C> {
    /// Debian family: rewrite the list file, refresh it alone, then
    /// `apt-get install <pkg>=<version>`.
    pub(crate) async fn update_apt(&mut self) -> Result<UpdateOutcome> {
        let version = self.target_version().await?;
        if let Some(outcome) = self.current_or_dry_run(&version) {
            return Ok(outcome);
        }
        self.require_elevation().await?;

        let path = self.config.paths.apt_sources.clone();
        let label = path.display().to_string();
        let base_url = self.config.distribution.base_url().to_string();
        let track = self.track;
        let rewrote = update_source_file(&path, |content| {
            rewrite_apt_sources(content, &base_url, track, &label)
        })
        .await?;
        if rewrote {
            println!("Updated {} to use the {} track", label, track);
        }

        self.confirm(&version)?;

        let package = self.config.distribution.package.clone();
        refresh_list(&path).stream_output().execute_success().await?;

        SystemCommand::new("apt-get")
            .args(["install", "--yes", "--allow-downgrades"])
            .arg(format!("{package}={version}"))
            .stream_output()
            .execute_success()
            .await?;

        Ok(UpdateOutcome::Updated {
            version,
        })
    }
}

/// `apt-get update` restricted to `list`; other lists keep their cached state.
fn refresh_list(list: &Path) -> SystemCommand {
    SystemCommand::new("apt-get")
        .arg("update")
        .arg("-o")
        .arg(format!("Dir::Etc::SourceList={}", list.display()))
        .args(["-o", "Dir::Etc::SourceParts=-"])
        .args(["-o", "APT::Get::List-Cleanup=0"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_targets_configured_list() {
        let command = refresh_list(Path::new("/srv/apt/custom-tailscale.list"));
        assert_eq!(
            command.command_line(),
            "apt-get update -o Dir::Etc::SourceList=/srv/apt/custom-tailscale.list \
             -o Dir::Etc::SourceParts=- -o APT::Get::List-Cleanup=0"
        );
    }
}
