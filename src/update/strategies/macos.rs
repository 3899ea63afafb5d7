use anyhow::Result;
use regex::Regex;

use crate::update::capabilities::PlatformCapabilities;
use crate::update::fetch::Fetch;
use crate::update::{UpdateOutcome, Updater};
use crate::utils::command::SystemCommand;
use crate::utils::progress::spinner_with_message;

const COMMERCE_PLIST: &str = "/Library/Preferences/com.apple.commerce.plist";

impl<F: Fetch, C: PlatformCapabilities> Updater<F, C> {
    /// App Store installs: the candidate comes from `softwareupdate`, which
    /// also performs the install.
    pub(crate) async fn update_mac_app_store(&mut self) -> Result<UpdateOutcome> {
        let auto_update = SystemCommand::new("defaults")
            .args(["read", COMMERCE_PLIST, "AutoUpdate"])
            .execute_stdout()
            .await?;
        if auto_update != "1\n" {
            eprintln!(
                "NOTE: Automatic updating for App Store apps is turned off. You can change this setting in System Settings (search for ‘update’)."
            );
        }

        let spinner = spinner_with_message("Checking the App Store for updates...");
        let listing = SystemCommand::new("softwareupdate").arg("--list").execute().await;
        spinner.finish_and_clear();

        let display_name = self.config.distribution.display_name.clone();
        let Some(label) = parse_softwareupdate_list(&listing?.combined(), &display_name)? else {
            println!("no {display_name} update available");
            return Ok(UpdateOutcome::NoUpdateAvailable);
        };

        let prefix = format!("{display_name}-");
        let version = label.strip_prefix(&prefix).unwrap_or(&label).to_string();
        if let Some(outcome) = self.current_or_dry_run(&version) {
            return Ok(outcome);
        }
        self.confirm(&version)?;

        SystemCommand::new("sudo")
            .args(["softwareupdate", "--install"])
            .arg(label)
            .stream_output()
            .execute_success()
            .await?;

        Ok(UpdateOutcome::Updated {
            version,
        })
    }
}

/// Finds the `<Name>-<version>` label in `softwareupdate --list` output.
fn parse_softwareupdate_list(output: &str, display_name: &str) -> Result<Option<String>> {
    let pattern = Regex::new(&format!(
        r"(?m)^[ \t]+\*[ \t]+Label:[ \t]*({}-\d[\d\.]+)",
        regex::escape(display_name)
    ))?;
    Ok(pattern.captures(output).map(|caps| caps[1].to_string()))
}
