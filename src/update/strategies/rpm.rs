use anyhow::Result;

use crate::core::with_remediation;
use crate::update::capabilities::PlatformCapabilities;
use crate::update::dispatch::RpmTool;
use crate::update::fetch::Fetch;
use crate::update::sources::yum::RepoNaming;
use crate::update::sources::{rewrite_yum_repo, update_source_file};
use crate::update::{UpdateOutcome, Updater};
use crate::utils::command::SystemCommand;

impl<F: Fetch, C: PlatformCapabilities> Updater<F, C> {
    /// Fedora family, with either dnf or yum.
    ///
    /// Failures other than an abort suggest `<tool> upgrade <pkg>`.
    pub(crate) async fn update_rpm(&mut self, tool: RpmTool) -> Result<UpdateOutcome> {
        let remediation = format!("{} upgrade {}", tool.command(), self.config.distribution.package);
        let result = self.update_rpm_inner(tool).await;
        with_remediation(result, &remediation)
    }

    async fn update_rpm_inner(&mut self, tool: RpmTool) -> Result<UpdateOutcome> {
        let version = self.target_version().await?;
        if let Some(outcome) = self.current_or_dry_run(&version) {
            return Ok(outcome);
        }
        self.require_elevation().await?;

        let path = self.config.paths.yum_repo.clone();
        let label = path.display().to_string();
        let distribution = self.config.distribution.clone();
        let naming = RepoNaming {
            base_url: distribution.base_url(),
            package: &distribution.package,
            display_name: &distribution.display_name,
        };
        let track = self.track;
        let rewrote =
            update_source_file(&path, |content| rewrite_yum_repo(content, naming, track, &label)).await?;
        if rewrote {
            println!("Updated {} to use the {} track", label, track);
        }

        self.confirm(&version)?;

        SystemCommand::new(tool.command())
            .args(["install", "--assumeyes"])
            .arg(format!("{}-{}-1", distribution.package, version))
            .stream_output()
            .execute_success()
            .await?;

        Ok(UpdateOutcome::Updated {
            version,
        })
    }
}
