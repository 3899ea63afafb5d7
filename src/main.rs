//! tsupdate CLI entry point
//!
//! Startup has two phases. A process started by the Windows handoff (see
//! [`tsupdate::update::handoff`]) finds the installer path in its
//! environment and installs it before any argument parsing. Every other
//! process parses arguments and runs the requested command.

use anyhow::Result;
use clap::Parser;
use tsupdate::cli::{self, Cli};
use tsupdate::config::UpdateConfig;
use tsupdate::core::user_friendly_error;
use tsupdate::update::handoff;

#[tokio::main]
async fn main() -> Result<()> {
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    if let Some(result) = run_pending_installer().await {
        return exit_with(result);
    }

    let cli = Cli::parse();
    exit_with(cli.execute().await)
}

/// Phase one: install a handed-over MSI, if there is one.
async fn run_pending_installer() -> Option<Result<()>> {
    handoff::pending_installer()?;
    cli::init_logging("info");
    match UpdateConfig::load_with_optional(None).await {
        Ok(config) => handoff::run_pending_install(&config).await,
        Err(e) => Some(Err(e)),
    }
}

fn exit_with(result: Result<()>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}
