//! Command-line interface for tsupdate.
//!
//! # Available Commands
//!
//! - `update` - Update the installed client through the platform's package
//!   manager, the App Store, or a verified MSI installer
//! - `version` - Print the running version, optionally with the latest one
//!
//! # Global Options
//!
//! - `--verbose` - Enable debug output
//! - `--quiet` - Suppress all output except errors
//! - `--config` - Path to a custom config file
//! - `--no-progress` - Disable spinners
//!
//! ```bash
//! tsupdate update --dry-run
//! tsupdate update --track unstable --yes
//! tsupdate --verbose version --with-latest
//! ```
//!
//! # Logging
//!
//! Log lines go to stderr. `RUST_LOG` takes precedence over the verbosity
//! flags; otherwise `--verbose` selects `debug`, `--quiet` selects `error`,
//! and the default is `info`.

mod update;
mod version;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::utils::progress::disable_progress;

pub use update::UpdateCommand;
pub use version::VersionCommand;

/// Root command and global options.
#[derive(Parser, Debug)]
#[command(
    name = "tsupdate",
    about = "Update the Tailscale client",
    version,
    author,
    long_about = "tsupdate moves an installed Tailscale client to a newer (or explicitly chosen) \
                  version using the mechanism that installed it: apt, dnf/yum, pacman, the Mac \
                  App Store, or the Windows MSI installer."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to a custom config file (default: ~/.tsupdate/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable progress spinners
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Update Tailscale to the latest version on its track, or a chosen one
    Update(UpdateCommand),

    /// Print the tsupdate version
    Version(VersionCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        init_logging(self.log_level());
        if self.no_progress {
            disable_progress();
        }

        match self.command {
            Commands::Update(cmd) => cmd.execute(self.config).await,
            Commands::Version(cmd) => cmd.execute(self.config).await,
        }
    }

    const fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }
}

/// Installs the stderr log subscriber; later calls are no-ops.
///
/// `RUST_LOG` wins over `default_level` when set.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        let cli = Cli::try_parse_from(["tsupdate", "--verbose", "version"]).unwrap();
        assert_eq!(cli.log_level(), "debug");
        let cli = Cli::try_parse_from(["tsupdate", "version", "--quiet"]).unwrap();
        assert_eq!(cli.log_level(), "error");
        let cli = Cli::try_parse_from(["tsupdate", "version"]).unwrap();
        assert_eq!(cli.log_level(), "info");

        assert!(Cli::try_parse_from(["tsupdate", "-v", "-q", "version"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["tsupdate", "update", "--dry-run", "--config", "/tmp/ts.toml", "--no-progress"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/ts.toml")));
        assert!(cli.no_progress);
        assert!(matches!(cli.command, Commands::Update(_)));
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
