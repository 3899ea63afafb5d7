//! tsupdate - self-update orchestrator for the Tailscale client
//!
//! tsupdate decides which release track and version to move to, confirms the
//! change with the operator, and drives the mechanism that installed the
//! client (apt, dnf/yum, pacman, the Mac App Store, or the Windows MSI
//! installer) to perform it. Anything downloaded is checked against its
//! published SHA-256 before use.
//!
//! # Core Modules
//!
//! - [`update`] - Track and version resolution, platform dispatch, source
//!   file rewriting, download/verify, confirmation, and the Windows handoff
//! - [`cli`] - `update` and `version` commands
//! - [`config`] - Optional `~/.tsupdate/config.toml`
//! - [`core`] - Error types and user-facing error rendering
//! - [`utils`] - Subprocess execution, platform names, spinners
//!
//! # Release Tracks
//!
//! A version's track is encoded in its minor component: `1.44.0` and
//! `1.46.2` are stable, `1.45.3` and `1.47.1` are unstable.
//!
//! ```rust
//! use tsupdate::update::Track;
//!
//! assert_eq!(Track::of_version("1.46.2"), Some(Track::Stable));
//! assert_eq!(Track::of_version("1.47.1"), Some(Track::Unstable));
//! ```
//!
//! # Command Line
//!
//! ```bash
//! tsupdate update                    # latest release on the current track
//! tsupdate update --track unstable   # move to the unstable track
//! tsupdate update --version 1.44.2   # install an exact version
//! tsupdate update --dry-run          # report what would be installed
//! tsupdate version --with-latest
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod update;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
