//! One executor per update strategy.
//!
//! Each submodule adds an `update_*` method to [`Updater`](super::Updater).
//! Package-manager executors follow the same order: resolve the version,
//! short-circuit when current or dry-run, require elevation, rewrite the
//! source file, confirm, then install with the version pinned.

mod apt;
mod macos;
mod pacman;
mod rpm;
mod windows;
