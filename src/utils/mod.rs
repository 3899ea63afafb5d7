//! Cross-platform utilities and helpers
//!
//! # Modules
//!
//! - [`command`] - External command builder with logging and typed failures
//! - [`platform`] - OS/architecture naming and elevation messages
//! - [`progress`] - Spinners for long-running lookups

pub mod command;
pub mod platform;
pub mod progress;

pub use command::{CommandOutput, SystemCommand};
pub use platform::{arch_name, command_exists, os_name};
