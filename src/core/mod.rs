//! Core types for tsupdate
//!
//! This module holds the error model shared by every other module:
//!
//! - [`UpdateError`] - strongly-typed failure classes
//! - [`ErrorContext`] - user-facing rendering with details and suggestions
//! - [`Remediation`] - "you can try updating using ..." context
//! - [`user_friendly_error`] - converts any `anyhow::Error` for display
//!
//! # Examples
//!
//! ```rust,no_run
//! use tsupdate::core::{UpdateError, user_friendly_error};
//!
//! fn check() -> anyhow::Result<()> {
//!     Err(UpdateError::validation("cannot specify both --version and --track").into())
//! }
//!
//! if let Err(e) = check() {
//!     user_friendly_error(e).display();
//! }
//! ```

pub mod error;
mod error_formatting;

pub use error::{ErrorContext, Remediation, UpdateError, is_user_abort, with_remediation};
pub use error_formatting::{create_error_context, user_friendly_error};
