//! Error handling for tsupdate
//!
//! This module provides the error types and user-facing error reporting for the
//! update orchestrator. The error system follows two rules:
//! 1. **Strongly-typed errors** so callers can tell failure classes apart
//! 2. **User-friendly messages** with a one-line remediation where one exists
//!
//! # Architecture
//!
//! - [`UpdateError`] - Enumerated error types for every failure class
//! - [`ErrorContext`] - Wrapper that adds details and suggestions for display
//! - [`Remediation`] - Typed `anyhow` context carrying a "you can try ..." hint
//!
//! Fallible functions return [`anyhow::Result`]. Typed errors are raised with
//! `UpdateError::X { .. }.into()` and stay reachable through `downcast_ref`
//! even after `anyhow::Context` has been attached.
//!
//! # Operator aborts
//!
//! [`UpdateError::UserAborted`] is special: wrapping helpers such as
//! [`with_remediation`] never attach advice to it, and [`is_user_abort`] lets
//! callers distinguish "the operator said no" from "the action failed".
//!
//! # Examples
//!
//! ```rust,no_run
//! use tsupdate::core::{UpdateError, is_user_abort};
//!
//! let err: anyhow::Error = UpdateError::UserAborted.into();
//! assert!(is_user_abort(&err));
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for update operations.
///
/// Each variant corresponds to one failure class. Variants carry the
/// information needed to render a single descriptive message; remediation
/// text is added by [`crate::core::user_friendly_error`].
///
/// # Error Classes
///
/// - [`Validation`] - conflicting or malformed request fields, raised before any I/O
/// - [`PlatformUnsupported`] - no update strategy exists for this system
/// - [`NotImplemented`] - a recognised platform whose strategy is not built yet
/// - [`PermissionDenied`] - missing elevation, with an OS-specific hint
/// - [`Subprocess`] - an external tool exited non-zero
/// - [`Network`] - bad HTTP status, timeout, or malformed response body
/// - [`Integrity`] - hash or length mismatch on a downloaded artifact
/// - [`ConfigParse`] - a package source file has an unexpected shape
/// - [`UserAborted`] - the operator declined the confirmation prompt
/// - [`FileSystem`] - local file operations failed
///
/// [`Validation`]: UpdateError::Validation
/// [`PlatformUnsupported`]: UpdateError::PlatformUnsupported
/// [`NotImplemented`]: UpdateError::NotImplemented
/// [`PermissionDenied`]: UpdateError::PermissionDenied
/// [`Subprocess`]: UpdateError::Subprocess
/// [`Network`]: UpdateError::Network
/// [`Integrity`]: UpdateError::Integrity
/// [`ConfigParse`]: UpdateError::ConfigParse
/// [`UserAborted`]: UpdateError::UserAborted
/// [`FileSystem`]: UpdateError::FileSystem
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpdateError {
    /// Conflicting or malformed request fields
    ///
    /// Always raised before any network or file-system access.
    #[error("{message}")]
    Validation {
        /// Description of the invalid input
        message: String,
    },

    /// No update strategy exists for the current system
    ///
    /// This error is fatal and must not be retried.
    #[error("The 'update' command is not supported on this platform: {reason}")]
    PlatformUnsupported {
        /// Why the platform could not be handled
        reason: String,
        /// Documentation pointer shown as the remediation
        docs_url: String,
    },

    /// The platform is recognised but its update path is not implemented
    #[error("The 'update' command is not yet implemented on {platform}")]
    NotImplemented {
        /// Human-readable platform name
        platform: String,
        /// Documentation pointer shown as the remediation
        docs_url: String,
    },

    /// The process lacks the elevation required to modify installed software
    #[error("{message}")]
    PermissionDenied {
        /// Short description, e.g. "must be root; use sudo"
        message: String,
    },

    /// An external tool exited with a non-zero status
    #[error("{command} failed ({status})")]
    Subprocess {
        /// The command line that was run
        command: String,
        /// Exit status description
        status: String,
        /// Combined stdout and stderr captured from the command
        output: String,
    },

    /// Network-level failure during a metadata or artifact fetch
    #[error("{operation}: {reason}")]
    Network {
        /// The request that failed, e.g. "HEAD https://..."
        operation: String,
        /// Status line, transport error, or decode failure
        reason: String,
    },

    /// A downloaded artifact failed its length or hash check
    #[error("integrity check failed: {reason}")]
    Integrity {
        /// What did not match
        reason: String,
    },

    /// A package source file does not have the shape the rewriter expects
    ///
    /// The file is never partially rewritten when this is raised.
    #[error("unexpected/unsupported {path} contents: {reason}")]
    ConfigParse {
        /// Path of the offending file
        path: String,
        /// What was unexpected
        reason: String,
    },

    /// The operator declined the confirmation prompt
    #[error("aborting update")]
    UserAborted,

    /// A local file operation failed
    #[error("Failed to {operation}: {path}")]
    FileSystem {
        /// The operation that failed, e.g. "create MSI cache directory"
        operation: String,
        /// The path involved
        path: String,
    },

    /// Any other failure, rendered with its full context chain
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

impl UpdateError {
    /// Shorthand for a [`UpdateError::Validation`] error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a [`UpdateError::Network`] error.
    pub fn network(operation: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Network {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }
}

/// Typed `anyhow` context carrying a remediation command for the operator.
///
/// Attach with [`with_remediation`] rather than directly so that operator
/// aborts stay unwrapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remediation(pub String);

impl fmt::Display for Remediation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "you can try updating using \"{}\"", self.0)
    }
}

/// Returns `true` when the error chain contains [`UpdateError::UserAborted`].
#[must_use]
pub fn is_user_abort(error: &anyhow::Error) -> bool {
    error
        .chain()
        .any(|cause| matches!(cause.downcast_ref::<UpdateError>(), Some(UpdateError::UserAborted)))
}

/// Attaches a [`Remediation`] hint to a failed result unless the failure is
/// an operator abort or missing elevation.
pub fn with_remediation<T>(result: anyhow::Result<T>, command: &str) -> anyhow::Result<T> {
    result.map_err(|err| {
        let permission_denied = err.chain().any(|cause| {
            matches!(
                cause.downcast_ref::<UpdateError>(),
                Some(UpdateError::PermissionDenied { .. })
            )
        });
        if permission_denied || is_user_abort(&err) {
            err
        } else {
            err.context(Remediation(command.to_string()))
        }
    })
}

/// Error wrapper that adds user-friendly details and suggestions.
///
/// Mirrors the `error:` / `details:` / `suggestion:` block printed by the CLI.
///
/// # Examples
///
/// ```rust,no_run
/// use tsupdate::core::{ErrorContext, UpdateError};
///
/// let context = ErrorContext::new(UpdateError::PermissionDenied {
///     message: "must be root; use sudo".to_string(),
/// })
/// .with_suggestion("Re-run the command with sudo");
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: UpdateError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: UpdateError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error context to stderr with terminal colors.
    ///
    /// - Error message: red and bold
    /// - Details: yellow
    /// - Suggestion: green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_user_abort_detected_through_context() {
        let err: anyhow::Error = UpdateError::UserAborted.into();
        let wrapped = err.context("while confirming");
        assert!(is_user_abort(&wrapped));
    }

    #[test]
    fn test_with_remediation_skips_user_abort() {
        let result: anyhow::Result<()> = Err(UpdateError::UserAborted.into());
        let err = with_remediation(result, "dnf upgrade tailscale").unwrap_err();
        assert!(err.downcast_ref::<Remediation>().is_none());
        assert_eq!(err.to_string(), "aborting update");
    }

    #[test]
    fn test_with_remediation_skips_permission_denied() {
        let result: anyhow::Result<()> = Err(UpdateError::PermissionDenied {
            message: "must be root; use sudo".to_string(),
        }
        .into());
        let err = with_remediation(result, "dnf upgrade tailscale").unwrap_err();
        assert!(err.downcast_ref::<Remediation>().is_none());
        assert_eq!(err.to_string(), "must be root; use sudo");
    }

    #[test]
    fn test_with_remediation_wraps_other_errors() {
        let result: anyhow::Result<()> = Err(UpdateError::Subprocess {
            command: "dnf install".to_string(),
            status: "exit status: 1".to_string(),
            output: "boom".to_string(),
        }
        .into());
        let err = with_remediation(result, "dnf upgrade tailscale").unwrap_err();

        let hint = err.downcast_ref::<Remediation>().unwrap();
        assert_eq!(hint.to_string(), "you can try updating using \"dnf upgrade tailscale\"");
        assert!(matches!(
            err.downcast_ref::<UpdateError>(),
            Some(UpdateError::Subprocess { .. })
        ));
        assert!(!is_user_abort(&err));
    }

    #[test]
    fn test_other_context_is_not_abort() {
        let err = std::fs::read("/definitely/not/here")
            .context("reading")
            .unwrap_err();
        assert!(!is_user_abort(&err));
    }

    #[test]
    fn test_error_context_display() {
        let ctx = ErrorContext::new(UpdateError::validation("cannot specify both --version and --track"))
            .with_details("details here")
            .with_suggestion("pick one");
        assert_eq!(
            ctx.to_string(),
            "cannot specify both --version and --track\nDetails: details here\nSuggestion: pick one"
        );
    }
}
