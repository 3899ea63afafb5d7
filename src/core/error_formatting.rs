//! Error formatting utilities for tsupdate
//!
//! This module converts internal errors into clear, actionable messages for
//! the operator. The top-level message is always the typed error found in the
//! chain; a [`Remediation`] attached by a strategy becomes the suggestion.

use super::error::{ErrorContext, Remediation, UpdateError};

/// Keywords that indicate network-related errors
const NETWORK_ERROR_KEYWORDS: &[&str] = &["network", "connection", "timed out", "dns"];

/// Convert any error into a user-friendly format with contextual suggestions
///
/// The error chain is walked once to find the outermost [`UpdateError`] and
/// any [`Remediation`] context. Operator aborts never receive a suggestion,
/// and missing elevation keeps its own.
///
/// # Arguments
///
/// * `error` - The error to convert to a user-friendly format
///
/// # Returns
///
/// An [`ErrorContext`] with user-friendly messages and suggestions
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let remediation = error.downcast_ref::<Remediation>().cloned();

    if let Some(update_error) = error.chain().find_map(|cause| cause.downcast_ref::<UpdateError>())
    {
        let ctx = create_error_context(update_error);
        return match remediation {
            Some(hint)
                if !matches!(
                    update_error,
                    UpdateError::UserAborted | UpdateError::PermissionDenied { .. }
                ) =>
            {
                ctx.with_suggestion(hint.to_string())
            }
            _ => ctx,
        };
    }

    let permission_denied = error
        .chain()
        .filter_map(|cause| cause.downcast_ref::<std::io::Error>())
        .any(|io_error| io_error.kind() == std::io::ErrorKind::PermissionDenied);
    if permission_denied {
        return ErrorContext::new(UpdateError::Other {
            message: format!("{error:#}"),
        })
        .with_suggestion("Check file permissions and try running with appropriate privileges");
    }

    let error_msg = format!("{error:#}");
    let lowered = error_msg.to_lowercase();

    if NETWORK_ERROR_KEYWORDS.iter().any(|&keyword| lowered.contains(keyword)) {
        return ErrorContext::new(UpdateError::Network {
            operation: "network request".to_string(),
            reason: error_msg,
        })
        .with_suggestion("Check your internet connection and try again");
    }

    let ctx = ErrorContext::new(UpdateError::Other {
        message: error_msg,
    });
    match remediation {
        Some(hint) => ctx.with_suggestion(hint.to_string()),
        None => ctx,
    }
}

/// Create a user-friendly error context from an [`UpdateError`]
pub fn create_error_context(error: &UpdateError) -> ErrorContext {
    let ctx = ErrorContext::new(error.clone());
    match error {
        UpdateError::UserAborted => ctx,
        UpdateError::PlatformUnsupported {
            docs_url,
            ..
        }
        | UpdateError::NotImplemented {
            docs_url,
            ..
        } => ctx.with_suggestion(format!("See {docs_url}")),
        UpdateError::PermissionDenied {
            ..
        } => ctx.with_suggestion("Re-run the command with elevated privileges"),
        UpdateError::Subprocess {
            output,
            ..
        } if !output.trim().is_empty() => ctx.with_details(output.trim().to_string()),
        UpdateError::Network {
            ..
        } => ctx.with_suggestion("Check your internet connection and try again"),
        UpdateError::Integrity {
            ..
        } => ctx.with_suggestion("Re-run the update to download a fresh copy"),
        UpdateError::ConfigParse {
            path,
            ..
        } => ctx.with_details(format!("{path} was left unchanged")),
        _ => ctx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::with_remediation;
    use anyhow::Context;
    use std::io;

    #[test]
    fn test_user_abort_has_no_suggestion() {
        let error: anyhow::Error = UpdateError::UserAborted.into();
        let ctx = user_friendly_error(error.context("confirming update"));

        assert_eq!(ctx.error, UpdateError::UserAborted);
        assert!(ctx.suggestion.is_none());
    }

    #[test]
    fn test_remediation_becomes_suggestion() {
        let result: anyhow::Result<()> = Err(UpdateError::Subprocess {
            command: "pacman --sync --refresh --info tailscale".to_string(),
            status: "exit status: 1".to_string(),
            output: "error: you cannot perform this operation unless you are root.".to_string(),
        }
        .into());
        let error = with_remediation(result, "pacman --sync --refresh tailscale").unwrap_err();
        let ctx = user_friendly_error(error);

        assert!(matches!(ctx.error, UpdateError::Subprocess { .. }));
        assert_eq!(
            ctx.suggestion.as_deref(),
            Some("you can try updating using \"pacman --sync --refresh tailscale\"")
        );
        assert!(ctx.details.unwrap().contains("unless you are root"));
    }

    #[test]
    fn test_permission_denied_keeps_elevation_suggestion() {
        let error: anyhow::Error = UpdateError::PermissionDenied {
            message: "must be root; use sudo".to_string(),
        }
        .into();
        let ctx = user_friendly_error(error.context(Remediation("dnf upgrade tailscale".to_string())));

        assert_eq!(ctx.error.to_string(), "must be root; use sudo");
        assert_eq!(ctx.suggestion.as_deref(), Some("Re-run the command with elevated privileges"));
    }

    #[test]
    fn test_platform_unsupported_points_at_docs() {
        let error: anyhow::Error = UpdateError::PlatformUnsupported {
            reason: "unknown OS".to_string(),
            docs_url: "https://tailscale.com/s/client-updates".to_string(),
        }
        .into();
        let ctx = user_friendly_error(error);
        assert_eq!(ctx.suggestion.as_deref(), Some("See https://tailscale.com/s/client-updates"));
    }

    #[test]
    fn test_io_permission_denied() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "Access denied");
        let error = anyhow::Error::from(io_err).context("Failed to write /etc/apt/sources.list.d/tailscale.list");
        let ctx = user_friendly_error(error);

        assert!(matches!(ctx.error, UpdateError::Other { .. }));
        assert!(ctx.error.to_string().contains("Access denied"));
        assert!(ctx.suggestion.is_some());
    }

    #[test]
    fn test_network_keyword_fallback() {
        let error = anyhow::Error::msg("Connection refused by peer");
        let ctx = user_friendly_error(error);

        assert!(matches!(ctx.error, UpdateError::Network { .. }));
        assert!(ctx.suggestion.unwrap().contains("internet connection"));
    }

    #[test]
    fn test_fallback_keeps_message() {
        let error = anyhow::Error::msg("something odd");
        let ctx = user_friendly_error(error);
        assert_eq!(ctx.error.to_string(), "something odd");
        assert!(ctx.suggestion.is_none());
    }
}
