//! The operator's update request.

use anyhow::Result;

use crate::core::UpdateError;

/// What the operator asked for.
///
/// Built by the CLI layer and checked with [`UpdateRequest::validate`]
/// before any network or file-system access.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateRequest {
    /// Exact version to install (may be a downgrade)
    pub explicit_version: Option<String>,
    /// Track name as typed; validated during track resolution
    pub explicit_track: Option<String>,
    /// Skip the confirmation prompt
    pub non_interactive: bool,
    /// Report what would happen and stop
    pub dry_run: bool,
    /// Check the App Store even if this is not an App Store install
    pub app_store_only: bool,
}

impl UpdateRequest {
    /// Rejects requests whose fields conflict.
    ///
    /// # Errors
    ///
    /// [`UpdateError::Validation`] when both a version and a track are given.
    pub fn validate(&self) -> Result<()> {
        if self.explicit_version.is_some() && self.explicit_track.is_some() {
            return Err(UpdateError::validation("cannot specify both --version and --track").into());
        }
        Ok(())
    }

    /// Whether the operator pinned either a version or a track.
    #[must_use]
    pub const fn pins_release(&self) -> bool {
        self.explicit_version.is_some() || self.explicit_track.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_and_track_conflict() {
        let request = UpdateRequest {
            explicit_version: Some("1.45.3".to_string()),
            explicit_track: Some("stable".to_string()),
            ..UpdateRequest::default()
        };
        let err = request.validate().unwrap_err();
        assert_eq!(err.to_string(), "cannot specify both --version and --track");
    }

    #[test]
    fn test_single_pin_is_valid() {
        let request = UpdateRequest {
            explicit_version: Some("1.45.3".to_string()),
            ..UpdateRequest::default()
        };
        assert!(request.validate().is_ok());
        assert!(request.pins_release());
        assert!(!UpdateRequest::default().pins_release());
    }
}
