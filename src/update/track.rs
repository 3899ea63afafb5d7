//! Release tracks and track resolution.
//!
//! Tailscale publishes two tracks. A version's track is encoded in its minor
//! component: even minors are stable releases, odd minors are unstable
//! (development) builds.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::UpdateError;
use crate::update::UpdateRequest;

/// Release channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Track {
    Stable,
    Unstable,
}

impl Track {
    /// The track name as it appears in package URLs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Unstable => "unstable",
        }
    }

    /// Infers the track from a version string.
    ///
    /// Returns `None` when the version has fewer than three dot-separated
    /// components or a non-numeric minor component.
    ///
    /// ```rust
    /// use tsupdate::update::Track;
    ///
    /// assert_eq!(Track::of_version("1.44.0"), Some(Track::Stable));
    /// assert_eq!(Track::of_version("1.45.3"), Some(Track::Unstable));
    /// assert_eq!(Track::of_version("abc.def"), None);
    /// ```
    #[must_use]
    pub fn of_version(version: &str) -> Option<Self> {
        let (_, rest) = version.split_once('.')?;
        let (minor, _) = rest.split_once('.')?;
        let minor: i64 = minor.parse().ok()?;
        Some(if minor % 2 == 0 {
            Self::Stable
        } else {
            Self::Unstable
        })
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Track {
    type Err = UpdateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stable" => Ok(Self::Stable),
            "unstable" => Ok(Self::Unstable),
            other => Err(UpdateError::validation(format!(
                "unknown track {other:?}; must be 'stable' or 'unstable'"
            ))),
        }
    }
}

/// Identity of the running build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    /// Short version string, e.g. `1.44.0`
    pub version: String,
    /// Track the running build was published on
    pub track: Track,
}

impl BuildInfo {
    /// Build info derived from the crate version.
    ///
    /// A version whose track cannot be inferred is treated as stable.
    #[must_use]
    pub fn current() -> Self {
        Self::from_version(env!("CARGO_PKG_VERSION"))
    }

    #[must_use]
    pub fn from_version(version: &str) -> Self {
        Self {
            version: version.to_string(),
            track: Track::of_version(version).unwrap_or(Track::Stable),
        }
    }
}

/// Decides the target track for a request.
///
/// An explicit track wins; otherwise the track is inferred from an explicit
/// version; otherwise the running build's track is used.
///
/// # Errors
///
/// [`UpdateError::Validation`] for an unknown track name or a malformed
/// explicit version.
pub fn resolve_track(request: &UpdateRequest, build: &BuildInfo) -> Result<Track> {
    if let Some(track) = request.explicit_track.as_deref() {
        return Ok(track.parse::<Track>()?);
    }
    if let Some(version) = request.explicit_version.as_deref() {
        return Track::of_version(version)
            .ok_or_else(|| UpdateError::validation(format!("malformed version {version:?}")).into());
    }
    Ok(build.track)
}
