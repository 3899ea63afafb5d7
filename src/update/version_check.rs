//! Target version resolution.

use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

use crate::core::UpdateError;
use crate::update::Track;
use crate::update::fetch::{Fetch, is_success, read_limited};
use crate::utils::progress::spinner_with_message;

/// Upper bound on the metadata response body.
const MAX_METADATA_BYTES: usize = 1 << 20;

#[derive(Debug, Deserialize)]
struct LatestVersion {
    #[serde(rename = "Version", default)]
    version: String,
}

/// Decides which version to install.
pub struct VersionResolver<'a, F> {
    fetcher: &'a F,
    base_url: &'a str,
    os: &'a str,
    timeout: Duration,
}

impl<'a, F: Fetch> VersionResolver<'a, F> {
    /// `base_url` is the package server root, `os` the server's OS name.
    pub const fn new(fetcher: &'a F, base_url: &'a str, os: &'a str, timeout: Duration) -> Self {
        Self {
            fetcher,
            base_url,
            os,
            timeout,
        }
    }

    /// The metadata endpoint for `track`.
    #[must_use]
    pub fn metadata_url(&self, track: Track) -> String {
        format!("{}/{}/?mode=json&os={}", self.base_url, track, self.os)
    }

    /// Returns `explicit` verbatim, or the latest version published on `track`.
    ///
    /// # Errors
    ///
    /// [`UpdateError::Network`] for a transport failure, a non-2xx status,
    /// an undecodable body, or an empty `Version` field.
    pub async fn resolve(&self, explicit: Option<&str>, track: Track) -> Result<String> {
        if let Some(version) = explicit {
            return Ok(version.to_string());
        }
        self.latest(track).await
    }

    /// Looks up the latest version published on `track`.
    pub async fn latest(&self, track: Track) -> Result<String> {
        let url = self.metadata_url(track);
        let operation = format!("fetching latest version from {url}");
        let spinner = spinner_with_message(format!("Checking the {track} track for updates..."));

        let result: Result<String> = async {
            let mut response = self.fetcher.get(&url, Some(self.timeout)).await?;
            if !is_success(response.status) {
                return Err(UpdateError::network(&operation, format!("HTTP {}", response.status)).into());
            }
            let body = read_limited(&mut response.body, MAX_METADATA_BYTES).await?;
            let latest: LatestVersion = serde_json::from_slice(&body)
                .map_err(|e| UpdateError::network(&operation, format!("decoding JSON: {e}")))?;
            if latest.version.is_empty() {
                return Err(UpdateError::network(&operation, format!("no version found at {url:?}")).into());
            }
            Ok(latest.version)
        }
        .await;

        spinner.finish_and_clear();
        if let Ok(version) = &result {
            tracing::debug!("Latest {} version: {}", track, version);
        }
        result
    }
}
