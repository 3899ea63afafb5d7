//! Download-and-verify for installer artifacts.
//!
//! The transfer is two-phase: a bounded-time probe (`HEAD` plus the
//! `.sha256` sidecar), then the body itself streamed through a sink that
//! writes to disk, hashes, and reports progress.
//!
//! The body transfer has no timeout and does not observe cancellation; only
//! a length mismatch or process termination stops it. A failed transfer
//! leaves its partial file on disk and nothing resumes from it.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::core::UpdateError;
use crate::update::fetch::{Fetch, FetchBody, is_success, read_limited};
use crate::update::verification::ChecksumVerifier;

/// Upper bound on the sidecar checksum body.
const MAX_SIDECAR_BYTES: usize = 100;

/// A verified artifact on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArtifact {
    pub url: String,
    pub expected_sha256: Vec<u8>,
    pub local_path: PathBuf,
    pub declared_length: u64,
}

/// Throttled transfer progress.
///
/// The first chunk is always reported, then at most one line per
/// `interval`, plus a final line from [`ProgressMeter::finish`].
#[derive(Debug)]
pub struct ProgressMeter {
    bytes_done: u64,
    bytes_total: u64,
    last_report: Option<Instant>,
    interval: Duration,
}

impl ProgressMeter {
    #[must_use]
    pub const fn new(bytes_total: u64, interval: Duration) -> Self {
        Self {
            bytes_done: 0,
            bytes_total,
            last_report: None,
            interval,
        }
    }

    /// Accounts for `n` more bytes; returns whether a line was emitted.
    pub fn record(&mut self, n: u64) -> bool {
        self.record_at(n, Instant::now())
    }

    fn record_at(&mut self, n: u64, now: Instant) -> bool {
        self.bytes_done += n;
        let due = self.last_report.is_none_or(|last| now.duration_since(last) > self.interval);
        if due {
            self.report_at(now);
        }
        due
    }

    /// Emits the closing progress line.
    pub fn finish(&mut self) {
        self.report_at(Instant::now());
    }

    fn report_at(&mut self, now: Instant) {
        self.last_report = Some(now);
        info!(target: "download", "{}", self.line());
    }

    /// `Downloaded <done>/<total> (<pct>%)`
    #[must_use]
    pub fn line(&self) -> String {
        let pct = if self.bytes_total == 0 {
            0.0
        } else {
            self.bytes_done as f64 / self.bytes_total as f64 * 100.0
        };
        format!("Downloaded {}/{} ({:.1}%)", self.bytes_done, self.bytes_total, pct)
    }

    #[must_use]
    pub const fn bytes_done(&self) -> u64 {
        self.bytes_done
    }
}

/// Writes, hashes, and meters every byte of one transfer.
struct DownloadSink {
    file: File,
    hasher: Sha256,
    meter: ProgressMeter,
    path: PathBuf,
}

impl DownloadSink {
    async fn write(&mut self, chunk: &[u8]) -> Result<()> {
        self.file
            .write_all(chunk)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        self.hasher.update(chunk);
        self.meter.record(chunk.len() as u64);
        Ok(())
    }
}

/// Downloads artifacts through a [`Fetch`] implementation.
pub struct Downloader<'a, F> {
    fetcher: &'a F,
    metadata_timeout: Duration,
    progress_interval: Duration,
}

impl<'a, F: Fetch> Downloader<'a, F> {
    pub const fn new(fetcher: &'a F, metadata_timeout: Duration, progress_interval: Duration) -> Self {
        Self {
            fetcher,
            metadata_timeout,
            progress_interval,
        }
    }

    /// Downloads `url` to `dest` and verifies it against `<url>.sha256`.
    ///
    /// # Errors
    ///
    /// - [`UpdateError::Network`]: non-2xx status, missing or zero
    ///   `Content-Length`, malformed sidecar, or transport failure
    /// - [`UpdateError::Integrity`]: short body or digest mismatch
    pub async fn download(&self, url: &str, dest: &Path) -> Result<DownloadArtifact> {
        let head = self.fetcher.head(url, self.metadata_timeout).await?;
        if !is_success(head.status) {
            return Err(UpdateError::network(format!("HEAD {url}"), format!("HTTP {}", head.status)).into());
        }
        let declared_length = match head.content_length {
            Some(length) if length > 0 => length,
            other => {
                return Err(UpdateError::network(
                    format!("HEAD {url}"),
                    format!("unexpected Content-Length {other:?}"),
                )
                .into());
            }
        };
        info!(target: "download", "Download size: {}", declared_length);

        let expected_sha256 = self.fetch_sidecar(url).await?;

        let mut response = self.fetcher.get(url, None).await?;
        if !is_success(response.status) {
            return Err(UpdateError::network(format!("GET {url}"), format!("HTTP {}", response.status)).into());
        }

        let file = File::create(dest).await.map_err(|_| UpdateError::FileSystem {
            operation: "create download file".to_string(),
            path: dest.display().to_string(),
        })?;
        let mut sink = DownloadSink {
            file,
            hasher: Sha256::new(),
            meter: ProgressMeter::new(declared_length, self.progress_interval),
            path: dest.to_path_buf(),
        };

        while sink.meter.bytes_done() < declared_length {
            let Some(chunk) = response.body.chunk().await? else {
                break;
            };
            let remaining = declared_length - sink.meter.bytes_done();
            let take = usize::try_from(remaining).map_or(chunk.len(), |r| chunk.len().min(r));
            sink.write(&chunk[..take]).await?;
        }

        let written = sink.meter.bytes_done();
        if written != declared_length {
            return Err(UpdateError::Integrity {
                reason: format!("downloaded {written}; want {declared_length}"),
            }
            .into());
        }
        sink.file
            .flush()
            .await
            .with_context(|| format!("Failed to flush {}", dest.display()))?;
        sink.meter.finish();

        let what = dest.file_name().map_or_else(|| url.to_string(), |n| n.to_string_lossy().to_string());
        ChecksumVerifier::verify_digest(&what, &sink.hasher.finalize(), &expected_sha256)?;

        Ok(DownloadArtifact {
            url: url.to_string(),
            expected_sha256,
            local_path: dest.to_path_buf(),
            declared_length,
        })
    }

    async fn fetch_sidecar(&self, url: &str) -> Result<Vec<u8>> {
        let sidecar_url = format!("{url}.sha256");
        let mut response = self.fetcher.get(&sidecar_url, Some(self.metadata_timeout)).await?;
        if !is_success(response.status) {
            return Err(UpdateError::network(
                format!("GET {sidecar_url}"),
                format!("HTTP {}", response.status),
            )
            .into());
        }
        let body = read_limited(&mut response.body, MAX_SIDECAR_BYTES).await?;
        ChecksumVerifier::parse_sidecar(&sidecar_url, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_meter_throttles() {
        let start = Instant::now();
        let mut meter = ProgressMeter::new(1000, Duration::from_secs(2));

        assert!(meter.record_at(100, start));
        assert!(!meter.record_at(100, start + Duration::from_millis(500)));
        assert!(!meter.record_at(100, start + Duration::from_secs(2)));
        assert!(meter.record_at(100, start + Duration::from_millis(2001)));
        assert_eq!(meter.bytes_done(), 400);
        assert_eq!(meter.line(), "Downloaded 400/1000 (40.0%)");
    }

    #[test]
    fn test_progress_line_rounding() {
        let mut meter = ProgressMeter::new(3, Duration::from_secs(2));
        meter.record(1);
        assert_eq!(meter.line(), "Downloaded 1/3 (33.3%)");
    }
}
