//! HTTP access for version metadata and installer artifacts.
//!
//! The updater talks to the network only through the [`Fetch`] trait. The
//! production implementation is [`HttpFetcher`] (reqwest); tests substitute
//! an in-memory fetcher that also counts requests.

use anyhow::Result;
use std::time::Duration;

use crate::core::UpdateError;

/// Status and declared length from a `HEAD` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchHead {
    pub status: u16,
    /// Parsed `Content-Length` header, if present and numeric
    pub content_length: Option<u64>,
}

/// Status and streaming body from a `GET` request.
#[derive(Debug)]
pub struct FetchResponse<B> {
    pub status: u16,
    pub body: B,
}

/// Whether `status` is a 2xx code.
#[must_use]
pub const fn is_success(status: u16) -> bool {
    status >= 200 && status < 300
}

/// A response body read chunk by chunk.
#[allow(async_fn_in_trait)]
pub trait FetchBody {
    /// The next chunk, or `None` at end of body.
    async fn chunk(&mut self) -> Result<Option<Vec<u8>>>;
}

/// Minimal HTTP client surface used by the updater.
#[allow(async_fn_in_trait)]
pub trait Fetch {
    type Body: FetchBody;

    /// Issues a `HEAD` request bounded by `timeout`.
    async fn head(&self, url: &str, timeout: Duration) -> Result<FetchHead>;

    /// Issues a `GET` request. With `Some(timeout)` the whole exchange,
    /// body included, is bounded; with `None` it is not.
    async fn get(&self, url: &str, timeout: Option<Duration>) -> Result<FetchResponse<Self::Body>>;
}

/// Reads at most `max` bytes of `body`.
pub async fn read_limited<B: FetchBody>(body: &mut B, max: usize) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    while out.len() < max {
        let Some(chunk) = body.chunk().await? else {
            break;
        };
        let take = chunk.len().min(max - out.len());
        out.extend_from_slice(&chunk[..take]);
    }
    Ok(out)
}

/// [`Fetch`] backed by a shared `reqwest` client.
///
/// Proxy settings come from the standard environment variables, which
/// reqwest honours by default.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with a `tsupdate/<version>` user agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| UpdateError::network("initialise HTTP client", e))?;
        Ok(Self {
            client,
        })
    }
}

/// Streaming body of a reqwest response.
#[derive(Debug)]
pub struct HttpBody {
    response: reqwest::Response,
    operation: String,
}

impl FetchBody for HttpBody {
    async fn chunk(&mut self) -> Result<Option<Vec<u8>>> {
        match self.response.chunk().await {
            Ok(chunk) => Ok(chunk.map(|bytes| bytes.to_vec())),
            Err(e) => Err(UpdateError::network(self.operation.clone(), e).into()),
        }
    }
}

impl Fetch for HttpFetcher {
    type Body = HttpBody;

    async fn head(&self, url: &str, timeout: Duration) -> Result<FetchHead> {
        let operation = format!("HEAD {url}");
        tracing::debug!(target: "download", "{}", operation);
        let response = self
            .client
            .head(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| UpdateError::network(operation.clone(), e))?;

        // reqwest reports a zero body length for HEAD, so read the header itself.
        let content_length = response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());

        Ok(FetchHead {
            status: response.status().as_u16(),
            content_length,
        })
    }

    async fn get(&self, url: &str, timeout: Option<Duration>) -> Result<FetchResponse<HttpBody>> {
        let operation = format!("GET {url}");
        tracing::debug!(target: "download", "{}", operation);
        let mut request = self.client.get(url);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response =
            request.send().await.map_err(|e| UpdateError::network(operation.clone(), e))?;

        Ok(FetchResponse {
            status: response.status().as_u16(),
            body: HttpBody {
                response,
                operation,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Chunks(Vec<Vec<u8>>);

    impl FetchBody for Chunks {
        async fn chunk(&mut self) -> Result<Option<Vec<u8>>> {
            Ok(if self.0.is_empty() {
                None
            } else {
                Some(self.0.remove(0))
            })
        }
    }

    #[tokio::test]
    async fn test_read_limited_truncates() {
        let mut body = Chunks(vec![b"0123456789".to_vec(), b"abcdef".to_vec()]);
        let out = read_limited(&mut body, 12).await.unwrap();
        assert_eq!(out, b"0123456789ab");
    }

    #[tokio::test]
    async fn test_read_limited_short_body() {
        let mut body = Chunks(vec![b"abc".to_vec()]);
        assert_eq!(read_limited(&mut body, 100).await.unwrap(), b"abc");
    }

    #[test]
    fn test_is_success() {
        assert!(is_success(200));
        assert!(is_success(204));
        assert!(!is_success(304));
        assert!(!is_success(404));
    }
}
