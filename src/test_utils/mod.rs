//! Test utilities for tsupdate
//!
//! In-memory stand-ins for the collaborators an [`Updater`] is built from,
//! so strategy runs can be exercised without a network, a terminal, or
//! elevated privileges.
//!
//! - [`MemoryFetcher`] serves canned responses and counts every request
//! - [`ScriptedPrompt`] answers the confirmation prompt and records questions
//! - [`FakeCapabilities`] reports a fixed elevation state
//!
//! [`Updater`]: crate::update::Updater

use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::core::UpdateError;
use crate::update::capabilities::PlatformCapabilities;
use crate::update::confirm::Prompt;
use crate::update::fetch::{Fetch, FetchBody, FetchHead, FetchResponse};

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Respects `RUST_LOG` when no level is given; with neither, logging stays
/// off.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// A canned HTTP response.
#[derive(Debug, Clone)]
pub struct MemoryResponse {
    pub status: u16,
    pub body: Vec<u8>,
    /// Value reported by `HEAD`; defaults to the body length
    pub content_length: Option<u64>,
}

impl MemoryResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        Self {
            status: 200,
            content_length: Some(body.len() as u64),
            body,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
            content_length: None,
        }
    }

    /// Overrides the declared length without changing the body.
    #[must_use]
    pub fn with_content_length(mut self, length: Option<u64>) -> Self {
        self.content_length = length;
        self
    }
}

/// [`Fetch`] over a fixed URL table.
///
/// Clones share the request counter and log, so a test can keep a handle
/// after moving the fetcher into an updater. Unknown URLs answer 404.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    responses: Arc<HashMap<String, MemoryResponse>>,
    calls: Arc<AtomicUsize>,
    log: Arc<Mutex<Vec<String>>>,
}

impl MemoryFetcher {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = (S, MemoryResponse)>,
        S: Into<String>,
    {
        Self {
            responses: Arc::new(responses.into_iter().map(|(url, r)| (url.into(), r)).collect()),
            ..Self::default()
        }
    }

    /// Number of `HEAD` and `GET` requests issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests issued so far, as `"<METHOD> <url>"`.
    pub fn requests(&self) -> Vec<String> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    fn record(&self, method: &str, url: &str) -> MemoryResponse {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut log) = self.log.lock() {
            log.push(format!("{method} {url}"));
        }
        self.responses.get(url).cloned().unwrap_or_else(|| MemoryResponse::status(404))
    }
}

/// Body served in fixed-size chunks.
#[derive(Debug)]
pub struct MemoryBody {
    data: Vec<u8>,
    pos: usize,
}

const CHUNK: usize = 7;

impl FetchBody for MemoryBody {
    async fn chunk(&mut self) -> Result<Option<Vec<u8>>> {
        if self.pos >= self.data.len() {
            return Ok(None);
        }
        let end = (self.pos + CHUNK).min(self.data.len());
        let chunk = self.data[self.pos..end].to_vec();
        self.pos = end;
        Ok(Some(chunk))
    }
}

impl Fetch for MemoryFetcher {
    type Body = MemoryBody;

    async fn head(&self, url: &str, _timeout: Duration) -> Result<FetchHead> {
        let response = self.record("HEAD", url);
        Ok(FetchHead {
            status: response.status,
            content_length: response.content_length,
        })
    }

    async fn get(&self, url: &str, _timeout: Option<Duration>) -> Result<FetchResponse<MemoryBody>> {
        let response = self.record("GET", url);
        Ok(FetchResponse {
            status: response.status,
            body: MemoryBody {
                data: response.body,
                pos: 0,
            },
        })
    }
}

/// [`Prompt`] that replays one answer.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answer: Option<String>,
    /// Every question asked, in order
    pub questions: Vec<String>,
}

impl ScriptedPrompt {
    /// `None` behaves like a failed read.
    pub const fn new(answer: Option<String>) -> Self {
        Self {
            answer,
            questions: Vec::new(),
        }
    }

    pub fn answering(answer: &str) -> Self {
        Self::new(Some(answer.to_string()))
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&mut self, question: &str) -> Option<String> {
        self.questions.push(question.to_string());
        self.answer.clone()
    }
}

/// [`PlatformCapabilities`] with a fixed elevation state.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeCapabilities {
    pub elevated: bool,
}

impl FakeCapabilities {
    pub const fn elevated() -> Self {
        Self {
            elevated: true,
        }
    }

    pub const fn unprivileged() -> Self {
        Self {
            elevated: false,
        }
    }
}

impl PlatformCapabilities for FakeCapabilities {
    async fn is_elevated(&self) -> bool {
        self.elevated
    }

    async fn verify_signature(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    async fn mark_temp_file(&self, _path: &Path) -> Result<()> {
        Err(UpdateError::validation("temp file marking is not faked").into())
    }
}
