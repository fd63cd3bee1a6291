//! The fetch capability: `GET url -> bytes`, layered.
//!
//! - [`HttpFetcher`]: blocking `ureq` client with bounded retry and exponential backoff
//! - [`DiskCache`]: persists successful bodies of immutable URLs across runs, keyed by
//!   SHA-256 of the URL
//! - [`CachedFetcher`]: run-scoped memo, at most one underlying fetch per URL
//! - [`StaticFetcher`]: canned in-memory responses with call counting, for tests and
//!   offline fixtures

use c2g_core::memo::MemoCache;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Response body shared between cache entries and callers.
pub type Body = Arc<Vec<u8>>;

/// Largest body accepted from the registry (crate archives included).
const MAX_BODY_BYTES: u64 = 512 * 1024 * 1024;

/// Ceiling for a single retry delay.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Errors from fetching a URL. Clone so results can be memoized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("cache I/O for {url}: {message}")]
    Io { url: String, message: String },
    #[error("could not decode response from {url}: {message}")]
    Parse { url: String, message: String },
    #[error("giving up on {url} after {attempts} attempts: {last}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last: String,
    },
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }

    /// Worth another attempt: connection-level failures, 429 and 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Something that can GET a URL. Implementations must be idempotent.
pub trait Fetch: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Body, FetchError>;
}

/// Fetch `url` and decode the body as JSON.
pub fn fetch_json<T: DeserializeOwned>(fetcher: &dyn Fetch, url: &str) -> Result<T, FetchError> {
    let body = fetcher.fetch(url)?;
    serde_json::from_slice(&body).map_err(|e| FetchError::Parse {
        url: url.to_string(),
        message: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// Blocking HTTP client for the registry.
pub struct HttpFetcher {
    agent: ureq::Agent,
    user_agent: String,
    max_retries: u32,
    backoff: Duration,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration, max_retries: u32, backoff: Duration) -> Self {
        Self {
            agent: ureq::Agent::new_with_config(
                ureq::config::Config::builder()
                    .timeout_global(Some(timeout))
                    .build(),
            ),
            user_agent: user_agent.to_string(),
            max_retries,
            backoff,
        }
    }

    fn fetch_once(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut response = self
            .agent
            .get(url)
            .header("User-Agent", &self.user_agent)
            .call()
            .map_err(|e| match e {
                ureq::Error::StatusCode(status) => FetchError::Status {
                    url: url.to_string(),
                    status,
                },
                other => FetchError::Transport {
                    url: url.to_string(),
                    message: other.to_string(),
                },
            })?;

        response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_vec()
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })
    }

    fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff
            .saturating_mul(1u32 << attempt.min(16))
            .min(MAX_BACKOFF)
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Body, FetchError> {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            match self.fetch_once(url) {
                Ok(body) => return Ok(Arc::new(body)),
                Err(e) if e.is_transient() => {
                    tracing::warn!("GET {} attempt {} failed: {}", url, attempt + 1, e);
                    last_err = Some(e);
                    if attempt < self.max_retries {
                        std::thread::sleep(self.backoff_for(attempt));
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(FetchError::RetriesExhausted {
            url: url.to_string(),
            attempts: self.max_retries + 1,
            last: last_err.map(|e| e.to_string()).unwrap_or_default(),
        })
    }
}

// ---------------------------------------------------------------------------
// Disk cache
// ---------------------------------------------------------------------------

/// Whether the registry never changes the body behind `url` once published.
///
/// Version records, dependency lists and archives live at least two path segments
/// below `/crates/` and are immutable. The crate record (`/crates/{name}`) carries
/// `max_version` and changes with every release.
pub fn is_immutable_registry_url(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    path.rfind("/crates/").is_some_and(|at| {
        path[at + "/crates/".len()..]
            .split('/')
            .filter(|segment| !segment.is_empty())
            .count()
            >= 2
    })
}

/// Persistent response cache in front of another fetcher.
///
/// Only successful bodies of URLs accepted by the filter are stored; everything
/// else goes straight to the inner fetcher. Write failures are logged, never fatal.
pub struct DiskCache {
    dir: PathBuf,
    inner: Box<dyn Fetch>,
    cacheable: fn(&str) -> bool,
}

impl DiskCache {
    /// A cache that stores every successful body.
    pub fn new(dir: PathBuf, inner: Box<dyn Fetch>) -> Self {
        Self {
            dir,
            inner,
            cacheable: |_| true,
        }
    }

    /// Restrict the cache to URLs for which `cacheable` returns true.
    #[must_use]
    pub fn only_if(mut self, cacheable: fn(&str) -> bool) -> Self {
        self.cacheable = cacheable;
        self
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        let key = format!("{:x}", Sha256::digest(url.as_bytes()));
        self.dir.join(&key[..2]).join(key)
    }
}

impl Fetch for DiskCache {
    fn fetch(&self, url: &str) -> Result<Body, FetchError> {
        if !(self.cacheable)(url) {
            return self.inner.fetch(url);
        }
        let path = self.entry_path(url);

        match std::fs::read(&path) {
            Ok(bytes) => {
                tracing::debug!(%url, "disk cache hit");
                return Ok(Arc::new(bytes));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(FetchError::Io {
                    url: url.to_string(),
                    message: e.to_string(),
                });
            }
        }

        let body = self.inner.fetch(url)?;

        if let Err(e) = write_atomic(&path, &body) {
            tracing::warn!(%url, path = %path.display(), "could not write cache entry: {}", e);
        }

        Ok(body)
    }
}

fn write_atomic(path: &std::path::Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension(format!("tmp{}", std::process::id()));
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)
}

// ---------------------------------------------------------------------------
// In-memory memo
// ---------------------------------------------------------------------------

/// Run-scoped memo over another fetcher. Concurrent requests for one URL share a
/// single underlying fetch; errors are memoized too.
pub struct CachedFetcher {
    inner: Box<dyn Fetch>,
    memo: MemoCache<String, Result<Body, FetchError>>,
}

impl CachedFetcher {
    pub fn new(inner: Box<dyn Fetch>) -> Self {
        Self {
            inner,
            memo: MemoCache::new(),
        }
    }
}

impl Fetch for CachedFetcher {
    fn fetch(&self, url: &str) -> Result<Body, FetchError> {
        self.memo
            .get_or_compute(&url.to_string(), || self.inner.fetch(url))
    }
}

// ---------------------------------------------------------------------------
// Static responses
// ---------------------------------------------------------------------------

/// Serves canned bodies from memory; unknown URLs answer 404. Counts calls per URL.
#[derive(Default)]
pub struct StaticFetcher {
    responses: HashMap<String, Result<Body, FetchError>>,
    calls: std::sync::Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.responses
            .insert(url.to_string(), Ok(Arc::new(body.into())));
        self
    }

    pub fn with_json(self, url: &str, value: &serde_json::Value) -> Self {
        self.with_body(url, value.to_string())
    }

    pub fn with_error(mut self, url: &str, error: FetchError) -> Self {
        self.responses.insert(url.to_string(), Err(error));
        self
    }

    /// How many times `url` was requested.
    pub fn calls(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    /// Total number of requests served.
    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

impl Fetch for StaticFetcher {
    fn fetch(&self, url: &str) -> Result<Body, FetchError> {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self
            .calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .entry(url.to_string())
            .or_default() += 1;

        self.responses.get(url).cloned().unwrap_or_else(|| {
            Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        })
    }
}

impl<F: Fetch + ?Sized> Fetch for Arc<F> {
    fn fetch(&self, url: &str) -> Result<Body, FetchError> {
        (**self).fetch(url)
    }
}
