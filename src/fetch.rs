//! Fetching specifications over HTTP.
//!
//! The analysis engine only sees bytes; this module is the collaborator that
//! produces them for URL sources.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::document::Format;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("oascheck/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur while fetching a specification.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("rate limited by server")]
    RateLimited,
    #[error("server returned HTTP {0}")]
    Status(u16),
    #[error("could not start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// A fetched document.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub url: String,
    pub bytes: Vec<u8>,
    pub format: Option<Format>,
}

/// HTTP client for specification documents.
pub struct Fetcher {
    http: reqwest::Client,
    token: Option<String>,
    timeout: Duration,
}

impl Fetcher {
    pub fn new(token: Option<String>) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self {
            http,
            token: token.filter(|t| !t.is_empty()),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// GET a document. Non-2xx statuses are errors.
    pub async fn fetch(&self, url: &str) -> Result<Fetched, FetchError> {
        debug!(url, "fetching specification");
        let mut request = self.http.get(url).timeout(self.timeout);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Network(e)
            }
        })?;

        match response.status().as_u16() {
            200..=299 => {}
            429 => return Err(FetchError::RateLimited),
            status => return Err(FetchError::Status(status)),
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?.to_vec();
        let format = format_hint(url, content_type.as_deref());

        info!(url, size = bytes.len(), format = ?format, "fetched specification");
        Ok(Fetched {
            url: url.to_string(),
            bytes,
            format,
        })
    }

    /// Blocking wrapper over [`Fetcher::fetch`].
    pub fn fetch_blocking(&self, url: &str) -> Result<Fetched, FetchError> {
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.fetch(url))
    }
}

/// Format from the content type, falling back to the URL's extension.
fn format_hint(url: &str, content_type: Option<&str>) -> Option<Format> {
    content_type.and_then(Format::from_content_type).or_else(|| {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        path.rsplit_once('.')
            .filter(|(_, ext)| !ext.contains('/'))
            .and_then(|(_, ext)| Format::from_extension(ext))
    })
}

/// Whether a source string looks like an HTTP(S) URL.
pub fn is_url(source: &str) -> bool {
    let lower = source.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
