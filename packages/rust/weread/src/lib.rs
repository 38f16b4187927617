//! Client for the WeRead bookmark list, the source side of a sync.
//!
//! One call fetches one page of highlights. The client makes a single attempt
//! per call; retrying is the caller's job.

mod wire;

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use tracing::{debug, instrument};
use url::Url;

use notesync_shared::{AppConfig, Note, NoteSource, NoteSyncError, Result, parse_base_url};

/// Browser-like User-Agent; the endpoint rejects obvious bots.
const USER_AGENT: &str = concat!("Mozilla/5.0 (compatible; notesync/", env!("CARGO_PKG_VERSION"), ")");

/// Path of the bookmark list endpoint, relative to the API origin.
const BOOKMARK_LIST_PATH: &str = "book/bookmarklist";

/// Fixed ordering/selection parameters sent with every page request.
const ORDER_BY: &str = "1";
const SELECT_TYPE: &str = "0";

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Runtime configuration for [`WereadClient`].
#[derive(Clone)]
pub struct WereadConfig {
    /// API origin, e.g. `https://i.weread.qq.com`.
    pub base_url: Url,
    /// Session cookie copied from a logged-in browser.
    pub cookie: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl WereadConfig {
    /// Build from the loaded app config plus the resolved cookie.
    pub fn from_app_config(config: &AppConfig, cookie: impl Into<String>) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url("weread.base_url", &config.weread.base_url)?,
            cookie: cookie.into(),
            timeout: Duration::from_secs(config.weread.timeout_secs),
        })
    }
}

impl std::fmt::Debug for WereadConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WereadConfig")
            .field("base_url", &self.base_url.as_str())
            .field("cookie", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Authenticated client for the bookmark list endpoint.
pub struct WereadClient {
    client: Client,
    endpoint: Url,
}

impl WereadClient {
    /// Create a client. Fails if the cookie is not a valid header value.
    pub fn new(config: WereadConfig) -> Result<Self> {
        let mut cookie = HeaderValue::from_str(&config.cookie)
            .map_err(|_| NoteSyncError::config("WeRead cookie contains invalid header characters"))?;
        cookie.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, cookie);

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| NoteSyncError::Network(format!("failed to build HTTP client: {e}")))?;

        let endpoint = config
            .base_url
            .join(BOOKMARK_LIST_PATH)
            .map_err(|e| NoteSyncError::config(format!("invalid WeRead base URL: {e}")))?;

        Ok(Self { client, endpoint })
    }

    /// Fetch the page of bookmarks starting at `offset`.
    #[instrument(skip(self))]
    pub async fn fetch_bookmarks(&self, offset: u32, limit: u32) -> Result<Vec<Note>> {
        let url = &self.endpoint;
        let start = offset.to_string();
        let limit = limit.to_string();

        let response = self
            .client
            .get(url.as_str())
            .query(&[
                ("start", start.as_str()),
                ("limit", limit.as_str()),
                ("orderby", ORDER_BY),
                ("selectType", SELECT_TYPE),
            ])
            .send()
            .await
            .map_err(|e| NoteSyncError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NoteSyncError::Network(format!("{url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| NoteSyncError::Network(format!("{url}: failed to read body: {e}")))?;

        let notes = wire::decode_page(&body)?;
        debug!(count = notes.len(), "bookmark page decoded");
        Ok(notes)
    }
}

impl NoteSource for WereadClient {
    async fn fetch_page(&self, offset: u32, limit: u32) -> Result<Vec<Note>> {
        self.fetch_bookmarks(offset, limit).await
    }
}
