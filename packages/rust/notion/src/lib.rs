//! Client for the Notion database notes are synced into.
//!
//! Provides the two destination capabilities: an exact-match lookup on the
//! note ID property ([`NotionClient::find_by_note_id`]) and page creation
//! ([`NotionClient::create_page`]). Requests carry no timeout.

mod payload;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use notesync_shared::{
    AppConfig, NoteDestination, NoteSyncError, PropertyMapping, Record, Result, parse_base_url,
};

/// API version the request/response shapes are written against.
const NOTION_API_VERSION: &str = "2022-06-28";

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("notesync/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Runtime configuration for [`NotionClient`].
#[derive(Clone)]
pub struct NotionConfig {
    /// API origin, e.g. `https://api.notion.com`.
    pub base_url: Url,
    /// Integration token.
    pub token: String,
    /// Database every record is written to.
    pub database_id: String,
    /// Property names the record fields map onto.
    pub properties: PropertyMapping,
}

impl NotionConfig {
    /// Build from the loaded app config plus the resolved secrets.
    pub fn from_app_config(
        config: &AppConfig,
        token: impl Into<String>,
        database_id: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url("notion.base_url", &config.notion.base_url)?,
            token: token.into(),
            database_id: database_id.into(),
            properties: config.notion.properties.clone(),
        })
    }
}

impl std::fmt::Debug for NotionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotionConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"<redacted>")
            .field("database_id", &self.database_id)
            .field("properties", &self.properties)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Authenticated client bound to one database.
pub struct NotionClient {
    client: Client,
    query_url: Url,
    pages_url: Url,
    database_id: String,
    properties: PropertyMapping,
}

impl NotionClient {
    /// Create a client. Fails if the token is not a valid header value.
    pub fn new(config: NotionConfig) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| NoteSyncError::config("Notion token contains invalid header characters"))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            HeaderName::from_static("notion-version"),
            HeaderValue::from_static(NOTION_API_VERSION),
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| NoteSyncError::Network(format!("failed to build HTTP client: {e}")))?;

        let join = |path: &str| {
            config
                .base_url
                .join(path)
                .map_err(|e| NoteSyncError::config(format!("invalid Notion base URL: {e}")))
        };
        let query_url = join(&format!("v1/databases/{}/query", config.database_id))?;
        let pages_url = join("v1/pages")?;

        Ok(Self {
            client,
            query_url,
            pages_url,
            database_id: config.database_id,
            properties: config.properties,
        })
    }

    /// Whether any page in the database carries `note_id` in the ID property.
    ///
    /// An empty ID is rejected: the filter would not express "this note".
    #[instrument(skip(self))]
    pub async fn find_by_note_id(&self, note_id: &str) -> Result<bool> {
        if note_id.is_empty() {
            return Err(NoteSyncError::validation("cannot look up an empty note ID"));
        }

        let body = payload::exists_query(&self.properties.note_id, note_id);
        let response = self.post(&self.query_url, &body).await?;

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| NoteSyncError::Decode(format!("database query: {e}")))?;

        debug!(matches = parsed.results.len(), "database query returned");
        Ok(!parsed.results.is_empty())
    }

    /// Create one page for `record`.
    #[instrument(skip_all, fields(note_id = %record.note_id))]
    pub async fn create_page(&self, record: &Record) -> Result<()> {
        let body = payload::create_page(&self.database_id, &self.properties, record);
        self.post(&self.pages_url, &body).await?;
        debug!("page created");
        Ok(())
    }

    async fn post(&self, url: &Url, body: &Value) -> Result<Response> {
        let response = self
            .client
            .post(url.as_str())
            .json(body)
            .send()
            .await
            .map_err(|e| NoteSyncError::Destination(format!("{url}: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let detail = match serde_json::from_str::<ApiError>(&text) {
            Ok(ApiError {
                code: Some(code),
                message: Some(message),
            }) => format!("{code}: {message}"),
            _ => text,
        };
        Err(NoteSyncError::Destination(format!(
            "{url}: HTTP {status}: {detail}"
        )))
    }
}

impl NoteDestination for NotionClient {
    async fn exists(&self, note_id: &str) -> Result<bool> {
        self.find_by_note_id(note_id).await
    }

    async fn create(&self, record: &Record) -> Result<()> {
        self.create_page(record).await
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> NotionClient {
        NotionClient::new(NotionConfig {
            base_url: Url::parse(&server.uri()).unwrap(),
            token: "secret_abc".into(),
            database_id: "db123".into(),
            properties: PropertyMapping::default(),
        })
        .unwrap()
    }

    fn record() -> Record {
        Record {
            title: "Simplify".into(),
            content: "Simplify, simplify.".into(),
            note_id: "n1".into(),
            book: "Walden".into(),
            author: "Thoreau".into(),
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_exists_true_when_match_found() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/databases/db123/query"))
            .and(header("authorization", "Bearer secret_abc"))
            .and(header("notion-version", NOTION_API_VERSION))
            .and(body_partial_json(serde_json::json!({
                "filter": { "property": "Note ID", "rich_text": { "equals": "n1" } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "list",
                "results": [{ "object": "page", "id": "p1" }],
                "has_more": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        assert!(client_for(&server).exists("n1").await.unwrap());
    }

    #[tokio::test]
    async fn test_exists_false_on_empty_results() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/databases/db123/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "list",
                "results": [],
                "has_more": false
            })))
            .mount(&server)
            .await;

        assert!(!client_for(&server).exists("n2").await.unwrap());
    }

    #[tokio::test]
    async fn test_exists_rejects_empty_id_without_request() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server).exists("").await.unwrap_err();
        assert!(matches!(err, NoteSyncError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_posts_page() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/pages"))
            .and(body_partial_json(serde_json::json!({
                "parent": { "database_id": "db123" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "page",
                "id": "p9"
            })))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).create(&record()).await.unwrap();
    }

    #[tokio::test]
    async fn test_api_error_surfaces_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/pages"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "object": "error",
                "status": 400,
                "code": "validation_error",
                "message": "Note ID is not a property that exists."
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).create(&record()).await.unwrap_err();
        match err {
            NoteSyncError::Destination(msg) => {
                assert!(msg.contains("400"));
                assert!(msg.contains("validation_error"));
                assert!(msg.contains("not a property"));
            }
            other => panic!("expected Destination, got {other:?}"),
        }
    }

    #[test]
    fn test_config_debug_redacts_token() {
        let config =
            NotionConfig::from_app_config(&AppConfig::default(), "secret_abc", "db123").unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret_abc"));
        assert!(debug.contains("db123"));
    }
}
