//! Application configuration for notesync.
//!
//! User config lives at `~/.notesync/notesync.toml` and is optional: every
//! field has a default. Credentials never live in the file; it only names the
//! environment variables holding them. CLI flags override file values.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{NoteSyncError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "notesync.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".notesync";

// ---------------------------------------------------------------------------
// Config structs (matching notesync.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Sync loop settings.
    #[serde(default)]
    pub sync: SyncSettings,

    /// Retry policy for source fetches.
    #[serde(default)]
    pub retry: RetrySettings,

    /// Reading platform (source) settings.
    #[serde(default)]
    pub weread: WereadSettings,

    /// Note database (destination) settings.
    #[serde(default)]
    pub notion: NotionSettings,
}

/// `[sync]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Notes requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Stop after this many non-empty pages. Unlimited when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,

    /// Check for duplicates but never write.
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_pages: None,
            dry_run: false,
        }
    }
}

fn default_page_size() -> u32 {
    20
}

/// How the delay grows between fetch attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    /// Same delay before every retry.
    #[default]
    Fixed,
    /// Delay doubles after each failed attempt.
    Exponential,
}

/// `[retry]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts per page, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay between attempts in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    #[serde(default)]
    pub backoff: BackoffKind,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_delay_ms(),
            backoff: BackoffKind::default(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}
fn default_delay_ms() -> u64 {
    2000
}

/// `[weread]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WereadSettings {
    /// API origin.
    #[serde(default = "default_weread_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Name of the env var holding the session cookie.
    #[serde(default = "default_cookie_env")]
    pub cookie_env: String,
}

impl Default for WereadSettings {
    fn default() -> Self {
        Self {
            base_url: default_weread_base_url(),
            timeout_secs: default_timeout_secs(),
            cookie_env: default_cookie_env(),
        }
    }
}

fn default_weread_base_url() -> String {
    "https://i.weread.qq.com".into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_cookie_env() -> String {
    "WEREAD_COOKIE".into()
}

/// `[notion]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionSettings {
    /// API origin.
    #[serde(default = "default_notion_base_url")]
    pub base_url: String,

    /// Name of the env var holding the integration token.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Name of the env var holding the target database ID.
    #[serde(default = "default_database_id_env")]
    pub database_id_env: String,

    /// Maximum characters of content used as the record title.
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,

    /// Title used when a note has no content.
    #[serde(default = "default_title_placeholder")]
    pub title_placeholder: String,

    /// Database property names each record field is written to.
    #[serde(default)]
    pub properties: PropertyMapping,
}

impl Default for NotionSettings {
    fn default() -> Self {
        Self {
            base_url: default_notion_base_url(),
            token_env: default_token_env(),
            database_id_env: default_database_id_env(),
            title_max_chars: default_title_max_chars(),
            title_placeholder: default_title_placeholder(),
            properties: PropertyMapping::default(),
        }
    }
}

fn default_notion_base_url() -> String {
    "https://api.notion.com".into()
}
fn default_token_env() -> String {
    "NOTION_TOKEN".into()
}
fn default_database_id_env() -> String {
    "NOTION_DATABASE_ID".into()
}
fn default_title_max_chars() -> usize {
    20
}
fn default_title_placeholder() -> String {
    "Untitled note".into()
}

/// `[notion.properties]`: destination schema the records are mapped onto.
///
/// `title` must name the database's title property; `created` a date property;
/// the rest rich-text properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyMapping {
    #[serde(default = "default_prop_title")]
    pub title: String,
    #[serde(default = "default_prop_content")]
    pub content: String,
    /// Property holding the dedup key.
    #[serde(default = "default_prop_note_id")]
    pub note_id: String,
    #[serde(default = "default_prop_book")]
    pub book: String,
    #[serde(default = "default_prop_author")]
    pub author: String,
    #[serde(default = "default_prop_created")]
    pub created: String,
}

impl Default for PropertyMapping {
    fn default() -> Self {
        Self {
            title: default_prop_title(),
            content: default_prop_content(),
            note_id: default_prop_note_id(),
            book: default_prop_book(),
            author: default_prop_author(),
            created: default_prop_created(),
        }
    }
}

fn default_prop_title() -> String {
    "Title".into()
}
fn default_prop_content() -> String {
    "Content".into()
}
fn default_prop_note_id() -> String {
    "Note ID".into()
}
fn default_prop_book() -> String {
    "Book".into()
}
fn default_prop_author() -> String {
    "Author".into()
}
fn default_prop_created() -> String {
    "Created".into()
}

// ---------------------------------------------------------------------------
// Credentials (runtime, resolved from the environment)
// ---------------------------------------------------------------------------

/// The three secrets a sync run needs.
#[derive(Clone)]
pub struct Credentials {
    pub weread_cookie: String,
    pub notion_token: String,
    pub notion_database_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("weread_cookie", &"<redacted>")
            .field("notion_token", &"<redacted>")
            .field("notion_database_id", &self.notion_database_id)
            .finish()
    }
}

/// Read credentials from the process environment.
pub fn resolve_credentials(config: &AppConfig) -> Result<Credentials> {
    resolve_credentials_with(config, |name| std::env::var(name).ok())
}

/// Read credentials through `lookup`. Every missing or empty variable is
/// named in the error, not just the first one.
pub fn resolve_credentials_with<F>(config: &AppConfig, lookup: F) -> Result<Credentials>
where
    F: Fn(&str) -> Option<String>,
{
    let mut missing = Vec::new();
    let mut get = |name: &str| match lookup(name) {
        Some(val) if !val.trim().is_empty() => val,
        _ => {
            missing.push(name.to_string());
            String::new()
        }
    };

    let weread_cookie = get(&config.weread.cookie_env);
    let notion_token = get(&config.notion.token_env);
    let notion_database_id = get(&config.notion.database_id_env);

    if !missing.is_empty() {
        return Err(NoteSyncError::config(format!(
            "missing required environment variables: {}. \
             Set them in the environment or in a .env file.",
            missing.join(", ")
        )));
    }

    Ok(Credentials {
        weread_cookie,
        notion_token,
        notion_database_id,
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Reject values the sync loop cannot run with.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.sync.page_size == 0 {
        return Err(NoteSyncError::config("sync.page_size must be at least 1"));
    }
    if config.notion.title_max_chars == 0 {
        return Err(NoteSyncError::config("notion.title_max_chars must be at least 1"));
    }
    parse_base_url("weread.base_url", &config.weread.base_url)?;
    parse_base_url("notion.base_url", &config.notion.base_url)?;

    let props = &config.notion.properties;
    for (key, name) in [
        ("title", &props.title),
        ("content", &props.content),
        ("note_id", &props.note_id),
        ("book", &props.book),
        ("author", &props.author),
        ("created", &props.created),
    ] {
        if name.trim().is_empty() {
            return Err(NoteSyncError::config(format!(
                "notion.properties.{key} must not be empty"
            )));
        }
    }
    Ok(())
}

/// Parse a configured API origin.
pub fn parse_base_url(key: &str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| NoteSyncError::config(format!("{key} '{value}' is invalid: {e}")))
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.notesync/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| NoteSyncError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.notesync/notesync.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NoteSyncError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| NoteSyncError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| NoteSyncError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| NoteSyncError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NoteSyncError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
