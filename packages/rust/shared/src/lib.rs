//! Shared types, error model, capability traits, and configuration for notesync.
//!
//! This crate is the foundation depended on by all other notesync crates.
//! It provides:
//! - [`NoteSyncError`]: the unified error type
//! - Domain types ([`Note`], [`Record`], [`PageCursor`])
//! - The [`NoteSource`] / [`NoteDestination`] traits the sync loop runs against
//! - Configuration ([`AppConfig`], [`Credentials`], config loading)

pub mod config;
pub mod error;
pub mod ports;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BackoffKind, Credentials, NotionSettings, PropertyMapping, RetrySettings,
    SyncSettings, WereadSettings, config_dir, config_file_path, init_config, load_config,
    load_config_from, parse_base_url, resolve_credentials, resolve_credentials_with,
    validate_config,
};
pub use error::{NoteSyncError, Result};
pub use ports::{NoteDestination, NoteSource};
pub use types::{Note, PageCursor, Record};
