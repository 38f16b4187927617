//! Capability traits the sync loop is written against.
//!
//! The HTTP clients in `notesync-weread` and `notesync-notion` implement these;
//! tests substitute in-memory fakes.

use std::future::Future;

use crate::error::Result;
use crate::types::{Note, Record};

/// Read side: a paginated list of notes.
pub trait NoteSource {
    /// Fetch one page of notes starting at `offset`.
    ///
    /// An empty vector means the source has no more notes. Any failure,
    /// including a delivered response with a non-success status, is an `Err`.
    fn fetch_page(&self, offset: u32, limit: u32)
    -> impl Future<Output = Result<Vec<Note>>> + Send;
}

/// Write side: the database notes are copied into.
pub trait NoteDestination {
    /// Whether a record carrying `note_id` already exists. Must not mutate anything.
    fn exists(&self, note_id: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Create exactly one record.
    fn create(&self, record: &Record) -> impl Future<Output = Result<()>> + Send;
}
