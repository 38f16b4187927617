//! Core domain types for notesync.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NoteSyncError, Result};

// ---------------------------------------------------------------------------
// Note
// ---------------------------------------------------------------------------

/// A highlighted passage as delivered by the reading platform.
///
/// Notes are read-only: the sync loop inspects them once and either skips
/// them or projects them into a [`Record`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Platform-assigned identifier, stable across runs. Used as the dedup key.
    pub id: String,
    /// Title of the book the passage was highlighted in.
    pub book_name: String,
    /// Author of that book.
    pub author: String,
    /// Highlighted text, whitespace-trimmed. May be empty.
    pub content: String,
    /// When the highlight was made, if the platform reported it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Note {
    /// Whether the note carries any highlighted text. Whitespace alone is none.
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// Destination-side projection of a [`Note`].
///
/// Created once per note ID and never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Display title, a bounded prefix of the content.
    pub title: String,
    /// Full highlighted text.
    pub content: String,
    /// The source note ID, stored so later runs can find this record.
    pub note_id: String,
    pub book: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// PageCursor
// ---------------------------------------------------------------------------

/// Offset/limit pair driving pagination through the source.
///
/// Each run starts at offset 0; nothing is persisted between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    offset: u32,
    page_size: u32,
}

impl PageCursor {
    /// Cursor positioned at the first page. A page size of 0 would never
    /// advance, so it is rejected.
    pub fn start(page_size: u32) -> Result<Self> {
        if page_size == 0 {
            return Err(NoteSyncError::validation("page size must be at least 1"));
        }
        Ok(Self {
            offset: 0,
            page_size,
        })
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Move to the next page.
    pub fn advance(&mut self) {
        self.offset = self.offset.saturating_add(self.page_size);
    }
}
