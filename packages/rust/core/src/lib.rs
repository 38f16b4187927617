//! Sync orchestration for notesync.
//!
//! This crate holds the parts with decision logic: the retry policy wrapped
//! around source fetches, the note → record mapping, and the sync loop that
//! ties a [`NoteSource`](notesync_shared::NoteSource) to a
//! [`NoteDestination`](notesync_shared::NoteDestination).

pub mod record;
pub mod retry;
pub mod sync;

pub use record::{TitlePolicy, to_record};
pub use retry::RetryPolicy;
pub use sync::{ProgressReporter, SilentProgress, SkipReason, SyncOptions, SyncReport, run_sync};
