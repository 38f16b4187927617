//! The sync loop: page through the source, skip what the destination already
//! has, write the rest.
//!
//! The loop is sequential. A page is fetched (under the retry policy), then
//! each of its notes is checked and written before the next note is looked at.
//! An empty page ends the run. Fetch failures that outlast the retry budget
//! abort the run; per-note destination failures are reported and skipped.

use std::time::{Duration, Instant};

use tracing::{debug, error, info, instrument, warn};

use notesync_shared::{
    AppConfig, Note, NoteDestination, NoteSource, NoteSyncError, PageCursor, Result,
};

use crate::record::{TitlePolicy, to_record};
use crate::retry::RetryPolicy;

// ---------------------------------------------------------------------------
// Options & report
// ---------------------------------------------------------------------------

/// Settings for one sync run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Notes requested per page.
    pub page_size: u32,
    /// Stop after this many non-empty pages.
    pub max_pages: Option<u32>,
    /// Check for duplicates but never write.
    pub dry_run: bool,
    /// Retry policy applied to every page fetch.
    pub retry: RetryPolicy,
    /// How record titles are derived.
    pub titles: TitlePolicy,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for SyncOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            page_size: config.sync.page_size,
            max_pages: config.sync.max_pages,
            dry_run: config.sync.dry_run,
            retry: RetryPolicy::from(&config.retry),
            titles: TitlePolicy::from(&config.notion),
        }
    }
}

/// Totals for a finished run.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Records created (or, in a dry run, that would have been created).
    pub added: usize,
    /// Notes whose ID was already present in the destination.
    pub skipped_existing: usize,
    /// Notes with no highlighted text.
    pub skipped_empty: usize,
    /// Notes with no ID to deduplicate on.
    pub skipped_invalid: usize,
    /// Notes whose lookup or write failed.
    pub failed: usize,
    /// Non-empty pages processed.
    pub pages: usize,
    pub dry_run: bool,
    pub elapsed: Duration,
}

/// Why a note was not written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A record with this note's ID already exists.
    AlreadySynced,
    /// The note has no text.
    EmptyContent,
    /// The note has no ID.
    MissingId,
}

/// What happened to a single note.
#[derive(Debug)]
enum NoteOutcome {
    Added,
    Skipped(SkipReason),
    Failed,
}

impl NoteOutcome {
    fn record(self, report: &mut SyncReport) {
        match self {
            NoteOutcome::Added => report.added += 1,
            NoteOutcome::Skipped(SkipReason::AlreadySynced) => report.skipped_existing += 1,
            NoteOutcome::Skipped(SkipReason::EmptyContent) => report.skipped_empty += 1,
            NoteOutcome::Skipped(SkipReason::MissingId) => report.skipped_invalid += 1,
            NoteOutcome::Failed => report.failed += 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for reporting sync status.
pub trait ProgressReporter: Send + Sync {
    /// Called after a non-empty page arrives.
    fn page_fetched(&self, offset: u32, count: usize);
    /// Called when a record is created (or would be, in a dry run).
    fn note_added(&self, note: &Note, dry_run: bool);
    /// Called when a note is skipped.
    fn note_skipped(&self, note: &Note, reason: SkipReason);
    /// Called when a lookup or write for a note fails.
    fn note_failed(&self, note: &Note, error: &NoteSyncError);
    /// Called once the run reaches the end of the source.
    fn done(&self, report: &SyncReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn page_fetched(&self, _offset: u32, _count: usize) {}
    fn note_added(&self, _note: &Note, _dry_run: bool) {}
    fn note_skipped(&self, _note: &Note, _reason: SkipReason) {}
    fn note_failed(&self, _note: &Note, _error: &NoteSyncError) {}
    fn done(&self, _report: &SyncReport) {}
}

// ---------------------------------------------------------------------------
// Sync loop
// ---------------------------------------------------------------------------

/// Run a full sync from `source` into `destination`.
///
/// Returns the run totals, or the fatal error that stopped the run. Only an
/// exhausted page fetch is fatal.
#[instrument(skip_all, fields(page_size = options.page_size, dry_run = options.dry_run))]
pub async fn run_sync<S, D>(
    source: &S,
    destination: &D,
    options: &SyncOptions,
    progress: &dyn ProgressReporter,
) -> Result<SyncReport>
where
    S: NoteSource + Sync,
    D: NoteDestination + Sync,
{
    let start = Instant::now();
    let mut cursor = PageCursor::start(options.page_size)?;
    let mut report = SyncReport {
        dry_run: options.dry_run,
        ..SyncReport::default()
    };

    info!(
        max_attempts = options.retry.attempts(),
        max_pages = ?options.max_pages,
        "starting sync"
    );

    loop {
        if let Some(max) = options.max_pages {
            if report.pages >= max as usize {
                info!(pages = report.pages, "page limit reached, stopping");
                break;
            }
        }

        let offset = cursor.offset();
        let limit = cursor.page_size();
        let notes = options
            .retry
            .run("page fetch", move |attempt| {
                debug!(offset, limit, attempt, "fetching page");
                source.fetch_page(offset, limit)
            })
            .await?;

        if notes.is_empty() {
            debug!(offset, "empty page, end of source");
            break;
        }

        report.pages += 1;
        progress.page_fetched(offset, notes.len());
        debug!(offset, count = notes.len(), "processing page");

        for note in &notes {
            sync_note(note, destination, options, progress)
                .await
                .record(&mut report);
        }

        cursor.advance();
    }

    report.elapsed = start.elapsed();

    info!(
        added = report.added,
        skipped_existing = report.skipped_existing,
        skipped_empty = report.skipped_empty,
        skipped_invalid = report.skipped_invalid,
        failed = report.failed,
        pages = report.pages,
        duration_ms = report.elapsed.as_millis() as u64,
        "sync completed"
    );
    progress.done(&report);

    Ok(report)
}

/// Check, then write, one note. Never fails the run.
async fn sync_note<D: NoteDestination>(
    note: &Note,
    destination: &D,
    options: &SyncOptions,
    progress: &dyn ProgressReporter,
) -> NoteOutcome {
    if !note.has_content() {
        debug!(note_id = %note.id, "empty content, skipping");
        progress.note_skipped(note, SkipReason::EmptyContent);
        return NoteOutcome::Skipped(SkipReason::EmptyContent);
    }

    if note.id.is_empty() {
        warn!(book = %note.book_name, "note has no ID, skipping");
        progress.note_skipped(note, SkipReason::MissingId);
        return NoteOutcome::Skipped(SkipReason::MissingId);
    }

    match destination.exists(&note.id).await {
        Ok(true) => {
            debug!(note_id = %note.id, "already synced, skipping");
            progress.note_skipped(note, SkipReason::AlreadySynced);
            return NoteOutcome::Skipped(SkipReason::AlreadySynced);
        }
        Ok(false) => {}
        Err(e) => {
            warn!(note_id = %note.id, error = %e, "duplicate check failed, not writing");
            progress.note_failed(note, &e);
            return NoteOutcome::Failed;
        }
    }

    if options.dry_run {
        debug!(note_id = %note.id, "dry run, would add");
        progress.note_added(note, true);
        return NoteOutcome::Added;
    }

    let record = to_record(note, &options.titles);
    match destination.create(&record).await {
        Ok(()) => {
            debug!(note_id = %note.id, book = %note.book_name, "note added");
            progress.note_added(note, false);
            NoteOutcome::Added
        }
        Err(e) => {
            error!(note_id = %note.id, error = %e, "failed to write note");
            progress.note_failed(note, &e);
            NoteOutcome::Failed
        }
    }
}
