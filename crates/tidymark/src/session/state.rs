//! In-memory progress for one collection's cleanup.

use super::store::{SessionRecord, SessionStore, SessionSummary, optional_timestamp};
use crate::error::StateError;
use crate::model::{BookmarkId, CollectionId};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

// ── Stats ──────────────────────────────────────────────────────────

/// Running counters for a collection, cumulative across resumptions.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SessionStats {
    /// Approved actions attempted (success or failure).
    pub processed: u64,
    pub kept: u64,
    pub deleted: u64,
    pub archived: u64,
    pub moved: u64,
    pub errors: u64,
    /// Bookmarks in batches where nothing was approved.
    pub skipped: u64,
    /// Seconds spent in earlier runs of this session.
    pub session_time: f64,
    /// When the current run started. Informational only.
    #[serde(
        deserialize_with = "optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<NaiveDateTime>,
}

impl SessionStats {
    pub fn apply(&mut self, delta: &StatsDelta) {
        self.processed += delta.processed;
        self.kept += delta.kept;
        self.deleted += delta.deleted;
        self.archived += delta.archived;
        self.moved += delta.moved;
        self.errors += delta.errors;
        self.skipped += delta.skipped;
    }

    /// Kept and deleted shares of `kept + deleted + archived + moved`, in
    /// percent. `None` when nothing was decided yet.
    pub fn kept_deleted_percent(&self) -> Option<(f64, f64)> {
        let total = self.kept + self.deleted + self.archived + self.moved;
        if total == 0 {
            return None;
        }
        let total = total as f64;
        Some((
            self.kept as f64 / total * 100.0,
            self.deleted as f64 / total * 100.0,
        ))
    }
}

/// Counter increments applied after a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsDelta {
    pub processed: u64,
    pub kept: u64,
    pub deleted: u64,
    pub archived: u64,
    pub moved: u64,
    pub errors: u64,
    pub skipped: u64,
}

impl StatsDelta {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl std::ops::AddAssign for StatsDelta {
    fn add_assign(&mut self, rhs: Self) {
        self.processed += rhs.processed;
        self.kept += rhs.kept;
        self.deleted += rhs.deleted;
        self.archived += rhs.archived;
        self.moved += rhs.moved;
        self.errors += rhs.errors;
        self.skipped += rhs.skipped;
    }
}

// ── Processed set ──────────────────────────────────────────────────

/// Insertion-ordered set of finalized bookmark ids.
#[derive(Debug, Clone, Default)]
pub struct ProcessedSet {
    order: Vec<BookmarkId>,
    members: HashSet<BookmarkId>,
}

impl ProcessedSet {
    /// Returns `false` if the id was already present.
    pub fn insert(&mut self, id: BookmarkId) -> bool {
        if self.members.insert(id) {
            self.order.push(id);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, id: BookmarkId) -> bool {
        self.members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn as_slice(&self) -> &[BookmarkId] {
        &self.order
    }
}

impl FromIterator<BookmarkId> for ProcessedSet {
    fn from_iter<I: IntoIterator<Item = BookmarkId>>(iter: I) -> Self {
        let mut set = ProcessedSet::default();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

// ── SessionState ───────────────────────────────────────────────────

/// What a loaded record offers to resume from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumePoint {
    pub current_page: u32,
    pub processed_count: usize,
    pub last_updated: NaiveDateTime,
    /// Whether the loaded record was written by a dry run.
    pub dry_run: bool,
}

/// Durable, resumable progress of one collection's cleanup.
///
/// Owns its [`SessionStore`]; the orchestrator owns the state for the
/// length of a run.
#[derive(Debug)]
pub struct SessionState {
    store: SessionStore,
    processed: ProcessedSet,
    current_page: u32,
    stats: SessionStats,
    started: Instant,
    dry_run: bool,
}

impl SessionState {
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            processed: ProcessedSet::default(),
            current_page: 0,
            stats: fresh_stats(),
            started: Instant::now(),
            dry_run: false,
        }
    }

    /// Mark records written from now on as dry-run records.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Load the durable record for a collection, if there is a valid one.
    ///
    /// Replaces the processed set and counters and restarts the live clock.
    /// Missing or invalid records leave the state untouched.
    pub fn load(
        &mut self,
        collection_id: CollectionId,
        collection_name: &str,
    ) -> Option<ResumePoint> {
        let record = self.store.read(collection_id, collection_name)?;

        self.processed = record.processed_bookmark_ids.iter().copied().collect();
        self.current_page = record.current_page;
        self.stats = record.stats;
        self.stats.start_time = Some(Local::now().naive_local());
        self.started = Instant::now();

        info!(
            "Loaded session for {collection_name:?}: page {}, {} processed",
            self.current_page,
            self.processed.len()
        );
        Some(ResumePoint {
            current_page: record.current_page,
            processed_count: self.processed.len(),
            last_updated: record.last_updated,
            dry_run: record.dry_run,
        })
    }

    /// Write the full state, with `page` as the resume cursor.
    pub fn checkpoint(
        &mut self,
        collection_id: CollectionId,
        collection_name: &str,
        page: u32,
    ) -> Result<PathBuf, StateError> {
        self.current_page = page;
        let mut stats = self.stats.clone();
        stats.session_time = self.total_session_secs();

        let record = SessionRecord {
            collection_id,
            collection_name: collection_name.to_string(),
            current_page: page,
            processed_bookmark_ids: self.processed.as_slice().to_vec(),
            stats,
            last_updated: Local::now().naive_local(),
            dry_run: self.dry_run,
        };
        self.store.write(&record)
    }

    /// Delete the durable record once the collection is fully triaged.
    /// Returns whether a record was removed.
    pub fn complete(&self, collection_id: CollectionId, collection_name: &str) -> bool {
        match self.store.remove(collection_id, collection_name) {
            Ok(removed) => removed,
            Err(e) => {
                warn!("Could not remove finished session record: {e}");
                false
            }
        }
    }

    /// Forget all progress and start over from page 0.
    pub fn reset(&mut self) {
        self.processed = ProcessedSet::default();
        self.current_page = 0;
        self.stats = fresh_stats();
        self.started = Instant::now();
    }

    /// Returns `false` if the id was already processed.
    pub fn mark_processed(&mut self, id: BookmarkId) -> bool {
        self.processed.insert(id)
    }

    pub fn is_processed(&self, id: BookmarkId) -> bool {
        self.processed.contains(id)
    }

    pub fn update_stats(&mut self, delta: &StatsDelta) {
        self.stats.apply(delta);
    }

    pub fn list_resumable(&self) -> Vec<SessionSummary> {
        self.store.list_resumable()
    }

    pub fn processed_ids(&self) -> &[BookmarkId] {
        self.processed.as_slice()
    }

    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Wall time since this run started (or since the last load/reset).
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Earlier runs plus the current one, in seconds.
    pub fn total_session_secs(&self) -> f64 {
        self.stats.session_time + self.elapsed().as_secs_f64()
    }

    /// Processed bookmarks per minute of the current run.
    pub fn rate_per_minute(&self) -> f64 {
        let minutes = self.elapsed().as_secs_f64() / 60.0;
        if minutes <= f64::EPSILON {
            return 0.0;
        }
        self.processed.len() as f64 / minutes
    }
}

fn fresh_stats() -> SessionStats {
    SessionStats {
        start_time: Some(Local::now().naive_local()),
        ..SessionStats::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_in(dir: &std::path::Path) -> SessionState {
        SessionState::new(SessionStore::new(dir).unwrap())
    }

    #[test]
    fn processed_set_is_idempotent_and_ordered() {
        let mut set = ProcessedSet::default();
        assert!(set.insert(3));
        assert!(set.insert(1));
        assert!(!set.insert(3));
        assert_eq!(set.as_slice(), &[3, 1]);
        assert!(set.contains(1));
        assert!(!set.contains(2));
    }

    #[test]
    fn checkpoint_then_load_restores_progress() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path());
        state.mark_processed(10);
        state.mark_processed(11);
        state.update_stats(&StatsDelta {
            processed: 1,
            deleted: 1,
            kept: 1,
            ..Default::default()
        });
        state.checkpoint(7, "Reading", 3).unwrap();

        let mut resumed = state_in(dir.path());
        let point = resumed.load(7, "Reading").unwrap();
        assert_eq!(point.current_page, 3);
        assert_eq!(point.processed_count, 2);
        assert!(resumed.is_processed(10));
        assert!(resumed.is_processed(11));
        assert_eq!(resumed.stats().deleted, 1);
        assert_eq!(resumed.current_page(), 3);
    }

    #[test]
    fn session_time_accumulates_without_double_counting() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        let mut record = SessionRecord {
            collection_id: 1,
            collection_name: "A".into(),
            current_page: 0,
            processed_bookmark_ids: vec![],
            stats: SessionStats {
                session_time: 600.0,
                ..Default::default()
            },
            last_updated: NaiveDateTime::default(),
            dry_run: false,
        };
        store.write(&record).unwrap();

        let mut state = SessionState::new(store.clone());
        state.load(1, "A").unwrap();
        state.checkpoint(1, "A", 0).unwrap();
        state.checkpoint(1, "A", 0).unwrap();

        record = store.read(1, "A").unwrap();
        assert!(record.stats.session_time >= 600.0);
        assert!(record.stats.session_time < 660.0);
        // The in-memory base is not bumped by checkpoints.
        assert_eq!(state.stats().session_time, 600.0);
    }

    #[test]
    fn load_missing_leaves_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path());
        state.mark_processed(5);
        assert!(state.load(1, "Nope").is_none());
        assert!(state.is_processed(5));
    }

    #[test]
    fn complete_deletes_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path());
        let path = state.checkpoint(2, "Done", 1).unwrap();
        assert!(path.exists());
        assert!(state.complete(2, "Done"));
        assert!(!path.exists());
        assert!(!state.complete(2, "Done"));
    }

    #[test]
    fn reset_clears_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path());
        state.mark_processed(1);
        state.update_stats(&StatsDelta {
            skipped: 4,
            ..Default::default()
        });
        state.checkpoint(1, "X", 5).unwrap();
        state.reset();
        assert_eq!(state.processed_count(), 0);
        assert_eq!(state.current_page(), 0);
        assert_eq!(state.stats().skipped, 0);
    }

    #[test]
    fn dry_run_flag_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path()).with_dry_run(true);
        state.checkpoint(4, "Sim", 0).unwrap();
        let mut other = state_in(dir.path());
        assert!(other.load(4, "Sim").unwrap().dry_run);
    }

    #[test]
    fn kept_deleted_percent_excludes_skipped() {
        let stats = SessionStats {
            kept: 3,
            deleted: 1,
            skipped: 100,
            ..Default::default()
        };
        let (kept, deleted) = stats.kept_deleted_percent().unwrap();
        assert_eq!(kept, 75.0);
        assert_eq!(deleted, 25.0);
        assert!(SessionStats::default().kept_deleted_percent().is_none());
    }
}
