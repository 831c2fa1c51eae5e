//! On-disk session records, one JSON file per collection.
//!
//! Records live directly under the state directory (default
//! `.raindrop_state/`) and are named `collection_{id}_{slug}.json`, so the
//! file identity is the (collection id, collection name) pair:
//!
//! ```text
//! .raindrop_state/
//!   collection_42_Reading_List.json
//!   collection_7_Dev.json
//! ```
//!
//! Writes are atomic (temp file, then rename). Reads are lenient: a missing,
//! unreadable, malformed, or mismatched record is "no record".

use super::state::SessionStats;
use crate::error::StateError;
use crate::model::{BookmarkId, CollectionId};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const FILE_PREFIX: &str = "collection_";
const FILE_SUFFIX: &str = ".json";

// ── SessionRecord ──────────────────────────────────────────────────

/// The durable form of a [`SessionState`](super::SessionState).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub collection_id: CollectionId,
    pub collection_name: String,
    /// Resume cursor: the page the run was on when this was written.
    #[serde(default)]
    pub current_page: u32,
    /// In the order they were processed.
    #[serde(default)]
    pub processed_bookmark_ids: Vec<BookmarkId>,
    #[serde(default)]
    pub stats: SessionStats,
    #[serde(default = "unix_epoch", deserialize_with = "timestamp_or_epoch")]
    pub last_updated: NaiveDateTime,
    #[serde(default)]
    pub dry_run: bool,
}

/// Listing entry for a resumable session.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub path: PathBuf,
    pub collection_id: CollectionId,
    pub collection_name: String,
    pub current_page: u32,
    pub processed_count: usize,
    pub last_updated: NaiveDateTime,
    pub stats: SessionStats,
    pub dry_run: bool,
}

impl From<(PathBuf, SessionRecord)> for SessionSummary {
    fn from((path, record): (PathBuf, SessionRecord)) -> Self {
        Self {
            path,
            collection_id: record.collection_id,
            collection_name: record.collection_name,
            current_page: record.current_page,
            processed_count: record.processed_bookmark_ids.len(),
            last_updated: record.last_updated,
            stats: record.stats,
            dry_run: record.dry_run,
        }
    }
}

// ── SessionStore ───────────────────────────────────────────────────

/// Reads and writes [`SessionRecord`] files in one directory.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Open a store, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StateError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| StateError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for a collection.
    pub fn path_for(&self, collection_id: CollectionId, collection_name: &str) -> PathBuf {
        self.dir
            .join(state_file_name(collection_id, collection_name))
    }

    /// Atomic write: serialize to a temp file, then rename into place.
    pub fn write(&self, record: &SessionRecord) -> Result<PathBuf, StateError> {
        let final_path = self.path_for(record.collection_id, &record.collection_name);
        let tmp_name = format!(
            ".{}.tmp",
            state_file_name(record.collection_id, &record.collection_name)
        );
        let tmp_path = self.dir.join(tmp_name);

        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(&tmp_path, json).map_err(|e| StateError::io(&tmp_path, e))?;
        std::fs::rename(&tmp_path, &final_path).map_err(|e| StateError::io(&final_path, e))?;

        debug!(
            "Wrote session record {} ({} processed, page {})",
            final_path.display(),
            record.processed_bookmark_ids.len(),
            record.current_page
        );
        Ok(final_path)
    }

    /// Read the record for a collection. Any failure is logged and treated
    /// as "no record".
    pub fn read(&self, collection_id: CollectionId, collection_name: &str) -> Option<SessionRecord> {
        let path = self.path_for(collection_id, collection_name);
        if !path.exists() {
            return None;
        }
        let record = read_record(&path)?;
        if record.collection_id != collection_id || record.collection_name != collection_name {
            warn!(
                "Ignoring session record {}: it belongs to collection {} ({:?})",
                path.display(),
                record.collection_id,
                record.collection_name
            );
            return None;
        }
        Some(record)
    }

    /// Delete the record for a collection. Returns whether a file was removed.
    pub fn remove(
        &self,
        collection_id: CollectionId,
        collection_name: &str,
    ) -> Result<bool, StateError> {
        let path = self.path_for(collection_id, collection_name);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StateError::io(path, e)),
        }
    }

    /// Every `collection_*.json` file in the directory, sorted by name.
    pub fn state_files(&self) -> Result<Vec<PathBuf>, StateError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| StateError::io(&self.dir, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StateError::io(&self.dir, e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(FILE_PREFIX)
                && name.ends_with(FILE_SUFFIX)
                && entry.file_type().is_ok_and(|ft| ft.is_file())
            {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// All readable records, most recently updated first. Corrupt files are
    /// skipped.
    pub fn list_resumable(&self) -> Vec<SessionSummary> {
        let files = match self.state_files() {
            Ok(files) => files,
            Err(e) => {
                warn!("Cannot list session records: {e}");
                return Vec::new();
            }
        };

        let mut sessions: Vec<SessionSummary> = files
            .into_iter()
            .filter_map(|path| read_record(&path).map(|record| (path, record).into()))
            .collect();
        sessions.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        sessions
    }

    /// Delete every record file. Returns the number removed.
    pub fn clean_all(&self) -> Result<usize, StateError> {
        let files = self.state_files()?;
        for path in &files {
            std::fs::remove_file(path).map_err(|e| StateError::io(path, e))?;
        }
        Ok(files.len())
    }
}

fn read_record(path: &Path) -> Option<SessionRecord> {
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) => {
            warn!("Skipping unreadable session record {}: {e}", path.display());
            return None;
        }
    };
    match serde_json::from_str(&json) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!("Skipping malformed session record {}: {e}", path.display());
            None
        }
    }
}

// ── Naming ─────────────────────────────────────────────────────────

/// `collection_{id}_{slug}.json`, where the slug keeps alphanumerics,
/// spaces, hyphens and underscores, drops trailing spaces, and turns the
/// remaining spaces into underscores.
pub fn state_file_name(collection_id: CollectionId, collection_name: &str) -> String {
    let kept: String = collection_name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let slug = kept.trim_end().replace(' ', "_");
    format!("{FILE_PREFIX}{collection_id}_{slug}{FILE_SUFFIX}")
}

// ── Timestamps ─────────────────────────────────────────────────────

pub(crate) fn unix_epoch() -> NaiveDateTime {
    NaiveDateTime::default()
}

/// Parse the timestamp shapes that appear in session records: ISO-8601 with
/// `T` or space, with or without fraction or offset, or a bare date.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn timestamp_or_epoch<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp).unwrap_or_else(unix_epoch))
}

pub(crate) fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: CollectionId, name: &str, updated: &str) -> SessionRecord {
        SessionRecord {
            collection_id: id,
            collection_name: name.into(),
            current_page: 2,
            processed_bookmark_ids: vec![10, 11, 12],
            stats: SessionStats::default(),
            last_updated: parse_timestamp(updated).unwrap(),
            dry_run: false,
        }
    }

    #[test]
    fn file_name_slug_rules() {
        assert_eq!(
            state_file_name(42, "Reading List"),
            "collection_42_Reading_List.json"
        );
        assert_eq!(
            state_file_name(7, "Dev & Tools!  "),
            "collection_7_Dev__Tools.json"
        );
        assert_eq!(state_file_name(1, "my-stuff_2"), "collection_1_my-stuff_2.json");
    }

    #[test]
    fn write_then_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        let rec = record(42, "Reading List", "2024-03-01T10:00:00");

        let path = store.write(&rec).unwrap();
        assert!(path.ends_with("collection_42_Reading_List.json"));
        assert_eq!(store.read(42, "Reading List"), Some(rec));
    }

    #[test]
    fn atomic_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        store.write(&record(1, "A", "2024-01-01")).unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["collection_1_A.json".to_string()]);
    }

    #[test]
    fn mismatched_record_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        // Same slug, different real name.
        let path = store.path_for(5, "Dev!");
        let rec = record(5, "Dev?", "2024-01-01");
        std::fs::write(&path, serde_json::to_string(&rec).unwrap()).unwrap();

        assert!(store.read(5, "Dev!").is_none());
    }

    #[test]
    fn malformed_record_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        std::fs::write(store.path_for(3, "X"), "{ not json").unwrap();
        assert!(store.read(3, "X").is_none());
        assert!(store.read(99, "Missing").is_none());
    }

    #[test]
    fn list_resumable_skips_corrupt_and_sorts_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        store.write(&record(1, "Old", "2023-01-01T00:00:00")).unwrap();
        store.write(&record(2, "New", "2024-06-01T12:30:00")).unwrap();
        std::fs::write(dir.path().join("collection_3_Bad.json"), "[]").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let sessions = store.list_resumable();
        let names: Vec<&str> = sessions.iter().map(|s| s.collection_name.as_str()).collect();
        assert_eq!(names, vec!["New", "Old"]);
        assert_eq!(sessions[0].processed_count, 3);
    }

    #[test]
    fn clean_all_removes_only_state_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        store.write(&record(1, "A", "2024-01-01")).unwrap();
        store.write(&record(2, "B", "2024-01-01")).unwrap();
        std::fs::write(dir.path().join("keep.txt"), "x").unwrap();

        assert_eq!(store.clean_all().unwrap(), 2);
        assert!(store.state_files().unwrap().is_empty());
        assert!(dir.path().join("keep.txt").exists());
    }

    #[test]
    fn remove_reports_whether_file_existed() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        store.write(&record(1, "A", "2024-01-01")).unwrap();
        assert!(store.remove(1, "A").unwrap());
        assert!(!store.remove(1, "A").unwrap());
    }

    #[test]
    fn lenient_record_fields() {
        let json = r#"{
            "collection_id": 9,
            "collection_name": "Legacy",
            "processed_bookmark_ids": [1, 2],
            "stats": {"processed": 2, "deleted": 2, "start_time": "2024-01-01 09:00:00.123456", "future_counter": 5},
            "last_updated": "garbage"
        }"#;
        let rec: SessionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.current_page, 0);
        assert_eq!(rec.stats.deleted, 2);
        assert!(rec.stats.start_time.is_some());
        assert_eq!(rec.last_updated, unix_epoch());
        assert!(!rec.dry_run);
    }

    #[test]
    fn parse_timestamp_shapes() {
        assert!(parse_timestamp("2024-05-01T10:11:12.123456").is_some());
        assert!(parse_timestamp("2024-05-01 10:11:12").is_some());
        assert!(parse_timestamp("2024-05-01T10:11:12Z").is_some());
        assert!(parse_timestamp("1970-01-01").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
