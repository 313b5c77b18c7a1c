use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use sentiment_core::{CompositeResult, SentimentError};

/// Retention window: two years of daily entries.
pub const MAX_HISTORY_ENTRIES: usize = 730;

/// One persisted day of the composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub value: u8,
    pub label: String,
    pub indicators_used: usize,
    pub indicators_total: usize,
    pub updated_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn from_composite(date: NaiveDate, composite: &CompositeResult) -> Self {
        Self {
            date,
            value: composite.value,
            label: composite.label.as_str().to_string(),
            indicators_used: composite.indicators_used,
            indicators_total: composite.indicators_total,
            updated_at: composite.updated_at,
        }
    }
}

/// Append-only, date-deduplicated daily record of the composite score,
/// persisted as one human-diffable JSON document.
pub struct HistoryStore {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
}

impl HistoryStore {
    /// Read the persisted store. A missing or unparsable file yields an
    /// empty store, never an error — a run re-seeds history in that case.
    pub fn load(path: &Path) -> Self {
        let entries = match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
                Ok(mut entries) => {
                    entries.sort_by_key(|e| e.date);
                    entries
                }
                Err(e) => {
                    tracing::warn!(
                        "History store {} unparsable ({}), starting empty",
                        path.display(), e
                    );
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!("History store {} unreadable ({}), starting empty", path.display(), e);
                Vec::new()
            }
        };

        Self {
            path: path.to_path_buf(),
            entries,
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Replace any entry for the same date (last writer wins), keep the list
    /// sorted ascending, and evict the oldest entries past the retention cap.
    pub fn upsert(&mut self, entry: HistoryEntry) {
        self.entries.retain(|e| e.date != entry.date);
        self.entries.push(entry);
        self.entries.sort_by_key(|e| e.date);
        if self.entries.len() > MAX_HISTORY_ENTRIES {
            let excess = self.entries.len() - MAX_HISTORY_ENTRIES;
            self.entries.drain(..excess);
        }
    }

    /// Write the whole store back atomically (temp file, then rename).
    pub fn save(&self) -> Result<(), SentimentError> {
        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| SentimentError::StoreError(format!("serialize: {}", e)))?;

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)
            .map_err(|e| SentimentError::StoreError(format!("write {}: {}", tmp.display(), e)))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            SentimentError::StoreError(format!("rename into {}: {}", self.path.display(), e))
        })?;

        tracing::info!("History store saved: {} entries", self.entries.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(date: NaiveDate, value: u8) -> HistoryEntry {
        HistoryEntry {
            date,
            value,
            label: "Neutral".to_string(),
            indicators_used: 7,
            indicators_total: 7,
            updated_at: Utc::now(),
        }
    }

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset)
    }

    fn empty_store() -> HistoryStore {
        HistoryStore {
            path: PathBuf::from("/nonexistent/history.json"),
            entries: Vec::new(),
        }
    }

    #[test]
    fn test_upsert_same_date_is_idempotent() {
        let mut store = empty_store();
        store.upsert(entry(day(0), 40));
        store.upsert(entry(day(0), 60));
        assert_eq!(store.entries().len(), 1);
        assert_eq!(store.entries()[0].value, 60); // last writer wins
    }

    #[test]
    fn test_upsert_keeps_ascending_unique_dates() {
        let mut store = empty_store();
        store.upsert(entry(day(2), 52));
        store.upsert(entry(day(0), 50));
        store.upsert(entry(day(1), 51));
        let dates: Vec<NaiveDate> = store.entries().iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![day(0), day(1), day(2)]);
    }

    #[test]
    fn test_retention_evicts_oldest() {
        let mut store = empty_store();
        for i in 0..(MAX_HISTORY_ENTRIES as i64 + 10) {
            store.upsert(entry(day(i), 50));
        }
        assert_eq!(store.entries().len(), MAX_HISTORY_ENTRIES);
        assert_eq!(store.entries()[0].date, day(10)); // oldest 10 evicted
        assert_eq!(
            store.entries().last().unwrap().date,
            day(MAX_HISTORY_ENTRIES as i64 + 9)
        );
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::load(&dir.path().join("missing.json"));
        assert!(store.entries().is_empty());
    }

    #[test]
    fn test_load_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = HistoryStore::load(&path);
        assert!(store.entries().is_empty());
    }

    #[test]
    fn test_load_out_of_range_value_is_empty() {
        // value 500 does not fit the 0-100 scale's u8 storage: corrupt store.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(
            &path,
            r#"[{"date":"2024-01-01","value":500,"label":"x","indicators_used":7,"indicators_total":7,"updated_at":"2024-01-01T12:00:00Z"}]"#,
        )
        .unwrap();
        let store = HistoryStore::load(&path);
        assert!(store.entries().is_empty());
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut store = HistoryStore::load(&path);
        store.upsert(entry(day(0), 42));
        store.upsert(entry(day(1), 58));
        store.save().unwrap();

        let reloaded = HistoryStore::load(&path);
        assert_eq!(reloaded.entries(), store.entries());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_failed_run_leaves_file_untouched() {
        // A run that writes nothing must leave the store byte-identical.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut store = HistoryStore::load(&path);
        store.upsert(entry(day(0), 42));
        store.save().unwrap();
        let before = std::fs::read(&path).unwrap();

        // Load without upsert/save: the aggregation-failure path.
        let _untouched = HistoryStore::load(&path);
        let after = std::fs::read(&path).unwrap();
        assert_eq!(before, after);
    }
}
