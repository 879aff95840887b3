//! Append-only ledger of corpus unique-count snapshots.
//!
//! Each merge appends `(timestamp, unique_texts)`. The latest entry is the
//! baseline for "new posts since the last run".

use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::Path;

use crate::error::Result;
use crate::store::CorpusStore;

/// Wire format of the `timestamp` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressEntry {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: NaiveDateTime,
    pub unique_texts: u64,
}

impl ProgressEntry {
    pub fn new(timestamp: NaiveDateTime, unique_texts: u64) -> Self {
        Self {
            timestamp,
            unique_texts,
        }
    }

    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

fn serialize_timestamp<S: serde::Serializer>(
    ts: &NaiveDateTime,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(&ts.format(TIMESTAMP_FORMAT))
}

pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT).ok()
}

/// A progress log at one location of a store.
pub struct ProgressLog<'a> {
    store: &'a dyn CorpusStore,
    location: &'a Path,
}

impl<'a> ProgressLog<'a> {
    pub fn new(store: &'a dyn CorpusStore, location: &'a Path) -> Self {
        Self { store, location }
    }

    pub fn history(&self) -> Result<Vec<ProgressEntry>> {
        self.store.read_log(self.location)
    }

    pub fn last(&self) -> Result<Option<ProgressEntry>> {
        Ok(self.history()?.last().copied())
    }

    /// Unique count of the latest snapshot, 0 when the log is absent or empty.
    pub fn last_total(&self) -> Result<u64> {
        Ok(self.last()?.map(|e| e.unique_texts).unwrap_or(0))
    }

    /// Append a snapshot. Entries stay time-ordered: a `now` earlier than the
    /// last entry is clamped to that entry's timestamp.
    pub fn append(&self, now: NaiveDateTime, unique_texts: u64) -> Result<ProgressEntry> {
        let timestamp = match self.last()? {
            Some(last) if now < last.timestamp => {
                tracing::warn!(
                    log = %self.location.display(),
                    last = %last.formatted_timestamp(),
                    "clock is behind the progress log; reusing last timestamp"
                );
                last.timestamp
            }
            _ => now,
        };
        let entry = ProgressEntry::new(timestamp, unique_texts);
        self.store.append_log(self.location, &entry)?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    #[test]
    fn test_absent_log_has_zero_baseline() {
        let store = MemoryStore::new();
        let log = ProgressLog::new(&store, Path::new("t_log.csv"));
        assert_eq!(log.last_total().unwrap(), 0);
        assert!(log.history().unwrap().is_empty());
    }

    #[test]
    fn test_last_entry_is_baseline() {
        let store = MemoryStore::new();
        let log = ProgressLog::new(&store, Path::new("t_log.csv"));
        log.append(ts("2024-01-01 10:00:00"), 10).unwrap();
        log.append(ts("2024-01-01 11:00:00"), 7).unwrap();
        assert_eq!(log.last_total().unwrap(), 7);
        assert_eq!(log.history().unwrap().len(), 2);
    }

    #[test]
    fn test_append_clamps_backwards_clock() {
        let store = MemoryStore::new();
        let log = ProgressLog::new(&store, Path::new("t_log.csv"));
        log.append(ts("2024-01-01 10:00:00"), 1).unwrap();
        let entry = log.append(ts("2024-01-01 09:00:00"), 2).unwrap();
        assert_eq!(entry.formatted_timestamp(), "2024-01-01 10:00:00");
        let history = log.history().unwrap();
        assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_timestamp_format() {
        assert!(parse_timestamp("2024-03-05 07:08:09").is_some());
        assert!(parse_timestamp("05-03-2024 07:08:09").is_none());
    }
}
