//! JSON-file history store keyed by date.
//!
//! The whole history is kept in memory as a date-ordered map and written back
//! to disk after each mutation.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use thiserror::Error;
use tracing::{debug, info};

use crate::regime::RegimeResult;

use super::types::DailySnapshot;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Date-keyed snapshot store backed by a single JSON file.
pub struct HistoryStore {
    path: PathBuf,
    rows: BTreeMap<NaiveDate, DailySnapshot>,
}

impl HistoryStore {
    /// Open the store, creating parent directories as needed. A missing file
    /// is an empty history.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let rows = if path.exists() {
            let content = fs::read_to_string(&path)?;
            let list: Vec<DailySnapshot> = if content.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&content)?
            };
            list.into_iter().map(|s| (s.date, s)).collect()
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), rows = rows.len(), "opened history store");
        Ok(Self { path, rows })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DailySnapshot> {
        self.rows.get(&date)
    }

    /// Insert or replace the snapshot for its date.
    pub fn upsert(&mut self, snapshot: DailySnapshot) -> StoreResult<()> {
        self.rows.insert(snapshot.date, snapshot);
        self.flush()
    }

    /// Write the regime fields of `result` onto the row for `date`.
    ///
    /// Returns `false` when no row exists for that date.
    pub fn update_regime_fields(&mut self, date: NaiveDate, result: &RegimeResult) -> StoreResult<bool> {
        match self.rows.get_mut(&date) {
            Some(row) => {
                row.apply_regime(result);
                self.flush()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Last `limit` snapshots, oldest first.
    pub fn fetch_recent(&self, limit: usize) -> Vec<DailySnapshot> {
        let skip = self.rows.len().saturating_sub(limit);
        self.rows.values().skip(skip).cloned().collect()
    }

    /// Every snapshot, oldest first.
    pub fn fetch_all(&self) -> Vec<DailySnapshot> {
        self.rows.values().cloned().collect()
    }

    /// Snapshots dated within `start..=end`, oldest first.
    pub fn fetch_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<DailySnapshot> {
        if start > end {
            return Vec::new();
        }
        self.rows.range(start..=end).map(|(_, s)| s.clone()).collect()
    }

    /// Drop rows dated before `today - retention_days`. Non-positive
    /// retention keeps everything. Returns the number of rows removed.
    pub fn prune(&mut self, retention_days: i64, today: NaiveDate) -> StoreResult<usize> {
        if retention_days <= 0 {
            return Ok(0);
        }
        // A horizon reaching past the earliest representable date keeps everything.
        let Some(cutoff) = Duration::try_days(retention_days).and_then(|d| today.checked_sub_signed(d)) else {
            return Ok(0);
        };
        let kept = self.rows.split_off(&cutoff);
        let removed = self.rows.len();
        self.rows = kept;

        if removed > 0 {
            info!(removed, %cutoff, "pruned history");
            self.flush()?;
        }
        Ok(removed)
    }

    fn flush(&self) -> StoreResult<()> {
        let list: Vec<&DailySnapshot> = self.rows.values().collect();
        let content = serde_json::to_string_pretty(&list)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regime::{Confidence, RegimePhase, Trend, ValueKind};
    use tempfile::tempdir;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + Duration::days(offset)
    }

    fn seeded(path: &Path, scores: &[f64]) -> HistoryStore {
        let mut store = HistoryStore::open(path).unwrap();
        for (i, &score) in scores.iter().enumerate() {
            store
                .upsert(DailySnapshot::new(day(i as i64)).with_phase_score(score))
                .unwrap();
        }
        store
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("history.json");
        let store = HistoryStore::open(&path).unwrap();
        assert!(store.is_empty());
        assert!(path.parent().unwrap().exists());
    }

    #[test]
    fn test_upsert_is_idempotent_per_date() {
        let dir = tempdir().unwrap();
        let mut store = seeded(&dir.path().join("history.json"), &[1.0, 2.0]);
        store.upsert(DailySnapshot::new(day(1)).with_phase_score(9.0)).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(day(1)).unwrap().phase_score, Some(9.0));
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        seeded(&path, &[1.0, 2.0, 3.0]);

        let reopened = HistoryStore::open(&path).unwrap();
        let scores: Vec<_> = reopened.fetch_all().iter().map(|s| s.phase_score).collect();
        assert_eq!(scores, vec![Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_fetch_recent_and_range() {
        let dir = tempdir().unwrap();
        let store = seeded(&dir.path().join("history.json"), &[1.0, 2.0, 3.0, 4.0, 5.0]);

        let recent = store.fetch_recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].date, day(3));
        assert_eq!(recent[1].date, day(4));
        assert_eq!(store.fetch_recent(50).len(), 5);

        let range = store.fetch_range(day(1), day(3));
        assert_eq!(range.iter().map(|s| s.date).collect::<Vec<_>>(), vec![day(1), day(2), day(3)]);
        assert!(store.fetch_range(day(3), day(1)).is_empty());
    }

    #[test]
    fn test_update_regime_fields() {
        let dir = tempdir().unwrap();
        let mut store = seeded(&dir.path().join("history.json"), &[1.0]);
        let result = RegimeResult {
            phase: RegimePhase::Phase2,
            score: Some(2.2),
            value: Some(0.4),
            method: Some(ValueKind::ZScore),
            calibrated: false,
            trend: Some(Trend::Stable),
            trend_score: None,
            confidence: Confidence::High,
            window_days: 7,
        };
        assert!(store.update_regime_fields(day(0), &result).unwrap());
        assert!(!store.update_regime_fields(day(5), &result).unwrap());

        let row = store.get(day(0)).unwrap();
        assert_eq!(row.regime_phase, Some(RegimePhase::Phase2));
        assert_eq!(row.regime_score, Some(2.2));
        assert_eq!(row.regime_confidence, Some(Confidence::High));
    }

    #[test]
    fn test_prune() {
        let dir = tempdir().unwrap();
        let mut store = seeded(&dir.path().join("history.json"), &[1.0; 10]);

        assert_eq!(store.prune(0, day(9)).unwrap(), 0);
        assert_eq!(store.len(), 10);

        // cutoff is day(6); days 0..=5 go
        assert_eq!(store.prune(3, day(9)).unwrap(), 6);
        assert_eq!(store.fetch_all().first().unwrap().date, day(6));
    }

    #[test]
    fn test_prune_with_huge_retention_keeps_everything() {
        let dir = tempdir().unwrap();
        let mut store = seeded(&dir.path().join("history.json"), &[1.0; 4]);
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

        assert_eq!(store.prune(1_000_000_000, today).unwrap(), 0);
        assert_eq!(store.prune(i64::MAX, today).unwrap(), 0);
        assert_eq!(store.len(), 4);
    }
}
