use crate::habit::{FailureRecord, Habit, HabitDraft, HabitId, RecordId, UpsertOutcome};
use chrono::{NaiveDate, NaiveDateTime};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Storage for habits and their failure records.
///
/// Implementations keep at most one record per `(habit_id, date)` and
/// remove a habit's records together with the habit.
pub trait HabitStore: Send + Sync {
    fn find_habit(&self, id: HabitId) -> PersistenceResult<Option<Habit>>;

    /// Newest `created_at` first; ties broken by descending id.
    fn list_habits(&self) -> PersistenceResult<Vec<Habit>>;

    fn create_habit(&self, draft: &HabitDraft) -> PersistenceResult<Habit>;

    /// Returns `false` when no habit had this id.
    fn delete_habit(&self, id: HabitId) -> PersistenceResult<bool>;

    /// Records with `from <= date <= to`, ascending by date.
    fn find_records_in_range(
        &self,
        habit_id: HabitId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> PersistenceResult<Vec<FailureRecord>>;

    fn find_record_by_date(
        &self,
        habit_id: HabitId,
        date: NaiveDate,
    ) -> PersistenceResult<Option<FailureRecord>>;

    fn find_record(&self, record_id: RecordId) -> PersistenceResult<Option<FailureRecord>>;

    /// Every record of the habit, ascending by date.
    fn find_all_records_for_habit(&self, habit_id: HabitId)
    -> PersistenceResult<Vec<FailureRecord>>;

    /// Insert a record for `(habit_id, date)` or overwrite the reason of the
    /// one already there. `created_at` is only used for new rows.
    fn upsert_record(
        &self,
        habit_id: HabitId,
        date: NaiveDate,
        reason: &str,
        created_at: NaiveDateTime,
    ) -> PersistenceResult<(FailureRecord, UpsertOutcome)>;

    fn update_record_reason(
        &self,
        record_id: RecordId,
        reason: &str,
    ) -> PersistenceResult<Option<FailureRecord>>;

    /// Returns `false` when no record had this id.
    fn delete_record(&self, record_id: RecordId) -> PersistenceResult<bool>;
}

pub mod file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    HabitSnapshot, RecordCsvRow, load_records_from_csv, load_snapshot_from_json,
    restore_snapshot, save_records_to_csv, save_snapshot_to_json, snapshot_store,
};
pub use memory::MemoryHabitStore;
