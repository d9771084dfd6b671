use super::{HabitStore, PersistenceError, PersistenceResult};
use crate::habit::{FailureRecord, Habit, HabitDraft, RecordId};
use crate::tracker::check_failure_date;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitExport {
    pub habit: Habit,
    #[serde(default)]
    pub records: Vec<FailureRecord>,
}

/// Every habit in a store together with its failure records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitSnapshot {
    pub habits: Vec<HabitExport>,
}

pub fn snapshot_store(store: &dyn HabitStore) -> PersistenceResult<HabitSnapshot> {
    let mut habits = Vec::new();
    for habit in store.list_habits()? {
        let records = store.find_all_records_for_habit(habit.id)?;
        habits.push(HabitExport { habit, records });
    }
    Ok(HabitSnapshot { habits })
}

/// Recreate the snapshot's habits in `store`. Habits and records get fresh
/// ids; names, dates, reasons and timestamps are kept. Returns the new habits
/// in snapshot order.
///
/// The whole snapshot is checked before anything is written: every habit
/// needs a name and every record must fall within `[start_date, today]`.
/// A store error part way through removes the habits already restored.
pub fn restore_snapshot(
    store: &dyn HabitStore,
    snapshot: &HabitSnapshot,
    today: NaiveDate,
) -> PersistenceResult<Vec<Habit>> {
    for entry in &snapshot.habits {
        validate_export(entry, today)?;
    }

    let mut restored = Vec::with_capacity(snapshot.habits.len());
    // Oldest first so list order (newest created first) matches the source store.
    for entry in snapshot.habits.iter().rev() {
        match restore_entry(store, entry) {
            Ok(habit) => restored.push(habit),
            Err(err) => {
                for habit in &restored {
                    if let Err(cleanup) = store.delete_habit(habit.id) {
                        warn!(habit_id = habit.id, error = %cleanup, "failed to undo partial restore");
                    }
                }
                return Err(err);
            }
        }
    }
    restored.reverse();
    Ok(restored)
}

fn validate_export(entry: &HabitExport, today: NaiveDate) -> PersistenceResult<()> {
    if entry.habit.name.trim().is_empty() {
        return Err(PersistenceError::InvalidData(format!(
            "habit {} has an empty name",
            entry.habit.id
        )));
    }
    for record in &entry.records {
        check_failure_date(&entry.habit, record.date, today).map_err(|violation| {
            PersistenceError::InvalidData(format!(
                "record {} of habit {}: {violation}",
                record.id, entry.habit.id
            ))
        })?;
    }
    Ok(())
}

fn restore_entry(store: &dyn HabitStore, entry: &HabitExport) -> PersistenceResult<Habit> {
    let habit = store.create_habit(&HabitDraft {
        name: entry.habit.name.clone(),
        description: entry.habit.description.clone(),
        start_date: entry.habit.start_date,
        created_at: entry.habit.created_at,
    })?;
    for record in &entry.records {
        if let Err(err) =
            store.upsert_record(habit.id, record.date, &record.reason, record.created_at)
        {
            store.delete_habit(habit.id)?;
            return Err(err);
        }
    }
    Ok(habit)
}

pub fn save_snapshot_to_json<P: AsRef<Path>>(
    snapshot: &HabitSnapshot,
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, snapshot)?;
    Ok(())
}

pub fn load_snapshot_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<HabitSnapshot> {
    let file = File::open(path)?;
    let snapshot: HabitSnapshot = serde_json::from_reader(file)?;
    Ok(snapshot)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCsvRow {
    pub id: RecordId,
    pub date: NaiveDate,
    pub reason: String,
    pub created_at: NaiveDateTime,
}

impl From<&FailureRecord> for RecordCsvRow {
    fn from(record: &FailureRecord) -> Self {
        Self {
            id: record.id,
            date: record.date,
            reason: record.reason.clone(),
            created_at: record.created_at,
        }
    }
}

pub fn save_records_to_csv<P: AsRef<Path>>(
    records: &[FailureRecord],
    path: P,
) -> PersistenceResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(RecordCsvRow::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_records_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<RecordCsvRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        let row: RecordCsvRow = row?;
        rows.push(row);
    }
    Ok(rows)
}
