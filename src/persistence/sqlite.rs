use super::{HabitStore, PersistenceResult};
use crate::habit::{FailureRecord, Habit, HabitDraft, HabitId, RecordId, UpsertOutcome};
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, params};

const HABIT_COLUMNS: &str = "id, name, description, start_date, created_at";
const RECORD_COLUMNS: &str = "id, habit_id, date, reason, created_at";

pub struct SqliteHabitStore {
    connection: Mutex<Connection>,
}

impl SqliteHabitStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::from_connection(connection)
    }

    pub fn open_in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> PersistenceResult<Self> {
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS habits (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT,
                start_date TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS habit_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                habit_id INTEGER NOT NULL REFERENCES habits (id) ON DELETE CASCADE,
                date TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'fail',
                reason TEXT NOT NULL,
                created_at TEXT NOT NULL,
                CONSTRAINT habit_date_unique UNIQUE (habit_id, date)
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn habit_from_row(row: &Row<'_>) -> rusqlite::Result<Habit> {
        Ok(Habit {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            start_date: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    fn record_from_row(row: &Row<'_>) -> rusqlite::Result<FailureRecord> {
        Ok(FailureRecord {
            id: row.get(0)?,
            habit_id: row.get(1)?,
            date: row.get(2)?,
            reason: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    fn record_by_id(conn: &Connection, record_id: RecordId) -> rusqlite::Result<Option<FailureRecord>> {
        conn.query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM habit_records WHERE id = ?1"),
            params![record_id],
            Self::record_from_row,
        )
        .optional()
    }
}

impl HabitStore for SqliteHabitStore {
    fn find_habit(&self, id: HabitId) -> PersistenceResult<Option<Habit>> {
        let conn = self.connection.lock();
        let habit = conn
            .query_row(
                &format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = ?1"),
                params![id],
                Self::habit_from_row,
            )
            .optional()?;
        Ok(habit)
    }

    fn list_habits(&self) -> PersistenceResult<Vec<Habit>> {
        let conn = self.connection.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {HABIT_COLUMNS} FROM habits ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map([], Self::habit_from_row)?;

        let mut habits = Vec::new();
        for habit in rows {
            habits.push(habit?);
        }
        Ok(habits)
    }

    fn create_habit(&self, draft: &HabitDraft) -> PersistenceResult<Habit> {
        let conn = self.connection.lock();
        conn.execute(
            "INSERT INTO habits (name, description, start_date, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                draft.name,
                draft.description,
                draft.start_date,
                draft.created_at
            ],
        )?;
        Ok(Habit {
            id: conn.last_insert_rowid(),
            name: draft.name.clone(),
            description: draft.description.clone(),
            start_date: draft.start_date,
            created_at: draft.created_at,
        })
    }

    fn delete_habit(&self, id: HabitId) -> PersistenceResult<bool> {
        let mut conn = self.connection.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM habit_records WHERE habit_id = ?1",
            params![id],
        )?;
        let removed = tx.execute("DELETE FROM habits WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(removed > 0)
    }

    fn find_records_in_range(
        &self,
        habit_id: HabitId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> PersistenceResult<Vec<FailureRecord>> {
        let conn = self.connection.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM habit_records \
             WHERE habit_id = ?1 AND date >= ?2 AND date <= ?3 ORDER BY date ASC"
        ))?;
        let rows = stmt.query_map(params![habit_id, from, to], Self::record_from_row)?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }

    fn find_record_by_date(
        &self,
        habit_id: HabitId,
        date: NaiveDate,
    ) -> PersistenceResult<Option<FailureRecord>> {
        let conn = self.connection.lock();
        let record = conn
            .query_row(
                &format!(
                    "SELECT {RECORD_COLUMNS} FROM habit_records WHERE habit_id = ?1 AND date = ?2"
                ),
                params![habit_id, date],
                Self::record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn find_record(&self, record_id: RecordId) -> PersistenceResult<Option<FailureRecord>> {
        let conn = self.connection.lock();
        Ok(Self::record_by_id(&conn, record_id)?)
    }

    fn find_all_records_for_habit(
        &self,
        habit_id: HabitId,
    ) -> PersistenceResult<Vec<FailureRecord>> {
        let conn = self.connection.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM habit_records WHERE habit_id = ?1 ORDER BY date ASC"
        ))?;
        let rows = stmt.query_map(params![habit_id], Self::record_from_row)?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }

    fn upsert_record(
        &self,
        habit_id: HabitId,
        date: NaiveDate,
        reason: &str,
        created_at: NaiveDateTime,
    ) -> PersistenceResult<(FailureRecord, UpsertOutcome)> {
        let mut conn = self.connection.lock();
        let tx = conn.transaction()?;

        let existing: Option<RecordId> = tx
            .query_row(
                "SELECT id FROM habit_records WHERE habit_id = ?1 AND date = ?2",
                params![habit_id, date],
                |row| row.get(0),
            )
            .optional()?;

        let (record_id, outcome) = match existing {
            Some(record_id) => {
                tx.execute(
                    "UPDATE habit_records SET reason = ?1 WHERE id = ?2",
                    params![reason, record_id],
                )?;
                (record_id, UpsertOutcome::Updated)
            }
            None => {
                tx.execute(
                    "INSERT INTO habit_records (habit_id, date, status, reason, created_at) \
                     VALUES (?1, ?2, 'fail', ?3, ?4)",
                    params![habit_id, date, reason, created_at],
                )?;
                (tx.last_insert_rowid(), UpsertOutcome::Created)
            }
        };

        let record = tx.query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM habit_records WHERE id = ?1"),
            params![record_id],
            Self::record_from_row,
        )?;
        tx.commit()?;
        Ok((record, outcome))
    }

    fn update_record_reason(
        &self,
        record_id: RecordId,
        reason: &str,
    ) -> PersistenceResult<Option<FailureRecord>> {
        let conn = self.connection.lock();
        let changed = conn.execute(
            "UPDATE habit_records SET reason = ?1 WHERE id = ?2",
            params![reason, record_id],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        Ok(Self::record_by_id(&conn, record_id)?)
    }

    fn delete_record(&self, record_id: RecordId) -> PersistenceResult<bool> {
        let conn = self.connection.lock();
        let removed = conn.execute(
            "DELETE FROM habit_records WHERE id = ?1",
            params![record_id],
        )?;
        Ok(removed > 0)
    }
}
