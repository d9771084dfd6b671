pub mod calendar;
pub mod clock;
pub mod config;
pub mod habit;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod persistence;
pub mod streak;
pub mod tracker;
pub mod validation;

pub use calendar::{CalendarDay, DayStatus, MonthCalendar, MonthPeriod, build_calendar};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AppConfig, ConfigError};
pub use habit::{
    FailureRecord, Habit, HabitDraft, HabitId, HabitSummary, NewHabit, RecordId, UpsertOutcome,
};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteHabitStore;
pub use persistence::{
    HabitSnapshot, HabitStore, MemoryHabitStore, PersistenceError, PersistenceResult,
    load_records_from_csv, load_snapshot_from_json, restore_snapshot, save_records_to_csv,
    save_snapshot_to_json, snapshot_store,
};
pub use streak::{FailureLookup, consecutive_days, last_fail_date};
pub use tracker::{HabitError, HabitResult, HabitTracker, TemporalViolation};
pub use validation::ValidationError;
