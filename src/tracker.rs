use crate::calendar::{MonthCalendar, MonthPeriod, build_calendar};
use crate::clock::{Clock, SystemClock};
use crate::habit::{
    FailureRecord, Habit, HabitDraft, HabitId, HabitSummary, NewHabit, RecordId, UpsertOutcome,
};
use crate::persistence::{HabitStore, PersistenceError};
use crate::streak;
use crate::validation::{self, ValidationError};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Why a failure date was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TemporalViolation {
    #[error("cannot mark {date}: habit starts on {start_date}")]
    BeforeStart {
        date: NaiveDate,
        start_date: NaiveDate,
    },
    #[error("cannot mark {date}: it is after today ({today})")]
    InFuture { date: NaiveDate, today: NaiveDate },
}

#[derive(Debug, Error)]
pub enum HabitError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("habit {0} not found")]
    HabitNotFound(HabitId),
    #[error("record {0} not found")]
    RecordNotFound(RecordId),
    #[error(transparent)]
    TemporalConstraint(#[from] TemporalViolation),
    #[error("invalid calendar period {year}-{month}")]
    InvalidCalendarPeriod { year: i32, month: u32 },
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub type HabitResult<T> = Result<T, HabitError>;

/// Entry point for every habit operation. Reads "today" once per call.
#[derive(Clone)]
pub struct HabitTracker {
    store: Arc<dyn HabitStore>,
    clock: Arc<dyn Clock>,
}

impl HabitTracker {
    pub fn new(store: Arc<dyn HabitStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn HabitStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &dyn HabitStore {
        self.store.as_ref()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn find_habit(&self, habit_id: HabitId) -> HabitResult<Habit> {
        self.store
            .find_habit(habit_id)?
            .ok_or(HabitError::HabitNotFound(habit_id))
    }

    pub fn find_record(&self, record_id: RecordId) -> HabitResult<FailureRecord> {
        self.store
            .find_record(record_id)?
            .ok_or(HabitError::RecordNotFound(record_id))
    }

    pub fn create_habit(&self, input: NewHabit) -> HabitResult<Habit> {
        let name = validation::require_text("name", Some(&input.name))?;
        let draft = HabitDraft {
            name,
            description: validation::optional_text(input.description.as_deref()),
            start_date: input.start_date.unwrap_or_else(|| self.clock.today()),
            created_at: self.clock.now(),
        };
        let habit = self.store.create_habit(&draft)?;
        info!(habit_id = habit.id, name = %habit.name, start_date = %habit.start_date, "created habit");
        Ok(habit)
    }

    pub fn delete_habit(&self, habit_id: HabitId) -> HabitResult<()> {
        if !self.store.delete_habit(habit_id)? {
            return Err(HabitError::HabitNotFound(habit_id));
        }
        info!(habit_id, "deleted habit and its records");
        Ok(())
    }

    pub fn list_habits(&self) -> HabitResult<Vec<HabitSummary>> {
        let today = self.clock.today();
        self.store
            .list_habits()?
            .into_iter()
            .map(|habit| self.summarize_on(habit, today))
            .collect()
    }

    pub fn habit_summary(&self, habit_id: HabitId) -> HabitResult<HabitSummary> {
        let habit = self.find_habit(habit_id)?;
        self.summarize_on(habit, self.clock.today())
    }

    pub fn consecutive_days(&self, habit: &Habit) -> HabitResult<u32> {
        self.consecutive_days_on(habit, self.clock.today())
    }

    pub fn last_fail_date(&self, habit: &Habit) -> HabitResult<Option<NaiveDate>> {
        let records = self.store.find_all_records_for_habit(habit.id)?;
        Ok(streak::last_fail_date(&records))
    }

    fn consecutive_days_on(&self, habit: &Habit, today: NaiveDate) -> HabitResult<u32> {
        if today < habit.start_date {
            return Ok(0);
        }
        let failures: BTreeSet<NaiveDate> = self
            .store
            .find_records_in_range(habit.id, habit.start_date, today)?
            .into_iter()
            .map(|record| record.date)
            .collect();
        Ok(streak::consecutive_days(habit, today, &failures))
    }

    fn summarize_on(&self, habit: Habit, today: NaiveDate) -> HabitResult<HabitSummary> {
        let consecutive_days = self.consecutive_days_on(&habit, today)?;
        let last_fail_date = self.last_fail_date(&habit)?;
        debug!(habit_id = habit.id, consecutive_days, ?last_fail_date, "computed streak");
        Ok(HabitSummary {
            habit,
            consecutive_days,
            last_fail_date,
        })
    }

    /// Month view for a habit. Missing year or month default to today's.
    pub fn calendar(
        &self,
        habit_id: HabitId,
        year: Option<i32>,
        month: Option<u32>,
    ) -> HabitResult<MonthCalendar> {
        let habit = self.find_habit(habit_id)?;
        let today = self.clock.today();
        let year = year.unwrap_or_else(|| today.year());
        let month = month.unwrap_or_else(|| today.month());
        let period =
            MonthPeriod::new(year, month).ok_or(HabitError::InvalidCalendarPeriod { year, month })?;

        let records =
            self.store
                .find_records_in_range(habit.id, period.first_day(), period.last_day())?;
        let days = build_calendar(&habit, period, &records, today);
        debug!(habit_id, year, month, failures = records.len(), "built calendar");
        Ok(MonthCalendar {
            year,
            month,
            days,
            habit,
        })
    }

    pub fn records(&self, habit_id: HabitId) -> HabitResult<Vec<FailureRecord>> {
        let habit = self.find_habit(habit_id)?;
        Ok(self.store.find_all_records_for_habit(habit.id)?)
    }

    /// Record a failure for `date`, or overwrite the reason of the failure
    /// already recorded on that day.
    pub fn mark_fail(
        &self,
        habit_id: HabitId,
        date: NaiveDate,
        reason: &str,
    ) -> HabitResult<(FailureRecord, UpsertOutcome)> {
        let habit = self.find_habit(habit_id)?;
        let reason = validation::require_text("reason", Some(reason))?;
        let today = self.clock.today();
        check_failure_date(&habit, date, today)?;

        let (record, outcome) =
            self.store
                .upsert_record(habit.id, date, &reason, self.clock.now())?;
        info!(habit_id, record_id = record.id, %date, ?outcome, "marked failure");
        Ok((record, outcome))
    }

    pub fn update_record_reason(
        &self,
        record_id: RecordId,
        reason: &str,
    ) -> HabitResult<FailureRecord> {
        let reason = validation::require_text("reason", Some(reason))?;
        let record = self
            .store
            .update_record_reason(record_id, &reason)?
            .ok_or(HabitError::RecordNotFound(record_id))?;
        info!(record_id, habit_id = record.habit_id, "updated failure reason");
        Ok(record)
    }

    pub fn delete_record(&self, record_id: RecordId) -> HabitResult<()> {
        if !self.store.delete_record(record_id)? {
            return Err(HabitError::RecordNotFound(record_id));
        }
        info!(record_id, "deleted failure record");
        Ok(())
    }
}

/// Failures may only be recorded between the habit's start and today.
pub fn check_failure_date(
    habit: &Habit,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<(), TemporalViolation> {
    if date < habit.start_date {
        return Err(TemporalViolation::BeforeStart {
            date,
            start_date: habit.start_date,
        });
    }
    if date > today {
        return Err(TemporalViolation::InFuture { date, today });
    }
    Ok(())
}
