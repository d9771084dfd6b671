use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::habit::{FailureRecord, Habit, RecordId};

/// Classification of a single calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DayStatus {
    Success,
    Fail,
    NotStarted,
    Future,
}

impl DayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayStatus::Success => "success",
            DayStatus::Fail => "fail",
            DayStatus::NotStarted => "not-started",
            DayStatus::Future => "future",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub day: u32,
    pub status: DayStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<RecordId>,
}

/// One month of day statuses bundled with the habit it describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCalendar {
    pub year: i32,
    pub month: u32,
    pub days: Vec<CalendarDay>,
    pub habit: Habit,
}

/// A validated (year, month) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthPeriod {
    year: i32,
    month: u32,
    first_day: NaiveDate,
    last_day: NaiveDate,
}

impl MonthPeriod {
    /// Returns `None` when the month is outside 1..=12 or the year (or the
    /// following January) cannot be represented as a calendar date.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let first_day = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        let last_day = next_month - Duration::days(1);
        Some(Self {
            year,
            month,
            first_day,
            last_day,
        })
    }

    pub fn containing(date: NaiveDate) -> Option<Self> {
        Self::new(date.year(), date.month())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        self.last_day
    }

    /// Number of days in the month: 28, 29, 30 or 31.
    pub fn day_count(&self) -> usize {
        self.last_day.day() as usize
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.first_day.iter_days().take(self.day_count())
    }
}

/// Overlay failure records onto a month of default successes.
///
/// Precedence per day: success, then fail (record present), then
/// not-started (before the habit's start date), then future (after `today`).
/// A later rule replaces only the status; reason and record id from a
/// matching record stay attached.
pub fn build_calendar(
    habit: &Habit,
    period: MonthPeriod,
    records: &[FailureRecord],
    today: NaiveDate,
) -> Vec<CalendarDay> {
    let failures: HashMap<NaiveDate, &FailureRecord> = records
        .iter()
        .filter(|record| record.date >= period.first_day() && record.date <= period.last_day())
        .map(|record| (record.date, record))
        .collect();

    let mut days = Vec::with_capacity(period.day_count());
    for date in period.days() {
        let mut entry = CalendarDay {
            date,
            day: date.day(),
            status: DayStatus::Success,
            reason: None,
            record_id: None,
        };

        if let Some(record) = failures.get(&date) {
            entry.status = DayStatus::Fail;
            entry.reason = Some(record.reason.clone());
            entry.record_id = Some(record.id);
        }

        if date < habit.start_date {
            entry.status = DayStatus::NotStarted;
        }

        if date > today {
            entry.status = DayStatus::Future;
        }

        days.push(entry);
    }
    days
}
