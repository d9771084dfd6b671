use chrono::NaiveDate;
use std::collections::{BTreeSet, HashSet};

use crate::habit::{FailureRecord, Habit};

/// Answers "was there a failure on this day?" for the backward streak walk.
pub trait FailureLookup {
    fn has_failure_on(&self, date: NaiveDate) -> bool;
}

impl FailureLookup for BTreeSet<NaiveDate> {
    fn has_failure_on(&self, date: NaiveDate) -> bool {
        self.contains(&date)
    }
}

impl FailureLookup for HashSet<NaiveDate> {
    fn has_failure_on(&self, date: NaiveDate) -> bool {
        self.contains(&date)
    }
}

impl FailureLookup for [FailureRecord] {
    fn has_failure_on(&self, date: NaiveDate) -> bool {
        self.iter().any(|record| record.date == date)
    }
}

impl<F> FailureLookup for F
where
    F: Fn(NaiveDate) -> bool,
{
    fn has_failure_on(&self, date: NaiveDate) -> bool {
        self(date)
    }
}

/// Count unbroken success days ending at `today`.
///
/// Walks back one day at a time from `today` and stops at the first failure
/// or once the walk passes the habit's start date. Zero when `today` is
/// before the start date.
pub fn consecutive_days<L>(habit: &Habit, today: NaiveDate, failures: &L) -> u32
where
    L: FailureLookup + ?Sized,
{
    let mut count = 0;
    let mut current = today;
    while current >= habit.start_date {
        if failures.has_failure_on(current) {
            break;
        }
        count += 1;
        match current.pred_opt() {
            Some(previous) => current = previous,
            None => break,
        }
    }
    count
}

/// Latest failure date over the whole record set of a habit.
pub fn last_fail_date<'a, I>(records: I) -> Option<NaiveDate>
where
    I: IntoIterator<Item = &'a FailureRecord>,
{
    records.into_iter().map(|record| record.date).max()
}

/// Upper bound for [`consecutive_days`]: the number of tracked days up to
/// and including `today`.
pub fn tracked_days(habit: &Habit, today: NaiveDate) -> u32 {
    if today < habit.start_date {
        return 0;
    }
    let span = (today - habit.start_date).num_days() + 1;
    u32::try_from(span).unwrap_or(u32::MAX)
}
