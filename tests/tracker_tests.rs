#![cfg(feature = "sqlite")]

use chrono::NaiveDate;
use quit_habit::{
    DayStatus, FixedClock, HabitError, HabitStore, HabitTracker, MemoryHabitStore, NewHabit,
    SqliteHabitStore, TemporalViolation, UpsertOutcome,
};
use std::sync::Arc;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn tracker_on(store: Arc<dyn HabitStore>, today: NaiveDate) -> HabitTracker {
    HabitTracker::with_clock(store, Arc::new(FixedClock::new(today)))
}

fn stores() -> Vec<(&'static str, Arc<dyn HabitStore>)> {
    let memory: Arc<dyn HabitStore> = Arc::new(MemoryHabitStore::new());
    let sqlite: Arc<dyn HabitStore> = Arc::new(SqliteHabitStore::open_in_memory().unwrap());
    vec![("memory", memory), ("sqlite", sqlite)]
}

#[test]
fn end_to_end_march_scenario() {
    for (name, store) in stores() {
        let tracker = tracker_on(store, d(2024, 3, 12));
        let habit = tracker
            .create_habit(NewHabit::new("Smoking").starting(d(2024, 3, 1)))
            .unwrap();

        tracker.mark_fail(habit.id, d(2024, 3, 5), "stress").unwrap();
        let (march_10, _) = tracker.mark_fail(habit.id, d(2024, 3, 10), "party").unwrap();

        let summary = tracker.habit_summary(habit.id).unwrap();
        assert_eq!(summary.last_fail_date, Some(d(2024, 3, 10)), "{name}");
        assert_eq!(summary.consecutive_days, 2, "{name}");

        let calendar = tracker.calendar(habit.id, Some(2024), Some(3)).unwrap();
        assert_eq!(calendar.days.len(), 31, "{name}");
        assert_eq!(calendar.days[4].status, DayStatus::Fail, "{name}");
        assert_eq!(calendar.days[9].status, DayStatus::Fail, "{name}");
        assert_eq!(calendar.days[9].record_id, Some(march_10.id), "{name}");
        assert!(
            calendar.days[12..]
                .iter()
                .all(|day| day.status == DayStatus::Future),
            "{name}"
        );
        assert_eq!(calendar.habit.id, habit.id);

        tracker.delete_record(march_10.id).unwrap();
        let summary = tracker.habit_summary(habit.id).unwrap();
        assert_eq!(summary.consecutive_days, 7, "{name}");
        assert_eq!(summary.last_fail_date, Some(d(2024, 3, 5)), "{name}");
    }
}

#[test]
fn mark_fail_twice_keeps_one_record_with_latest_reason() {
    for (name, store) in stores() {
        let tracker = tracker_on(store, d(2024, 5, 20));
        let habit = tracker
            .create_habit(NewHabit::new("Doomscrolling").starting(d(2024, 5, 1)))
            .unwrap();

        let (first, outcome) = tracker.mark_fail(habit.id, d(2024, 5, 2), "bored").unwrap();
        assert_eq!(outcome, UpsertOutcome::Created, "{name}");
        let (second, outcome) = tracker
            .mark_fail(habit.id, d(2024, 5, 2), "very bored")
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated, "{name}");
        assert_eq!(first.id, second.id, "{name}");

        let records = tracker.records(habit.id).unwrap();
        assert_eq!(records.len(), 1, "{name}");
        assert_eq!(records[0].reason, "very bored", "{name}");
    }
}

#[test]
fn mark_fail_rejects_dates_outside_tracking_window() {
    let tracker = tracker_on(Arc::new(MemoryHabitStore::new()), d(2024, 5, 20));
    let habit = tracker
        .create_habit(NewHabit::new("Coffee").starting(d(2024, 5, 10)))
        .unwrap();

    let err = tracker
        .mark_fail(habit.id, d(2024, 5, 9), "early")
        .unwrap_err();
    assert!(matches!(
        err,
        HabitError::TemporalConstraint(TemporalViolation::BeforeStart { .. })
    ));

    let err = tracker
        .mark_fail(habit.id, d(2024, 5, 21), "tomorrow")
        .unwrap_err();
    assert!(matches!(
        err,
        HabitError::TemporalConstraint(TemporalViolation::InFuture { .. })
    ));

    // Both ends are inclusive.
    tracker.mark_fail(habit.id, d(2024, 5, 10), "first day").unwrap();
    tracker.mark_fail(habit.id, d(2024, 5, 20), "today").unwrap();
}

#[test]
fn validation_and_not_found_errors() {
    let tracker = tracker_on(Arc::new(MemoryHabitStore::new()), d(2024, 5, 20));
    assert!(matches!(
        tracker.create_habit(NewHabit::new("   ")),
        Err(HabitError::Validation(_))
    ));

    let habit = tracker.create_habit(NewHabit::new("Late nights")).unwrap();
    assert_eq!(habit.start_date, d(2024, 5, 20));
    assert!(matches!(
        tracker.mark_fail(habit.id, d(2024, 5, 20), "  "),
        Err(HabitError::Validation(_))
    ));
    assert!(matches!(
        tracker.mark_fail(999, d(2024, 5, 20), "x"),
        Err(HabitError::HabitNotFound(999))
    ));
    assert!(matches!(
        tracker.update_record_reason(42, "x"),
        Err(HabitError::RecordNotFound(42))
    ));
    assert!(matches!(
        tracker.delete_record(42),
        Err(HabitError::RecordNotFound(42))
    ));
    assert!(matches!(
        tracker.calendar(habit.id, Some(2024), Some(13)),
        Err(HabitError::InvalidCalendarPeriod {
            year: 2024,
            month: 13
        })
    ));
}

#[test]
fn summary_for_habit_starting_at_earliest_date() {
    let today = NaiveDate::MIN + chrono::Duration::days(3);
    let tracker = tracker_on(Arc::new(MemoryHabitStore::new()), today);
    let habit = tracker
        .create_habit(NewHabit::new("Ancient").starting(NaiveDate::MIN))
        .unwrap();

    let summary = tracker.habit_summary(habit.id).unwrap();
    assert_eq!(summary.consecutive_days, 4);
    assert_eq!(tracker.list_habits().unwrap()[0].consecutive_days, 4);
}

#[test]
fn calendar_defaults_to_current_month() {
    let tracker = tracker_on(Arc::new(MemoryHabitStore::new()), d(2024, 2, 10));
    let habit = tracker
        .create_habit(NewHabit::new("Soda").starting(d(2024, 1, 15)))
        .unwrap();

    let calendar = tracker.calendar(habit.id, None, None).unwrap();
    assert_eq!((calendar.year, calendar.month), (2024, 2));
    assert_eq!(calendar.days.len(), 29);

    let january = tracker.calendar(habit.id, None, Some(1)).unwrap();
    assert_eq!(january.days[13].status, DayStatus::NotStarted);
    assert_eq!(january.days[14].status, DayStatus::Success);
}

#[test]
fn deleting_habit_cascades_to_records() {
    for (name, store) in stores() {
        let tracker = tracker_on(store.clone(), d(2024, 4, 30));
        let habit = tracker
            .create_habit(NewHabit::new("Gaming").starting(d(2024, 4, 1)))
            .unwrap();
        let (record, _) = tracker.mark_fail(habit.id, d(2024, 4, 3), "raid").unwrap();

        tracker.delete_habit(habit.id).unwrap();
        assert!(store.find_record(record.id).unwrap().is_none(), "{name}");
        assert!(
            matches!(
                tracker.habit_summary(habit.id),
                Err(HabitError::HabitNotFound(_))
            ),
            "{name}"
        );
        assert!(
            matches!(
                tracker.delete_habit(habit.id),
                Err(HabitError::HabitNotFound(_))
            ),
            "{name}"
        );
    }
}

#[test]
fn list_habits_is_newest_first_with_streaks() {
    let store: Arc<dyn HabitStore> = Arc::new(MemoryHabitStore::new());
    let early = HabitTracker::with_clock(
        store.clone(),
        Arc::new(FixedClock::at(d(2024, 1, 1).and_hms_opt(9, 0, 0).unwrap())),
    );
    let later = HabitTracker::with_clock(
        store,
        Arc::new(FixedClock::at(d(2024, 1, 10).and_hms_opt(9, 0, 0).unwrap())),
    );

    let first = early.create_habit(NewHabit::new("Older")).unwrap();
    let second = later.create_habit(NewHabit::new("Newer")).unwrap();
    later.mark_fail(first.id, d(2024, 1, 8), "relapse").unwrap();

    let habits = later.list_habits().unwrap();
    assert_eq!(habits.len(), 2);
    assert_eq!(habits[0].habit.id, second.id);
    assert_eq!(habits[0].consecutive_days, 1);
    assert_eq!(habits[0].last_fail_date, None);
    assert_eq!(habits[1].habit.id, first.id);
    assert_eq!(habits[1].consecutive_days, 2);
    assert_eq!(habits[1].last_fail_date, Some(d(2024, 1, 8)));
}
