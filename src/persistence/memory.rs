use super::{HabitStore, PersistenceResult};
use crate::habit::{FailureRecord, Habit, HabitDraft, HabitId, RecordId, UpsertOutcome};
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::RwLock;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct MemoryState {
    habits: BTreeMap<HabitId, Habit>,
    records: BTreeMap<RecordId, FailureRecord>,
    by_day: BTreeMap<(HabitId, NaiveDate), RecordId>,
    last_habit_id: HabitId,
    last_record_id: RecordId,
}

impl MemoryState {
    fn records_between(
        &self,
        habit_id: HabitId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Vec<FailureRecord> {
        if from > to {
            return Vec::new();
        }
        self.by_day
            .range((habit_id, from)..=(habit_id, to))
            .filter_map(|(_, record_id)| self.records.get(record_id).cloned())
            .collect()
    }
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryHabitStore {
    state: RwLock<MemoryState>,
}

impl MemoryHabitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HabitStore for MemoryHabitStore {
    fn find_habit(&self, id: HabitId) -> PersistenceResult<Option<Habit>> {
        Ok(self.state.read().habits.get(&id).cloned())
    }

    fn list_habits(&self) -> PersistenceResult<Vec<Habit>> {
        let mut habits: Vec<Habit> = self.state.read().habits.values().cloned().collect();
        habits.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(habits)
    }

    fn create_habit(&self, draft: &HabitDraft) -> PersistenceResult<Habit> {
        let mut state = self.state.write();
        state.last_habit_id += 1;
        let habit = Habit {
            id: state.last_habit_id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            start_date: draft.start_date,
            created_at: draft.created_at,
        };
        state.habits.insert(habit.id, habit.clone());
        Ok(habit)
    }

    fn delete_habit(&self, id: HabitId) -> PersistenceResult<bool> {
        let mut state = self.state.write();
        if state.habits.remove(&id).is_none() {
            return Ok(false);
        }
        let keys: Vec<(HabitId, NaiveDate)> = state
            .by_day
            .range((id, NaiveDate::MIN)..=(id, NaiveDate::MAX))
            .map(|(key, _)| *key)
            .collect();
        for key in keys {
            if let Some(record_id) = state.by_day.remove(&key) {
                state.records.remove(&record_id);
            }
        }
        Ok(true)
    }

    fn find_records_in_range(
        &self,
        habit_id: HabitId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> PersistenceResult<Vec<FailureRecord>> {
        Ok(self.state.read().records_between(habit_id, from, to))
    }

    fn find_record_by_date(
        &self,
        habit_id: HabitId,
        date: NaiveDate,
    ) -> PersistenceResult<Option<FailureRecord>> {
        let state = self.state.read();
        Ok(state
            .by_day
            .get(&(habit_id, date))
            .and_then(|record_id| state.records.get(record_id))
            .cloned())
    }

    fn find_record(&self, record_id: RecordId) -> PersistenceResult<Option<FailureRecord>> {
        Ok(self.state.read().records.get(&record_id).cloned())
    }

    fn find_all_records_for_habit(
        &self,
        habit_id: HabitId,
    ) -> PersistenceResult<Vec<FailureRecord>> {
        Ok(self
            .state
            .read()
            .records_between(habit_id, NaiveDate::MIN, NaiveDate::MAX))
    }

    fn upsert_record(
        &self,
        habit_id: HabitId,
        date: NaiveDate,
        reason: &str,
        created_at: NaiveDateTime,
    ) -> PersistenceResult<(FailureRecord, UpsertOutcome)> {
        let mut state = self.state.write();
        if let Some(record_id) = state.by_day.get(&(habit_id, date)).copied() {
            if let Some(record) = state.records.get_mut(&record_id) {
                record.reason = reason.to_string();
                return Ok((record.clone(), UpsertOutcome::Updated));
            }
        }

        state.last_record_id += 1;
        let record = FailureRecord {
            id: state.last_record_id,
            habit_id,
            date,
            reason: reason.to_string(),
            created_at,
        };
        state.by_day.insert((habit_id, date), record.id);
        state.records.insert(record.id, record.clone());
        Ok((record, UpsertOutcome::Created))
    }

    fn update_record_reason(
        &self,
        record_id: RecordId,
        reason: &str,
    ) -> PersistenceResult<Option<FailureRecord>> {
        let mut state = self.state.write();
        Ok(state.records.get_mut(&record_id).map(|record| {
            record.reason = reason.to_string();
            record.clone()
        }))
    }

    fn delete_record(&self, record_id: RecordId) -> PersistenceResult<bool> {
        let mut state = self.state.write();
        match state.records.remove(&record_id) {
            Some(record) => {
                state.by_day.remove(&(record.habit_id, record.date));
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
