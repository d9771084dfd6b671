use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub type HabitId = i64;
pub type RecordId = i64;

/// A behaviour being quit. Tracking starts on `start_date` (inclusive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    /// Serialized as `""` when absent; blank text reads back as `None`.
    #[serde(default, with = "blank_as_none")]
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub created_at: NaiveDateTime,
}

mod blank_as_none {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<String>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.filter(|text| !text.trim().is_empty()))
    }
}

/// Caller-supplied fields for a new habit, before defaults are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHabit {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

impl NewHabit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            start_date: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn starting(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }
}

/// Fully resolved habit row handed to a store for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitDraft {
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub created_at: NaiveDateTime,
}

/// A day on which the habit was not kept. Days without a record are successes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub id: RecordId,
    pub habit_id: HabitId,
    pub date: NaiveDate,
    pub reason: String,
    pub created_at: NaiveDateTime,
}

/// Whether a mark-fail call inserted a new row or rewrote an existing reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Habit fields plus the derived streak statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitSummary {
    #[serde(flatten)]
    pub habit: Habit,
    pub consecutive_days: u32,
    pub last_fail_date: Option<NaiveDate>,
}
