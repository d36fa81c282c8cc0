use chrono::{DateTime, FixedOffset, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::date::{self, midnight_utc, parse_timestamp, weekday_from_monday, weekday_name};
use crate::error::ParseError;

pub type HabitId = String;

/// Set of weekdays a `Custom` habit is due on.
///
/// Persisted as a list of lowercase weekday names; unknown names are dropped
/// on load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct DaySet(u8);

impl DaySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= Self::bit(day);
    }

    pub fn remove(&mut self, day: Weekday) {
        self.0 &= !Self::bit(day);
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & Self::bit(day) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Members in Monday-to-Sunday order.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        (0..7u8)
            .filter(|idx| self.0 & (1u8 << *idx) != 0)
            .filter_map(weekday_from_monday)
    }

    fn bit(day: Weekday) -> u8 {
        1 << day.num_days_from_monday()
    }
}

impl FromIterator<Weekday> for DaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = DaySet::empty();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl From<Vec<String>> for DaySet {
    fn from(names: Vec<String>) -> Self {
        names
            .iter()
            .filter_map(|name| match date::parse_weekday(name) {
                Ok(day) => Some(day),
                Err(err) => {
                    tracing::warn!(%err, "dropping unknown custom day");
                    None
                }
            })
            .collect()
    }
}

impl From<DaySet> for Vec<String> {
    fn from(set: DaySet) -> Self {
        set.iter().map(|day| weekday_name(day).to_string()).collect()
    }
}

/// Recurrence rule of a habit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    /// Every other day, counted from the creation date.
    Alternate,
    Custom(DaySet),
    /// A frequency type this engine does not know. Never due.
    Unrecognized(String),
}

impl Frequency {
    /// Build from the persisted `frequency_type` and optional `custom_days`.
    /// An absent day list on a custom habit is the same as an empty one.
    pub fn from_parts(kind: &str, custom_days: Option<DaySet>) -> Self {
        let normalized = kind.trim();
        if normalized.eq_ignore_ascii_case("daily") {
            Frequency::Daily
        } else if normalized.eq_ignore_ascii_case("alternate") {
            Frequency::Alternate
        } else if normalized.eq_ignore_ascii_case("custom") {
            Frequency::Custom(custom_days.unwrap_or_default())
        } else {
            tracing::debug!(kind = normalized, "unrecognized frequency type");
            Frequency::Unrecognized(normalized.to_string())
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Alternate => "alternate",
            Frequency::Custom(_) => "custom",
            Frequency::Unrecognized(raw) => raw,
        }
    }

    pub fn custom_days(&self) -> Option<DaySet> {
        match self {
            Frequency::Custom(days) => Some(*days),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "HabitRecord", into = "HabitRecord")]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    pub description: Option<String>,
    pub frequency: Frequency,
    pub created_at: DateTime<FixedOffset>,
    pub is_active: bool,
}

impl Habit {
    /// Active habit created at midnight UTC on `created_on`.
    pub fn new(
        id: impl Into<HabitId>,
        name: impl Into<String>,
        frequency: Frequency,
        created_on: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            frequency,
            created_at: midnight_utc(created_on),
            is_active: true,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<FixedOffset>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Creation date in the offset it was recorded with; the parity anchor
    /// for alternate-day habits.
    pub fn anchor_date(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}

/// Persisted shape of a habit: a flat frequency type plus an optional day
/// list. Accepts both snake_case and camelCase field names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HabitRecord {
    pub id: HabitId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(alias = "frequencyType")]
    pub frequency_type: String,
    #[serde(default, alias = "customDays", skip_serializing_if = "Option::is_none")]
    pub custom_days: Option<DaySet>,
    #[serde(alias = "createdAt")]
    pub created_at: String,
    #[serde(default = "default_active", alias = "isActive")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl TryFrom<HabitRecord> for Habit {
    type Error = ParseError;

    fn try_from(record: HabitRecord) -> Result<Self, Self::Error> {
        let created_at = parse_timestamp(&record.created_at)?;
        Ok(Habit {
            frequency: Frequency::from_parts(&record.frequency_type, record.custom_days),
            id: record.id,
            name: record.name,
            description: record.description,
            created_at,
            is_active: record.is_active,
        })
    }
}

impl From<Habit> for HabitRecord {
    fn from(habit: Habit) -> Self {
        HabitRecord {
            frequency_type: habit.frequency.kind().to_string(),
            custom_days: habit.frequency.custom_days(),
            id: habit.id,
            name: habit.name,
            description: habit.description,
            created_at: habit.created_at.to_rfc3339(),
            is_active: habit.is_active,
        }
    }
}

/// One performed occurrence of a habit on a calendar date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HabitCompletion {
    #[serde(alias = "habitId")]
    pub habit_id: HabitId,
    #[serde(default, alias = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(alias = "completionDate")]
    pub completion_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl HabitCompletion {
    pub fn new(habit_id: impl Into<HabitId>, completion_date: NaiveDate) -> Self {
        Self {
            habit_id: habit_id.into(),
            user_id: None,
            completion_date,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}
