use chrono::{DateTime, Utc};
use habit_core::{Habit, HabitId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReminderRequest {
    pub habit_id: HabitId,
    pub title: String,
    pub body: String,
    pub scheduled_for: DateTime<Utc>,
}

/// Platform-specific reminder adapters will implement this trait.
pub trait ReminderSink: Send + Sync {
    fn schedule(&self, reminder: ReminderRequest);
    fn clear_for_habit(&self, habit: &Habit);
}
