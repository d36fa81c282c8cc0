pub mod completions;
pub mod date;
pub mod error;
pub mod model;
pub mod ranking;
pub mod schedule;
pub mod streak;
pub mod trend;
pub mod window;

pub use crate::completions::{CompletionIndex, CompletionLookup};
pub use crate::date::DateWindow;
pub use crate::error::ParseError;
pub use crate::model::{DaySet, Frequency, Habit, HabitCompletion, HabitId};
pub use crate::ranking::{rank_by_failure, AbandonedHabit};
pub use crate::schedule::{due_dates, is_due};
pub use crate::streak::{current_streak, current_streak_capped, longest_streak, STREAK_WALK_LIMIT};
pub use crate::trend::{bucketize, bucketize_habit, Granularity, TrendPoint};
pub use crate::window::{aggregate, aggregate_habit, aggregate_per_habit, WindowTotals};
