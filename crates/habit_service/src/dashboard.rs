use chrono::NaiveDate;
use habit_core::{
    aggregate_habit, bucketize, current_streak_capped, is_due, longest_streak, rank_by_failure,
    CompletionLookup, DateWindow, Granularity, Habit, HabitId, TrendPoint, WindowTotals,
    STREAK_WALK_LIMIT,
};
use serde::{Deserialize, Serialize};

use crate::snapshot::Snapshot;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardOptions {
    /// Length of the trailing window used for totals, ranking and trend.
    pub window_days: u32,
    pub streak_walk_limit: u32,
    pub abandoned_limit: usize,
    pub granularity: Granularity,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            window_days: 30,
            streak_walk_limit: STREAK_WALK_LIMIT,
            abandoned_limit: 5,
            granularity: Granularity::Week,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HabitStatus {
    pub id: HabitId,
    pub name: String,
    pub frequency: String,
    pub due_today: bool,
    pub completed_today: bool,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_completed: Option<NaiveDate>,
    pub totals: WindowTotals,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AbandonedEntry {
    pub id: HabitId,
    pub name: String,
    pub missed: u32,
    pub planned: u32,
    pub failure_rate: f64,
}

/// Everything a home screen shows, computed from one snapshot.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Dashboard {
    pub as_of: NaiveDate,
    pub window: DateWindow,
    pub habits: Vec<HabitStatus>,
    pub totals: WindowTotals,
    pub completion_rate: f64,
    pub abandoned: Vec<AbandonedEntry>,
    pub trend: Vec<TrendPoint>,
}

impl Dashboard {
    pub fn compute(snapshot: &Snapshot, as_of: NaiveDate, options: &DashboardOptions) -> Self {
        let window = DateWindow::trailing(as_of, options.window_days);
        let index = snapshot.index();

        let habits: Vec<HabitStatus> = snapshot
            .active_habits()
            .map(|habit| habit_status(habit, snapshot, as_of, &window, options))
            .collect();
        let totals = habits.iter().map(|status| status.totals).sum::<WindowTotals>();

        let abandoned = rank_by_failure(snapshot.habits(), index, &window)
            .into_iter()
            .take(options.abandoned_limit)
            .map(|entry| AbandonedEntry {
                id: entry.habit.id.clone(),
                name: entry.habit.name.clone(),
                missed: entry.missed,
                planned: entry.planned,
                failure_rate: entry.failure_rate,
            })
            .collect();

        let trend = bucketize(snapshot.habits(), index, window, options.granularity)
            .iter()
            .collect();

        Self {
            as_of,
            window,
            habits,
            completion_rate: totals.completion_rate(),
            totals,
            abandoned,
            trend,
        }
    }
}

fn habit_status(
    habit: &Habit,
    snapshot: &Snapshot,
    as_of: NaiveDate,
    window: &DateWindow,
    options: &DashboardOptions,
) -> HabitStatus {
    let index = snapshot.index();
    // completion dates never widen the history; it starts at creation
    let history = DateWindow::new(habit.anchor_date(), as_of);
    let totals = aggregate_habit(habit, index, window);
    HabitStatus {
        id: habit.id.clone(),
        name: habit.name.clone(),
        frequency: habit.frequency.kind().to_string(),
        due_today: is_due(habit, as_of),
        completed_today: index.is_completed(&habit.id, as_of),
        current_streak: current_streak_capped(habit, index, as_of, options.streak_walk_limit),
        longest_streak: longest_streak(habit, index, &history),
        last_completed: index.last_completed(&habit.id, as_of),
        completion_rate: totals.completion_rate(),
        totals,
    }
}
