use chrono::NaiveDate;

use crate::completions::CompletionLookup;
use crate::date::DateWindow;
use crate::model::Habit;

/// Maximum number of calendar days the current-streak walk visits, counting
/// the reference date itself.
pub const STREAK_WALK_LIMIT: u32 = 365;

/// Unbroken run of completed due dates ending at or before `as_of`.
///
/// Walks backward one calendar day at a time: a completed due date extends
/// the run, a missed due date ends it, and days the habit is not due are
/// skipped. The walk stops after [`STREAK_WALK_LIMIT`] days.
pub fn current_streak<C>(habit: &Habit, completions: &C, as_of: NaiveDate) -> u32
where
    C: CompletionLookup + ?Sized,
{
    current_streak_capped(habit, completions, as_of, STREAK_WALK_LIMIT)
}

/// [`current_streak`] with an explicit walk limit.
pub fn current_streak_capped<C>(
    habit: &Habit,
    completions: &C,
    as_of: NaiveDate,
    walk_limit: u32,
) -> u32
where
    C: CompletionLookup + ?Sized,
{
    let anchor = habit.anchor_date();
    let mut streak = 0;
    let mut day = as_of;
    for _ in 0..walk_limit {
        if habit.frequency.is_due(anchor, day) {
            if !completions.is_completed(&habit.id, day) {
                break;
            }
            streak += 1;
        }
        match day.pred_opt() {
            Some(previous) => day = previous,
            None => break,
        }
    }
    streak
}

/// Longest run of completed due dates inside `window`, using the same
/// extend/break/skip rules as [`current_streak`].
pub fn longest_streak<C>(habit: &Habit, completions: &C, window: &DateWindow) -> u32
where
    C: CompletionLookup + ?Sized,
{
    let anchor = habit.anchor_date();
    let mut best = 0;
    let mut run = 0;
    for day in window.days() {
        if !habit.frequency.is_due(anchor, day) {
            continue;
        }
        if completions.is_completed(&habit.id, day) {
            run += 1;
            best = best.max(run);
        } else {
            run = 0;
        }
    }
    best
}
