use std::cmp::Ordering;

use serde::Serialize;

use crate::completions::CompletionLookup;
use crate::date::DateWindow;
use crate::model::Habit;
use crate::window::aggregate_habit;

/// A habit that was missed at least once in the ranked window.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AbandonedHabit<'a> {
    pub habit: &'a Habit,
    pub missed: u32,
    pub planned: u32,
    pub failure_rate: f64,
}

/// Active habits ordered from most to least abandoned.
///
/// Habits never due in the window, and habits with no misses, are left out.
/// Order is by failure rate, then by absolute misses, both descending; any
/// remaining tie keeps input order.
pub fn rank_by_failure<'a, C>(
    habits: &'a [Habit],
    completions: &C,
    window: &DateWindow,
) -> Vec<AbandonedHabit<'a>>
where
    C: CompletionLookup + ?Sized,
{
    let mut ranked: Vec<AbandonedHabit<'a>> = habits
        .iter()
        .filter(|habit| habit.is_active)
        .filter_map(|habit| {
            let totals = aggregate_habit(habit, completions, window);
            let missed = totals.missed();
            if totals.planned == 0 || missed == 0 {
                return None;
            }
            Some(AbandonedHabit {
                habit,
                missed,
                planned: totals.planned,
                failure_rate: totals.failure_rate(),
            })
        })
        .collect();
    ranked.sort_by(by_failure_desc);
    ranked
}

// Compares missed/planned as exact fractions so equal rates tie exactly.
fn by_failure_desc(a: &AbandonedHabit<'_>, b: &AbandonedHabit<'_>) -> Ordering {
    let a_scaled = u64::from(a.missed) * u64::from(b.planned);
    let b_scaled = u64::from(b.missed) * u64::from(a.planned);
    b_scaled.cmp(&a_scaled).then_with(|| b.missed.cmp(&a.missed))
}
