use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::completions::CompletionLookup;
use crate::date::DateWindow;
use crate::model::Habit;
use crate::schedule::due_dates;

/// Planned and completed occurrences over a window.
///
/// Only due dates are counted; a completion logged on a day the habit was not
/// due adds nothing, so `completed <= planned` always holds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowTotals {
    pub planned: u32,
    pub completed: u32,
}

impl WindowTotals {
    pub fn missed(&self) -> u32 {
        self.planned.saturating_sub(self.completed)
    }

    /// Percentage in `0.0..=100.0`; zero when nothing was planned.
    pub fn completion_rate(&self) -> f64 {
        percentage(self.completed, self.planned)
    }

    /// `missed / planned * 100`; zero when nothing was planned.
    pub fn failure_rate(&self) -> f64 {
        percentage(self.missed(), self.planned)
    }
}

impl Add for WindowTotals {
    type Output = WindowTotals;

    fn add(self, rhs: WindowTotals) -> WindowTotals {
        WindowTotals {
            planned: self.planned + rhs.planned,
            completed: self.completed + rhs.completed,
        }
    }
}

impl AddAssign for WindowTotals {
    fn add_assign(&mut self, rhs: WindowTotals) {
        *self = *self + rhs;
    }
}

impl Sum for WindowTotals {
    fn sum<I: Iterator<Item = WindowTotals>>(iter: I) -> Self {
        iter.fold(WindowTotals::default(), Add::add)
    }
}

pub(crate) fn percentage(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        f64::from(part) / f64::from(whole) * 100.0
    }
}

/// Totals across every active habit in `habits`.
pub fn aggregate<C>(habits: &[Habit], completions: &C, window: &DateWindow) -> WindowTotals
where
    C: CompletionLookup + ?Sized,
{
    habits
        .iter()
        .filter(|habit| habit.is_active)
        .map(|habit| aggregate_habit(habit, completions, window))
        .sum()
}

/// Totals for a single habit, regardless of its active flag.
pub fn aggregate_habit<C>(habit: &Habit, completions: &C, window: &DateWindow) -> WindowTotals
where
    C: CompletionLookup + ?Sized,
{
    let mut totals = WindowTotals::default();
    for day in due_dates(habit, window) {
        totals.planned += 1;
        if completions.is_completed(&habit.id, day) {
            totals.completed += 1;
        }
    }
    totals
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HabitTotals<'a> {
    pub habit: &'a Habit,
    pub totals: WindowTotals,
}

/// One entry per active habit, in input order.
pub fn aggregate_per_habit<'a, C>(
    habits: &'a [Habit],
    completions: &C,
    window: &DateWindow,
) -> Vec<HabitTotals<'a>>
where
    C: CompletionLookup + ?Sized,
{
    habits
        .iter()
        .filter(|habit| habit.is_active)
        .map(|habit| HabitTotals {
            habit,
            totals: aggregate_habit(habit, completions, window),
        })
        .collect()
}
