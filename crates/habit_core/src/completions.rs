use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;

use crate::model::{Habit, HabitCompletion, HabitId};

/// Answers "was this habit done on this date?".
///
/// Lookups for ids or dates that match nothing are simply `false`, which is
/// how orphaned completions end up ignored.
pub trait CompletionLookup {
    fn is_completed(&self, habit_id: &str, date: NaiveDate) -> bool;
}

impl CompletionLookup for [HabitCompletion] {
    fn is_completed(&self, habit_id: &str, date: NaiveDate) -> bool {
        self.iter()
            .any(|entry| entry.completion_date == date && entry.habit_id == habit_id)
    }
}

impl CompletionLookup for Vec<HabitCompletion> {
    fn is_completed(&self, habit_id: &str, date: NaiveDate) -> bool {
        self.as_slice().is_completed(habit_id, date)
    }
}

/// Deduplicated `(habit id, date)` index over a completion snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionIndex {
    by_habit: HashMap<HabitId, BTreeSet<NaiveDate>>,
}

impl CompletionIndex {
    pub fn new(completions: &[HabitCompletion]) -> Self {
        completions.iter().collect()
    }

    /// Returns `false` when the pair was already present.
    pub fn insert(&mut self, habit_id: &str, date: NaiveDate) -> bool {
        self.by_habit
            .entry(habit_id.to_string())
            .or_default()
            .insert(date)
    }

    pub fn remove(&mut self, habit_id: &str, date: NaiveDate) -> bool {
        let Some(dates) = self.by_habit.get_mut(habit_id) else {
            return false;
        };
        let removed = dates.remove(&date);
        if dates.is_empty() {
            self.by_habit.remove(habit_id);
        }
        removed
    }

    /// Number of distinct occurrences.
    pub fn len(&self) -> usize {
        self.by_habit.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_habit.is_empty()
    }

    /// Completion dates of one habit, oldest first.
    pub fn dates_for(&self, habit_id: &str) -> impl DoubleEndedIterator<Item = NaiveDate> + '_ {
        self.by_habit
            .get(habit_id)
            .into_iter()
            .flat_map(|dates| dates.iter().copied())
    }

    /// Most recent completion on or before `date`.
    pub fn last_completed(&self, habit_id: &str, date: NaiveDate) -> Option<NaiveDate> {
        self.by_habit
            .get(habit_id)?
            .range(..=date)
            .next_back()
            .copied()
    }

    /// Habit ids that have completions but are absent from `habits`, sorted.
    pub fn orphan_habit_ids<'a>(&'a self, habits: &[Habit]) -> Vec<&'a str> {
        let known: HashSet<&str> = habits.iter().map(|habit| habit.id.as_str()).collect();
        let mut orphans: Vec<&str> = self
            .by_habit
            .keys()
            .map(String::as_str)
            .filter(|id| !known.contains(id))
            .collect();
        orphans.sort_unstable();
        orphans
    }
}

impl CompletionLookup for CompletionIndex {
    fn is_completed(&self, habit_id: &str, date: NaiveDate) -> bool {
        self.by_habit
            .get(habit_id)
            .is_some_and(|dates| dates.contains(&date))
    }
}

impl<'a> FromIterator<&'a HabitCompletion> for CompletionIndex {
    fn from_iter<I: IntoIterator<Item = &'a HabitCompletion>>(iter: I) -> Self {
        let mut index = CompletionIndex::default();
        for completion in iter {
            index.insert(&completion.habit_id, completion.completion_date);
        }
        index
    }
}
