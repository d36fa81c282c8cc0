use chrono::{Datelike, NaiveDate};

use crate::date::DateWindow;
use crate::model::{Frequency, Habit};

/// Whether `habit` should be performed on `date`.
pub fn is_due(habit: &Habit, date: NaiveDate) -> bool {
    habit.frequency.is_due(habit.anchor_date(), date)
}

/// Due dates of `habit` inside `window`, oldest first.
pub fn due_dates<'a>(
    habit: &'a Habit,
    window: &DateWindow,
) -> impl Iterator<Item = NaiveDate> + 'a {
    let anchor = habit.anchor_date();
    window.days().filter(move |date| habit.frequency.is_due(anchor, *date))
}

impl Frequency {
    /// `anchor` is the creation date; only alternate-day habits consult it.
    pub fn is_due(&self, anchor: NaiveDate, date: NaiveDate) -> bool {
        match self {
            Frequency::Daily => true,
            Frequency::Alternate => {
                let offset = (date - anchor).num_days();
                offset >= 0 && offset % 2 == 0
            }
            Frequency::Custom(days) => days.contains(date.weekday()),
            Frequency::Unrecognized(_) => false,
        }
    }
}
