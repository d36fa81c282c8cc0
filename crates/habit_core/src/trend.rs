use std::fmt;
use std::iter::FusedIterator;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::completions::CompletionLookup;
use crate::date::{format_date, week_start, DateWindow};
use crate::error::ParseError;
use crate::model::Habit;
use crate::window::{aggregate, aggregate_habit, WindowTotals};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    /// Monday-starting weeks, clipped at the window edges.
    #[default]
    Week,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("day") {
            Ok(Granularity::Day)
        } else if trimmed.eq_ignore_ascii_case("week") {
            Ok(Granularity::Week)
        } else {
            Err(ParseError::InvalidGranularity(trimmed.to_string()))
        }
    }
}

/// Split `window` into chronological buckets. Restartable: every call walks
/// the window from its start.
pub fn buckets(window: &DateWindow, granularity: Granularity) -> BucketIter {
    BucketIter {
        next_start: (!window.is_empty()).then_some(window.start),
        end: window.end,
        granularity,
    }
}

#[derive(Debug, Clone)]
pub struct BucketIter {
    next_start: Option<NaiveDate>,
    end: NaiveDate,
    granularity: Granularity,
}

impl Iterator for BucketIter {
    type Item = DateWindow;

    fn next(&mut self) -> Option<DateWindow> {
        let start = self.next_start?;
        let natural_end = match self.granularity {
            Granularity::Day => start,
            Granularity::Week => week_start(start)
                .checked_add_days(Days::new(6))
                .unwrap_or(NaiveDate::MAX),
        };
        let end = natural_end.min(self.end);
        self.next_start = if end < self.end { end.succ_opt() } else { None };
        Some(DateWindow::new(start, end))
    }
}

impl FusedIterator for BucketIter {}

/// One bucket of a trend series. `label` is the bucket's first day as
/// `YYYY-MM-DD`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrendPoint {
    pub label: String,
    pub window: DateWindow,
    pub totals: WindowTotals,
    pub rate: f64,
}

impl TrendPoint {
    fn new(window: DateWindow, totals: WindowTotals) -> Self {
        Self {
            label: format_date(window.start),
            window,
            totals,
            rate: totals.completion_rate(),
        }
    }
}

/// Completion rate across all active habits, one point per bucket.
pub fn bucketize<'a, C>(
    habits: &'a [Habit],
    completions: &'a C,
    window: DateWindow,
    granularity: Granularity,
) -> TrendSeries<'a, C>
where
    C: CompletionLookup + ?Sized,
{
    TrendSeries {
        habits,
        completions,
        window,
        granularity,
    }
}

/// Lazily evaluated global series. Holds only borrowed inputs, so it can be
/// iterated any number of times with identical results.
#[derive(Debug)]
pub struct TrendSeries<'a, C: ?Sized> {
    habits: &'a [Habit],
    completions: &'a C,
    window: DateWindow,
    granularity: Granularity,
}

impl<'a, C> TrendSeries<'a, C>
where
    C: CompletionLookup + ?Sized,
{
    pub fn iter(&self) -> TrendIter<'_, 'a, C> {
        TrendIter {
            series: self,
            buckets: buckets(&self.window, self.granularity),
        }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }
}

impl<'s, 'a, C> IntoIterator for &'s TrendSeries<'a, C>
where
    C: CompletionLookup + ?Sized,
{
    type Item = TrendPoint;
    type IntoIter = TrendIter<'s, 'a, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct TrendIter<'s, 'a, C: ?Sized> {
    series: &'s TrendSeries<'a, C>,
    buckets: BucketIter,
}

impl<C> Iterator for TrendIter<'_, '_, C>
where
    C: CompletionLookup + ?Sized,
{
    type Item = TrendPoint;

    fn next(&mut self) -> Option<TrendPoint> {
        let bucket = self.buckets.next()?;
        let totals = aggregate(self.series.habits, self.series.completions, &bucket);
        Some(TrendPoint::new(bucket, totals))
    }
}

/// Series for a single habit. Buckets in which the habit is never due have
/// no point at all; with day granularity every emitted rate is 0 or 100.
pub fn bucketize_habit<'a, C>(
    habit: &'a Habit,
    completions: &'a C,
    window: DateWindow,
    granularity: Granularity,
) -> HabitTrendSeries<'a, C>
where
    C: CompletionLookup + ?Sized,
{
    HabitTrendSeries {
        habit,
        completions,
        window,
        granularity,
    }
}

#[derive(Debug)]
pub struct HabitTrendSeries<'a, C: ?Sized> {
    habit: &'a Habit,
    completions: &'a C,
    window: DateWindow,
    granularity: Granularity,
}

impl<'a, C> HabitTrendSeries<'a, C>
where
    C: CompletionLookup + ?Sized,
{
    pub fn iter(&self) -> HabitTrendIter<'_, 'a, C> {
        HabitTrendIter {
            series: self,
            buckets: buckets(&self.window, self.granularity),
        }
    }

    pub fn habit(&self) -> &'a Habit {
        self.habit
    }
}

impl<'s, 'a, C> IntoIterator for &'s HabitTrendSeries<'a, C>
where
    C: CompletionLookup + ?Sized,
{
    type Item = TrendPoint;
    type IntoIter = HabitTrendIter<'s, 'a, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct HabitTrendIter<'s, 'a, C: ?Sized> {
    series: &'s HabitTrendSeries<'a, C>,
    buckets: BucketIter,
}

impl<C> Iterator for HabitTrendIter<'_, '_, C>
where
    C: CompletionLookup + ?Sized,
{
    type Item = TrendPoint;

    fn next(&mut self) -> Option<TrendPoint> {
        for bucket in self.buckets.by_ref() {
            let totals = aggregate_habit(self.series.habit, self.series.completions, &bucket);
            if totals.planned > 0 {
                return Some(TrendPoint::new(bucket, totals));
            }
        }
        None
    }
}
