use std::iter::FusedIterator;

use chrono::{
    DateTime, Datelike, Days, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
    Weekday,
};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Canonical exchange format for completion dates and window bounds.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const WEEKDAY_NAMES: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

pub fn parse_date(input: &str) -> Result<NaiveDate, ParseError> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| ParseError::InvalidDate(trimmed.to_string()))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Accepts RFC 3339, a naive `YYYY-MM-DD[T ]HH:MM:SS` (read as UTC) or a bare
/// date (midnight UTC).
pub fn parse_timestamp(input: &str) -> Result<DateTime<FixedOffset>, ParseError> {
    let trimmed = input.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts);
    }
    let naive = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f"));
    if let Ok(naive) = naive {
        return Ok(Utc.from_utc_datetime(&naive).fixed_offset());
    }
    parse_date(trimmed)
        .map(midnight_utc)
        .map_err(|_| ParseError::InvalidTimestamp(trimmed.to_string()))
}

pub fn midnight_utc(date: NaiveDate) -> DateTime<FixedOffset> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)).fixed_offset()
}

/// Lowercase, locale-independent weekday name (`monday` … `sunday`).
pub fn weekday_name(day: Weekday) -> &'static str {
    WEEKDAY_NAMES[day.num_days_from_monday() as usize]
}

pub fn parse_weekday(name: &str) -> Result<Weekday, ParseError> {
    let trimmed = name.trim();
    WEEKDAY_NAMES
        .iter()
        .position(|candidate| candidate.eq_ignore_ascii_case(trimmed))
        .and_then(|idx| weekday_from_monday(idx as u8))
        .ok_or_else(|| ParseError::InvalidWeekday(trimmed.to_string()))
}

pub(crate) fn weekday_from_monday(idx: u8) -> Option<Weekday> {
    match idx {
        0 => Some(Weekday::Mon),
        1 => Some(Weekday::Tue),
        2 => Some(Weekday::Wed),
        3 => Some(Weekday::Thu),
        4 => Some(Weekday::Fri),
        5 => Some(Weekday::Sat),
        6 => Some(Weekday::Sun),
        _ => None,
    }
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let back = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(back)).unwrap_or(NaiveDate::MIN)
}

/// Inclusive calendar-date range. A window whose start is after its end is
/// empty rather than invalid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn single(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    /// Parse `YYYY-MM-DD` bounds. Inverted bounds are accepted and yield an
    /// empty window.
    pub fn parse(start: &str, end: &str) -> Result<Self, ParseError> {
        Ok(Self::new(parse_date(start)?, parse_date(end)?))
    }

    /// The `days` calendar days ending at (and including) `end`. Zero days
    /// gives an empty window.
    pub fn trailing(end: NaiveDate, days: u32) -> Self {
        match days.checked_sub(1) {
            Some(span) => {
                let start = end
                    .checked_sub_days(Days::new(u64::from(span)))
                    .unwrap_or(NaiveDate::MIN);
                Self::new(start, end)
            }
            None => Self::new(end.succ_opt().unwrap_or(NaiveDate::MAX), end),
        }
    }

    /// Monday-to-Sunday week containing `date`.
    pub fn week_of(date: NaiveDate) -> Self {
        let start = week_start(date);
        let end = start.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX);
        Self::new(start, end)
    }

    /// Calendar month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        let start = date.with_day(1).unwrap_or(date);
        let next_month = if date.month() == 12 {
            NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
        };
        let end = next_month
            .and_then(|first| first.pred_opt())
            .unwrap_or(NaiveDate::MAX);
        Self::new(start, end)
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days covered, zero for an empty window.
    pub fn len_days(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            (self.end - self.start).num_days() as u64 + 1
        }
    }

    /// Overlap of two windows; empty when they do not meet.
    pub fn intersect(&self, other: &DateWindow) -> DateWindow {
        DateWindow::new(self.start.max(other.start), self.end.min(other.end))
    }

    /// Every date in the window, oldest first. Each call starts over.
    pub fn days(&self) -> DayIter {
        DayIter {
            next: (!self.is_empty()).then_some(self.start),
            end: self.end,
        }
    }
}

impl IntoIterator for &DateWindow {
    type Item = NaiveDate;
    type IntoIter = DayIter;

    fn into_iter(self) -> Self::IntoIter {
        self.days()
    }
}

#[derive(Debug, Clone)]
pub struct DayIter {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for DayIter {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        self.next = if current < self.end {
            current.succ_opt()
        } else {
            None
        };
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .next
            .map(|next| (self.end - next).num_days() as usize + 1)
            .unwrap_or(0);
        (remaining, Some(remaining))
    }
}

impl FusedIterator for DayIter {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_and_formats_canonical_dates() {
        let parsed = parse_date(" 2025-02-28 ").unwrap();
        assert_eq!(parsed, date(2025, 2, 28));
        assert_eq!(format_date(parsed), "2025-02-28");
        assert_eq!(
            parse_date("2025-02-30"),
            Err(ParseError::InvalidDate("2025-02-30".into()))
        );
        assert!(parse_date("28/02/2025").is_err());
    }

    #[test]
    fn timestamps_keep_their_recorded_offset() {
        let late_evening = parse_timestamp("2025-03-01T23:30:00-05:00").unwrap();
        assert_eq!(late_evening.date_naive(), date(2025, 3, 1));
        let naive = parse_timestamp("2025-03-01 08:15:00").unwrap();
        assert_eq!(naive.date_naive(), date(2025, 3, 1));
        assert_eq!(parse_timestamp("2025-03-01").unwrap(), midnight_utc(date(2025, 3, 1)));
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(ParseError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn weekday_names_are_lowercase_english() {
        assert_eq!(weekday_name(Weekday::Mon), "monday");
        assert_eq!(weekday_name(Weekday::Sun), "sunday");
        assert_eq!(parse_weekday("Wednesday").unwrap(), Weekday::Wed);
        assert_eq!(parse_weekday("saturday").unwrap(), Weekday::Sat);
        assert!(parse_weekday("sat").is_err());
        assert!(parse_weekday("").is_err());
    }

    #[test]
    fn week_start_is_monday() {
        // 2025-10-23 is a Thursday.
        assert_eq!(week_start(date(2025, 10, 23)), date(2025, 10, 20));
        assert_eq!(week_start(date(2025, 10, 20)), date(2025, 10, 20));
        assert_eq!(week_start(date(2025, 10, 26)), date(2025, 10, 20));
    }

    #[test]
    fn window_iterates_inclusive_bounds() {
        let window = DateWindow::new(date(2025, 12, 30), date(2026, 1, 2));
        let days: Vec<_> = window.days().collect();
        assert_eq!(
            days,
            vec![
                date(2025, 12, 30),
                date(2025, 12, 31),
                date(2026, 1, 1),
                date(2026, 1, 2)
            ]
        );
        assert_eq!(window.len_days(), 4);
        assert_eq!(window.days().size_hint(), (4, Some(4)));
        // restartable
        assert_eq!(window.days().count(), 4);
    }

    #[test]
    fn inverted_window_is_empty() {
        let window = DateWindow::new(date(2025, 1, 2), date(2025, 1, 1));
        assert!(window.is_empty());
        assert_eq!(window.len_days(), 0);
        assert_eq!(window.days().next(), None);
        assert!(!window.contains(date(2025, 1, 1)));
    }

    #[test]
    fn window_presets() {
        let thursday = date(2025, 10, 23);
        assert_eq!(
            DateWindow::trailing(thursday, 7),
            DateWindow::new(date(2025, 10, 17), thursday)
        );
        assert!(DateWindow::trailing(thursday, 0).is_empty());
        assert_eq!(
            DateWindow::week_of(thursday),
            DateWindow::new(date(2025, 10, 20), date(2025, 10, 26))
        );
        assert_eq!(
            DateWindow::month_of(date(2024, 2, 10)),
            DateWindow::new(date(2024, 2, 1), date(2024, 2, 29))
        );
        assert_eq!(
            DateWindow::month_of(date(2025, 12, 31)),
            DateWindow::new(date(2025, 12, 1), date(2025, 12, 31))
        );
    }

    #[test]
    fn intersect_clips_to_overlap() {
        let outer = DateWindow::new(date(2025, 1, 1), date(2025, 1, 31));
        let week = DateWindow::week_of(date(2025, 1, 1));
        assert_eq!(
            outer.intersect(&week),
            DateWindow::new(date(2025, 1, 1), date(2025, 1, 5))
        );
        let disjoint = DateWindow::single(date(2025, 3, 1));
        assert!(outer.intersect(&disjoint).is_empty());
    }

    #[test]
    fn window_parse_accepts_inverted_bounds() {
        let window = DateWindow::parse("2025-05-02", "2025-05-01").unwrap();
        assert!(window.is_empty());
        assert!(DateWindow::parse("2025-05-02", "tomorrow").is_err());
    }
}
