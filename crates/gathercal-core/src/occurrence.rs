//! Occurrence generation for recurrence rules.
//!
//! This module provides [`DateWindow`], an inclusive range of calendar days,
//! and [`Occurrences`], the lazy ascending sequence of dates on which a
//! [`RecurrenceRule`] fires inside a window.
//!
//! All arithmetic is done on [`NaiveDate`] values, i.e. whole calendar days in
//! UTC. An event's time-of-day never shifts its occurrence date.

use std::iter::FusedIterator;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rule::{RecurrenceRule, RuleParse};

/// Number of days ahead of the run date that templates are expanded into.
pub const EXPANSION_DAYS: u64 = 90;

/// A window whose start falls after its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("window start {start} is after end {end}")]
pub struct WindowError {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// An inclusive range of calendar dates `[start, end]`.
///
/// Deserializing rejects a start after the end, like [`DateWindow::try_new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateWindow")]
pub struct DateWindow {
    /// First day of the window (inclusive).
    pub start: NaiveDate,
    /// Last day of the window (inclusive).
    pub end: NaiveDate,
}

impl DateWindow {
    /// Creates a new window.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        assert!(start <= end, "DateWindow start must be <= end");
        Self { start, end }
    }

    /// Creates a new window, or fails if `start` is after `end`.
    pub fn try_new(start: NaiveDate, end: NaiveDate) -> Result<Self, WindowError> {
        if start > end {
            return Err(WindowError { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates a window from `start` through `start + days`.
    ///
    /// Saturates at the last representable date.
    pub fn forward(start: NaiveDate, days: u64) -> Self {
        let end = start.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX);
        Self { start, end }
    }

    /// The recurrence expansion window for a run on `today`.
    pub fn expansion(today: NaiveDate) -> Self {
        Self::forward(today, EXPANSION_DAYS)
    }

    /// Checks if a date falls within this window (both ends inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Returns the number of days covered, counting both ends.
    pub fn len_days(&self) -> u64 {
        (self.end - self.start).num_days() as u64 + 1
    }
}

#[derive(Deserialize)]
struct RawDateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawDateWindow> for DateWindow {
    type Error = WindowError;

    fn try_from(raw: RawDateWindow) -> Result<Self, Self::Error> {
        Self::try_new(raw.start, raw.end)
    }
}

/// Returns the date of the `n`th `day` in the given month (1-based).
///
/// The first occurrence is located and `(n - 1)` weeks are added. If that
/// leaves the month, the month has no such occurrence and `None` is returned.
pub fn nth_weekday_of_month(year: i32, month: u32, day: Weekday, n: u32) -> Option<NaiveDate> {
    if n == 0 {
        return None;
    }
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let offset = (7 + day.num_days_from_sunday() - first.weekday().num_days_from_sunday()) % 7;
    let first_match = first.checked_add_days(Days::new(u64::from(offset)))?;
    let candidate = first_match.checked_add_days(Days::new(u64::from(n - 1) * 7))?;
    (candidate.month() == month && candidate.year() == year).then_some(candidate)
}

/// Returns the date of the last `day` in the given month.
pub fn last_weekday_of_month(year: i32, month: u32, day: Weekday) -> Option<NaiveDate> {
    let last = last_day_of_month(year, month)?;
    let offset = (7 + last.weekday().num_days_from_sunday() - day.num_days_from_sunday()) % 7;
    last.checked_sub_days(Days::new(u64::from(offset)))
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = next_month(year, month);
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

#[derive(Debug, Clone, Copy)]
enum Cursor {
    /// Next candidate date for weekly rules.
    Day(NaiveDate),
    /// Next month to inspect for monthly rules.
    Month { year: i32, month: u32 },
    Done,
}

/// Ascending dates on which a rule fires within a window.
///
/// The sequence is lazy, finite, and consumed as it is iterated.
#[derive(Debug, Clone)]
pub struct Occurrences {
    rule: Option<RecurrenceRule>,
    window: DateWindow,
    cursor: Cursor,
}

impl Occurrences {
    /// Creates the occurrence sequence of `rule` over `window`.
    pub fn new(rule: RecurrenceRule, window: DateWindow) -> Self {
        let cursor = match rule {
            RecurrenceRule::Weekly { day } => first_on_or_after(window.start, day)
                .map(Cursor::Day)
                .unwrap_or(Cursor::Done),
            RecurrenceRule::MonthlyOrdinal { .. } | RecurrenceRule::MonthlyLast { .. } => {
                Cursor::Month {
                    year: window.start.year(),
                    month: window.start.month(),
                }
            }
        };
        Self {
            rule: Some(rule),
            window,
            cursor,
        }
    }

    /// An empty sequence.
    pub fn empty(window: DateWindow) -> Self {
        Self {
            rule: None,
            window,
            cursor: Cursor::Done,
        }
    }

    /// Creates the sequence for a parse result.
    ///
    /// An unrecognized rule yields no dates.
    pub fn for_parse(parse: &RuleParse, window: DateWindow) -> Self {
        match parse {
            RuleParse::Recognized(rule) => Self::new(*rule, window),
            RuleParse::Unrecognized(_) => Self::empty(window),
        }
    }

    /// Returns the rule being expanded, if any.
    pub fn rule(&self) -> Option<&RecurrenceRule> {
        self.rule.as_ref()
    }

    fn occurrence_in_month(&self, year: i32, month: u32) -> Option<NaiveDate> {
        match self.rule? {
            RecurrenceRule::MonthlyOrdinal { ordinal, day } => {
                nth_weekday_of_month(year, month, day, ordinal)
            }
            RecurrenceRule::MonthlyLast { day } => last_weekday_of_month(year, month, day),
            RecurrenceRule::Weekly { .. } => None,
        }
    }
}

impl Iterator for Occurrences {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        loop {
            match self.cursor {
                Cursor::Done => return None,
                Cursor::Day(date) => {
                    if date > self.window.end {
                        self.cursor = Cursor::Done;
                        return None;
                    }
                    self.cursor = date
                        .checked_add_days(Days::new(7))
                        .map(Cursor::Day)
                        .unwrap_or(Cursor::Done);
                    return Some(date);
                }
                Cursor::Month { year, month } => {
                    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
                        self.cursor = Cursor::Done;
                        return None;
                    };
                    if first > self.window.end {
                        self.cursor = Cursor::Done;
                        return None;
                    }

                    let (next_year, next_month) = next_month(year, month);
                    self.cursor = Cursor::Month {
                        year: next_year,
                        month: next_month,
                    };

                    if let Some(date) = self.occurrence_in_month(year, month)
                        && self.window.contains(date)
                    {
                        return Some(date);
                    }
                }
            }
        }
    }
}

impl FusedIterator for Occurrences {}

fn first_on_or_after(start: NaiveDate, day: Weekday) -> Option<NaiveDate> {
    let offset = (7 + day.num_days_from_sunday() - start.weekday().num_days_from_sunday()) % 7;
    start.checked_add_days(Days::new(u64::from(offset)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::parse_rule;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn expand(rule: &str, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        Occurrences::for_parse(&parse_rule(rule), DateWindow::new(start, end)).collect()
    }

    mod window {
        use super::*;

        #[test]
        fn expansion_window_is_ninety_days() {
            let window = DateWindow::expansion(date(2024, 1, 1));
            assert_eq!(window.start, date(2024, 1, 1));
            assert_eq!(window.end, date(2024, 3, 31));
            assert_eq!(window.len_days(), 91);
        }

        #[test]
        fn contains_is_inclusive() {
            let window = DateWindow::new(date(2024, 1, 1), date(2024, 1, 15));
            assert!(window.contains(date(2024, 1, 1)));
            assert!(window.contains(date(2024, 1, 15)));
            assert!(!window.contains(date(2023, 12, 31)));
            assert!(!window.contains(date(2024, 1, 16)));
        }

        #[test]
        #[should_panic(expected = "start must be <= end")]
        fn inverted_window_panics() {
            DateWindow::new(date(2024, 1, 2), date(2024, 1, 1));
        }

        #[test]
        fn try_new_reports_inverted_bounds() {
            let err = DateWindow::try_new(date(2024, 1, 2), date(2024, 1, 1)).unwrap_err();
            assert_eq!(err.to_string(), "window start 2024-01-02 is after end 2024-01-01");
            let single = DateWindow::try_new(date(2024, 1, 1), date(2024, 1, 1)).unwrap();
            assert_eq!(single.len_days(), 1);
        }

        #[test]
        fn deserializing_checks_bounds() {
            let window: DateWindow =
                serde_json::from_str(r#"{"start":"2024-01-01","end":"2024-01-15"}"#).unwrap();
            assert_eq!(window, DateWindow::new(date(2024, 1, 1), date(2024, 1, 15)));

            let err = serde_json::from_str::<DateWindow>(r#"{"start":"2024-01-15","end":"2024-01-01"}"#)
                .unwrap_err();
            assert!(err.to_string().contains("is after end"));
        }
    }

    mod weekly {
        use super::*;

        #[test]
        fn tuesdays_in_first_half_of_january() {
            assert_eq!(
                expand("WEEKLY:TUE", date(2024, 1, 1), date(2024, 1, 15)),
                vec![date(2024, 1, 2), date(2024, 1, 9)]
            );
        }

        #[test]
        fn start_day_matches() {
            assert_eq!(
                expand("WEEKLY:MON", date(2024, 1, 1), date(2024, 1, 8)),
                vec![date(2024, 1, 1), date(2024, 1, 8)]
            );
        }

        #[test]
        fn crosses_year_boundary() {
            assert_eq!(
                expand("WEEKLY:SUN", date(2023, 12, 25), date(2024, 1, 8)),
                vec![date(2023, 12, 31), date(2024, 1, 7)]
            );
        }

        #[test]
        fn single_day_window_without_match() {
            assert!(expand("WEEKLY:WED", date(2024, 1, 1), date(2024, 1, 1)).is_empty());
        }
    }

    mod monthly {
        use super::*;

        #[test]
        fn third_wednesday() {
            assert_eq!(
                expand("MONTHLY:3:WED", date(2024, 1, 1), date(2024, 2, 29)),
                vec![date(2024, 1, 17), date(2024, 2, 21)]
            );
        }

        #[test]
        fn missing_fifth_friday_does_not_roll_over() {
            // February 2024 has four Fridays; March 2024 has five.
            assert_eq!(
                expand("MONTHLY:5:FRI", date(2024, 2, 1), date(2024, 3, 31)),
                vec![date(2024, 3, 29)]
            );
            assert!(expand("MONTHLY:5:FRI", date(2024, 2, 1), date(2024, 2, 29)).is_empty());
        }

        #[test]
        fn last_sunday_of_non_leap_february() {
            assert_eq!(
                expand("MONTHLY:LAST:SUN", date(2023, 2, 1), date(2023, 2, 28)),
                vec![date(2023, 2, 26)]
            );
        }

        #[test]
        fn last_thursday_respects_window_start() {
            assert_eq!(
                expand("MONTHLY:LAST:THU", date(2024, 1, 26), date(2024, 2, 29)),
                vec![date(2024, 2, 29)]
            );
        }

        #[test]
        fn ordinal_before_window_start_is_skipped() {
            // 1st Monday of January 2024 is the 1st; window opens on the 2nd.
            assert_eq!(
                expand("MONTHLY:1:MON", date(2024, 1, 2), date(2024, 3, 10)),
                vec![date(2024, 2, 5), date(2024, 3, 4)]
            );
        }

        #[test]
        fn spans_december_into_january() {
            assert_eq!(
                expand("MONTHLY:LAST:FRI", date(2023, 12, 1), date(2024, 1, 31)),
                vec![date(2023, 12, 29), date(2024, 1, 26)]
            );
        }

        #[test]
        fn helpers_match_calendar() {
            assert_eq!(
                nth_weekday_of_month(2024, 2, Weekday::Thu, 5),
                Some(date(2024, 2, 29))
            );
            assert_eq!(nth_weekday_of_month(2023, 2, Weekday::Thu, 5), None);
            assert_eq!(nth_weekday_of_month(2024, 2, Weekday::Thu, 0), None);
            assert_eq!(
                last_weekday_of_month(2024, 12, Weekday::Tue),
                Some(date(2024, 12, 31))
            );
        }
    }

    #[test]
    fn unrecognized_rule_is_empty() {
        assert!(expand("BIWEEKLY:MON", date(2024, 1, 1), date(2024, 12, 31)).is_empty());
        assert!(expand("WEEKLY:XYZ", date(2024, 1, 1), date(2024, 12, 31)).is_empty());
    }

    #[test]
    fn sequence_is_exhausted_after_iteration() {
        let mut occurrences = Occurrences::new(
            RecurrenceRule::Weekly { day: Weekday::Tue },
            DateWindow::new(date(2024, 1, 1), date(2024, 1, 15)),
        );
        assert_eq!(occurrences.by_ref().count(), 2);
        assert_eq!(occurrences.next(), None);
    }
}
