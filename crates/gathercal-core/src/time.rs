//! Date and time-of-day helpers for calendar display.
//!
//! Event times are stored as free text (`"18:30"`, `"9:00"`), and dates as
//! ISO `YYYY-MM-DD`. These helpers parse the former and render both for
//! display, and convert between dates and ISO week identifiers
//! (`2024-W09`).

use chrono::{Datelike, NaiveDate, Weekday};

use crate::occurrence::DateWindow;

/// Time label for events without a usable time of day.
pub const TBD: &str = "TBD";

/// Parses an `H:MM` or `HH:MM` time of day, with optional `:SS`.
///
/// Returns `(hour, minute)` for 24-hour times, `None` otherwise.
pub fn parse_time_of_day(text: &str) -> Option<(u32, u32)> {
    let mut parts = text.trim().split(':');
    let hour = parts.next()?;
    let minute = parts.next()?;
    if let Some(seconds) = parts.next()
        && !is_two_digits(seconds)
    {
        return None;
    }
    if parts.next().is_some() {
        return None;
    }

    if hour.is_empty() || hour.len() > 2 || !hour.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !is_two_digits(minute) {
        return None;
    }

    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    (hour < 24 && minute < 60).then_some((hour, minute))
}

fn is_two_digits(s: &str) -> bool {
    s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit())
}

/// Formats a 24-hour time as `h:mm am|pm`.
pub fn format_time(hour: u32, minute: u32) -> String {
    let meridiem = if hour >= 12 { "pm" } else { "am" };
    let display_hour = match hour {
        0 => 12,
        h if h > 12 => h - 12,
        h => h,
    };
    format!("{display_hour}:{minute:02} {meridiem}")
}

/// Formats a date as a short label such as `Mar 1`.
pub fn short_date(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

/// Returns the ISO week identifier of a date, e.g. `2024-W09`.
pub fn iso_week_id(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// Parses an ISO week identifier into its Monday..Sunday window.
///
/// Returns `None` if the identifier is malformed or the week does not exist
/// in that ISO year.
pub fn parse_week_id(week_id: &str) -> Option<DateWindow> {
    let (year, week) = week_id.split_once("-W")?;
    let year: i32 = year.parse().ok()?;
    let week: u32 = week.parse().ok()?;
    let monday = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)?;
    let sunday = NaiveDate::from_isoywd_opt(year, week, Weekday::Sun)?;
    Some(DateWindow::new(monday, sunday))
}

/// Returns the week page anchor for a day, e.g. `/week/2024-W09/#2024-03-01`.
pub fn week_url(date: NaiveDate) -> String {
    format!("/week/{}/#{}", iso_week_id(date), date.format("%Y-%m-%d"))
}
