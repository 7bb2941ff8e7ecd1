//! Terminal rendering of calendars and occurrence lists.

use std::fmt::Write;

use chrono::NaiveDate;

use gathercal_core::{DayBucket, EventCopy};

/// Renders day buckets as plain text, one block per day.
pub fn calendar_text(days: &[DayBucket]) -> String {
    if days.is_empty() {
        return "No events\n".to_string();
    }

    let mut out = String::new();
    for (index, day) in days.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let weekday = day.date.format("%a");
        match &day.week_url {
            Some(url) => {
                let _ = writeln!(out, "{weekday} {}  {url}", day.short_date);
            }
            None => {
                let _ = writeln!(out, "{weekday} {}", day.short_date);
            }
        }
        for slot in &day.time_slots {
            for copy in &slot.events {
                let _ = writeln!(out, "  {:>8}  {}", copy.formatted_time, event_line(copy));
            }
        }
    }
    out
}

fn event_line(copy: &EventCopy) -> String {
    let record = &copy.event.event;
    let mut line = copy.display_title.clone();

    match (record.city.as_deref(), record.state.as_deref()) {
        (Some(city), Some(state)) => {
            let _ = write!(line, " @ {city}, {state}");
        }
        (Some(place), None) | (None, Some(place)) => {
            let _ = write!(line, " @ {place}");
        }
        (None, None) => {}
    }

    let mut sources: Vec<&str> = Vec::new();
    if let Some(name) = record.group_name.as_deref().or(record.source()) {
        sources.push(name);
    }
    sources.extend(copy.event.also_published_by.iter().map(|r| r.source.as_str()));
    if !sources.is_empty() {
        let _ = write!(line, " [{}]", sources.join(", "));
    }
    line
}

/// Renders one ISO date per line.
pub fn dates_text(dates: &[NaiveDate]) -> String {
    dates.iter().map(|date| format!("{date}\n")).collect()
}
