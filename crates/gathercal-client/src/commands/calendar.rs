//! Calendar rendering against the configured store.

use std::sync::Arc;

use chrono::NaiveDate;

use gathercal_core::DayBucket;
use gathercal_server::CalendarService;
use gathercal_store::EventStore;

use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::render;

/// Which days to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarView {
    /// From a date through the configured number of days ahead.
    Upcoming(NaiveDate),
    /// One ISO week, e.g. `2024-W09`.
    Week(String),
}

/// Builds the calendar for `view`.
pub async fn build(
    store: Arc<dyn EventStore>,
    config: &ClientConfig,
    view: &CalendarView,
) -> ClientResult<Vec<DayBucket>> {
    let service = CalendarService::new(store, config.to_server_config().calendar);
    let days = match view {
        CalendarView::Upcoming(today) => service.upcoming(*today).await?,
        CalendarView::Week(week_id) => service.week(week_id).await?,
    };
    Ok(days)
}

/// Prints the calendar as text or JSON.
pub async fn run(
    config: &ClientConfig,
    today: Option<NaiveDate>,
    week: Option<String>,
    json: bool,
) -> ClientResult<()> {
    let view = match week {
        Some(week_id) => CalendarView::Week(week_id),
        None => CalendarView::Upcoming(super::today_or_now(today)),
    };
    let store = super::as_dyn(super::open_store(config).await?);
    let days = build(store, config, &view).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&days)?);
    } else {
        print!("{}", render::calendar_text(&days));
    }
    Ok(())
}
