use chrono::{Datelike, NaiveDate, Weekday};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::models::capacity::Period;

/// Fixed workday length shared by the calculator and its callers.
pub const HOURS_PER_WORKDAY: f64 = 7.0;

/// Hours a story point converts to when no explicit estimate exists.
pub const HOURS_PER_STORY_POINT: f64 = 4.0;

pub fn ensure_period(period: &Period) -> AppResult<()> {
    if period.end < period.start {
        return Err(AppError::validation_with_details(
            "周期结束日期必须不早于开始日期",
            json!({"start": period.start.to_string(), "end": period.end.to_string()}),
        ));
    }
    Ok(())
}

pub fn days_to_hours(days: f64) -> f64 {
    days * HOURS_PER_WORKDAY
}

/// Monday of the ISO week containing `date`, used as the weekly
/// distribution key.
pub fn iso_week_start(date: NaiveDate) -> NaiveDate {
    let week = date.iso_week();
    NaiveDate::from_isoywd_opt(week.year(), week.week(), Weekday::Mon)
        .unwrap_or(date)
}

pub fn iso_week_key(date: NaiveDate) -> String {
    iso_week_start(date).format("%Y-%m-%d").to_string()
}
