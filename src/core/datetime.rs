//! Date parsing and plan-day arithmetic.
//!
//! Plans start on a given date and run in day-numbered cycles: day 1 is the
//! start date, and a plan with a 7-day cycle repeats its day 1 on day 8.

use chrono::{Duration, Local, NaiveDate};

use crate::error::SyncError;

/// Today's date in the local timezone.
#[must_use]
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse the date a completion applies to.
///
/// Supports:
/// - `2026-01-27` (ISO format)
/// - `today`, `yesterday`, `tomorrow`
/// - `+N` / `-N` day offsets from `today`
///
/// # Errors
///
/// Returns `SyncError::Parse` if the input matches none of these.
pub fn parse_completed_date(input: &str, today: NaiveDate) -> Result<NaiveDate, SyncError> {
    let input = input.trim().to_lowercase();

    match input.as_str() {
        "today" => return Ok(today),
        "yesterday" => return offset_from(today, -1, &input),
        "tomorrow" => return offset_from(today, 1, &input),
        _ => {}
    }

    if let Some(rest) = input.strip_prefix('+').or_else(|| input.strip_prefix('-')) {
        let days: i64 = rest
            .parse()
            .map_err(|_| SyncError::Parse(format!("Invalid day offset: {input}")))?;
        let offset = if input.starts_with('-') { -days } else { days };
        return offset_from(today, offset, &input);
    }

    NaiveDate::parse_from_str(&input, "%Y-%m-%d")
        .map_err(|_| SyncError::Parse(format!("Invalid date (expected YYYY-MM-DD): {input}")))
}

fn offset_from(today: NaiveDate, days: i64, input: &str) -> Result<NaiveDate, SyncError> {
    Duration::try_days(days)
        .and_then(|delta| today.checked_add_signed(delta))
        .ok_or_else(|| SyncError::Parse(format!("Day offset out of range: {input}")))
}

/// 1-based day number of `date` within a plan starting on `start`.
///
/// Returns `None` for dates before the start.
#[must_use]
pub fn plan_day_number(start: NaiveDate, date: NaiveDate) -> Option<u32> {
    let elapsed = date.signed_duration_since(start).num_days();
    u32::try_from(elapsed).ok().map(|d| d + 1)
}

/// Position of `day_number` within a repeating cycle, in `1..=cycle_length`.
///
/// A `cycle_length` of 0 means the plan does not repeat.
#[must_use]
pub const fn cycle_day(day_number: u32, cycle_length: u32) -> u32 {
    if cycle_length == 0 || day_number == 0 {
        return day_number;
    }
    (day_number - 1) % cycle_length + 1
}

/// Calendar date of `day_number` in a plan starting on `start`.
///
/// Returns `None` for day 0 or dates out of range.
#[must_use]
pub fn date_for_plan_day(start: NaiveDate, day_number: u32) -> Option<NaiveDate> {
    let offset = day_number.checked_sub(1)?;
    start.checked_add_signed(Duration::try_days(i64::from(offset))?)
}
