//! Core utilities shared across modules.

mod datetime;

pub use datetime::{cycle_day, date_for_plan_day, parse_completed_date, plan_day_number, today};
