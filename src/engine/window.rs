//! Canonical reporting windows for a (month, year) pair.
//!
//! Nominal hours are derived from real calendar day counts (leap-year
//! correct), never from a fixed 30-day or 365-day constant.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::error::EngineError;

/// Accepted year range; anything outside is a data-entry mistake.
const MIN_YEAR: i32 = 1970;
const MAX_YEAR: i32 = 2999;

/// Month window, year-to-date window, and nominal hours per unit for each.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportWindow {
    pub month: u32,
    pub year: i32,
    /// First instant of the month.
    pub month_start: DateTime<Utc>,
    /// Last instant of the last calendar day of the month.
    pub month_end: DateTime<Utc>,
    /// January 1 of the report year.
    pub year_start: DateTime<Utc>,
    /// December 31 of the report year, last instant.
    pub year_end: DateTime<Utc>,
    /// Calendar days in the month × 24.
    pub nominal_hours_month: f64,
    /// Elapsed days from January 1 through the month end × 24.
    pub nominal_hours_year: f64,
}

impl ReportWindow {
    /// Resolve the canonical windows for a reporting period.
    pub fn resolve(month: u32, year: i32) -> Result<Self, EngineError> {
        if !(1..=12).contains(&month) {
            return Err(EngineError::InvalidPeriod(format!(
                "month must be 1-12, got {month}"
            )));
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(EngineError::InvalidPeriod(format!(
                "year must be {MIN_YEAR}-{MAX_YEAR}, got {year}"
            )));
        }

        let first_of_month = date(year, month, 1)?;
        let first_of_next = if month == 12 {
            date(year + 1, 1, 1)?
        } else {
            date(year, month + 1, 1)?
        };
        let jan_first = date(year, 1, 1)?;
        let next_jan_first = date(year + 1, 1, 1)?;

        let days_in_month = (first_of_next - first_of_month).num_days();
        let elapsed_days_in_year = (first_of_next - jan_first).num_days();

        Ok(Self {
            month,
            year,
            month_start: start_of_day(first_of_month),
            month_end: start_of_day(first_of_next) - Duration::seconds(1),
            year_start: start_of_day(jan_first),
            year_end: start_of_day(next_jan_first) - Duration::seconds(1),
            nominal_hours_month: days_in_month as f64 * 24.0,
            nominal_hours_year: elapsed_days_in_year as f64 * 24.0,
        })
    }
}

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate, EngineError> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        EngineError::InvalidPeriod(format!("no such calendar date: {year}-{month:02}-{day:02}"))
    })
}

fn start_of_day(d: NaiveDate) -> DateTime<Utc> {
    d.and_time(NaiveTime::MIN).and_utc()
}
