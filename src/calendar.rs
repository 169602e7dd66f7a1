//! Plan-year fiscal calendar
//!
//! The plan accounts on "week-ending" boundaries: a fiscal year ends on the
//! first Saturday on or after December 31, and the next year begins the day
//! after. Age-as-of calculations throughout the engine use these dates.

use chrono::{Datelike, Days, Local, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// First plan year with ledger history
pub const EARLIEST_PLAN_YEAR: i32 = 2000;

/// How far past the current year a plan year may be requested
pub const FUTURE_PLAN_YEAR_WINDOW: i32 = 5;

/// Fiscal begin/end accounting dates for one plan year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYearBounds {
    pub begin: NaiveDate,
    pub end: NaiveDate,
}

/// Resolves plan years to fiscal accounting dates
#[derive(Debug, Clone)]
pub struct PlanCalendar {
    latest_plan_year: i32,
}

impl PlanCalendar {
    /// Calendar accepting plan years up to five years past today
    pub fn new() -> Self {
        Self {
            latest_plan_year: Local::now().date_naive().year() + FUTURE_PLAN_YEAR_WINDOW,
        }
    }

    /// Calendar with a pinned upper bound, for deterministic tests
    pub fn with_latest_year(latest_plan_year: i32) -> Self {
        Self { latest_plan_year }
    }

    /// Fiscal begin/end dates for a plan year.
    ///
    /// `end` is the Saturday-aligned week-ending date on or after
    /// December 31; `begin` is the day after the prior year's end.
    pub fn fiscal_year_bounds(&self, plan_year: i32) -> Result<FiscalYearBounds, EngineError> {
        if plan_year < EARLIEST_PLAN_YEAR || plan_year > self.latest_plan_year {
            return Err(EngineError::PlanYearOutOfRange {
                plan_year,
                min: EARLIEST_PLAN_YEAR,
                max: self.latest_plan_year,
            });
        }

        Ok(FiscalYearBounds {
            begin: week_ending(plan_year - 1) + Days::new(1),
            end: week_ending(plan_year),
        })
    }
}

impl Default for PlanCalendar {
    fn default() -> Self {
        Self::new()
    }
}

/// First Saturday on or after December 31 of `year`
fn week_ending(year: i32) -> NaiveDate {
    let dec31 = NaiveDate::from_ymd_opt(year, 12, 31).expect("December 31 exists in every year");
    let days_to_saturday = (6 - dec31.weekday().num_days_from_sunday()) % 7;
    dec31 + Days::new(u64::from(days_to_saturday))
}
