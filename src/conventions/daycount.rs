//! Day count conventions
//!
//! Simplified conventions with no calendar or coupon-schedule awareness:
//! - **ACT/365F**: actual days / 365
//! - **ACT/360**: actual days / 360
//! - **30/360**: US-style with any February date treated as day 30
//! - **ACT/ACT**: actual days prorated by the length of each calendar year spanned
//! - **ACT/365L**: actual days / 366 if the span includes a Feb 29, else / 365
//! - **ACT/365.25**: actual days / 365.25

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PricerError;

/// Names accepted by [`DayCount::from_str`]
pub const DAY_COUNT_NAMES: &str =
    "ACT/365F, ACT/365, ACT/360, 30/360, ACT/ACT, ACT/ACT(ISDA), ACT/365L, ACT/365.25";

/// Rule converting a date span into a year fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DayCount {
    #[default]
    Act365Fixed,
    Act360,
    Thirty360,
    ActActApprox,
    Act365Leap,
    Act36525,
}

impl DayCount {
    /// Year fraction between two dates
    pub fn year_fraction(&self, start: NaiveDate, end: NaiveDate) -> f64 {
        let days = (end - start).num_days() as f64;
        match self {
            DayCount::Act365Fixed => days / 365.0,
            DayCount::Act360 => days / 360.0,
            DayCount::Act36525 => days / 365.25,
            DayCount::Thirty360 => thirty_360(start, end),
            DayCount::ActActApprox => act_act_approx(start, end),
            DayCount::Act365Leap => {
                if end <= start {
                    return 0.0;
                }
                if spans_feb29(start, end) {
                    days / 366.0
                } else {
                    days / 365.0
                }
            }
        }
    }

    /// Canonical name of the convention
    pub fn name(&self) -> &'static str {
        match self {
            DayCount::Act365Fixed => "ACT/365F",
            DayCount::Act360 => "ACT/360",
            DayCount::Thirty360 => "30/360",
            DayCount::ActActApprox => "ACT/ACT",
            DayCount::Act365Leap => "ACT/365L",
            DayCount::Act36525 => "ACT/365.25",
        }
    }
}

impl FromStr for DayCount {
    type Err = PricerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACT/365F" | "ACT/365" => Ok(DayCount::Act365Fixed),
            "ACT/360" => Ok(DayCount::Act360),
            "30/360" => Ok(DayCount::Thirty360),
            "ACT/ACT" | "ACT/ACT(ISDA)" => Ok(DayCount::ActActApprox),
            "ACT/365L" => Ok(DayCount::Act365Leap),
            "ACT/365.25" => Ok(DayCount::Act36525),
            _ => Err(PricerError::configuration("day_count", s, DAY_COUNT_NAMES)),
        }
    }
}

impl fmt::Display for DayCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

fn days_in_year(year: i32) -> f64 {
    if is_leap_year(year) {
        366.0
    } else {
        365.0
    }
}

fn thirty_360(start: NaiveDate, end: NaiveDate) -> f64 {
    let mut d1 = start.day().min(30) as i64;
    let mut d2 = end.day().min(30) as i64;
    if start.month() == 2 {
        d1 = 30;
    }
    if end.month() == 2 {
        d2 = 30;
    }
    let years = (end.year() - start.year()) as i64;
    let months = end.month() as i64 - start.month() as i64;
    (years * 360 + months * 30 + (d2 - d1)) as f64 / 360.0
}

fn act_act_approx(start: NaiveDate, end: NaiveDate) -> f64 {
    if end <= start {
        return 0.0;
    }
    let mut total = 0.0;
    let mut current = start;
    while current < end {
        let next_year_start = NaiveDate::from_ymd_opt(current.year() + 1, 1, 1).unwrap_or(end);
        let segment_end = end.min(next_year_start);
        let days = (segment_end - current).num_days() as f64;
        total += days / days_in_year(current.year());
        current = segment_end;
    }
    total
}

fn spans_feb29(start: NaiveDate, end: NaiveDate) -> bool {
    (start.year()..=end.year())
        .filter(|&y| is_leap_year(y))
        .filter_map(|y| NaiveDate::from_ymd_opt(y, 2, 29))
        .any(|feb29| start <= feb29 && feb29 <= end)
}
