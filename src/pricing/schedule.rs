//! Payment schedule construction
//!
//! Frequencies that divide 12 step in whole calendar months from the
//! valuation date; any other frequency steps `365 / frequency` days. The
//! k-th date is always computed from the valuation date (never chained from
//! the previous date) so month-end clamping and day rounding do not drift.
//! The final date is pinned to the maturity date.

use chrono::{Duration, Months, NaiveDate};
use serde::Serialize;
use std::fmt;

use crate::conventions::DayCount;
use crate::error::{PricerError, Result};

/// Payments per year, validated to 1..=365
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frequency(u32);

impl Frequency {
    pub const SEMI_ANNUAL: Frequency = Frequency(2);

    pub fn new(per_year: u32) -> Result<Self> {
        if (1..=365).contains(&per_year) {
            Ok(Self(per_year))
        } else {
            Err(PricerError::configuration(
                "fixed_frequency",
                per_year.to_string(),
                "1..=365 payments per year (1, 2, 3, 4, 6, 12 step in calendar months)",
            ))
        }
    }

    pub fn per_year(self) -> u32 {
        self.0
    }

    /// Months per period, when the frequency divides a year evenly into months
    pub fn months(self) -> Option<u32> {
        (12 % self.0 == 0).then(|| 12 / self.0)
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Self::SEMI_ANNUAL
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/yr", self.0)
    }
}

/// One accrual period ending on a payment date
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SchedulePeriod {
    pub accrual_start: NaiveDate,
    pub payment_date: NaiveDate,
    /// Actual calendar days in the period
    pub day_count_days: i64,
    pub accrual_fraction: f64,
}

/// Builds payment schedules for one frequency and day count
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleBuilder {
    frequency: Frequency,
    day_count: DayCount,
}

impl ScheduleBuilder {
    pub fn new(frequency: Frequency, day_count: DayCount) -> Self {
        Self {
            frequency,
            day_count,
        }
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn day_count(&self) -> DayCount {
        self.day_count
    }

    /// Ordered periods from `valuation_date` to `maturity_date` inclusive
    pub fn build(
        &self,
        valuation_date: NaiveDate,
        maturity_date: NaiveDate,
    ) -> Result<Vec<SchedulePeriod>> {
        if maturity_date <= valuation_date {
            return Err(PricerError::Domain(format!(
                "maturity {} must be after the valuation date {}",
                maturity_date, valuation_date
            )));
        }

        let mut periods = Vec::new();
        let mut start = valuation_date;

        for k in 1u32.. {
            let date = self.nth_date(valuation_date, k).ok_or_else(|| {
                PricerError::Domain(format!(
                    "payment date {} periods after {} is out of range",
                    k, valuation_date
                ))
            })?;
            let end = date.min(maturity_date);

            periods.push(SchedulePeriod {
                accrual_start: start,
                payment_date: end,
                day_count_days: (end - start).num_days(),
                accrual_fraction: self.day_count.year_fraction(start, end),
            });

            if end == maturity_date {
                break;
            }
            start = end;
        }

        Ok(periods)
    }

    fn nth_date(&self, valuation_date: NaiveDate, k: u32) -> Option<NaiveDate> {
        match self.frequency.months() {
            Some(step) => valuation_date.checked_add_months(Months::new(step.checked_mul(k)?)),
            None => {
                let days = u64::from(k) * 365 / u64::from(self.frequency.per_year());
                let delta = Duration::try_days(i64::try_from(days).ok()?)?;
                valuation_date.checked_add_signed(delta)
            }
        }
    }
}
