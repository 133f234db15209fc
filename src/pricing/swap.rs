//! Swap valuation
//!
//! Prices a fixed-for-floating swap from the fixed-rate payer's side:
//! NPV = Σ PV(floating) − Σ PV(fixed). For each period the interpolated curve
//! rate at the payment date sets both the floating payment (a simple forward
//! proxy) and the discount factor, with time measured from the valuation date
//! under the configured day count. Curve lookups are measured from the curve's
//! own as-of date, which need not equal the valuation date.

use chrono::{Months, NaiveDate};

use super::cashflows::{PaymentScheduleEntry, PricingResult};
use super::schedule::ScheduleBuilder;
use crate::config::PricingConventions;
use crate::curve::YieldCurve;
use crate::error::{PricerError, Result};

/// Stateless swap pricer over resolved conventions
#[derive(Debug, Clone, Copy, Default)]
pub struct SwapPricer {
    conventions: PricingConventions,
}

impl SwapPricer {
    pub fn new(conventions: PricingConventions) -> Self {
        Self { conventions }
    }

    pub fn conventions(&self) -> &PricingConventions {
        &self.conventions
    }

    /// Price at `fixed_rate_percent` as of `valuation_date`
    ///
    /// The schedule and discount times run from `valuation_date`; curve
    /// lookups are re-based onto the curve's own as-of date, so a curve
    /// quoted on an earlier or later day can still be used.
    pub fn price(
        &self,
        notional: f64,
        fixed_rate_percent: f64,
        maturity_date: NaiveDate,
        curve: &YieldCurve,
        valuation_date: NaiveDate,
    ) -> Result<PricingResult> {
        let c = &self.conventions;
        validate_notional(notional, c.notional_max)?;
        validate_maturity(valuation_date, maturity_date, c.maturity_max_years)?;
        if !fixed_rate_percent.is_finite() {
            return Err(PricerError::Domain(format!(
                "fixed rate {} is not a finite number",
                fixed_rate_percent
            )));
        }

        let builder = ScheduleBuilder::new(c.frequency, c.day_count);
        let fixed_rate = fixed_rate_percent / 100.0;

        let schedule = builder
            .build(valuation_date, maturity_date)?
            .into_iter()
            .map(|period| {
                let target_days = (period.payment_date - curve.valuation_date()).num_days();
                let market_rate = c.interpolator.rate_at(curve, target_days)?;
                let t = c.day_count.year_fraction(valuation_date, period.payment_date);
                let discount_factor = c.discount.checked_discount_factor(market_rate, t)?;

                let fixed_payment = notional * fixed_rate * period.accrual_fraction;
                let floating_payment = notional * market_rate * period.accrual_fraction;

                Ok(PaymentScheduleEntry {
                    payment_date: period.payment_date,
                    day_count_days: period.day_count_days,
                    accrual_fraction: period.accrual_fraction,
                    market_rate_percent: market_rate * 100.0,
                    fixed_payment,
                    floating_payment,
                    discount_factor,
                    pv_fixed: fixed_payment * discount_factor,
                    pv_floating: floating_payment * discount_factor,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(PricingResult::from_schedule(
            fixed_rate_percent,
            valuation_date,
            maturity_date,
            schedule,
        ))
    }
}

pub(crate) fn validate_notional(notional: f64, notional_max: f64) -> Result<()> {
    if !notional.is_finite() || notional <= 0.0 {
        return Err(PricerError::Domain(format!(
            "notional {} must be a positive number",
            notional
        )));
    }
    if notional > notional_max {
        return Err(PricerError::Domain(format!(
            "notional {} exceeds the maximum of {}",
            notional, notional_max
        )));
    }
    Ok(())
}

pub(crate) fn validate_maturity(
    valuation_date: NaiveDate,
    maturity_date: NaiveDate,
    maturity_max_years: u32,
) -> Result<()> {
    if maturity_date <= valuation_date {
        return Err(PricerError::Domain(format!(
            "maturity {} must be after the valuation date {}",
            maturity_date, valuation_date
        )));
    }
    let limit =
        valuation_date.checked_add_months(Months::new(maturity_max_years.saturating_mul(12)));
    if limit.map_or(false, |limit| maturity_date > limit) {
        return Err(PricerError::Domain(format!(
            "maturity {} is more than {} years after the valuation date {}",
            maturity_date, maturity_max_years, valuation_date
        )));
    }
    Ok(())
}
