//! Per-period cashflows and pricing results

use chrono::NaiveDate;
use serde::Serialize;

/// One row of a swap's payment schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaymentScheduleEntry {
    pub payment_date: NaiveDate,
    pub day_count_days: i64,
    pub accrual_fraction: f64,
    /// Interpolated curve rate at the payment date (percent)
    pub market_rate_percent: f64,
    pub fixed_payment: f64,
    pub floating_payment: f64,
    pub discount_factor: f64,
    pub pv_fixed: f64,
    pub pv_floating: f64,
}

impl PaymentScheduleEntry {
    /// Floating minus fixed PV for this period
    pub fn net_pv(&self) -> f64 {
        self.pv_floating - self.pv_fixed
    }
}

/// Result of pricing a swap at a given fixed rate
///
/// NPV is from the fixed-rate payer's side: floating leg PV minus fixed leg PV.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingResult {
    pub npv: f64,
    pub fixed_rate_percent: f64,
    pub valuation_date: NaiveDate,
    pub maturity_date: NaiveDate,
    pub schedule: Vec<PaymentScheduleEntry>,
}

impl PricingResult {
    pub(crate) fn from_schedule(
        fixed_rate_percent: f64,
        valuation_date: NaiveDate,
        maturity_date: NaiveDate,
        schedule: Vec<PaymentScheduleEntry>,
    ) -> Self {
        let npv = schedule.iter().map(PaymentScheduleEntry::net_pv).sum();
        Self {
            npv,
            fixed_rate_percent,
            valuation_date,
            maturity_date,
            schedule,
        }
    }

    pub fn fixed_leg_pv(&self) -> f64 {
        self.schedule.iter().map(|e| e.pv_fixed).sum()
    }

    pub fn floating_leg_pv(&self) -> f64 {
        self.schedule.iter().map(|e| e.pv_floating).sum()
    }

    /// Σ accrual × DF; the fixed leg PV per unit notional per unit rate
    pub fn annuity(&self) -> f64 {
        self.schedule
            .iter()
            .map(|e| e.accrual_fraction * e.discount_factor)
            .sum()
    }

    pub fn period_count(&self) -> usize {
        self.schedule.len()
    }
}

/// Par rate and the at-par valuation it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveResult {
    pub par_rate_percent: f64,
    /// Pricing evaluations used
    pub iterations: u32,
    pub at_par: PricingResult,
}
