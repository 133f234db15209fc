//! Discounting strategies
//!
//! Supports:
//! - Continuous compounding (`exp_cont`): DF = e^(-r t)
//! - Simple interest (`simple`): DF = 1 / (1 + r t)
//! - Periodic compounding (`comp_n`, n in {1, 2, 4, 12}): DF = (1 + r/n)^(-n t)
//!
//! Rates are decimals and times are year fractions. The strategy is resolved
//! to a pair of function pointers once, so pricing never re-dispatches on names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PricerError;

/// Names accepted by [`DiscountStrategy::from_str`]
pub const DISCOUNTING_NAMES: &str = "exp_cont, simple, comp_1, comp_2, comp_4, comp_12";

/// (rate, time_years) -> discount factor
pub type DiscountFn = fn(f64, f64) -> f64;

/// (discount factor, time_years) -> rate, the inverse of a [`DiscountFn`]
pub type ImpliedRateFn = fn(f64, f64) -> f64;

/// How a rate and a time are turned into a discount factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DiscountStrategy {
    #[default]
    Continuous,
    Simple,
    Annual,
    SemiAnnual,
    Quarterly,
    Monthly,
}

impl DiscountStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            DiscountStrategy::Continuous => "exp_cont",
            DiscountStrategy::Simple => "simple",
            DiscountStrategy::Annual => "comp_1",
            DiscountStrategy::SemiAnnual => "comp_2",
            DiscountStrategy::Quarterly => "comp_4",
            DiscountStrategy::Monthly => "comp_12",
        }
    }

    /// Resolve the strategy into its discount function and its inverse
    pub fn build(self) -> DiscountEngine {
        let (discount, implied): (DiscountFn, ImpliedRateFn) = match self {
            DiscountStrategy::Continuous => (continuous_df, continuous_rate),
            DiscountStrategy::Simple => (simple_df, simple_rate),
            DiscountStrategy::Annual => (compounded_df::<1>, compounded_rate::<1>),
            DiscountStrategy::SemiAnnual => (compounded_df::<2>, compounded_rate::<2>),
            DiscountStrategy::Quarterly => (compounded_df::<4>, compounded_rate::<4>),
            DiscountStrategy::Monthly => (compounded_df::<12>, compounded_rate::<12>),
        };
        DiscountEngine {
            strategy: self,
            discount,
            implied,
        }
    }
}

impl FromStr for DiscountStrategy {
    type Err = PricerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exp_cont" => Ok(DiscountStrategy::Continuous),
            "simple" => Ok(DiscountStrategy::Simple),
            "comp_1" => Ok(DiscountStrategy::Annual),
            "comp_2" => Ok(DiscountStrategy::SemiAnnual),
            "comp_4" => Ok(DiscountStrategy::Quarterly),
            "comp_12" => Ok(DiscountStrategy::Monthly),
            _ => Err(PricerError::configuration(
                "discounting_strategy",
                s,
                DISCOUNTING_NAMES,
            )),
        }
    }
}

impl fmt::Display for DiscountStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Discount function resolved from a [`DiscountStrategy`]
#[derive(Clone, Copy)]
pub struct DiscountEngine {
    strategy: DiscountStrategy,
    discount: DiscountFn,
    implied: ImpliedRateFn,
}

impl DiscountEngine {
    pub fn strategy(&self) -> DiscountStrategy {
        self.strategy
    }

    /// Discount factor for a decimal rate over `time_years`
    #[inline]
    pub fn discount_factor(&self, rate: f64, time_years: f64) -> f64 {
        (self.discount)(rate, time_years)
    }

    /// Discount factor that must be finite and positive
    ///
    /// Simple discounting breaks down once `1 + r t <= 0`, which negative
    /// rates over long horizons can reach.
    pub fn checked_discount_factor(&self, rate: f64, time_years: f64) -> Result<f64, PricerError> {
        let df = self.discount_factor(rate, time_years);
        if df.is_finite() && df > 0.0 {
            Ok(df)
        } else {
            Err(PricerError::Domain(format!(
                "{} discounting of {:.4}% over {:.4} years gives discount factor {}",
                self.strategy,
                rate * 100.0,
                time_years,
                df
            )))
        }
    }

    /// Rate that reproduces `discount_factor` over `time_years` under this strategy
    #[inline]
    pub fn implied_rate(&self, discount_factor: f64, time_years: f64) -> f64 {
        (self.implied)(discount_factor, time_years)
    }
}

impl fmt::Debug for DiscountEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscountEngine")
            .field("strategy", &self.strategy)
            .finish()
    }
}

impl Default for DiscountEngine {
    fn default() -> Self {
        DiscountStrategy::default().build()
    }
}

fn continuous_df(rate: f64, t: f64) -> f64 {
    (-rate * t).exp()
}

fn continuous_rate(df: f64, t: f64) -> f64 {
    -df.ln() / t
}

fn simple_df(rate: f64, t: f64) -> f64 {
    1.0 / (1.0 + rate * t)
}

fn simple_rate(df: f64, t: f64) -> f64 {
    (1.0 / df - 1.0) / t
}

fn compounded_df<const N: u32>(rate: f64, t: f64) -> f64 {
    let n = N as f64;
    (1.0 + rate / n).powf(-n * t)
}

fn compounded_rate<const N: u32>(df: f64, t: f64) -> f64 {
    let n = N as f64;
    n * (df.powf(-1.0 / (n * t)) - 1.0)
}
