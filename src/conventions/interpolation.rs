//! Curve interpolation and extrapolation policy
//!
//! Targets are expressed in whole days after the curve's valuation date, the
//! same unit the curve nodes are stored in, so no fractional-year drift creeps
//! into node lookups.
//!
//! - `linear_zero`: piecewise-linear on quoted rates
//! - `log_linear_df`: nodes converted to discount factors with the active
//!   [`DiscountEngine`], piecewise-linear on ln(DF) against time, converted
//!   back to a rate with the same engine (so node rates are reproduced exactly)
//!
//! The extrapolation policy is applied before either strategy runs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::discount::DiscountEngine;
use crate::curve::{YieldCurve, DAYS_PER_YEAR};
use crate::error::{PricerError, Result};

pub const INTERP_NAMES: &str = "linear_zero, log_linear_df";
pub const EXTRAPOLATION_NAMES: &str = "clamp, error";

/// Interpolation strategy between curve nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum InterpStrategy {
    #[default]
    LinearZero,
    LogLinearDf,
}

impl InterpStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            InterpStrategy::LinearZero => "linear_zero",
            InterpStrategy::LogLinearDf => "log_linear_df",
        }
    }
}

impl FromStr for InterpStrategy {
    type Err = PricerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear_zero" => Ok(InterpStrategy::LinearZero),
            "log_linear_df" => Ok(InterpStrategy::LogLinearDf),
            _ => Err(PricerError::configuration("interp_strategy", s, INTERP_NAMES)),
        }
    }
}

impl fmt::Display for InterpStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Behaviour for targets outside the quoted maturity range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ExtrapolationPolicy {
    /// Use the nearest endpoint's value
    #[default]
    Clamp,
    /// Reject with a domain error
    Error,
}

impl ExtrapolationPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            ExtrapolationPolicy::Clamp => "clamp",
            ExtrapolationPolicy::Error => "error",
        }
    }
}

impl FromStr for ExtrapolationPolicy {
    type Err = PricerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clamp" => Ok(ExtrapolationPolicy::Clamp),
            "error" => Ok(ExtrapolationPolicy::Error),
            _ => Err(PricerError::configuration(
                "extrapolation_policy",
                s,
                EXTRAPOLATION_NAMES,
            )),
        }
    }
}

impl fmt::Display for ExtrapolationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Market-rate lookup on a [`YieldCurve`]
#[derive(Debug, Clone, Copy)]
pub struct Interpolator {
    strategy: InterpStrategy,
    policy: ExtrapolationPolicy,
    discount: DiscountEngine,
}

impl Interpolator {
    pub fn new(
        strategy: InterpStrategy,
        policy: ExtrapolationPolicy,
        discount: DiscountEngine,
    ) -> Self {
        Self {
            strategy,
            policy,
            discount,
        }
    }

    pub fn strategy(&self) -> InterpStrategy {
        self.strategy
    }

    pub fn policy(&self) -> ExtrapolationPolicy {
        self.policy
    }

    /// Interpolated rate (decimal) at `target_days` after the curve's valuation date
    pub fn rate_at(&self, curve: &YieldCurve, target_days: i64) -> Result<f64> {
        let days = self.bounded_target(curve, target_days)?;
        let nodes = curve.node_days();

        // Index of the first node at or beyond the target
        let hi = nodes.partition_point(|&d| d < days);
        if nodes[hi] == days {
            return Ok(curve.rate(hi));
        }
        let lo = hi - 1;

        match self.strategy {
            InterpStrategy::LinearZero => {
                let w = (days - nodes[lo]) as f64 / (nodes[hi] - nodes[lo]) as f64;
                Ok(curve.rate(lo) + w * (curve.rate(hi) - curve.rate(lo)))
            }
            InterpStrategy::LogLinearDf => {
                let t_lo = nodes[lo] as f64 / DAYS_PER_YEAR;
                let t_hi = nodes[hi] as f64 / DAYS_PER_YEAR;
                let t = days as f64 / DAYS_PER_YEAR;

                let ln_lo = self.node_discount_factor(curve, lo)?.ln();
                let ln_hi = self.node_discount_factor(curve, hi)?.ln();
                let w = (t - t_lo) / (t_hi - t_lo);
                let df = (ln_lo + w * (ln_hi - ln_lo)).exp();

                Ok(self.discount.implied_rate(df, t))
            }
        }
    }

    fn node_discount_factor(&self, curve: &YieldCurve, i: usize) -> Result<f64> {
        let t = curve.node_days()[i] as f64 / DAYS_PER_YEAR;
        if t <= 0.0 {
            Ok(1.0)
        } else {
            self.discount.checked_discount_factor(curve.rate(i), t)
        }
    }

    /// Apply the extrapolation policy; returns a target inside the node range
    fn bounded_target(&self, curve: &YieldCurve, target_days: i64) -> Result<i64> {
        let nodes = curve.node_days();
        let first = nodes[0];
        let last = nodes[nodes.len() - 1];

        if target_days >= first && target_days <= last {
            return Ok(target_days);
        }

        match self.policy {
            ExtrapolationPolicy::Clamp => Ok(target_days.clamp(first, last)),
            ExtrapolationPolicy::Error => Err(PricerError::Domain(format!(
                "maturity {:.4}y ({} days) is outside the curve range [{}y, {}y] \
                 and extrapolation is disabled",
                target_days as f64 / DAYS_PER_YEAR,
                target_days,
                curve.first_maturity_years(),
                curve.last_maturity_years()
            ))),
        }
    }
}

impl Default for Interpolator {
    fn default() -> Self {
        Self::new(
            InterpStrategy::default(),
            ExtrapolationPolicy::default(),
            DiscountEngine::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conventions::DiscountStrategy;
    use crate::curve::{CurveLimits, CurvePoint};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    const LOG_LINEAR: InterpStrategy = InterpStrategy::LogLinearDf;

    fn curve(rows: &[(f64, f64)]) -> YieldCurve {
        YieldCurve::new(
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            rows.iter().copied().map(CurvePoint::from).collect(),
            &CurveLimits::default(),
        )
        .unwrap()
    }

    fn interp(strategy: InterpStrategy, policy: ExtrapolationPolicy) -> Interpolator {
        Interpolator::new(strategy, policy, DiscountStrategy::Continuous.build())
    }

    #[test]
    fn test_linear_midpoint() {
        let c = curve(&[(1.0, 3.0), (5.0, 4.0), (10.0, 4.5)]);
        let i = interp(InterpStrategy::LinearZero, ExtrapolationPolicy::Clamp);
        assert_relative_eq!(i.rate_at(&c, 365 * 3).unwrap(), 0.035, epsilon = 1e-12);
        assert_relative_eq!(i.rate_at(&c, 1825).unwrap(), 0.04, epsilon = 1e-15);
    }

    #[test]
    fn test_clamp_beyond_ends() {
        let c = curve(&[(1.0, 3.0), (5.0, 4.0), (10.0, 4.5)]);
        for strategy in [InterpStrategy::LinearZero, InterpStrategy::LogLinearDf] {
            let i = interp(strategy, ExtrapolationPolicy::Clamp);
            assert_relative_eq!(i.rate_at(&c, 365 * 30).unwrap(), 0.045, epsilon = 1e-12);
            assert_relative_eq!(i.rate_at(&c, 30).unwrap(), 0.03, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_error_policy_beyond_ends() {
        let c = curve(&[(1.0, 3.0), (5.0, 4.0), (10.0, 4.5)]);
        for strategy in [InterpStrategy::LinearZero, InterpStrategy::LogLinearDf] {
            let i = interp(strategy, ExtrapolationPolicy::Error);
            let err = i.rate_at(&c, 365 * 30).unwrap_err();
            assert!(err.is_domain());
            assert!(err.to_string().contains("[1y, 10y]"));
            assert!(i.rate_at(&c, 30).is_err());
            assert!(i.rate_at(&c, 365 * 10).is_ok());
        }
    }

    #[test]
    fn test_log_linear_reproduces_nodes() {
        let c = curve(&[(0.5, 4.0), (2.0, 4.5), (5.0, 5.0)]);
        let i = interp(InterpStrategy::LogLinearDf, ExtrapolationPolicy::Clamp);
        assert_relative_eq!(i.rate_at(&c, 730).unwrap(), 0.045, epsilon = 1e-12);
    }

    #[test]
    fn test_log_linear_flat_curve_stays_flat() {
        let c = curve(&[(1.0, 4.0), (10.0, 4.0)]);
        for name in ["exp_cont", "simple", "comp_2"] {
            let engine = name.parse::<DiscountStrategy>().unwrap().build();
            let i = Interpolator::new(LOG_LINEAR, ExtrapolationPolicy::Clamp, engine);
            let r = i.rate_at(&c, 365 * 4).unwrap();
            if name == "exp_cont" {
                assert_relative_eq!(r, 0.04, epsilon = 1e-12);
            } else {
                assert!(r > 0.035 && r < 0.045, "{} gave {}", name, r);
            }
        }
    }

    #[test]
    fn test_log_linear_between_nodes_is_between_rates() {
        let c = curve(&[(1.0, 3.0), (5.0, 4.0)]);
        let i = interp(InterpStrategy::LogLinearDf, ExtrapolationPolicy::Clamp);
        let r = i.rate_at(&c, 365 * 3).unwrap();
        // Continuous zero rates interpolated in ln(DF) weight by time
        let expected = (0.03 * 1.0 + 0.5 * (0.04 * 5.0 - 0.03 * 1.0)) / 3.0;
        assert_relative_eq!(r, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_spot_node_at_zero() {
        let c = curve(&[(0.0, 5.0), (1.0, 3.0)]);
        let i = interp(InterpStrategy::LogLinearDf, ExtrapolationPolicy::Error);
        let r = i.rate_at(&c, 182).unwrap();
        assert!(r.is_finite());
        assert_relative_eq!(i.rate_at(&c, 0).unwrap(), 0.05, epsilon = 1e-15);
    }

    #[test]
    fn test_single_point_curve() {
        let c = curve(&[(2.0, 3.3)]);
        let clamp = interp(InterpStrategy::LinearZero, ExtrapolationPolicy::Clamp);
        assert_relative_eq!(clamp.rate_at(&c, 100).unwrap(), 0.033, epsilon = 1e-15);
        let strict = interp(InterpStrategy::LinearZero, ExtrapolationPolicy::Error);
        assert!(strict.rate_at(&c, 100).is_err());
        assert!(strict.rate_at(&c, 730).is_ok());
    }

    #[test]
    fn test_log_linear_rejects_invalid_node_discount_factor() {
        // Simple discounting at -10% has no positive DF beyond 10y
        let c = curve(&[(1.0, -10.0), (15.0, -10.0)]);
        let engine = DiscountStrategy::Simple.build();
        let i = Interpolator::new(LOG_LINEAR, ExtrapolationPolicy::Clamp, engine);
        assert!(i.rate_at(&c, 365 * 5).unwrap_err().is_domain());

        let linear = interp(InterpStrategy::LinearZero, ExtrapolationPolicy::Clamp);
        assert_relative_eq!(linear.rate_at(&c, 365 * 5).unwrap(), -0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("LOG_LINEAR_DF".parse::<InterpStrategy>().unwrap(), InterpStrategy::LogLinearDf);
        assert!("cubic".parse::<InterpStrategy>().is_err());
        assert_eq!("error".parse::<ExtrapolationPolicy>().unwrap(), ExtrapolationPolicy::Error);
        assert!("flat".parse::<ExtrapolationPolicy>().is_err());
    }
}
