//! Par rate solver
//!
//! Newton-Raphson on NPV(fixed rate) with the analytic slope
//! `-notional / 100 × Σ accrual × DF` (per percentage point). If the slope
//! vanishes or a step leaves the number line, the remaining budget is spent
//! on bisection over the configured rate bounds. Every call to the pricer
//! counts against `max_iterations`; running out is an error, never a
//! best-effort rate.

use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};

use super::cashflows::SolveResult;
use super::swap::SwapPricer;
use crate::curve::YieldCurve;
use crate::error::{PricerError, Result};

/// Iteration budget, tolerance and search bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    pub max_iterations: u32,

    /// Convergence when |NPV| ≤ tolerance × notional
    pub tolerance: f64,

    pub rate_min_percent: f64,
    pub rate_max_percent: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-10,
            rate_min_percent: -10.0,
            rate_max_percent: 50.0,
        }
    }
}

/// Finds the fixed rate that zeroes a swap's NPV
#[derive(Debug, Clone, Copy, Default)]
pub struct ParRateSolver {
    pricer: SwapPricer,
    settings: SolverSettings,
}

/// Pricer evaluations spent so far and the last point seen
struct Budget {
    used: u32,
    last_rate: f64,
    last_npv: f64,
}

impl ParRateSolver {
    pub fn new(pricer: SwapPricer, settings: SolverSettings) -> Self {
        Self { pricer, settings }
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Par rate for a swap valued as of `valuation_date`
    pub fn solve(
        &self,
        notional: f64,
        maturity_date: NaiveDate,
        curve: &YieldCurve,
        valuation_date: NaiveDate,
    ) -> Result<SolveResult> {
        let conventions = self.pricer.conventions();
        let target_days = (maturity_date - curve.valuation_date()).num_days();
        let guess = conventions
            .interpolator
            .rate_at(curve, target_days)
            .map(|r| r * 100.0)?;

        let tolerance = self.settings.tolerance * notional;
        let mut budget = Budget {
            used: 0,
            last_rate: guess,
            last_npv: f64::NAN,
        };
        let mut rate = guess.clamp(self.settings.rate_min_percent, self.settings.rate_max_percent);

        while budget.used < self.settings.max_iterations {
            let result = self
                .pricer
                .price(notional, rate, maturity_date, curve, valuation_date)?;
            budget.used += 1;
            budget.last_rate = rate;
            budget.last_npv = result.npv;

            if result.npv.abs() <= tolerance {
                return Ok(SolveResult {
                    par_rate_percent: rate,
                    iterations: budget.used,
                    at_par: result,
                });
            }

            let slope = -notional / 100.0 * result.annuity();
            let next = rate - result.npv / slope;
            if slope == 0.0 || !next.is_finite() {
                warn!(
                    "Par rate Newton step failed at {:.6}% (slope {}), falling back to bisection",
                    rate, slope
                );
                return self.bisect(notional, maturity_date, curve, valuation_date, budget);
            }

            rate = next.clamp(self.settings.rate_min_percent, self.settings.rate_max_percent);
        }

        Err(non_convergence(&budget))
    }

    /// Bisection on [rate_min, rate_max]; NPV is decreasing in the fixed rate
    fn bisect(
        &self,
        notional: f64,
        maturity_date: NaiveDate,
        curve: &YieldCurve,
        valuation_date: NaiveDate,
        mut budget: Budget,
    ) -> Result<SolveResult> {
        let tolerance = self.settings.tolerance * notional;
        let mut low = self.settings.rate_min_percent;
        let mut high = self.settings.rate_max_percent;

        while budget.used < self.settings.max_iterations {
            let mid = 0.5 * (low + high);
            let result = self
                .pricer
                .price(notional, mid, maturity_date, curve, valuation_date)?;
            budget.used += 1;
            budget.last_rate = mid;
            budget.last_npv = result.npv;

            if result.npv.abs() <= tolerance {
                return Ok(SolveResult {
                    par_rate_percent: mid,
                    iterations: budget.used,
                    at_par: result,
                });
            }

            if result.npv > 0.0 {
                low = mid;
            } else {
                high = mid;
            }
        }

        Err(non_convergence(&budget))
    }
}

fn non_convergence(budget: &Budget) -> PricerError {
    PricerError::SolverNonConvergence {
        iterations: budget.used,
        last_rate_percent: budget.last_rate,
        residual: budget.last_npv,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PricerConfig;
    use crate::curve::{CurveLimits, CurvePoint};
    use approx::assert_relative_eq;

    const NOTIONAL: f64 = 10_000_000.0;

    fn val_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn curve(rows: &[(f64, f64)]) -> YieldCurve {
        YieldCurve::new(
            val_date(),
            rows.iter().copied().map(CurvePoint::from).collect(),
            &CurveLimits::default(),
        )
        .unwrap()
    }

    fn scenario_curve() -> YieldCurve {
        curve(&[(1.0, 3.0), (5.0, 4.0), (10.0, 4.5)])
    }

    fn five_years() -> NaiveDate {
        NaiveDate::from_ymd_opt(2029, 1, 15).unwrap()
    }

    fn maturities() -> [NaiveDate; 4] {
        [
            NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
            five_years(),
            NaiveDate::from_ymd_opt(2031, 6, 30).unwrap(),
            NaiveDate::from_ymd_opt(2044, 1, 15).unwrap(),
        ]
    }

    #[test]
    fn test_par_rate_round_trip() {
        let solver = ParRateSolver::default();
        let pricer = SwapPricer::default();
        let c = scenario_curve();

        for maturity in maturities() {
            let solved = solver.solve(NOTIONAL, maturity, &c, val_date()).unwrap();
            let repriced = pricer
                .price(NOTIONAL, solved.par_rate_percent, maturity, &c, val_date())
                .unwrap();
            assert!(repriced.npv.abs() <= 1e-6 * NOTIONAL, "{}: npv {}", maturity, repriced.npv);
            assert_eq!(solved.at_par.schedule, repriced.schedule);
        }
    }

    #[test]
    fn test_par_rate_round_trip_across_conventions() {
        let day_counts = ["ACT/365F", "ACT/360", "30/360", "ACT/ACT", "ACT/365L", "ACT/365.25"];
        // 5 and 52 per year step in days rather than calendar months
        let frequencies = [2, 5, 12, 1, 52, 4];
        let interps = ["linear_zero", "log_linear_df"];
        let discounts = ["exp_cont", "simple", "comp_1", "comp_2", "comp_4", "comp_12"];
        let c = scenario_curve();
        let later = NaiveDate::from_ymd_opt(2024, 4, 15).unwrap();

        for interp in interps {
            for discount in discounts {
                for (day_count, frequency) in day_counts.iter().zip(frequencies) {
                    let config = PricerConfig {
                        day_count: day_count.to_string(),
                        fixed_frequency: frequency,
                        interp_strategy: interp.to_string(),
                        discounting_strategy: discount.to_string(),
                        ..Default::default()
                    };
                    let (conventions, _) = config.resolve().unwrap();
                    let pricer = SwapPricer::new(conventions);
                    let solver = ParRateSolver::new(pricer, conventions.solver);

                    for valuation in [val_date(), later] {
                        for maturity in maturities() {
                            let label = format!(
                                "{} {} {} x{} {} -> {}",
                                interp, discount, day_count, frequency, valuation, maturity
                            );
                            let solved = solver
                                .solve(NOTIONAL, maturity, &c, valuation)
                                .unwrap_or_else(|e| panic!("{}: {}", label, e));
                            let repriced = pricer
                                .price(NOTIONAL, solved.par_rate_percent, maturity, &c, valuation)
                                .unwrap();
                            assert!(
                                repriced.npv.abs() <= 1e-6 * NOTIONAL,
                                "{}: npv {}",
                                label,
                                repriced.npv
                            );
                            assert!(
                                solved.par_rate_percent > 2.5 && solved.par_rate_percent < 5.0,
                                "{}: par {}",
                                label,
                                solved.par_rate_percent
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_scenario_par_rate() {
        let solver = ParRateSolver::default();
        let c = scenario_curve();
        let solved = solver.solve(NOTIONAL, five_years(), &c, val_date()).unwrap();

        // The floating leg averages curve rates between 3% and 4% over the life
        assert!(
            solved.par_rate_percent > 3.0 && solved.par_rate_percent < 4.0,
            "par {}",
            solved.par_rate_percent
        );
        assert!(solved.iterations <= 3);

        let pricer = SwapPricer::default();
        let at_four = pricer.price(NOTIONAL, 4.0, five_years(), &c, val_date()).unwrap();
        let at_four_half = pricer.price(NOTIONAL, 4.5, five_years(), &c, val_date()).unwrap();
        assert!(at_four.npv < 0.0);
        assert!(at_four_half.npv < at_four.npv);
    }

    #[test]
    fn test_flat_curve_par_equals_curve_rate() {
        let solver = ParRateSolver::default();
        let flat = curve(&[(1.0, 4.0), (10.0, 4.0)]);
        let solved = solver.solve(NOTIONAL, five_years(), &flat, val_date()).unwrap();
        assert_relative_eq!(solved.par_rate_percent, 4.0, epsilon = 1e-9);
        assert_eq!(solved.iterations, 1);
    }

    #[test]
    fn test_budget_exhausted_is_an_error() {
        let settings = SolverSettings {
            max_iterations: 1,
            ..Default::default()
        };
        let solver = ParRateSolver::new(SwapPricer::default(), settings);
        let err = solver
            .solve(NOTIONAL, five_years(), &scenario_curve(), val_date())
            .unwrap_err();

        match err {
            PricerError::SolverNonConvergence { iterations, residual, .. } => {
                assert_eq!(iterations, 1);
                assert!(residual.abs() > 0.0);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_bisection_converges() {
        let solver = ParRateSolver::default();
        let c = scenario_curve();
        let budget = Budget {
            used: 0,
            last_rate: 0.0,
            last_npv: f64::NAN,
        };
        // Bisection halves a 60-point bracket; tolerance is loose enough to land
        let loose = ParRateSolver::new(
            SwapPricer::default(),
            SolverSettings {
                tolerance: 1e-9,
                ..Default::default()
            },
        );
        let solved = loose
            .bisect(NOTIONAL, five_years(), &c, val_date(), budget)
            .unwrap();
        let newton = solver.solve(NOTIONAL, five_years(), &c, val_date()).unwrap();
        assert_relative_eq!(solved.par_rate_percent, newton.par_rate_percent, epsilon = 1e-6);
    }

    #[test]
    fn test_domain_errors_propagate() {
        let solver = ParRateSolver::default();
        let c = scenario_curve();
        assert!(solver.solve(-1.0, five_years(), &c, val_date()).unwrap_err().is_domain());
        assert!(solver.solve(NOTIONAL, val_date(), &c, val_date()).unwrap_err().is_domain());
    }
}
