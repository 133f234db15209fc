//! Swap pricing: schedules, valuation and par rate solving

mod cashflows;
mod schedule;
mod solver;
mod swap;

pub use cashflows::{PaymentScheduleEntry, PricingResult, SolveResult};
pub use schedule::{Frequency, ScheduleBuilder, SchedulePeriod};
pub use solver::{ParRateSolver, SolverSettings};
pub use swap::SwapPricer;

pub(crate) use swap::{validate_maturity, validate_notional};
