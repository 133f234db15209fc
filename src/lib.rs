//! Swap Pricer - valuation engine for plain-vanilla fixed-for-floating interest rate swaps
//!
//! This library provides:
//! - Day count, discounting and curve interpolation conventions
//! - Payment schedule construction and swap NPV with a per-period schedule
//! - Par rate solving (Newton with bisection fallback)
//! - A shared, thread-safe TTL/LRU cache of yield curves loaded from CSV
//! - A service container wiring the cache to the pricer for batch use

pub mod cache;
pub mod config;
pub mod conventions;
pub mod curve;
pub mod error;
pub mod input;
pub mod pricing;
pub mod services;

// Re-export commonly used types
pub use cache::{CacheKey, CacheMetrics, CacheSettings, CurveCache};
pub use config::{PricerConfig, PricingConventions};
pub use conventions::{DayCount, DiscountStrategy, ExtrapolationPolicy, InterpStrategy};
pub use curve::{CurvePoint, RawCurve, YieldCurve};
pub use error::{PricerError, Result};
pub use pricing::{ParRateSolver, PaymentScheduleEntry, PricingResult, SolveResult, SwapPricer};
pub use services::{CurveSource, PricingServices, SwapRequest, Valuation};
