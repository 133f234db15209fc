//! Yield curve data and the file loader that feeds the curve cache

mod data;
pub mod loader;

pub use data::{CurveLimits, CurvePoint, RawCurve, YieldCurve, DAYS_PER_YEAR};
pub use loader::{cache_key_for, find_curve_file, read_curve_rows, DEFAULT_CURVE_PREFIX};
