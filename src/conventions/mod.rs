//! Market conventions: day counts, discounting and interpolation

mod daycount;
mod discount;
mod interpolation;

pub use daycount::{DayCount, DAY_COUNT_NAMES};
pub use discount::{DiscountEngine, DiscountFn, DiscountStrategy, ImpliedRateFn, DISCOUNTING_NAMES};
pub use interpolation::{
    ExtrapolationPolicy, InterpStrategy, Interpolator, EXTRAPOLATION_NAMES, INTERP_NAMES,
};
