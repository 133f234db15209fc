//! Yield curve data structures and validation

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{PricerError, Result};

/// Day basis used to place curve nodes on the calendar
pub const DAYS_PER_YEAR: f64 = 365.0;

/// A single quoted point: maturity in years, rate in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub maturity_years: f64,
    pub rate_percent: f64,
}

impl CurvePoint {
    pub fn new(maturity_years: f64, rate_percent: f64) -> Self {
        Self {
            maturity_years,
            rate_percent,
        }
    }
}

impl From<(f64, f64)> for CurvePoint {
    fn from((maturity_years, rate_percent): (f64, f64)) -> Self {
        Self::new(maturity_years, rate_percent)
    }
}

/// Unvalidated curve rows as produced by a loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCurve {
    /// Date the quotes are "as of"
    pub valuation_date: NaiveDate,
    pub points: Vec<CurvePoint>,
}

impl RawCurve {
    pub fn new(valuation_date: NaiveDate, points: impl IntoIterator<Item = CurvePoint>) -> Self {
        Self {
            valuation_date,
            points: points.into_iter().collect(),
        }
    }
}

/// Bounds applied when validating curve rows
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveLimits {
    /// Maximum number of points
    pub max_points: usize,

    /// Lowest admissible rate (percent)
    pub min_rate_percent: f64,

    /// Highest admissible rate (percent)
    pub max_rate_percent: f64,
}

impl Default for CurveLimits {
    fn default() -> Self {
        Self {
            max_points: 200,
            min_rate_percent: -10.0,
            max_rate_percent: 50.0,
        }
    }
}

/// Validated, immutable yield curve
///
/// Points are strictly increasing by maturity. Each point is also placed on
/// the calendar as a whole number of days after the valuation date, which is
/// the unit interpolation works in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YieldCurve {
    valuation_date: NaiveDate,
    points: Vec<CurvePoint>,
    node_days: Vec<i64>,
}

impl YieldCurve {
    /// Validate rows against `limits` and build the curve
    pub fn new(
        valuation_date: NaiveDate,
        points: Vec<CurvePoint>,
        limits: &CurveLimits,
    ) -> Result<Self> {
        if points.is_empty() {
            return Err(PricerError::CurveValidation(
                "at least one curve point is required".to_string(),
            ));
        }
        if points.len() > limits.max_points {
            return Err(PricerError::CurveValidation(format!(
                "too many curve points: {} (maximum is {})",
                points.len(),
                limits.max_points
            )));
        }

        for (i, p) in points.iter().enumerate() {
            if !p.maturity_years.is_finite() || p.maturity_years < 0.0 {
                return Err(PricerError::CurveValidation(format!(
                    "point {}: maturity {} years must be a finite, non-negative number",
                    i + 1,
                    p.maturity_years
                )));
            }
            if !p.rate_percent.is_finite()
                || p.rate_percent < limits.min_rate_percent
                || p.rate_percent > limits.max_rate_percent
            {
                return Err(PricerError::CurveValidation(format!(
                    "point {}: rate {}% is outside [{}%, {}%]",
                    i + 1,
                    p.rate_percent,
                    limits.min_rate_percent,
                    limits.max_rate_percent
                )));
            }
        }

        for (i, pair) in points.windows(2).enumerate() {
            if pair[1].maturity_years <= pair[0].maturity_years {
                return Err(PricerError::CurveValidation(format!(
                    "maturities must be strictly increasing: point {} ({}y) follows {}y",
                    i + 2,
                    pair[1].maturity_years,
                    pair[0].maturity_years
                )));
            }
        }

        let node_days: Vec<i64> = points
            .iter()
            .map(|p| (p.maturity_years * DAYS_PER_YEAR).round() as i64)
            .collect();

        // Distinct maturities that land on the same day cannot be interpolated between
        if let Some(pos) = node_days.windows(2).position(|w| w[1] <= w[0]) {
            return Err(PricerError::CurveValidation(format!(
                "maturities {}y and {}y fall on the same day",
                points[pos].maturity_years,
                points[pos + 1].maturity_years
            )));
        }

        Ok(Self {
            valuation_date,
            points,
            node_days,
        })
    }

    /// Validate loader output
    pub fn from_raw(raw: RawCurve, limits: &CurveLimits) -> Result<Self> {
        Self::new(raw.valuation_date, raw.points, limits)
    }

    pub fn valuation_date(&self) -> NaiveDate {
        self.valuation_date
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    /// Number of quoted points (always at least one)
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Node offsets in days from the valuation date
    pub fn node_days(&self) -> &[i64] {
        &self.node_days
    }

    /// Rate at node `i` as a decimal
    pub fn rate(&self, i: usize) -> f64 {
        self.points[i].rate_percent / 100.0
    }

    pub fn first_maturity_years(&self) -> f64 {
        self.points[0].maturity_years
    }

    pub fn last_maturity_years(&self) -> f64 {
        self.points[self.points.len() - 1].maturity_years
    }
}
