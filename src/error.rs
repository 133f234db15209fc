//! Error types shared by the pricing engine and the curve cache

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while configuring, loading curves, pricing or solving
#[derive(Debug, Error)]
pub enum PricerError {
    /// Unknown strategy/convention name or out-of-range setting.
    /// Raised once when the configuration is resolved, never per request.
    #[error("configuration error: {option} = {value:?} is not supported (allowed: {allowed})")]
    Configuration {
        option: &'static str,
        value: String,
        allowed: String,
    },

    /// Curve rows violate the yield curve invariants
    #[error("invalid curve: {0}")]
    CurveValidation(String),

    /// Inputs outside the pricing domain (extrapolation, notional, maturity)
    #[error("domain error: {0}")]
    Domain(String),

    /// Par-rate iteration budget exhausted before the NPV tolerance was met
    #[error(
        "par rate solver did not converge after {iterations} iterations \
         (last rate {last_rate_percent:.6}%, residual NPV {residual:.6e})"
    )]
    SolverNonConvergence {
        iterations: u32,
        last_rate_percent: f64,
        residual: f64,
    },

    /// Failure reading or parsing a curve file
    #[error("failed to load curve from {}: {source}", path.display())]
    CurveLoad {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl PricerError {
    pub(crate) fn configuration(
        option: &'static str,
        value: impl Into<String>,
        allowed: impl Into<String>,
    ) -> Self {
        PricerError::Configuration {
            option,
            value: value.into(),
            allowed: allowed.into(),
        }
    }

    pub(crate) fn curve_load(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        PricerError::CurveLoad {
            path: path.into(),
            source: source.into(),
        }
    }

    /// True for errors caused by the request rather than by setup or I/O
    pub fn is_domain(&self) -> bool {
        matches!(self, PricerError::Domain(_))
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, PricerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_message_lists_allowed_values() {
        let err = PricerError::configuration("discounting_strategy", "comp_3", "exp_cont, simple");
        let msg = err.to_string();
        assert!(msg.contains("comp_3"));
        assert!(msg.contains("exp_cont, simple"));
    }

    #[test]
    fn test_curve_load_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = PricerError::curve_load("/data/SwapRates_20240115.csv", io);
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("SwapRates_20240115.csv"));
    }
}
