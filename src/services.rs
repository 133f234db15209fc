//! Pricing services: one place that wires the curve cache to the pricer
//!
//! Resolve the configuration once, then value many swaps against cached
//! curves without re-reading files.
//!
//! # Example
//! ```ignore
//! let services = PricingServices::build(&PricerConfig::default())?;
//! let request = SwapRequest::par(10_000_000.0, maturity, CurveSource::Latest);
//! let valuation = services.value(&request)?;
//! ```

use chrono::NaiveDate;
use log::info;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::{CacheMetrics, CurveCache};
use crate::config::{PricerConfig, PricingConventions};
use crate::curve::{cache_key_for, find_curve_file, read_curve_rows, RawCurve, YieldCurve};
use crate::error::Result;
use crate::pricing::{ParRateSolver, PaymentScheduleEntry, SwapPricer};

/// Where a request's curve comes from
#[derive(Debug, Clone, PartialEq)]
pub enum CurveSource {
    /// Latest `<prefix>_YYYYMMDD.csv` in the configured data directory
    Latest,
    /// A specific curve file (cache-backed)
    File(PathBuf),
    /// Rows supplied by the caller; validated but never cached
    Inline(RawCurve),
}

/// A swap to value
#[derive(Debug, Clone, PartialEq)]
pub struct SwapRequest {
    pub notional: f64,
    /// `None` solves for the par rate
    pub fixed_rate_percent: Option<f64>,
    pub maturity_date: NaiveDate,
    pub curve: CurveSource,
    /// `None` values the swap as of the curve's own date
    pub valuation_date: Option<NaiveDate>,
}

impl SwapRequest {
    pub fn priced(
        notional: f64,
        fixed_rate_percent: f64,
        maturity_date: NaiveDate,
        curve: CurveSource,
    ) -> Self {
        Self {
            notional,
            fixed_rate_percent: Some(fixed_rate_percent),
            maturity_date,
            curve,
            valuation_date: None,
        }
    }

    pub fn par(notional: f64, maturity_date: NaiveDate, curve: CurveSource) -> Self {
        Self {
            notional,
            fixed_rate_percent: None,
            maturity_date,
            curve,
            valuation_date: None,
        }
    }

    /// Value as of `date` instead of the curve's date
    pub fn as_of(mut self, date: NaiveDate) -> Self {
        self.valuation_date = Some(date);
        self
    }
}

/// Outcome of valuing one request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Valuation {
    pub valuation_date: NaiveDate,
    pub maturity_date: NaiveDate,
    pub notional: f64,
    /// Fixed rate the schedule was priced at (the par rate when solved)
    pub fixed_rate_percent: f64,
    pub npv: f64,
    /// Set when the fixed rate was solved rather than given
    pub par_rate_percent: Option<f64>,
    pub solver_iterations: Option<u32>,
    pub schedule: Vec<PaymentScheduleEntry>,
}

/// Cache-backed pricing entry points
#[derive(Debug)]
pub struct PricingServices {
    conventions: PricingConventions,
    pricer: SwapPricer,
    solver: ParRateSolver,
    cache: CurveCache,
    data_dir: PathBuf,
    curve_prefix: String,
}

impl PricingServices {
    /// Resolve `config` and construct a fresh cache and pricer
    pub fn build(config: &PricerConfig) -> Result<Self> {
        let (conventions, cache_settings) = config.resolve()?;

        info!(
            "Pricing conventions: day count {}, {} payments, {} discounting, \
             {} interpolation, {} extrapolation",
            conventions.day_count,
            conventions.frequency,
            conventions.discount.strategy(),
            conventions.interpolator.strategy(),
            conventions.interpolator.policy()
        );
        if cache_settings.enabled {
            info!(
                "Curve cache: max {} curves, TTL {}s",
                cache_settings.max_size,
                cache_settings.ttl.as_secs()
            );
        } else {
            info!("Curve cache disabled");
        }

        let pricer = SwapPricer::new(conventions);
        Ok(Self {
            conventions,
            pricer,
            solver: ParRateSolver::new(pricer, conventions.solver),
            cache: CurveCache::new(cache_settings),
            data_dir: config.data_dir.clone(),
            curve_prefix: config.curve_prefix.clone(),
        })
    }

    pub fn conventions(&self) -> &PricingConventions {
        &self.conventions
    }

    pub fn pricer(&self) -> &SwapPricer {
        &self.pricer
    }

    pub fn solver(&self) -> &ParRateSolver {
        &self.solver
    }

    pub fn cache(&self) -> &CurveCache {
        &self.cache
    }

    /// Load a curve file through the cache
    pub fn load_curve(&self, path: &Path) -> Result<Arc<YieldCurve>> {
        let key = cache_key_for(path)?;
        self.cache.get_or_load(&key, |k| read_curve_rows(k.path()))
    }

    /// Latest curve file in the configured data directory
    pub fn latest_curve_file(&self) -> Result<PathBuf> {
        find_curve_file(&self.data_dir, &self.curve_prefix)
    }

    /// Resolve a request's curve
    pub fn curve_for(&self, source: &CurveSource) -> Result<Arc<YieldCurve>> {
        match source {
            CurveSource::Latest => self.load_curve(&self.latest_curve_file()?),
            CurveSource::File(path) => self.load_curve(path),
            CurveSource::Inline(raw) => {
                let curve = YieldCurve::from_raw(raw.clone(), &self.conventions.limits)?;
                Ok(Arc::new(curve))
            }
        }
    }

    /// Price at the given fixed rate, or solve the par rate and return the
    /// at-par schedule
    pub fn value(&self, request: &SwapRequest) -> Result<Valuation> {
        let curve = self.curve_for(&request.curve)?;
        let valuation_date = request.valuation_date.unwrap_or_else(|| curve.valuation_date());
        let (notional, maturity) = (request.notional, request.maturity_date);

        let (result, par_rate_percent, solver_iterations) = match request.fixed_rate_percent {
            Some(rate) => (
                self.pricer.price(notional, rate, maturity, &curve, valuation_date)?,
                None,
                None,
            ),
            None => {
                let solved = self.solver.solve(notional, maturity, &curve, valuation_date)?;
                (solved.at_par, Some(solved.par_rate_percent), Some(solved.iterations))
            }
        };

        Ok(Valuation {
            valuation_date: result.valuation_date,
            maturity_date: result.maturity_date,
            notional: request.notional,
            fixed_rate_percent: result.fixed_rate_percent,
            npv: result.npv,
            par_rate_percent,
            solver_iterations,
            schedule: result.schedule,
        })
    }

    /// Value requests in parallel; results keep the input order
    pub fn value_batch(&self, requests: &[SwapRequest]) -> Vec<Result<Valuation>> {
        requests.par_iter().map(|r| self.value(r)).collect()
    }

    pub fn cache_metrics(&self) -> CacheMetrics {
        self.cache.metrics()
    }
}
