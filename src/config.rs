//! Pricer configuration
//!
//! [`PricerConfig`] holds raw, string-named options as they arrive from a
//! JSON file or `PRICER_*` environment variables. [`PricerConfig::resolve`]
//! validates them once and turns them into typed [`PricingConventions`] and
//! [`CacheSettings`]; nothing downstream re-parses a name.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheSettings;
use crate::conventions::{
    DayCount, DiscountEngine, DiscountStrategy, ExtrapolationPolicy, InterpStrategy, Interpolator,
};
use crate::curve::{CurveLimits, DEFAULT_CURVE_PREFIX};
use crate::error::{PricerError, Result};
use crate::pricing::{Frequency, SolverSettings};

/// Prefix for environment overrides, e.g. `PRICER_DAY_COUNT`
pub const ENV_PREFIX: &str = "PRICER_";

/// Raw configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PricerConfig {
    pub day_count: String,
    pub fixed_frequency: u32,
    pub interp_strategy: String,
    pub discounting_strategy: String,
    pub extrapolation_policy: String,

    pub curve_cache_enabled: bool,
    pub curve_cache_maxsize: usize,
    pub curve_cache_ttl_seconds: u64,

    pub curve_max_points: usize,
    pub rate_min_percent: f64,
    pub rate_max_percent: f64,

    pub maturity_max_years: u32,
    pub notional_max: f64,

    pub max_solver_iterations: u32,
    /// NPV tolerance per unit notional
    pub solver_tolerance: f64,

    /// Directory searched for `<curve_prefix>_YYYYMMDD.csv`
    pub data_dir: PathBuf,
    pub curve_prefix: String,
}

impl Default for PricerConfig {
    fn default() -> Self {
        Self {
            day_count: DayCount::default().name().to_string(),
            fixed_frequency: 2,
            interp_strategy: InterpStrategy::default().name().to_string(),
            discounting_strategy: DiscountStrategy::default().name().to_string(),
            extrapolation_policy: ExtrapolationPolicy::default().name().to_string(),
            curve_cache_enabled: true,
            curve_cache_maxsize: 4,
            curve_cache_ttl_seconds: 300,
            curve_max_points: 200,
            rate_min_percent: -10.0,
            rate_max_percent: 50.0,
            maturity_max_years: 100,
            notional_max: 1e11,
            max_solver_iterations: 100,
            solver_tolerance: 1e-10,
            data_dir: PathBuf::from("data"),
            curve_prefix: DEFAULT_CURVE_PREFIX.to_string(),
        }
    }
}

/// Typed, validated conventions shared by the pricer and solver
#[derive(Debug, Clone, Copy)]
pub struct PricingConventions {
    pub day_count: DayCount,
    pub frequency: Frequency,
    pub discount: DiscountEngine,
    pub interpolator: Interpolator,
    pub limits: CurveLimits,
    pub maturity_max_years: u32,
    pub notional_max: f64,
    pub solver: SolverSettings,
}

impl Default for PricingConventions {
    fn default() -> Self {
        Self {
            day_count: DayCount::default(),
            frequency: Frequency::default(),
            discount: DiscountEngine::default(),
            interpolator: Interpolator::default(),
            limits: CurveLimits::default(),
            maturity_max_years: 100,
            notional_max: 1e11,
            solver: SolverSettings::default(),
        }
    }
}

impl PricerConfig {
    /// Defaults overlaid with a JSON file; missing keys keep their defaults
    pub fn from_json_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            PricerError::configuration(
                "config_file",
                path.display().to_string(),
                format!("a readable file ({})", e),
            )
        })?;
        serde_json::from_str(&text).map_err(|e| {
            PricerError::configuration(
                "config_file",
                path.display().to_string(),
                format!("a JSON object of pricer options ({})", e),
            )
        })
    }

    /// Apply `PRICER_*` variables from the process environment
    pub fn with_env_overrides(mut self) -> Result<Self> {
        self.apply_overrides(env::vars())?;
        Ok(self)
    }

    /// Apply `PRICER_<OPTION>` pairs; unrelated variables are ignored
    pub fn apply_overrides<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(option) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref().trim();

            match option.to_ascii_lowercase().as_str() {
                "day_count" => self.day_count = value.to_string(),
                "fixed_frequency" => self.fixed_frequency = parse_number("fixed_frequency", value)?,
                "interp_strategy" => self.interp_strategy = value.to_string(),
                "discounting_strategy" => self.discounting_strategy = value.to_string(),
                "extrapolation_policy" => self.extrapolation_policy = value.to_string(),
                "curve_cache_enabled" => {
                    self.curve_cache_enabled = parse_flag("curve_cache_enabled", value)?
                }
                "curve_cache_maxsize" => {
                    self.curve_cache_maxsize = parse_number("curve_cache_maxsize", value)?
                }
                "curve_cache_ttl_seconds" => {
                    self.curve_cache_ttl_seconds = parse_number("curve_cache_ttl_seconds", value)?
                }
                "curve_max_points" => {
                    self.curve_max_points = parse_number("curve_max_points", value)?
                }
                "rate_min_percent" => {
                    self.rate_min_percent = parse_number("rate_min_percent", value)?
                }
                "rate_max_percent" => {
                    self.rate_max_percent = parse_number("rate_max_percent", value)?
                }
                "maturity_max_years" => {
                    self.maturity_max_years = parse_number("maturity_max_years", value)?
                }
                "notional_max" => self.notional_max = parse_number("notional_max", value)?,
                "max_solver_iterations" => {
                    self.max_solver_iterations = parse_number("max_solver_iterations", value)?
                }
                "solver_tolerance" => {
                    self.solver_tolerance = parse_number("solver_tolerance", value)?
                }
                "data_dir" => self.data_dir = PathBuf::from(value),
                "curve_prefix" => self.curve_prefix = value.to_string(),
                _ => log::warn!("Ignoring unknown setting {}", key.as_ref()),
            }
        }
        Ok(())
    }

    /// Validate every option and build typed settings
    pub fn resolve(&self) -> Result<(PricingConventions, CacheSettings)> {
        let day_count: DayCount = self.day_count.parse()?;
        let frequency = Frequency::new(self.fixed_frequency)?;
        let discount = self.discounting_strategy.parse::<DiscountStrategy>()?.build();
        let interpolator = Interpolator::new(
            self.interp_strategy.parse()?,
            self.extrapolation_policy.parse()?,
            discount,
        );

        if self.curve_max_points == 0 {
            return Err(out_of_range("curve_max_points", self.curve_max_points, "at least 1"));
        }
        if !self.rate_min_percent.is_finite()
            || !self.rate_max_percent.is_finite()
            || self.rate_min_percent >= self.rate_max_percent
        {
            return Err(PricerError::configuration(
                "rate_min_percent/rate_max_percent",
                format!("{}/{}", self.rate_min_percent, self.rate_max_percent),
                "finite bounds with min < max",
            ));
        }
        if self.maturity_max_years == 0 {
            return Err(out_of_range("maturity_max_years", self.maturity_max_years, "at least 1"));
        }
        if !self.notional_max.is_finite() || self.notional_max <= 0.0 {
            return Err(out_of_range("notional_max", self.notional_max, "a positive number"));
        }
        if self.max_solver_iterations == 0 {
            return Err(out_of_range(
                "max_solver_iterations",
                self.max_solver_iterations,
                "at least 1",
            ));
        }
        if !self.solver_tolerance.is_finite() || self.solver_tolerance <= 0.0 {
            return Err(out_of_range(
                "solver_tolerance",
                self.solver_tolerance,
                "a positive number",
            ));
        }
        if self.curve_cache_maxsize == 0 {
            return Err(out_of_range("curve_cache_maxsize", self.curve_cache_maxsize, "at least 1"));
        }

        let limits = CurveLimits {
            max_points: self.curve_max_points,
            min_rate_percent: self.rate_min_percent,
            max_rate_percent: self.rate_max_percent,
        };

        let conventions = PricingConventions {
            day_count,
            frequency,
            discount,
            interpolator,
            limits,
            maturity_max_years: self.maturity_max_years,
            notional_max: self.notional_max,
            solver: SolverSettings {
                max_iterations: self.max_solver_iterations,
                tolerance: self.solver_tolerance,
                rate_min_percent: self.rate_min_percent,
                rate_max_percent: self.rate_max_percent,
            },
        };

        let cache = CacheSettings {
            enabled: self.curve_cache_enabled,
            max_size: self.curve_cache_maxsize,
            ttl: Duration::from_secs(self.curve_cache_ttl_seconds),
            limits,
        };

        Ok((conventions, cache))
    }
}

fn parse_number<T: FromStr>(option: &'static str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| PricerError::configuration(option, value, "a number"))
}

fn parse_flag(option: &'static str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(PricerError::configuration(option, value, "true/false")),
    }
}

fn out_of_range(option: &'static str, value: impl ToString, allowed: &str) -> PricerError {
    PricerError::configuration(option, value.to_string(), allowed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_resolve() {
        let (conventions, cache) = PricerConfig::default().resolve().unwrap();
        assert_eq!(conventions.day_count, DayCount::Act365Fixed);
        assert_eq!(conventions.frequency.per_year(), 2);
        assert_eq!(conventions.discount.strategy(), DiscountStrategy::Continuous);
        assert_eq!(conventions.interpolator.strategy(), InterpStrategy::LinearZero);
        assert_eq!(conventions.interpolator.policy(), ExtrapolationPolicy::Clamp);
        assert_eq!(conventions.solver.max_iterations, 100);
        assert_eq!(cache.max_size, 4);
        assert_eq!(cache.ttl, Duration::from_secs(300));
        assert!(cache.enabled);
    }

    #[test]
    fn test_unknown_names_rejected() {
        let mut config = PricerConfig::default();
        config.discounting_strategy = "comp_3".to_string();
        let err = config.resolve().unwrap_err();
        assert!(matches!(err, PricerError::Configuration { option: "discounting_strategy", .. }));

        let mut config = PricerConfig::default();
        config.day_count = "BUS/252".to_string();
        assert!(config.resolve().is_err());

        let mut config = PricerConfig::default();
        config.interp_strategy = "cubic_spline".to_string();
        assert!(config.resolve().is_err());
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let cases: Vec<fn(&mut PricerConfig)> = vec![
            |c: &mut PricerConfig| c.fixed_frequency = 0,
            |c: &mut PricerConfig| c.curve_cache_maxsize = 0,
            |c: &mut PricerConfig| c.max_solver_iterations = 0,
            |c: &mut PricerConfig| c.solver_tolerance = -1.0,
            |c: &mut PricerConfig| c.rate_min_percent = 60.0,
            |c: &mut PricerConfig| c.notional_max = f64::INFINITY,
        ];
        for mutate in cases {
            let mut config = PricerConfig::default();
            mutate(&mut config);
            assert!(config.resolve().is_err(), "{:?}", config);
        }
    }

    #[test]
    fn test_env_style_overrides() {
        let mut config = PricerConfig::default();
        config
            .apply_overrides([
                ("PRICER_DAY_COUNT", "act/360"),
                ("PRICER_CURVE_CACHE_TTL_SECONDS", "0"),
                ("PRICER_CURVE_CACHE_ENABLED", "false"),
                ("PRICER_FIXED_FREQUENCY", "4"),
                ("HOME", "/root"),
            ])
            .unwrap();

        let (conventions, cache) = config.resolve().unwrap();
        assert_eq!(conventions.day_count, DayCount::Act360);
        assert_eq!(conventions.frequency.months(), Some(3));
        assert_eq!(cache.ttl, Duration::ZERO);
        assert!(!cache.enabled);

        let err = config.apply_overrides([("PRICER_CURVE_CACHE_MAXSIZE", "lots")]).unwrap_err();
        assert!(err.to_string().contains("lots"));
    }

    #[test]
    fn test_json_file_overlays_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = r#"{"interp_strategy": "log_linear_df", "curve_cache_maxsize": 8}"#;
        file.write_all(json.as_bytes()).unwrap();

        let config = PricerConfig::from_json_path(file.path()).unwrap();
        assert_eq!(config.interp_strategy, "log_linear_df");
        assert_eq!(config.curve_cache_maxsize, 8);
        assert_eq!(config.fixed_frequency, 2);
    }

    #[test]
    fn test_json_unknown_key_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"curve_cache_size": 8}}"#).unwrap();
        assert!(PricerConfig::from_json_path(file.path()).is_err());
    }
}
