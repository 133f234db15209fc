//! Caller-facing shorthand for notionals and maturities
//!
//! Notionals: plain numbers with optional separators (`1,000,000`,
//! `1_000_000`) or a suffix: `k` (thousand), `m`/`mm` (million),
//! `b`/`bn` (billion).
//!
//! Maturities: an ISO date (`2029-01-15`) or a tenor counted from the
//! valuation date: `5y` and `18m` add calendar months, `30d` adds days.
//! Fractional years are accepted when they are a whole number of months.

use chrono::{Duration, Months, NaiveDate};

use crate::error::{PricerError, Result};
use crate::pricing::{validate_maturity, validate_notional};

/// Parse a notional such as `10m` or `250,000`
pub fn parse_notional(input: &str, notional_max: f64) -> Result<f64> {
    let cleaned: String = input
        .trim()
        .to_ascii_lowercase()
        .chars()
        .filter(|c| *c != ',' && *c != '_')
        .collect();

    let (number, multiplier) = [("bn", 1e9), ("mm", 1e6), ("b", 1e9), ("m", 1e6), ("k", 1e3)]
        .iter()
        .find_map(|(suffix, mult)| cleaned.strip_suffix(suffix).map(|n| (n, *mult)))
        .unwrap_or((cleaned.as_str(), 1.0));

    let value: f64 = number.trim().parse().map_err(|_| {
        PricerError::Domain(format!(
            "notional '{}' is not a number (examples: 10000000, 10m, 250k, 1b)",
            input
        ))
    })?;

    let notional = value * multiplier;
    validate_notional(notional, notional_max)?;
    Ok(notional)
}

/// Parse a maturity date or tenor relative to `valuation_date`
pub fn parse_maturity(
    input: &str,
    valuation_date: NaiveDate,
    maturity_max_years: u32,
) -> Result<NaiveDate> {
    let trimmed = input.trim();
    let maturity = match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => tenor_date(trimmed, valuation_date)?,
    };
    validate_maturity(valuation_date, maturity, maturity_max_years)?;
    Ok(maturity)
}

fn tenor_date(tenor: &str, valuation_date: NaiveDate) -> Result<NaiveDate> {
    let invalid = || {
        PricerError::Domain(format!(
            "maturity '{}' is neither a YYYY-MM-DD date nor a tenor like 5y, 18m or 30d",
            tenor
        ))
    };

    let lower = tenor.to_ascii_lowercase();
    let unit = lower.chars().last().ok_or_else(invalid)?;
    let count = lower[..lower.len() - unit.len_utf8()].trim();

    let date = match unit {
        'y' => {
            let years: f64 = count.parse().map_err(|_| invalid())?;
            let months = years * 12.0;
            if !months.is_finite() || months < 0.0 || (months - months.round()).abs() > 1e-9 {
                return Err(PricerError::Domain(format!(
                    "maturity '{}' is not a whole number of months",
                    tenor
                )));
            }
            add_months(valuation_date, months.round() as u32)
        }
        'm' => add_months(valuation_date, count.parse().map_err(|_| invalid())?),
        'd' => {
            let days: i64 = count.parse().map_err(|_| invalid())?;
            Duration::try_days(days).and_then(|delta| valuation_date.checked_add_signed(delta))
        }
        _ => return Err(invalid()),
    };

    date.ok_or_else(|| PricerError::Domain(format!("maturity '{}' is out of range", tenor)))
}

fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}
