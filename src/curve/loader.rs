//! Load yield curves from CSV files such as `SwapRates_20240115.csv`
//!
//! Files carry a header row and at least two columns: maturity in years and
//! rate in percent. Extra columns are ignored. The valuation date comes from
//! the `_YYYYMMDD` token in the file name.
//!
//! Rows are returned unvalidated; [`crate::cache::CurveCache`] (or
//! [`super::YieldCurve::from_raw`] for uncached use) applies the curve rules.

use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use super::data::{CurvePoint, RawCurve};
use crate::cache::CacheKey;
use crate::error::{PricerError, Result};

/// Default file name prefix for curve files
pub const DEFAULT_CURVE_PREFIX: &str = "SwapRates";

/// Parse the valuation date from a file name like `SwapRates_20240115.csv`
pub fn valuation_date_from_filename(path: &Path) -> Result<NaiveDate> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| PricerError::curve_load(path, "file name is not valid UTF-8"))?;

    date_token(stem).ok_or_else(|| {
        PricerError::curve_load(
            path,
            format!(
                "cannot parse a valuation date from '{}' (expected <prefix>_YYYYMMDD.csv)",
                stem
            ),
        )
    })
}

fn date_token(stem: &str) -> Option<NaiveDate> {
    let (_, token) = stem.rsplit_once('_')?;
    if token.len() != 8 {
        return None;
    }
    NaiveDate::parse_from_str(token, "%Y%m%d").ok()
}

/// Read curve rows from a CSV file
pub fn read_curve_rows(path: &Path) -> Result<RawCurve> {
    let valuation_date = valuation_date_from_filename(path)?;
    let file = File::open(path).map_err(|e| PricerError::curve_load(path, e))?;
    let points = parse_curve_csv(file, path)?;
    log::debug!(
        "Read {} curve points from {} (as of {})",
        points.len(),
        path.display(),
        valuation_date
    );
    Ok(RawCurve::new(valuation_date, points))
}

/// Parse curve rows from any reader (e.g., an in-memory buffer)
///
/// `origin` is only used to label errors.
pub fn parse_curve_csv<R: Read>(reader: R, origin: &Path) -> Result<Vec<CurvePoint>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut points = Vec::new();

    for (i, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| PricerError::curve_load(origin, e))?;
        let line = i + 2; // header is line 1

        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        if record.len() < 2 {
            return Err(PricerError::curve_load(
                origin,
                format!(
                    "line {}: expected two columns (maturity in years, rate in percent), found {}",
                    line,
                    record.len()
                ),
            ));
        }

        let maturity_years = parse_field(&record[0], "maturity", line, origin)?;
        let rate_percent = parse_field(&record[1], "rate", line, origin)?;
        points.push(CurvePoint::new(maturity_years, rate_percent));
    }

    Ok(points)
}

fn parse_field(raw: &str, what: &str, line: usize, origin: &Path) -> Result<f64> {
    raw.parse::<f64>().map_err(|_| {
        PricerError::curve_load(
            origin,
            format!("line {}: {} '{}' is not a number", line, what, raw),
        )
    })
}

/// Build the cache key for a curve file: canonical path plus modification time
pub fn cache_key_for(path: &Path) -> Result<CacheKey> {
    let resolved = fs::canonicalize(path).map_err(|e| PricerError::curve_load(path, e))?;
    let modified = fs::metadata(&resolved)
        .and_then(|m| m.modified())
        .map_err(|e| PricerError::curve_load(&resolved, e))?;
    Ok(CacheKey::new(resolved, modified))
}

/// Find the curve file with the latest date token in `dir`
pub fn find_curve_file(dir: &Path, prefix: &str) -> Result<PathBuf> {
    let entries = fs::read_dir(dir).map_err(|e| PricerError::curve_load(dir, e))?;
    let wanted = format!("{}_", prefix);

    let mut best: Option<(NaiveDate, PathBuf)> = None;
    for entry in entries {
        let path = entry.map_err(|e| PricerError::curve_load(dir, e))?.path();
        if !path.is_file() {
            continue;
        }
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("csv"));
        let stem = match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) if is_csv && stem.starts_with(&wanted) => stem.to_string(),
            _ => continue,
        };
        if let Some(date) = date_token(&stem) {
            if best.as_ref().map_or(true, |(d, _)| date > *d) {
                best = Some((date, path));
            }
        }
    }

    best.map(|(_, path)| path).ok_or_else(|| {
        PricerError::curve_load(dir, format!("no {}_YYYYMMDD.csv file found", prefix))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_valuation_date_from_filename() {
        let d = valuation_date_from_filename(Path::new("/data/SwapRates_20240115.csv")).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());

        assert!(valuation_date_from_filename(Path::new("curve.csv")).is_err());
        assert!(valuation_date_from_filename(Path::new("SwapRates_2024.csv")).is_err());
    }

    #[test]
    fn test_read_curve_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "SwapRates_20240115.csv",
            "Maturity (Years),Rate,Source\n1,3.0,BBG\n5, 4.0 ,BBG\n10,4.5,BBG\n",
        );

        let raw = read_curve_rows(&path).unwrap();
        assert_eq!(raw.valuation_date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(raw.points.len(), 3);
        assert_eq!(raw.points[1], CurvePoint::new(5.0, 4.0));
    }

    #[test]
    fn test_bad_rows_report_line() {
        let err = parse_curve_csv("Maturity,Rate\n1,3.0\n2,abc\n".as_bytes(), Path::new("inline"))
            .unwrap_err();
        assert!(err.to_string().contains("line 3"), "{}", err);

        let err = parse_curve_csv("Maturity\n1\n".as_bytes(), Path::new("inline")).unwrap_err();
        assert!(err.to_string().contains("two columns"), "{}", err);
    }

    #[test]
    fn test_missing_file() {
        let err = read_curve_rows(Path::new("/nonexistent/SwapRates_20240115.csv")).unwrap_err();
        assert!(matches!(err, PricerError::CurveLoad { .. }));
    }

    #[test]
    fn test_find_curve_file_picks_latest() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "SwapRates_20240110.csv", "M,R\n1,3\n");
        write_file(dir.path(), "SwapRates_20240301.csv", "M,R\n1,3\n");
        write_file(dir.path(), "SwapRates_20231231.csv", "M,R\n1,3\n");
        write_file(dir.path(), "Other_20250101.csv", "M,R\n1,3\n");
        write_file(dir.path(), "SwapRates_20260101.txt", "M,R\n1,3\n");

        let found = find_curve_file(dir.path(), DEFAULT_CURVE_PREFIX).unwrap();
        assert!(found.ends_with("SwapRates_20240301.csv"));
    }

    #[test]
    fn test_find_curve_file_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_curve_file(dir.path(), DEFAULT_CURVE_PREFIX).is_err());
    }

    #[test]
    fn test_cache_key_tracks_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "SwapRates_20240115.csv", "M,R\n1,3\n");
        let a = cache_key_for(&path).unwrap();
        let b = cache_key_for(&path).unwrap();
        assert_eq!(a, b);
        assert!(a.path().is_absolute());
    }
}
