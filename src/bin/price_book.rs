//! Value every trade in a CSV book against one cached curve
//!
//! Book columns: `trade_id,notional,maturity,fixed_rate`. Notional and
//! maturity accept the same shorthand as the CLI; an empty `fixed_rate`
//! solves for the par rate. Trades are valued in parallel and written one
//! row per trade, failures included.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;

use swap_pricer::input::{parse_maturity, parse_notional};
use swap_pricer::{CurveSource, PricerConfig, PricingServices, SwapRequest, Valuation};

#[derive(Parser, Debug)]
#[command(name = "price_book", about = "Value a CSV book of swaps")]
struct Args {
    /// Trades CSV
    #[arg(long)]
    book: PathBuf,

    /// Curve file (defaults to the latest in the data directory)
    #[arg(long, conflicts_with = "data_dir")]
    curve: Option<PathBuf>,

    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Valuation date (YYYY-MM-DD); defaults to the curve's date
    #[arg(long)]
    valuation_date: Option<NaiveDate>,

    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "book_valuation_output.csv")]
    output: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
struct TradeRow {
    trade_id: String,
    notional: String,
    maturity: String,
    fixed_rate: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ResultRow {
    trade_id: String,
    maturity_date: Option<NaiveDate>,
    notional: Option<f64>,
    fixed_rate_percent: Option<f64>,
    par_rate_percent: Option<f64>,
    npv: Option<f64>,
    error: Option<String>,
}

impl ResultRow {
    fn from_outcome(trade_id: &str, outcome: Result<Valuation>) -> Self {
        match outcome {
            Ok(v) => Self {
                trade_id: trade_id.to_string(),
                maturity_date: Some(v.maturity_date),
                notional: Some(v.notional),
                fixed_rate_percent: Some(v.fixed_rate_percent),
                par_rate_percent: v.par_rate_percent,
                npv: Some(v.npv),
                error: None,
            },
            Err(e) => Self {
                trade_id: trade_id.to_string(),
                maturity_date: None,
                notional: None,
                fixed_rate_percent: None,
                par_rate_percent: None,
                npv: None,
                error: Some(format!("{:#}", e)),
            },
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let start = Instant::now();

    let mut config = match &args.config {
        Some(path) => PricerConfig::from_json_path(path)?,
        None => PricerConfig::default(),
    }
    .with_env_overrides()?;
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }

    let services = PricingServices::build(&config)?;
    let conventions = *services.conventions();

    let curve_path = match &args.curve {
        Some(path) => path.clone(),
        None => services.latest_curve_file()?,
    };
    let curve = services
        .load_curve(&curve_path)
        .with_context(|| format!("Failed to load curve {}", curve_path.display()))?;
    println!(
        "Curve {} as of {} ({} points)",
        curve_path.display(),
        curve.valuation_date(),
        curve.point_count()
    );
    if let Some(date) = args.valuation_date {
        println!("Valuing as of {}", date);
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(&args.book)
        .with_context(|| format!("Failed to open book {}", args.book.display()))?;
    let trades: Vec<TradeRow> = reader
        .deserialize()
        .collect::<std::result::Result<_, _>>()
        .with_context(|| format!("Failed to parse book {}", args.book.display()))?;
    println!("Loaded {} trades in {:?}", trades.len(), start.elapsed());

    let valuation_date = args.valuation_date.unwrap_or_else(|| curve.valuation_date());
    let source = CurveSource::File(curve_path);

    let price_start = Instant::now();
    let rows: Vec<ResultRow> = trades
        .par_iter()
        .map(|trade| {
            let outcome = parse_notional(&trade.notional, conventions.notional_max)
                .and_then(|notional| {
                    let maturity_date = parse_maturity(
                        &trade.maturity,
                        valuation_date,
                        conventions.maturity_max_years,
                    )?;
                    Ok(SwapRequest {
                        notional,
                        fixed_rate_percent: trade.fixed_rate,
                        maturity_date,
                        curve: source.clone(),
                        valuation_date: Some(valuation_date),
                    })
                })
                .and_then(|request| services.value(&request))
                .map_err(anyhow::Error::from);
            ResultRow::from_outcome(&trade.trade_id, outcome)
        })
        .collect();
    println!("Valued {} trades in {:?}", rows.len(), price_start.elapsed());

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    println!("Output written to {}", args.output.display());

    let failed = rows.iter().filter(|r| r.error.is_some()).count();
    let total_npv: f64 = rows.iter().filter_map(|r| r.npv).sum();
    let metrics = services.cache_metrics();

    println!("\nBook Summary:");
    println!("  Trades:    {} ({} failed)", rows.len(), failed);
    println!("  Total NPV: {:.2}", total_npv);
    println!(
        "  Curve cache: {} hits, {} misses, {} evictions ({:.1}% hit rate)",
        metrics.hits,
        metrics.misses,
        metrics.evictions,
        metrics.hit_rate() * 100.0
    );
    println!("\nTotal time: {:?}", start.elapsed());

    Ok(())
}
