//! Swap Pricer CLI
//!
//! Values one swap against the latest (or a given) curve file: NPV at a fixed
//! rate, or the par rate when `--fixed` is omitted.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

use swap_pricer::input::{parse_maturity, parse_notional};
use swap_pricer::{CurveSource, PricerConfig, PricingServices, SwapRequest, Valuation};

/// Value a plain-vanilla interest rate swap
#[derive(Parser, Debug)]
#[command(name = "swap-pricer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Notional, e.g. 10000000, 10m, 250k
    #[arg(short, long, required_unless_present = "show_config")]
    notional: Option<String>,

    /// Maturity as a tenor (5y, 18m, 30d) or a date (YYYY-MM-DD)
    #[arg(short, long, required_unless_present = "show_config")]
    maturity: Option<String>,

    /// Fixed rate in percent; omit to solve for the par rate
    #[arg(short, long)]
    fixed: Option<f64>,

    /// Valuation date (YYYY-MM-DD); defaults to the curve's date
    #[arg(long)]
    valuation_date: Option<NaiveDate>,

    /// Curve file (defaults to the latest SwapRates_YYYYMMDD.csv in the data directory)
    #[arg(long, conflicts_with = "data_dir")]
    curve: Option<PathBuf>,

    /// Directory searched for curve files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// JSON configuration file (PRICER_* environment variables override it)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the payment schedule
    #[arg(long)]
    schedule: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    show_config: bool,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<PricerConfig> {
    let mut config = match &cli.config {
        Some(path) => PricerConfig::from_json_path(path)
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?,
        None => PricerConfig::default(),
    };
    config = config.with_env_overrides()?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;

    if cli.show_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let services = PricingServices::build(&config)?;
    let conventions = *services.conventions();

    let source = match &cli.curve {
        Some(path) => CurveSource::File(path.clone()),
        None => CurveSource::File(services.latest_curve_file()?),
    };
    let curve = services.curve_for(&source).context("Failed to load the yield curve")?;

    let valuation_date = cli.valuation_date.unwrap_or_else(|| curve.valuation_date());
    let notional = parse_notional(
        cli.notional.as_deref().unwrap_or_default(),
        conventions.notional_max,
    )?;
    let maturity = parse_maturity(
        cli.maturity.as_deref().unwrap_or_default(),
        valuation_date,
        conventions.maturity_max_years,
    )?;

    let request = SwapRequest {
        notional,
        fixed_rate_percent: cli.fixed,
        maturity_date: maturity,
        curve: source,
        valuation_date: Some(valuation_date),
    };
    let valuation = services.value(&request)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&valuation)?);
    } else {
        print_summary(&valuation);
        if cli.schedule {
            print_schedule(&valuation);
        }
    }

    Ok(())
}

fn print_summary(valuation: &Valuation) {
    println!("Valuation date: {}", valuation.valuation_date);
    println!("Maturity:       {}", valuation.maturity_date);
    println!("Notional:       {:.2}", valuation.notional);
    match (valuation.par_rate_percent, valuation.solver_iterations) {
        (Some(par), Some(iterations)) => {
            println!("Par rate:       {:.4}% ({} iterations)", par, iterations)
        }
        _ => println!("Fixed rate:     {:.4}%", valuation.fixed_rate_percent),
    }
    println!("NPV (payer):    {:.2}", valuation.npv);
}

fn print_schedule(valuation: &Valuation) {
    println!();
    println!(
        "{:>10} {:>5} {:>9} {:>9} {:>14} {:>14} {:>10} {:>14} {:>14}",
        "Payment", "Days", "Accrual", "Rate%", "Fixed", "Floating", "DF", "PV Fixed", "PV Floating"
    );
    println!("{}", "-".repeat(109));

    for e in &valuation.schedule {
        println!(
            "{:>10} {:>5} {:>9.6} {:>9.4} {:>14.2} {:>14.2} {:>10.8} {:>14.2} {:>14.2}",
            e.payment_date,
            e.day_count_days,
            e.accrual_fraction,
            e.market_rate_percent,
            e.fixed_payment,
            e.floating_payment,
            e.discount_factor,
            e.pv_fixed,
            e.pv_floating,
        );
    }
}
