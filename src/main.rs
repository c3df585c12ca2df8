use anyhow::{Context, Result};
use clap::Parser;
use refep_rs::*;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::filter::LevelFilter;

/// Plot data for the convergence of REFEP calculations
///
/// Reads a Hamiltonian replica exchange log, accumulates the forward and reverse free energies
/// over the replica ladder, and writes them as a CSV table against simulation time.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Input REMD log file
    #[arg(short, long = "input", value_name = "FILE")]
    input: PathBuf,

    /// CSV file for the convergence table. By default, write it to stdout.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Time between exchange attempts in ps
    #[arg(
        short,
        long = "exchange-interval",
        visible_alias = "eaf",
        value_name = "PS"
    )]
    exchange_interval: f64,

    /// Add the difference between the forward and reverse free energies to show convergence
    #[arg(short, long = "diff")]
    diff: bool,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all log output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);
    debug!("Full CLI arguments parsed: {:?}", &cli);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn setup_logging(verbosity: u8, quiet: bool) {
    let level = if quiet {
        LevelFilter::OFF
    } else {
        match verbosity {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let remlog = HRemLog::from_path(&cli.input)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    info!(
        replicas = remlog.num_replicas(),
        exchanges = remlog.numexchg(),
        "Loaded exchange log"
    );

    let series = compute_series(remlog.ladder())?;
    let report = ConvergenceReport::builder()
        .series(series)
        .exchange_interval(cli.exchange_interval)
        .include_difference(cli.diff)
        .build()?;
    let summary = report.summary()?;

    let lines = format!(
        "The final, average free energy is {:.4}\nDisplay range: {:.4} to {:.4}\n",
        summary.converged_estimate, summary.display_range.low, summary.display_range.high
    );

    match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            report.write_csv(file)?;
            print!("{}", lines);
            println!("Saved {}. Done!", path.display());
        }
        None => {
            report.write_csv(io::stdout().lock())?;
            eprint!("{}", lines);
            io::stderr().flush()?;
        }
    }

    Ok(())
}
