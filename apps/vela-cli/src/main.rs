mod commands;
mod config;
mod obs;
mod output;

use clap::{Parser, Subcommand};
use commands::Command;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vela")]
#[command(about = "Vela candle data pipeline CLI", version, arg_required_else_help = true)]
#[command(
    after_help = "Examples:\n  vela fetch --config configs/vela.toml --instrument EUR_USD --granularity H1 --count 500\n  vela validate --input data/eur_usd_h1.csv --out report.json\n  vela migrate --db-url postgres://localhost/vela\n  vela doctor --config configs/vela.toml\n"
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Fetch candles, quality-check them, and persist to CSV (and optionally Postgres).
    Fetch {
        #[arg(long, default_value = "configs/vela.toml")]
        config: PathBuf,
        #[arg(long)]
        instrument: String,
        /// Provider granularity label (M1, M5, M15, M30, H1, H4, D, W, M).
        #[arg(long)]
        granularity: Option<String>,
        /// Number of candles to request (provider cap: 5000).
        #[arg(long)]
        count: Option<u32>,
        #[arg(long)]
        out: Option<PathBuf>,
        /// Also upsert the batch into Postgres.
        #[arg(long, default_value_t = false)]
        db: bool,
    },
    /// Run the data-quality checks over a candles CSV.
    Validate {
        #[arg(long)]
        input: PathBuf,
        /// Write the quality report as JSON.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Z-score threshold for the close-column outlier check.
        #[arg(long, default_value_t = 3.0)]
        threshold: f64,
    },
    /// Apply the SQL schema to the target database (one-shot setup).
    Migrate {
        #[arg(long)]
        db_url: Option<String>,
        #[arg(long, default_value = "migrations/0001_create_candles.sql")]
        schema_path: PathBuf,
    },
    /// Run the end-to-end pipeline check, step by step.
    Doctor {
        #[arg(long, default_value = "configs/vela.toml")]
        config: PathBuf,
    },
}

fn main() {
    output::print_banner();
    let cli = Cli::parse();
    let command = match cli.command {
        CliCommand::Fetch {
            config,
            instrument,
            granularity,
            count,
            out,
            db,
        } => Command::Fetch {
            config,
            instrument,
            granularity,
            count,
            out,
            db,
        },
        CliCommand::Validate {
            input,
            out,
            threshold,
        } => Command::Validate {
            input,
            out,
            threshold,
        },
        CliCommand::Migrate {
            db_url,
            schema_path,
        } => Command::Migrate {
            db_url,
            schema_path,
        },
        CliCommand::Doctor { config } => Command::Doctor { config },
    };

    if let Err(err) = commands::run(command) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
