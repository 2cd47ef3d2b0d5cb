mod doctor;
mod fetch;
mod migrate;
mod validate;

use std::path::PathBuf;

pub enum Command {
    Fetch {
        config: PathBuf,
        instrument: String,
        granularity: Option<String>,
        count: Option<u32>,
        out: Option<PathBuf>,
        db: bool,
    },
    Validate {
        input: PathBuf,
        out: Option<PathBuf>,
        threshold: f64,
    },
    Migrate {
        db_url: Option<String>,
        schema_path: PathBuf,
    },
    Doctor {
        config: PathBuf,
    },
}

pub fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Fetch {
            config,
            instrument,
            granularity,
            count,
            out,
            db,
        } => fetch::run(config, instrument, granularity, count, out, db),
        Command::Validate {
            input,
            out,
            threshold,
        } => validate::run(input, out, threshold),
        Command::Migrate {
            db_url,
            schema_path,
        } => migrate::run(db_url, schema_path),
        Command::Doctor { config } => doctor::run(config),
    }
}
