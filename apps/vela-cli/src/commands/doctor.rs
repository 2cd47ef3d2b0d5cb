use crate::config::{load_config, Config};
use crate::{obs, output};
use std::path::PathBuf;
use vela_domain::repositories::market_data::CandleFeed;
use vela_domain::services::validation::validate_candles;
use vela_domain::value_objects::granularity::Granularity;
use vela_infrastructure::market_data::oanda::{OandaClient, OandaCredentials};
use vela_infrastructure::persistence::csv_store::write_candles_csv;

/// Fetch probes matching the manual end-to-end check: two forex pairs and
/// one crypto instrument, sequentially.
const PROBES: [(&str, Granularity, u32); 3] = [
    ("EUR_USD", Granularity::H1, 500),
    ("USD_JPY", Granularity::H4, 500),
    ("BTC_USD", Granularity::D, 365),
];

/// Step-by-step pipeline check. Each step prints a pass/fail banner and the
/// run continues to the next independent step on failure.
pub fn run(config_path: PathBuf) -> Result<(), String> {
    output::print_header("VELA PIPELINE CHECK");
    let mut failures = 0usize;

    output::print_header("STEP 1: CONFIGURATION");
    let config = match load_config(&config_path).and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => {
            output::print_step(true, "configuration loaded and validated");
            print_config_summary(&config);
            config
        }
        Err(err) => {
            output::print_step(false, &format!("configuration: {err}"));
            return Err(err);
        }
    };
    obs::init_tracing(&config.log.level, &config.log.format)?;

    output::print_header("STEP 2: CREDENTIALS");
    let credentials = match OandaCredentials::from_env() {
        Ok(credentials) => {
            output::print_step(true, "credentials present");
            println!("  OANDA_API_TOKEN: {}", redact(&credentials.api_token));
            println!("  OANDA_ACCOUNT_ID: {}", redact(&credentials.account_id));
            println!("  OANDA_BASE_URL: {}", credentials.base_url);
            Some(credentials)
        }
        Err(err) => {
            output::print_step(false, &format!("credentials: {err}"));
            failures += 1;
            None
        }
    };

    output::print_header("STEP 3: API CONNECTION");
    let client = match credentials.map(OandaClient::new) {
        Some(Ok(client)) => match client.check_connection() {
            Ok(()) => {
                output::print_step(true, "connection check");
                Some(client)
            }
            Err(err) => {
                output::print_step(false, &format!("connection check: {err}"));
                failures += 1;
                None
            }
        },
        Some(Err(err)) => {
            output::print_step(false, &format!("client construction: {err}"));
            failures += 1;
            None
        }
        None => {
            output::print_step(false, "skipped (no credentials)");
            None
        }
    };

    output::print_header("STEP 4: FETCH AND VALIDATE");
    let mut fetched_rows: Vec<(&str, usize)> = Vec::new();
    if let Some(client) = &client {
        for (instrument, granularity, count) in PROBES {
            match client.fetch_candles(instrument, granularity, count) {
                Ok(candles) => {
                    output::print_step(
                        true,
                        &format!(
                            "{instrument} ({granularity}): retrieved {} candles",
                            candles.len()
                        ),
                    );
                    let report = validate_candles(&candles, config.data.outlier_threshold);
                    output::print_quality_report(&report);

                    let out_path = super::fetch::default_csv_path(
                        &config.paths.data_dir,
                        instrument,
                        granularity,
                    );
                    match persist(&out_path, &candles) {
                        Ok(()) => println!("saved to {}", out_path.display()),
                        Err(err) => {
                            output::print_step(false, &format!("{instrument}: {err}"));
                            failures += 1;
                        }
                    }
                    fetched_rows.push((instrument, candles.len()));
                }
                Err(err) => {
                    output::print_step(false, &format!("{instrument}: {err}"));
                    failures += 1;
                    fetched_rows.push((instrument, 0));
                }
            }
        }
    } else {
        output::print_step(false, "skipped (no client)");
    }

    output::print_header("SUMMARY");
    let total: usize = fetched_rows.iter().map(|(_, rows)| rows).sum();
    for (instrument, rows) in &fetched_rows {
        println!("  {instrument}: {rows} rows");
    }
    println!("  total rows: {total}");
    if failures == 0 {
        output::print_step(true, "all steps passed");
    } else {
        output::print_step(false, &format!("{failures} step(s) failed"));
    }

    Ok(())
}

fn persist(
    out_path: &std::path::Path,
    candles: &[vela_domain::value_objects::candle::Candle],
) -> Result<(), String> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|err| format!("failed to create {}: {}", parent.display(), err))?;
    }
    write_candles_csv(out_path, candles)
}

fn print_config_summary(config: &Config) {
    println!(
        "  api: max_retries={}, timeout_secs={}",
        config.api.max_retries, config.api.timeout_secs
    );
    println!(
        "  data: default_granularity={}, default_count={}, instruments={}",
        config.data.default_granularity,
        config.data.default_count,
        config.data.supported_instruments.len()
    );
    println!(
        "  quality: max_null_pct={}, max_duplicate_pct={}, outlier_threshold={}",
        config.data.max_null_percentage,
        config.data.max_duplicate_percentage,
        config.data.outlier_threshold
    );
    println!(
        "  paths: data_dir={}, out_dir={}",
        config.paths.data_dir, config.paths.out_dir
    );
    println!(
        "  db: table={}, url={}",
        config.db.table,
        if config.db.url.as_deref().unwrap_or("").is_empty() {
            "env DATABASE_URL"
        } else {
            "configured"
        }
    );
}

fn redact(value: &str) -> String {
    if value.len() > 10 {
        format!("{}...", &value[..10])
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::redact;

    #[test]
    fn redact_truncates_long_values() {
        assert_eq!(redact("0123456789abcdef"), "0123456789...");
        assert_eq!(redact("short"), "short");
    }
}
