use crate::config::{load_config, resolve_db_url};
use crate::{obs, output};
use std::path::PathBuf;
use vela_domain::repositories::market_data::CandleFeed;
use vela_domain::services::validation::validate_candles;
use vela_domain::value_objects::granularity::Granularity;
use vela_infrastructure::market_data::oanda::{OandaClient, OandaCredentials};
use vela_infrastructure::persistence::csv_store::write_candles_csv;
use vela_infrastructure::persistence::postgres_store::PostgresCandleStore;

pub fn run(
    config_path: PathBuf,
    instrument: String,
    granularity: Option<String>,
    count: Option<u32>,
    out: Option<PathBuf>,
    db: bool,
) -> Result<(), String> {
    let config = load_config(&config_path)?;
    config.validate()?;
    obs::init_tracing(&config.log.level, &config.log.format)?;

    let granularity_label =
        granularity.unwrap_or_else(|| config.data.default_granularity.clone());
    let granularity: Granularity = granularity_label.parse()?;
    let count = count.unwrap_or(config.data.default_count);

    let credentials = OandaCredentials::from_env().map_err(|err| err.to_string())?;
    let client = OandaClient::new(credentials)?;

    tracing::info!(
        instrument = %instrument,
        granularity = %granularity,
        count,
        "fetching candles"
    );
    let candles = client
        .fetch_candles(&instrument, granularity, count)
        .map_err(|err| err.to_string())?;
    println!(
        "retrieved {} candles for {} ({})",
        candles.len(),
        instrument,
        granularity
    );

    let report = validate_candles(&candles, config.data.outlier_threshold);
    output::print_quality_report(&report);

    let out_path =
        out.unwrap_or_else(|| default_csv_path(&config.paths.data_dir, &instrument, granularity));
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|err| format!("failed to create {}: {}", parent.display(), err))?;
    }
    write_candles_csv(&out_path, &candles)?;
    println!("saved {} rows to {}", candles.len(), out_path.display());

    if db {
        let db_url = resolve_db_url(&config)?;
        let store = PostgresCandleStore::new(
            &db_url,
            config.db.table.clone(),
            config.db.pool_max_size.unwrap_or(8),
        )?;
        let upserts = store.upsert_candles(&instrument, granularity, &candles)?;
        println!("upserted {} rows into {}", upserts, store.table);
    }

    Ok(())
}

pub fn default_csv_path(data_dir: &str, instrument: &str, granularity: Granularity) -> PathBuf {
    PathBuf::from(data_dir).join(format!(
        "{}_{}.csv",
        instrument.to_lowercase(),
        granularity.as_str().to_lowercase()
    ))
}

#[cfg(test)]
mod tests {
    use super::default_csv_path;
    use std::path::PathBuf;
    use vela_domain::value_objects::granularity::Granularity;

    #[test]
    fn default_csv_path_is_lowercased() {
        let path = default_csv_path("data/", "EUR_USD", Granularity::H1);
        assert_eq!(path, PathBuf::from("data/eur_usd_h1.csv"));
    }
}
