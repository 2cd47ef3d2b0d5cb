use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use vela_domain::value_objects::granularity::Granularity;
use vela_infrastructure::market_data::oanda::OANDA_MAX_COUNT;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub api: ApiConfig,
    pub data: DataConfig,
    pub paths: PathsConfig,
    pub db: DbConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Not consulted by the fetch path; a fetch is a single attempt.
    pub max_retries: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    pub default_granularity: String,
    pub default_count: u32,
    /// Informational catalog; instruments outside it are still fetchable.
    pub supported_instruments: Vec<String>,
    pub max_null_percentage: f64,
    pub max_duplicate_percentage: f64,
    pub outlier_threshold: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    pub data_dir: String,
    pub out_dir: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct DbConfig {
    pub url: Option<String>,
    pub table: String,
    pub pool_max_size: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Range checks applied eagerly, before any component uses the values.
    pub fn validate(&self) -> Result<(), String> {
        self.data
            .default_granularity
            .parse::<Granularity>()
            .map_err(|err| format!("data.default_granularity: {err}"))?;

        if self.data.default_count == 0 || self.data.default_count > OANDA_MAX_COUNT {
            return Err(format!(
                "data.default_count must be between 1 and {OANDA_MAX_COUNT}, got {}",
                self.data.default_count
            ));
        }
        if self.data.outlier_threshold <= 0.0 {
            return Err(format!(
                "data.outlier_threshold must be > 0, got {}",
                self.data.outlier_threshold
            ));
        }
        for (name, value) in [
            ("data.max_null_percentage", self.data.max_null_percentage),
            (
                "data.max_duplicate_percentage",
                self.data.max_duplicate_percentage,
            ),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(format!("{name} must be within 0..=100, got {value}"));
            }
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config, String> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read config {}: {}", path.display(), err))?;
    toml::from_str(&contents)
        .map_err(|err| format!("failed to parse TOML {}: {}", path.display(), err))
}

pub fn resolve_db_url(config: &Config) -> Result<String, String> {
    resolve_db_url_with(config, |name| std::env::var(name).ok())
}

fn resolve_db_url_with(
    config: &Config,
    get: impl Fn(&str) -> Option<String>,
) -> Result<String, String> {
    match config.db.url.as_deref() {
        Some(url) if !url.trim().is_empty() => Ok(url.to_string()),
        _ => get("DATABASE_URL")
            .ok_or_else(|| "missing db.url in config and env DATABASE_URL is not set".to_string()),
    }
}
