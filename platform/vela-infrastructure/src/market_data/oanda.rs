use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use vela_domain::repositories::market_data::{CandleFeed, FetchError};
use vela_domain::value_objects::candle::{Candle, ParseError};
use vela_domain::value_objects::granularity::Granularity;

/// Provider-side cap on candles per request.
pub const OANDA_MAX_COUNT: u32 = 5000;

/// Credentials are validated eagerly, before any request is made.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set in environment")]
    MissingVar(&'static str),

    #[error("{0} is empty")]
    EmptyVar(&'static str),
}

#[derive(Debug, Clone)]
pub struct OandaCredentials {
    pub api_token: String,
    pub account_id: String,
    pub base_url: String,
}

impl OandaCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            api_token: required(&get, "OANDA_API_TOKEN")?,
            account_id: required(&get, "OANDA_ACCOUNT_ID")?,
            base_url: required(&get, "OANDA_BASE_URL")?,
        })
    }
}

fn required(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    match get(name) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        Some(_) => Err(ConfigError::EmptyVar(name)),
        None => Err(ConfigError::MissingVar(name)),
    }
}

#[derive(Debug, Deserialize)]
struct CandlesResponse {
    candles: Vec<RawCandle>,
}

/// One raw provider record: ISO-8601 time, integer volume, and mid prices
/// as strings.
#[derive(Debug, Deserialize)]
pub struct RawCandle {
    pub time: String,
    pub volume: i64,
    pub mid: MidPrice,
}

#[derive(Debug, Deserialize)]
pub struct MidPrice {
    pub o: String,
    pub h: String,
    pub l: String,
    pub c: String,
}

/// Coerce raw provider records into candles, in provider order. The first
/// bad record fails the batch.
pub fn parse_candles(records: &[RawCandle]) -> Result<Vec<Candle>, ParseError> {
    let mut candles = Vec::with_capacity(records.len());
    for record in records {
        let time = parse_rfc3339(&record.time)?;
        if record.volume < 0 {
            return Err(ParseError::NegativeVolume {
                value: record.volume,
            });
        }
        candles.push(Candle {
            time,
            open: parse_price(&record.mid.o, "open")?,
            high: parse_price(&record.mid.h, "high")?,
            low: parse_price(&record.mid.l, "low")?,
            close: parse_price(&record.mid.c, "close")?,
            volume: record.volume,
        });
    }
    Ok(candles)
}

fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>, ParseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ParseError::InvalidTimestamp {
            value: value.to_string(),
        })
}

fn parse_price(value: &str, field: &'static str) -> Result<f64, ParseError> {
    value.parse::<f64>().map_err(|_| ParseError::InvalidPrice {
        field,
        value: value.to_string(),
    })
}

/// Blocking OANDA v3 client. One request per fetch; no retries.
pub struct OandaClient {
    client: Client,
    api_token: String,
    account_id: String,
    base_url: String,
}

impl OandaClient {
    pub fn new(credentials: OandaCredentials) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| format!("failed to build http client: {err}"))?;

        Ok(Self {
            client,
            api_token: credentials.api_token,
            account_id: credentials.account_id,
            base_url: credentials.base_url,
        })
    }

    fn candles_url(&self, instrument: &str) -> String {
        format!(
            "{}/v3/instruments/{}/candles",
            self.base_url.trim_end_matches('/'),
            instrument
        )
    }

    fn accounts_url(&self) -> String {
        format!(
            "{}/v3/accounts/{}",
            self.base_url.trim_end_matches('/'),
            self.account_id
        )
    }
}

impl CandleFeed for OandaClient {
    fn fetch_candles(
        &self,
        instrument: &str,
        granularity: Granularity,
        count: u32,
    ) -> Result<Vec<Candle>, FetchError> {
        if count == 0 || count > OANDA_MAX_COUNT {
            return Err(FetchError::Validation(format!(
                "count must be between 1 and {OANDA_MAX_COUNT}, got {count}"
            )));
        }

        let url = self.candles_url(instrument);
        let span = tracing::info_span!(
            "infra.oanda.fetch_candles",
            instrument = %instrument,
            granularity = %granularity,
            count
        );
        let _enter = span.enter();

        metrics::counter!("vela.infra.oanda.requests_total", "endpoint" => "candles")
            .increment(1);
        let start = Instant::now();

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_token)
            .query(&[
                ("granularity", granularity.as_str()),
                ("count", &count.to_string()),
            ])
            .send()
            .map_err(|err| {
                metrics::counter!(
                    "vela.infra.oanda.errors_total",
                    "endpoint" => "candles",
                    "kind" => "transport"
                )
                .increment(1);
                tracing::warn!(error = %err, "candles request failed");
                FetchError::Network(err.to_string())
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            metrics::counter!(
                "vela.infra.oanda.errors_total",
                "endpoint" => "candles",
                "kind" => "auth"
            )
            .increment(1);
            return Err(FetchError::Auth(format!(
                "provider rejected credentials (status {})",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            metrics::counter!(
                "vela.infra.oanda.errors_total",
                "endpoint" => "candles",
                "kind" => "http_status"
            )
            .increment(1);
            return Err(FetchError::Api {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        let payload: CandlesResponse = response
            .json()
            .map_err(|err| ParseError::MalformedResponse(err.to_string()))?;
        let candles = parse_candles(&payload.candles)?;

        metrics::histogram!("vela.infra.oanda.fetch_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);
        metrics::counter!("vela.infra.oanda.candles_fetched_total")
            .increment(candles.len() as u64);
        tracing::debug!(rows = candles.len(), "fetched candles");

        Ok(candles)
    }

    fn check_connection(&self) -> Result<(), FetchError> {
        let url = self.accounts_url();
        let span = tracing::info_span!("infra.oanda.check_connection", endpoint = %url);
        let _enter = span.enter();

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_token)
            .send()
            .map_err(|err| FetchError::Network(err.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::Auth(format!(
                "provider rejected credentials (status {})",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(FetchError::Api {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        tracing::debug!("connection check succeeded");
        Ok(())
    }
}
