use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One OHLCV observation for a fixed time bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// A malformed provider record fails the whole batch; there is no
/// partial-row recovery.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unparseable timestamp '{value}'")]
    InvalidTimestamp { value: String },

    #[error("non-numeric {field} value '{value}'")]
    InvalidPrice { field: &'static str, value: String },

    #[error("negative volume {value}")]
    NegativeVolume { value: i64 },

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}
