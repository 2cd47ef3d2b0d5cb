use crate::value_objects::candle::{Candle, ParseError};
use crate::value_objects::granularity::Granularity;
use thiserror::Error;

/// Failures from a candle provider. A failed fetch is not retried; callers
/// treat it as "no data" for that request.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("api error: status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Port for historical candle providers.
pub trait CandleFeed {
    /// Fetch up to `count` candles for one instrument and granularity, in
    /// the provider's own order.
    fn fetch_candles(
        &self,
        instrument: &str,
        granularity: Granularity,
        count: u32,
    ) -> Result<Vec<Candle>, FetchError>;

    /// Cheap reachability/credentials probe.
    fn check_connection(&self) -> Result<(), FetchError>;
}
