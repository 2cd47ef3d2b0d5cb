use crate::services::quality::{
    check_duplicates, check_nulls, check_outliers, Column, DuplicateReport, NullReport,
    OutlierReport,
};
use crate::value_objects::candle::Candle;
use serde::Serialize;

/// Immutable snapshot of all quality checks over one candle table.
///
/// The close-column outlier result is informational only: outliers are
/// reported but never block a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub nulls: NullReport,
    pub duplicates: DuplicateReport,
    pub close_outliers: OutlierReport,
    pub passed: bool,
}

pub fn validate_candles(candles: &[Candle], outlier_threshold: f64) -> QualityReport {
    let nulls = check_nulls(candles);
    let duplicates = check_duplicates(candles);
    let close_outliers = check_outliers(candles, Column::Close, outlier_threshold);
    let passed = !nulls.has_nulls && !duplicates.has_duplicates;

    QualityReport {
        nulls,
        duplicates,
        close_outliers,
        passed,
    }
}
