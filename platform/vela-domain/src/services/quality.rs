use crate::value_objects::candle::Candle;
use serde::Serialize;
use std::collections::HashSet;

pub const DEFAULT_OUTLIER_THRESHOLD: f64 = 3.0;

/// Fields per row for the null percentage denominator: time, open, high,
/// low, close, volume.
const FIELDS_PER_ROW: usize = 6;

/// Column selector for the outlier check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl Column {
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Open => "open",
            Column::High => "high",
            Column::Low => "low",
            Column::Close => "close",
            Column::Volume => "volume",
        }
    }

    fn value(&self, candle: &Candle) -> f64 {
        match self {
            Column::Open => candle.open,
            Column::High => candle.high,
            Column::Low => candle.low,
            Column::Close => candle.close,
            Column::Volume => candle.volume as f64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NullReport {
    pub has_nulls: bool,
    pub null_count: usize,
    pub null_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateReport {
    pub has_duplicates: bool,
    pub duplicate_count: usize,
    pub duplicate_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierReport {
    pub column: Column,
    pub threshold: f64,
    pub has_outliers: bool,
    pub outlier_count: usize,
    pub outlier_percentage: f64,
}

/// Count missing values across all fields of all rows. Time and volume
/// cannot be unset after parsing, so a value is missing iff a price field
/// is non-finite; the denominator stays rows x fields.
pub fn check_nulls(candles: &[Candle]) -> NullReport {
    let mut null_count = 0;
    for candle in candles {
        for column in [Column::Open, Column::High, Column::Low, Column::Close] {
            if !column.value(candle).is_finite() {
                null_count += 1;
            }
        }
    }

    let total_values = candles.len() * FIELDS_PER_ROW;
    let null_percentage = if total_values == 0 {
        0.0
    } else {
        round2(null_count as f64 / total_values as f64 * 100.0)
    };

    NullReport {
        has_nulls: null_count > 0,
        null_count,
        null_percentage,
    }
}

/// Count rows that are exact full-row duplicates of an earlier row.
pub fn check_duplicates(candles: &[Candle]) -> DuplicateReport {
    let mut seen = HashSet::with_capacity(candles.len());
    let mut duplicate_count = 0;
    for candle in candles {
        let key = (
            candle.time,
            candle.open.to_bits(),
            candle.high.to_bits(),
            candle.low.to_bits(),
            candle.close.to_bits(),
            candle.volume,
        );
        if !seen.insert(key) {
            duplicate_count += 1;
        }
    }

    DuplicateReport {
        has_duplicates: duplicate_count > 0,
        duplicate_count,
        duplicate_percentage: percentage_of_rows(duplicate_count, candles.len()),
    }
}

/// Flag rows whose column value lies more than `threshold` sample standard
/// deviations from the column mean. A column with zero or undefined
/// deviation flags nothing.
pub fn check_outliers(candles: &[Candle], column: Column, threshold: f64) -> OutlierReport {
    let values: Vec<f64> = candles.iter().map(|candle| column.value(candle)).collect();

    let outlier_count = match sample_stats(&values) {
        Some((mean, std)) if std.is_finite() && std > 0.0 => {
            let cutoff = threshold * std;
            values.iter().filter(|v| (**v - mean).abs() > cutoff).count()
        }
        _ => 0,
    };

    OutlierReport {
        column,
        threshold,
        has_outliers: outlier_count > 0,
        outlier_count,
        outlier_percentage: percentage_of_rows(outlier_count, candles.len()),
    }
}

/// Mean and sample standard deviation (ddof = 1). None for fewer than two
/// values.
fn sample_stats(values: &[f64]) -> Option<(f64, f64)> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some((mean, variance.sqrt()))
}

fn percentage_of_rows(count: usize, rows: usize) -> f64 {
    if rows == 0 {
        0.0
    } else {
        round2(count as f64 / rows as f64 * 100.0)
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::{check_duplicates, check_nulls, check_outliers, round2, Column};
    use crate::value_objects::candle::Candle;
    use chrono::{TimeZone, Utc};

    fn candle(ts: i64, close: f64) -> Candle {
        Candle {
            time: Utc.timestamp_opt(ts, 0).single().expect("timestamp"),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1,
        }
    }

    #[test]
    fn clean_table_has_no_nulls() {
        let candles = vec![candle(0, 1.0), candle(60, 2.0)];
        let report = check_nulls(&candles);
        assert!(!report.has_nulls);
        assert_eq!(report.null_count, 0);
        assert_eq!(report.null_percentage, 0.0);
    }

    #[test]
    fn non_finite_prices_count_as_nulls() {
        let mut bad = candle(60, 2.0);
        bad.high = f64::NAN;
        let candles = vec![candle(0, 1.0), bad];

        let report = check_nulls(&candles);
        assert!(report.has_nulls);
        assert_eq!(report.null_count, 1);
        // 1 missing out of 2 rows x 6 fields
        assert_eq!(report.null_percentage, 8.33);
    }

    #[test]
    fn ten_identical_rows_are_nine_duplicates() {
        let candles: Vec<Candle> = (0..10).map(|_| candle(0, 1.0)).collect();
        let report = check_duplicates(&candles);
        assert!(report.has_duplicates);
        assert_eq!(report.duplicate_count, 9);
        assert_eq!(report.duplicate_percentage, 90.0);
    }

    #[test]
    fn non_adjacent_duplicates_are_counted() {
        let candles = vec![candle(0, 1.0), candle(60, 2.0), candle(0, 1.0)];
        let report = check_duplicates(&candles);
        assert_eq!(report.duplicate_count, 1);
        assert_eq!(report.duplicate_percentage, 33.33);
    }

    #[test]
    fn same_time_different_prices_is_not_a_duplicate() {
        let candles = vec![candle(0, 1.0), candle(0, 2.0)];
        let report = check_duplicates(&candles);
        assert!(!report.has_duplicates);
        assert_eq!(report.duplicate_count, 0);
    }

    #[test]
    fn single_spike_is_flagged_where_its_z_score_crosses() {
        // z-score of the 100 against the sample deviation is ~2.04
        let closes = [1.0, 1.0, 1.0, 1.0, 1.0, 100.0];
        let candles: Vec<Candle> = closes
            .iter()
            .enumerate()
            .map(|(idx, c)| candle(idx as i64 * 60, *c))
            .collect();

        let report = check_outliers(&candles, Column::Close, 2.0);
        assert!(report.has_outliers);
        assert_eq!(report.outlier_count, 1);
        assert_eq!(report.outlier_percentage, 16.67);

        let strict = check_outliers(&candles, Column::Close, 3.0);
        assert_eq!(strict.outlier_count, 0);
    }

    #[test]
    fn constant_column_flags_nothing() {
        let candles: Vec<Candle> = (0..6).map(|idx| candle(idx * 60, 5.0)).collect();
        let report = check_outliers(&candles, Column::Close, 3.0);
        assert!(!report.has_outliers);
        assert_eq!(report.outlier_count, 0);
        assert_eq!(report.outlier_percentage, 0.0);
    }

    #[test]
    fn empty_table_returns_zeroes_everywhere() {
        let candles: Vec<Candle> = Vec::new();

        let nulls = check_nulls(&candles);
        assert!(!nulls.has_nulls);
        assert_eq!(nulls.null_percentage, 0.0);

        let duplicates = check_duplicates(&candles);
        assert!(!duplicates.has_duplicates);
        assert_eq!(duplicates.duplicate_percentage, 0.0);

        let outliers = check_outliers(&candles, Column::Close, 3.0);
        assert!(!outliers.has_outliers);
        assert_eq!(outliers.outlier_percentage, 0.0);
    }

    #[test]
    fn volume_column_is_checked_as_f64() {
        let mut spike = candle(300, 1.0);
        spike.volume = 1_000_000;
        let mut candles: Vec<Candle> = (0..5).map(|idx| candle(idx * 60, 1.0)).collect();
        candles.push(spike);

        let report = check_outliers(&candles, Column::Volume, 2.0);
        assert_eq!(report.outlier_count, 1);
    }

    #[test]
    fn round2_truncates_to_two_decimals() {
        assert_eq!(round2(16.666_666), 16.67);
        assert_eq!(round2(90.0), 90.0);
        assert_eq!(round2(0.004), 0.0);
    }
}
