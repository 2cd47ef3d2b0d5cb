use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::Deserialize;
use std::fs;
use std::fs::File;
use std::path::Path;
use vela_domain::value_objects::candle::Candle;

/// Write candles as `time,open,high,low,close,volume` with a header row.
/// Floats use the shortest representation that round-trips.
pub fn write_candles_csv(path: &Path, candles: &[Candle]) -> Result<(), String> {
    let mut output = String::from("time,open,high,low,close,volume\n");
    for candle in candles {
        output.push_str(&format!(
            "{},{},{},{},{},{}\n",
            candle.time.to_rfc3339_opts(SecondsFormat::Secs, true),
            candle.open,
            candle.high,
            candle.low,
            candle.close,
            candle.volume
        ));
    }
    fs::write(path, output)
        .map_err(|err| format!("failed to write candles csv {}: {}", path.display(), err))
}

#[derive(Debug, Deserialize)]
struct CandleRecord {
    time: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: i64,
}

/// Read candles back in file order.
pub fn read_candles_csv(path: &Path) -> Result<Vec<Candle>, String> {
    let file = File::open(path)
        .map_err(|err| format!("failed to open candles csv {}: {}", path.display(), err))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut candles = Vec::new();
    for result in reader.deserialize::<CandleRecord>() {
        let record = result.map_err(|err| format!("failed to parse csv row: {}", err))?;
        let time = parse_timestamp(&record.time)?;
        if record.volume < 0 {
            return Err(format!(
                "negative volume {} at {}",
                record.volume, record.time
            ));
        }
        candles.push(Candle {
            time,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
        });
    }
    Ok(candles)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%z") {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    Err(format!("unsupported timestamp format: {value}"))
}

#[cfg(test)]
mod tests {
    use super::{read_candles_csv, write_candles_csv};
    use chrono::{TimeZone, Utc};
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};
    use vela_domain::value_objects::candle::Candle;

    fn unique_tmp_path(name: &str) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("vela_{name}_{}_{}", std::process::id(), now))
    }

    fn sample_candles() -> Vec<Candle> {
        vec![
            Candle {
                time: Utc.timestamp_opt(1_767_225_600, 0).single().expect("ts"),
                open: 1.10437,
                high: 1.10521,
                low: 1.10390,
                close: 1.10488,
                volume: 1200,
            },
            Candle {
                time: Utc.timestamp_opt(1_767_229_200, 0).single().expect("ts"),
                open: 1.10488,
                high: 1.10602,
                low: 1.10471,
                close: 1.10555,
                volume: 1431,
            },
        ]
    }

    #[test]
    fn round_trip_preserves_values_and_order() {
        let path = unique_tmp_path("candles_roundtrip.csv");
        let candles = sample_candles();

        write_candles_csv(&path, &candles).expect("write");
        let read = read_candles_csv(&path).expect("read");

        assert_eq!(read, candles);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn written_file_has_header_row() {
        let path = unique_tmp_path("candles_header.csv");
        write_candles_csv(&path, &sample_candles()).expect("write");

        let contents = fs::read_to_string(&path).expect("read file");
        assert!(contents.starts_with("time,open,high,low,close,volume\n"));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn empty_table_writes_header_only() {
        let path = unique_tmp_path("candles_empty.csv");
        write_candles_csv(&path, &[]).expect("write");

        let read = read_candles_csv(&path).expect("read");
        assert!(read.is_empty());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn read_accepts_naive_utc_timestamps() {
        let path = unique_tmp_path("candles_naive.csv");
        let csv_data = "time,open,high,low,close,volume\n\
2026-01-01 00:00:00,1.0,1.1,0.9,1.05,10\n";
        fs::write(&path, csv_data).expect("write csv");

        let read = read_candles_csv(&path).expect("read");
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].time.timestamp(), 1_767_225_600);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn read_rejects_unsupported_timestamp() {
        let path = unique_tmp_path("candles_badts.csv");
        let csv_data = "time,open,high,low,close,volume\n\
01/01/2026,1.0,1.1,0.9,1.05,10\n";
        fs::write(&path, csv_data).expect("write csv");

        let err = read_candles_csv(&path).expect_err("bad timestamp");
        assert!(err.contains("unsupported timestamp format"));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn read_rejects_negative_volume() {
        let path = unique_tmp_path("candles_negvol.csv");
        let csv_data = "time,open,high,low,close,volume\n\
2026-01-01T00:00:00Z,1.0,1.1,0.9,1.05,-3\n";
        fs::write(&path, csv_data).expect("write csv");

        let err = read_candles_csv(&path).expect_err("negative volume");
        assert!(err.contains("negative volume"));

        let _ = fs::remove_file(&path);
    }
}
