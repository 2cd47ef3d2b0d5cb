use crate::{obs, output};
use std::path::PathBuf;
use vela_domain::services::validation::validate_candles;
use vela_infrastructure::persistence::csv_store::read_candles_csv;

pub fn run(input: PathBuf, out: Option<PathBuf>, threshold: f64) -> Result<(), String> {
    obs::init_tracing("info", "text")?;

    let candles = read_candles_csv(&input)?;
    println!("loaded {} rows from {}", candles.len(), input.display());

    let report = validate_candles(&candles, threshold);
    output::print_quality_report(&report);

    if let Some(out_path) = out {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|err| format!("failed to serialize quality report: {err}"))?;
        std::fs::write(&out_path, json).map_err(|err| {
            format!(
                "failed to write quality report {}: {}",
                out_path.display(),
                err
            )
        })?;
        println!("report written to {}", out_path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::run;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_tmp_path(name: &str) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("vela_cli_{name}_{}_{}", std::process::id(), now))
    }

    #[test]
    fn validate_reads_csv_and_writes_report() {
        let csv_path = unique_tmp_path("validate.csv");
        let report_path = unique_tmp_path("report.json");
        let csv_data = "time,open,high,low,close,volume\n\
2026-01-01T00:00:00Z,1,1,1,1,1\n\
2026-01-01T01:00:00Z,1,1,1,1,2\n";
        fs::write(&csv_path, csv_data).expect("write csv");

        run(csv_path.clone(), Some(report_path.clone()), 3.0).expect("validate");

        let report = fs::read_to_string(&report_path).expect("report file");
        assert!(report.contains("\"passed\": true"));

        let _ = fs::remove_file(&csv_path);
        let _ = fs::remove_file(&report_path);
    }

    #[test]
    fn validate_fails_on_missing_input() {
        let err = run(PathBuf::from("/nonexistent/candles.csv"), None, 3.0)
            .expect_err("missing input");
        assert!(err.contains("failed to open candles csv"));
    }
}
