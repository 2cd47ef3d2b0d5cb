use vela_domain::services::validation::QualityReport;

pub fn print_banner() {
    println!("vela: candle fetch / quality-check / persist pipeline");
}

pub fn print_header(text: &str) {
    println!();
    println!("{}", "=".repeat(60));
    println!("  {text}");
    println!("{}", "=".repeat(60));
}

pub fn print_step(ok: bool, text: &str) {
    if ok {
        println!("PASS: {text}");
    } else {
        println!("FAIL: {text}");
    }
}

pub fn print_quality_report(report: &QualityReport) {
    println!(
        "nulls: count={} pct={:.2}",
        report.nulls.null_count, report.nulls.null_percentage
    );
    println!(
        "duplicates: count={} pct={:.2}",
        report.duplicates.duplicate_count, report.duplicates.duplicate_percentage
    );
    println!(
        "{} outliers (threshold {}): count={} pct={:.2}",
        report.close_outliers.column.as_str(),
        report.close_outliers.threshold,
        report.close_outliers.outlier_count,
        report.close_outliers.outlier_percentage
    );
    println!(
        "validation: {}",
        if report.passed { "PASSED" } else { "FAILED" }
    );
}
