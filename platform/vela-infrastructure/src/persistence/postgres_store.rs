use chrono::{DateTime, Utc};
use postgres::NoTls;
use r2d2::Pool;
use r2d2_postgres::PostgresConnectionManager;
use std::path::Path;
use std::time::Instant;
use vela_domain::value_objects::candle::Candle;
use vela_domain::value_objects::granularity::Granularity;

/// Pooled blocking Postgres store for candles. Not part of the hot path;
/// the CSV store is the default persistence target.
#[derive(Debug, Clone)]
pub struct PostgresCandleStore {
    pool: Pool<PostgresConnectionManager<NoTls>>,
    pub table: String,
}

impl PostgresCandleStore {
    pub fn new(db_url: &str, table: String, pool_max_size: u32) -> Result<Self, String> {
        if let Err(err) = validate_table_name(&table) {
            return Err(format!("invalid candles table '{}': {}", table, err));
        }

        let config = db_url
            .parse::<postgres::Config>()
            .map_err(|err| format!("invalid postgres db url: {err}"))?;
        let manager = PostgresConnectionManager::new(config, NoTls);
        let pool = Pool::builder()
            .max_size(pool_max_size)
            .build_unchecked(manager);

        Ok(Self { pool, table })
    }

    /// Upsert one batch in a single transaction, keyed on
    /// (instrument, granularity, time_utc).
    pub fn upsert_candles(
        &self,
        instrument: &str,
        granularity: Granularity,
        candles: &[Candle],
    ) -> Result<u64, String> {
        if candles.is_empty() {
            return Ok(0);
        }

        let span = tracing::info_span!(
            "infra.postgres.upsert_candles",
            table = %self.table,
            instrument = %instrument,
            granularity = %granularity
        );
        let _enter = span.enter();
        let start = Instant::now();

        let mut client = self.pool.get().map_err(|err| {
            metrics::counter!(
                "vela.infra.postgres.upsert_candles.errors_total",
                "stage" => "pool_get"
            )
            .increment(1);
            tracing::error!(error = %err, "failed to checkout postgres connection");
            format!("failed to checkout postgres connection: {err}")
        })?;

        let statement = client
            .prepare(&format!(
                "INSERT INTO {} (instrument, granularity, time_utc, open, high, low, close, volume) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
                 ON CONFLICT (instrument, granularity, time_utc) DO UPDATE SET \
                 open = EXCLUDED.open, \
                 high = EXCLUDED.high, \
                 low = EXCLUDED.low, \
                 close = EXCLUDED.close, \
                 volume = EXCLUDED.volume, \
                 ingested_at = NOW()",
                self.table
            ))
            .map_err(|err| format!("failed to prepare upsert: {err}"))?;

        let granularity_label = granularity.as_str();
        let mut transaction = client
            .transaction()
            .map_err(|err| format!("failed to start transaction: {err}"))?;

        let mut total = 0u64;
        for candle in candles {
            transaction
                .execute(
                    &statement,
                    &[
                        &instrument,
                        &granularity_label,
                        &candle.time,
                        &candle.open,
                        &candle.high,
                        &candle.low,
                        &candle.close,
                        &candle.volume,
                    ],
                )
                .map_err(|err| format!("upsert failed: {err}"))?;
            total += 1;
        }

        transaction
            .commit()
            .map_err(|err| format!("failed to commit: {err}"))?;

        metrics::histogram!("vela.infra.postgres.upsert_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);
        metrics::counter!("vela.infra.postgres.candles_upserted_total").increment(total);
        tracing::debug!(rows = total, "upserted candles");

        Ok(total)
    }

    /// Read candles back for one instrument/granularity, ordered by time.
    pub fn load_candles(
        &self,
        instrument: &str,
        granularity: Granularity,
    ) -> Result<Vec<Candle>, String> {
        let span = tracing::info_span!(
            "infra.postgres.load_candles",
            table = %self.table,
            instrument = %instrument,
            granularity = %granularity
        );
        let _enter = span.enter();
        let start = Instant::now();

        let mut client = self
            .pool
            .get()
            .map_err(|err| format!("failed to checkout postgres connection: {err}"))?;

        let query = format!(
            "SELECT time_utc, open, high, low, close, volume FROM {} \
             WHERE instrument=$1 AND granularity=$2 \
             ORDER BY time_utc ASC",
            self.table
        );
        let granularity_label = granularity.as_str();
        let rows = client
            .query(&query, &[&instrument, &granularity_label])
            .map_err(|err| format!("failed to query candles: {err}"))?;

        let mut candles = Vec::with_capacity(rows.len());
        for row in rows {
            let time: DateTime<Utc> = row.get(0);
            candles.push(Candle {
                time,
                open: row.get(1),
                high: row.get(2),
                low: row.get(3),
                close: row.get(4),
                volume: row.get(5),
            });
        }

        metrics::histogram!("vela.infra.postgres.load_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);
        tracing::debug!(rows = candles.len(), "loaded candles");

        Ok(candles)
    }
}

/// One-shot schema setup: apply the DDL file, then report the public tables
/// so the caller can verify the result.
pub fn apply_schema(db_url: &str, schema_path: &Path) -> Result<Vec<String>, String> {
    let sql = std::fs::read_to_string(schema_path).map_err(|err| {
        format!(
            "failed to read schema file {}: {}",
            schema_path.display(),
            err
        )
    })?;

    let mut client = postgres::Client::connect(db_url, NoTls)
        .map_err(|err| format!("failed to connect to postgres: {err}"))?;

    client
        .batch_execute(&sql)
        .map_err(|err| format!("failed to apply schema: {err}"))?;

    let rows = client
        .query(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = 'public' ORDER BY table_name",
            &[],
        )
        .map_err(|err| format!("failed to list tables: {err}"))?;

    Ok(rows.iter().map(|row| row.get::<_, String>(0)).collect())
}

fn validate_table_name(table: &str) -> Result<(), String> {
    if table.is_empty() {
        return Err("table name is empty".to_string());
    }
    let parts: Vec<&str> = table.split('.').collect();
    if parts.is_empty() || parts.len() > 2 {
        return Err(format!("invalid table name: {table}"));
    }
    for part in parts {
        if part.is_empty() {
            return Err(format!("invalid table name: {table}"));
        }
        let mut chars = part.chars();
        let first = match chars.next() {
            Some(ch) => ch,
            None => return Err(format!("invalid table name: {table}")),
        };
        if !(first.is_ascii_alphabetic() || first == '_') {
            return Err(format!("invalid table name: {table}"));
        }
        if !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
            return Err(format!("invalid table name: {table}"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{apply_schema, validate_table_name, PostgresCandleStore};
    use std::path::Path;

    #[test]
    fn validate_table_name_accepts_schema_qualified_names() {
        assert!(validate_table_name("candles").is_ok());
        assert!(validate_table_name("public.candles").is_ok());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("candles;drop").is_err());
        assert!(validate_table_name("a.b.c").is_err());
    }

    #[test]
    fn new_rejects_invalid_table_name_before_connect() {
        let err = PostgresCandleStore::new("postgres://localhost/vela", "candles;drop".to_string(), 1)
            .expect_err("invalid table name");
        assert!(err.contains("invalid table name"));
    }

    #[test]
    fn new_rejects_invalid_db_url() {
        let err = PostgresCandleStore::new("not a url", "candles".to_string(), 1)
            .expect_err("invalid db url should fail fast");
        assert!(err.contains("invalid postgres db url"));
    }

    #[test]
    fn empty_upsert_is_a_no_op_without_connecting() {
        let store = PostgresCandleStore::new("postgres://localhost:1/vela", "candles".to_string(), 1)
            .expect("store");
        let total = store
            .upsert_candles("EUR_USD", vela_domain::value_objects::granularity::Granularity::H1, &[])
            .expect("empty upsert");
        assert_eq!(total, 0);
    }

    #[test]
    fn apply_schema_reports_missing_schema_file_before_connecting() {
        let err = apply_schema(
            "postgres://localhost:1/vela",
            Path::new("/nonexistent/schema.sql"),
        )
        .expect_err("missing schema file");
        assert!(err.contains("failed to read schema file"));
    }
}
