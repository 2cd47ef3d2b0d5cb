use crate::obs;
use std::path::PathBuf;
use vela_infrastructure::persistence::postgres_store::apply_schema;

pub fn run(db_url: Option<String>, schema_path: PathBuf) -> Result<(), String> {
    obs::init_tracing("info", "text")?;

    let db_url = match db_url {
        Some(url) if !url.trim().is_empty() => url,
        _ => std::env::var("DATABASE_URL")
            .map_err(|_| "missing --db-url and env DATABASE_URL is not set".to_string())?,
    };

    let tables = apply_schema(&db_url, &schema_path)?;
    println!("schema applied: {}", schema_path.display());
    println!("tables present: {}", tables.len());
    for table in &tables {
        println!("  - {table}");
    }

    Ok(())
}
