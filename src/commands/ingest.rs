use std::path::PathBuf;

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::services::store::SqliteStore;

pub async fn run(csv: Option<PathBuf>) {
    if let Err(e) = ingest(csv).await {
        eprintln!("❌ Ingest failed: {}", e);
        std::process::exit(1);
    }
}

async fn ingest(csv: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::from_env()?;
    let csv_path = csv.unwrap_or_else(|| config.csv_path());
    if !csv_path.exists() {
        return Err(AppError::NotFound(format!(
            "snapshot CSV not found: {} (run 'fetch' first)",
            csv_path.display()
        )));
    }

    let store = SqliteStore::open(&config.db_path()).await?;
    // The ingestion step logs failures and carries on; the table count below
    // is what callers check.
    match store.ingest_csv(&csv_path).await {
        Ok(rows) => {
            println!("🗄️  {} rows stored in {}", rows, config.db_path().display());
        }
        Err(e) => {
            tracing::error!("ingestion failed: {}", e);
            eprintln!("⚠️  Ingestion failed: {}", e);
        }
    }

    let count = store.count().await?;
    println!("📊 a_stock now holds {} rows", count);
    store.close().await;
    Ok(())
}
