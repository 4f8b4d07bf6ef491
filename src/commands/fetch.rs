use std::path::PathBuf;
use std::time::Duration;

use crate::config::AppConfig;
use crate::error::Result;
use crate::services::eastmoney::EastMoneyClient;
use crate::services::snapshot_csv;
use crate::services::store::SqliteStore;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const PREVIEW_ROWS: usize = 5;

pub async fn run(output: Option<PathBuf>, no_ingest: bool) {
    if let Err(e) = fetch_snapshot(output, no_ingest).await {
        eprintln!("❌ Fetch failed: {}", e);
        std::process::exit(1);
    }
}

async fn fetch_snapshot(output: Option<PathBuf>, no_ingest: bool) -> Result<()> {
    let config = AppConfig::from_env()?;

    println!("📡 Fetching A-share spot snapshot...");
    let client = EastMoneyClient::new(FETCH_TIMEOUT)?;
    let records = client.fetch_spot().await?;
    println!("✅ Fetched {} instruments", records.len());

    println!("\n🔎 Preview:");
    for record in records.iter().take(PREVIEW_ROWS) {
        println!(
            "   {} {:<10} price={:<10} change={:>6.2}% volume={}",
            record.code, record.name, record.price, record.change, record.volume
        );
    }

    let csv_path = config.csv_path();
    snapshot_csv::write_snapshot(&csv_path, &records)?;
    println!("\n💾 Snapshot written to {}", csv_path.display());

    if let Some(dir) = output {
        let copy_path = dir.join("a_stock_data.csv");
        snapshot_csv::write_snapshot(&copy_path, &records)?;
        println!("💾 Copy written to {}", copy_path.display());
    }

    if no_ingest {
        return Ok(());
    }

    // Ingestion trouble is logged, not fatal; the snapshot CSV stays on disk.
    let store = SqliteStore::open(&config.db_path()).await?;
    match store.ingest_csv(&csv_path).await {
        Ok(rows) => {
            println!("🗄️  {} rows stored in {}", rows, config.db_path().display());
        }
        Err(e) => {
            tracing::error!("ingestion failed: {}", e);
            eprintln!("⚠️  Ingestion failed (snapshot CSV kept): {}", e);
        }
    }
    if store.count().await.unwrap_or(0) == 0 {
        eprintln!("⚠️  a_stock table is empty after ingestion");
    }
    store.close().await;
    Ok(())
}
