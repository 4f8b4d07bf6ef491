use crate::config::AppConfig;
use crate::error::Result;
use crate::services::store::SqliteStore;

pub async fn run() {
    if let Err(e) = show_status().await {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn show_status() -> Result<()> {
    let config = AppConfig::from_env()?;

    println!("📊 A-share Snapshot Status\n");
    println!("📁 Data directory: {}", config.data_dir.display());

    let csv_path = config.csv_path();
    if csv_path.exists() {
        let modified = std::fs::metadata(&csv_path)?.modified()?;
        let written: chrono::DateTime<chrono::Local> = modified.into();
        println!(
            "💾 Snapshot CSV: {} (written {})",
            csv_path.display(),
            written.format("%Y-%m-%d %H:%M:%S")
        );
    } else {
        println!("💾 Snapshot CSV: missing (run 'fetch')");
    }

    let db_path = config.db_path();
    if !db_path.exists() {
        println!("🗄️  Database: missing (run 'fetch')");
        return Ok(());
    }

    let store = SqliteStore::open(&db_path).await?;
    let rows = store.count().await?;
    let codes = store.list_codes().await?;
    store.close().await;

    println!(
        "🗄️  Database: {} ({} rows, {} codes)",
        db_path.display(),
        rows,
        codes.len()
    );
    Ok(())
}
