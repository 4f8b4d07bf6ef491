use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::services::store::SqliteStore;

pub async fn run(code: &str) {
    if let Err(e) = query(code).await {
        eprintln!("❌ Query failed: {}", e);
        std::process::exit(1);
    }
}

async fn query(code: &str) -> Result<()> {
    let config = AppConfig::from_env()?;
    let db_path = config.db_path();
    if !db_path.exists() {
        return Err(AppError::NotFound(format!(
            "database not found: {} (run 'fetch' first)",
            db_path.display()
        )));
    }

    let store = SqliteStore::open(&db_path).await?;
    let rows = store.query_by_code(code.trim()).await?;
    store.close().await;

    if rows.is_empty() {
        println!("No rows for stock code {}", code);
        return Ok(());
    }

    println!("📋 {} row(s) for {}:", rows.len(), code);
    for row in &rows {
        println!(
            "   {} {} price={} change={:.2}% volume={} turnover={}",
            row.code, row.name, row.price, row.change, row.volume, row.turnover
        );
    }
    Ok(())
}
