use std::path::PathBuf;

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::services::chart;
use crate::services::store::SqliteStore;

pub async fn run(code: &str, output: Option<PathBuf>) {
    if let Err(e) = render(code, output).await {
        eprintln!("❌ Chart failed: {}", e);
        std::process::exit(1);
    }
}

async fn render(code: &str, output: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::from_env()?;
    let code = code.trim();

    let store = SqliteStore::open(&config.db_path()).await?;
    let rows = store.query_by_code(code).await?;
    store.close().await;

    if rows.is_empty() {
        return Err(AppError::NotFound(format!("no data for stock code {}", code)));
    }

    let out_dir = output.unwrap_or_else(|| config.data_dir.clone());
    std::fs::create_dir_all(&out_dir)?;

    let price_path = out_dir.join(format!("{}_price.svg", code));
    std::fs::write(&price_path, chart::price_chart_svg(&rows, code)?)?;
    println!("📈 {}", price_path.display());

    let volume_path = out_dir.join(format!("{}_volume_change.svg", code));
    std::fs::write(&volume_path, chart::volume_change_chart_svg(&rows, code)?)?;
    println!("📊 {}", volume_path.display());

    Ok(())
}
