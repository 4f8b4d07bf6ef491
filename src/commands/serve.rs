use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::error::Result;
use crate::server;
use crate::services::advisor::Advisor;
use crate::services::store::SqliteStore;

pub async fn run(port: u16) {
    if let Err(e) = serve(port).await {
        eprintln!("❌ Server failed: {}", e);
        std::process::exit(1);
    }
}

async fn serve(port: u16) -> Result<()> {
    let config = AppConfig::from_env()?;

    println!("🚀 Starting dashboard on http://127.0.0.1:{}", port);
    println!("📁 Data directory: {}", config.data_dir.display());

    let store = Arc::new(SqliteStore::open(&config.db_path()).await?);
    let count = store.count().await?;
    if count == 0 {
        eprintln!("⚠️  a_stock table is empty. Run 'fetch' first.");
    } else {
        println!("📊 {} stored rows", count);
    }

    let advisor = Arc::new(Advisor::new(
        &config.advisor_endpoint,
        Duration::from_secs(config.advisor_timeout_secs),
        config.advisor_max_tokens,
    )?);

    server::serve(store, advisor, port).await
}
