use std::time::Duration;

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::services::advisor::{self, Advisor};
use crate::services::store::SqliteStore;

pub async fn run(code: &str) {
    if let Err(e) = advise(code).await {
        eprintln!("❌ Advise failed: {}", e);
        std::process::exit(1);
    }
}

async fn advise(code: &str) -> Result<()> {
    let config = AppConfig::from_env()?;
    let code = code.trim();

    let store = SqliteStore::open(&config.db_path()).await?;
    let rows = store.query_by_code(code).await?;
    store.close().await;

    if rows.is_empty() {
        return Err(AppError::NotFound(format!("no data for stock code {}", code)));
    }
    let Some(inputs) = advisor::advice_inputs(&rows) else {
        return Err(AppError::InvalidInput(
            "insufficient data to generate advice".to_string(),
        ));
    };

    let advisor = Advisor::new(
        &config.advisor_endpoint,
        Duration::from_secs(config.advisor_timeout_secs),
        config.advisor_max_tokens,
    )?;

    println!(
        "🤖 Asking {} about {} ({})...",
        config.advisor_endpoint, inputs.name, inputs.code
    );
    // An unavailable advisor is a reported outcome, not a process failure.
    match advisor.advise(&inputs).await {
        Ok(advice) => {
            println!("\n💡 Suggestion:\n{}", advice);
        }
        Err(e) => {
            tracing::warn!("advice unavailable: {}", e);
            println!("\n⚠️  No advice available: {}", e);
        }
    }
    Ok(())
}
