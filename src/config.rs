use std::path::PathBuf;

use crate::error::{AppError, Result};

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_ADVISOR_ENDPOINT: &str = "http://127.0.0.1:1234";
const DEFAULT_ADVISOR_TIMEOUT_SECS: u64 = 60;
const DEFAULT_ADVISOR_MAX_TOKENS: u32 = 256;

/// Runtime configuration resolved from environment variables with defaults.
///
/// Passed explicitly to the components that need it instead of living in
/// module-level path constants.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the snapshot CSV and the SQLite database.
    pub data_dir: PathBuf,
    /// Base URL of the local completions endpoint.
    pub advisor_endpoint: String,
    /// One timeout for every advise call, CLI and dashboard alike.
    pub advisor_timeout_secs: u64,
    pub advisor_max_tokens: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let data_dir = std::env::var("STOCK_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));

        let advisor_endpoint = std::env::var("ADVISOR_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_ADVISOR_ENDPOINT.to_string())
            .trim_end_matches('/')
            .to_string();

        let advisor_timeout_secs = match std::env::var("ADVISOR_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| {
                AppError::Config(format!(
                    "ADVISOR_TIMEOUT_SECS must be an integer number of seconds, got '{}'",
                    raw
                ))
            })?,
            Err(_) => DEFAULT_ADVISOR_TIMEOUT_SECS,
        };

        let advisor_max_tokens = match std::env::var("ADVISOR_MAX_TOKENS") {
            Ok(raw) => raw.parse::<u32>().map_err(|_| {
                AppError::Config(format!("ADVISOR_MAX_TOKENS must be an integer, got '{}'", raw))
            })?,
            Err(_) => DEFAULT_ADVISOR_MAX_TOKENS,
        };

        Ok(Self {
            data_dir,
            advisor_endpoint,
            advisor_timeout_secs,
            advisor_max_tokens,
        })
    }

    /// Path of the snapshot CSV written by `fetch`.
    pub fn csv_path(&self) -> PathBuf {
        self.data_dir.join("a_stock_data.csv")
    }

    /// Path of the SQLite database file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("stock_data.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_join_data_dir() {
        let config = AppConfig {
            data_dir: PathBuf::from("/tmp/stocks"),
            advisor_endpoint: DEFAULT_ADVISOR_ENDPOINT.to_string(),
            advisor_timeout_secs: DEFAULT_ADVISOR_TIMEOUT_SECS,
            advisor_max_tokens: DEFAULT_ADVISOR_MAX_TOKENS,
        };
        assert_eq!(config.csv_path(), PathBuf::from("/tmp/stocks/a_stock_data.csv"));
        assert_eq!(config.db_path(), PathBuf::from("/tmp/stocks/stock_data.db"));
    }
}
