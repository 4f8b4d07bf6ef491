use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::Result;
use crate::models::StockRecord;
use crate::services::snapshot_csv;

/// SQLite-backed store for the latest A-share snapshot.
///
/// Holds a connection pool for the lifetime of the value; `close` (or drop)
/// releases it on every exit path.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database and ensure the snapshot table exists.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePool::connect_with(options).await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS a_stock (
                code TEXT PRIMARY KEY,
                name TEXT,
                price REAL,
                change REAL,
                volume REAL,
                turnover REAL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Replace the whole snapshot.
    ///
    /// Runs as one transaction so a concurrent reader sees either the old or
    /// the new snapshot, never a mix.
    pub async fn replace_all(&self, records: &[StockRecord]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM a_stock").execute(&mut *tx).await?;

        let mut inserted = 0usize;
        for record in records {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO a_stock (code, name, price, change, volume, turnover)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&record.code)
            .bind(&record.name)
            .bind(record.price)
            .bind(record.change)
            .bind(record.volume)
            .bind(record.turnover)
            .execute(&mut *tx)
            .await?;
            inserted += 1;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// Ingest a snapshot CSV, replacing the table contents.
    pub async fn ingest_csv(&self, path: &Path) -> Result<usize> {
        let records = snapshot_csv::read_snapshot(path)?;
        let inserted = self.replace_all(&records).await?;
        info!(rows = inserted, csv = %path.display(), "snapshot ingested");
        Ok(inserted)
    }

    /// All rows for one code. An absent code yields an empty vec, not an error.
    pub async fn query_by_code(&self, code: &str) -> Result<Vec<StockRecord>> {
        let rows = sqlx::query_as::<_, StockRecord>(
            "SELECT code, name, price, change, volume, turnover FROM a_stock WHERE code = ?1",
        )
        .bind(code)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Distinct codes, sorted, for the dashboard dropdown.
    pub async fn list_codes(&self) -> Result<Vec<String>> {
        let codes = sqlx::query_scalar::<_, String>("SELECT DISTINCT code FROM a_stock ORDER BY code")
            .fetch_all(&self.pool)
            .await?;
        Ok(codes)
    }

    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM a_stock")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Close the pool. Dropping the store releases connections as well.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_temp_store(dir: &tempfile::TempDir) -> SqliteStore {
        SqliteStore::open(&dir.path().join("stock_data.db")).await.unwrap()
    }

    fn record(code: &str, price: f64) -> StockRecord {
        StockRecord {
            code: code.to_string(),
            name: format!("stock {}", code),
            price,
            change: 0.0,
            volume: 100.0,
            turnover: price * 100.0,
        }
    }

    #[tokio::test]
    async fn test_ingest_chinese_csv_normalizes_percent() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("a_stock_data.csv");
        std::fs::write(
            &csv_path,
            "代码,名称,最新价,涨跌幅,成交量,成交额\n600519,Moutai,1800.5,1.23%,320000,580000000\n",
        )
        .unwrap();

        let store = open_temp_store(&dir).await;
        let inserted = store.ingest_csv(&csv_path).await.unwrap();
        assert_eq!(inserted, 1);

        let rows = store.query_by_code("600519").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Moutai");
        assert_eq!(rows[0].price, 1800.5);
        assert_eq!(rows[0].change, 1.23);
        assert_eq!(rows[0].volume, 320000.0);
        assert_eq!(rows[0].turnover, 5.8e8);
        store.close().await;
    }

    #[tokio::test]
    async fn test_ingest_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("a_stock_data.csv");
        std::fs::write(
            &csv_path,
            "code,name,price,change,volume,turnover\n600519,Moutai,1800.5,1.23,320000,580000000\n",
        )
        .unwrap();

        let store = open_temp_store(&dir).await;
        store.ingest_csv(&csv_path).await.unwrap();
        let after_first = store.query_by_code("600519").await.unwrap();

        store.ingest_csv(&csv_path).await.unwrap();
        let after_second = store.query_by_code("600519").await.unwrap();

        assert_eq!(after_first, after_second);
        assert_eq!(store.count().await.unwrap(), 1);
        store.close().await;
    }

    #[tokio::test]
    async fn test_replace_drops_absent_codes() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_temp_store(&dir).await;

        store
            .replace_all(&[record("600519", 1800.5), record("000001", 10.5)])
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 2);

        store.replace_all(&[record("000001", 10.6)]).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.query_by_code("600519").await.unwrap().is_empty());
        assert_eq!(store.query_by_code("000001").await.unwrap()[0].price, 10.6);
        store.close().await;
    }

    #[tokio::test]
    async fn test_query_absent_code_returns_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_temp_store(&dir).await;
        store.replace_all(&[record("600519", 1800.5)]).await.unwrap();

        let rows = store.query_by_code("999999").await.unwrap();
        assert!(rows.is_empty());
        store.close().await;
    }

    #[tokio::test]
    async fn test_list_codes_sorted_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_temp_store(&dir).await;
        store
            .replace_all(&[record("600519", 1800.5), record("000001", 10.5)])
            .await
            .unwrap();

        let codes = store.list_codes().await.unwrap();
        assert_eq!(codes, vec!["000001".to_string(), "600519".to_string()]);
        store.close().await;
    }
}
