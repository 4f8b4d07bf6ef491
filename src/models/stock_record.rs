use serde::{Deserialize, Serialize};

/// One instrument in the A-share spot snapshot.
///
/// # Percent Format
/// `change` is stored in percent points exactly as the provider reports it:
/// `1.23` means +1.23%. It is never divided by 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StockRecord {
    /// Exchange code, e.g. "600519". Kept as text so leading zeros survive.
    pub code: String,

    /// Display name.
    pub name: String,

    /// Latest quoted price in CNY.
    pub price: f64,

    /// Signed percent change in points.
    pub change: f64,

    /// Shares traded.
    pub volume: f64,

    /// Turnover in CNY.
    pub turnover: f64,
}
