use std::time::Duration;

use isahc::{config::Configurable, prelude::*, HttpClient};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::models::StockRecord;

const SPOT_URL: &str = "https://push2.eastmoney.com/api/qt/clist/get";

/// Board filter covering the SH, SZ and BJ A-share listings.
const SPOT_BOARDS: &str = "m:0+t:6,m:0+t:80,m:1+t:2,m:1+t:23,m:0+t:81+s:2048";

/// f12 code, f14 name, f2 latest price, f3 percent change, f5 volume, f6 turnover
const SPOT_FIELDS: &str = "f12,f14,f2,f3,f5,f6";

const PAGE_SIZE: usize = 200;

/// HTTP client for the EastMoney push2 quote API.
pub struct EastMoneyClient {
    client: HttpClient,
}

impl EastMoneyClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = HttpClient::builder()
            .timeout(timeout)
            .default_header(
                "User-Agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            )
            .default_header("Accept", "application/json, text/plain, */*")
            .default_header("Referer", "https://quote.eastmoney.com")
            .build()?;
        Ok(Self { client })
    }

    /// Fetch the full-market A-share spot snapshot.
    ///
    /// Pages through the quote list until the reported total is collected.
    /// Provider failures propagate to the caller; there is no retry, the HTTP
    /// timeout bounds each page call.
    pub async fn fetch_spot(&self) -> Result<Vec<StockRecord>> {
        let mut records = Vec::new();
        let mut skipped = 0usize;
        let mut page = 1usize;

        loop {
            let url = format!(
                "{}?pn={}&pz={}&po=1&np=1&fltt=2&invt=2&fid=f3&fs={}&fields={}",
                SPOT_URL, page, PAGE_SIZE, SPOT_BOARDS, SPOT_FIELDS
            );
            debug!(page, "requesting spot quote page");

            let mut response = self.client.get_async(url.as_str()).await?;
            let status = response.status();
            if !status.is_success() {
                return Err(AppError::Network(format!(
                    "spot quote request returned HTTP {}",
                    status.as_u16()
                )));
            }
            let body = response
                .text()
                .await
                .map_err(|e| AppError::Network(format!("spot response body: {}", e)))?;

            let json: Value = serde_json::from_str(&body)?;
            let data = json
                .get("data")
                .filter(|d| !d.is_null())
                .ok_or_else(|| AppError::Parse("spot response has no data field".to_string()))?;
            let total = data.get("total").and_then(Value::as_u64).unwrap_or(0) as usize;

            let Some(diff) = data.get("diff").and_then(Value::as_array) else {
                break;
            };
            if diff.is_empty() {
                break;
            }

            for item in diff {
                match parse_spot_item(item) {
                    Some(record) => records.push(record),
                    None => skipped += 1,
                }
            }

            if diff.len() < PAGE_SIZE || records.len() + skipped >= total {
                break;
            }
            page += 1;
        }

        if records.is_empty() {
            return Err(AppError::Parse(
                "no usable instruments in spot response".to_string(),
            ));
        }
        if skipped > 0 {
            warn!(skipped, "dropped instruments without numeric quotes");
        }
        info!(count = records.len(), "fetched spot snapshot");
        Ok(records)
    }
}

/// Extract one instrument from a `data.diff` entry.
///
/// Suspended instruments report "-" for their numeric fields; those rows are
/// dropped by returning None.
fn parse_spot_item(item: &Value) -> Option<StockRecord> {
    let code = text_field(item, "f12")?;
    let name = text_field(item, "f14")?;
    let price = numeric_field(item, "f2")?;
    let change = percent_field(item, "f3")?;
    let volume = numeric_field(item, "f5")?;
    let turnover = numeric_field(item, "f6")?;
    Some(StockRecord {
        code,
        name,
        price,
        change,
        volume,
        turnover,
    })
}

fn text_field(item: &Value, key: &str) -> Option<String> {
    match item.get(key)? {
        Value::String(s) if !s.is_empty() && s != "-" => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn numeric_field(item: &Value, key: &str) -> Option<f64> {
    match item.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim() != "-" => s.trim().parse().ok(),
        _ => None,
    }
}

/// Percent change may come through as a number or a "12.34%"-style string.
/// The percent sign is stripped and the value kept in percent points.
fn percent_field(item: &Value, key: &str) -> Option<f64> {
    match item.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim() != "-" => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_spot_item_numeric_fields() {
        let item = json!({
            "f12": "600519",
            "f14": "贵州茅台",
            "f2": 1800.5,
            "f3": 1.23,
            "f5": 320000,
            "f6": 5.8e8,
        });
        let record = parse_spot_item(&item).unwrap();
        assert_eq!(record.code, "600519");
        assert_eq!(record.name, "贵州茅台");
        assert_eq!(record.price, 1800.5);
        assert_eq!(record.change, 1.23);
        assert_eq!(record.volume, 320000.0);
        assert_eq!(record.turnover, 5.8e8);
    }

    #[test]
    fn test_parse_spot_item_percent_string_keeps_points() {
        let item = json!({
            "f12": "000001",
            "f14": "平安银行",
            "f2": 10.5,
            "f3": "12.34%",
            "f5": 1000,
            "f6": 10500.0,
        });
        let record = parse_spot_item(&item).unwrap();
        // Percent points, not a fraction: the sign is stripped, nothing is divided.
        assert_eq!(record.change, 12.34);
    }

    #[test]
    fn test_parse_spot_item_suspended_is_skipped() {
        let item = json!({
            "f12": "300001",
            "f14": "特锐德",
            "f2": "-",
            "f3": "-",
            "f5": "-",
            "f6": "-",
        });
        assert!(parse_spot_item(&item).is_none());
    }

    #[test]
    fn test_text_field_accepts_numeric_codes() {
        let item = json!({ "f12": 600519 });
        assert_eq!(text_field(&item, "f12").unwrap(), "600519");
    }
}
