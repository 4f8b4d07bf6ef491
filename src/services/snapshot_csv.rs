use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::StockRecord;

/// Byte order mark written ahead of the header so spreadsheet tools detect
/// the encoding.
const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

const HEADERS: [&str; 6] = ["code", "name", "price", "change", "volume", "turnover"];

/// Map a header cell to its canonical English field name.
///
/// Accepts the provider's Chinese headers as well as already-renamed English
/// ones, so a snapshot from any pipeline stage ingests the same way.
fn canonical_header(raw: &str) -> Option<&'static str> {
    match raw.trim_start_matches('\u{feff}').trim() {
        "code" | "代码" => Some("code"),
        "name" | "名称" => Some("name"),
        "price" | "最新价" => Some("price"),
        "change" | "涨跌幅" => Some("change"),
        "volume" | "成交量" => Some("volume"),
        "turnover" | "成交额" => Some("turnover"),
        _ => None,
    }
}

/// Parse a percent cell such as "1.23%" or "-0.5" into percent points.
fn parse_percent(raw: &str) -> Option<f64> {
    raw.trim().trim_end_matches('%').trim().parse().ok()
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse().ok()
}

/// Write a snapshot as UTF-8-with-BOM CSV with English headers.
pub fn write_snapshot(path: &Path, records: &[StockRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    out.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(HEADERS)?;
    for record in records {
        writer.write_record(&[
            record.code.as_str(),
            record.name.as_str(),
            &record.price.to_string(),
            &record.change.to_string(),
            &record.volume.to_string(),
            &record.turnover.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a snapshot CSV into records.
///
/// The stock code is always kept as a string (leading zeros preserved) and the
/// change column tolerates a trailing percent sign.
pub fn read_snapshot(path: &Path) -> Result<Vec<StockRecord>> {
    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader.headers()?.clone();
    let mut index: HashMap<&'static str, usize> = HashMap::new();
    for (i, cell) in headers.iter().enumerate() {
        if let Some(name) = canonical_header(cell) {
            index.insert(name, i);
        }
    }
    for required in HEADERS {
        if !index.contains_key(required) {
            return Err(AppError::Parse(format!(
                "snapshot CSV is missing column '{}'",
                required
            )));
        }
    }

    let mut records = Vec::new();
    for (row_number, row) in reader.records().enumerate() {
        let row = row?;
        let cell = |name: &str| row.get(index[name]).unwrap_or("");
        // Header line is 1, first data row is 2.
        let line = row_number + 2;

        let price = parse_number(cell("price"))
            .ok_or_else(|| AppError::Parse(format!("line {}: bad price '{}'", line, cell("price"))))?;
        let change = parse_percent(cell("change"))
            .ok_or_else(|| AppError::Parse(format!("line {}: bad change '{}'", line, cell("change"))))?;
        let volume = parse_number(cell("volume"))
            .ok_or_else(|| AppError::Parse(format!("line {}: bad volume '{}'", line, cell("volume"))))?;
        let turnover = parse_number(cell("turnover")).ok_or_else(|| {
            AppError::Parse(format!("line {}: bad turnover '{}'", line, cell("turnover")))
        })?;

        records.push(StockRecord {
            code: cell("code").trim().to_string(),
            name: cell("name").trim().to_string(),
            price,
            change,
            volume,
            turnover,
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records() -> Vec<StockRecord> {
        vec![
            StockRecord {
                code: "600519".to_string(),
                name: "Moutai".to_string(),
                price: 1800.5,
                change: 1.23,
                volume: 320000.0,
                turnover: 5.8e8,
            },
            StockRecord {
                code: "000001".to_string(),
                name: "Ping An Bank".to_string(),
                price: 10.5,
                change: -0.5,
                volume: 1000.0,
                turnover: 10500.0,
            },
        ]
    }

    #[test]
    fn test_snapshot_starts_with_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a_stock_data.csv");
        write_snapshot(&path, &sample_records()).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..3], UTF8_BOM);
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a_stock_data.csv");
        let records = sample_records();
        write_snapshot(&path, &records).unwrap();

        let loaded = read_snapshot(&path).unwrap();
        assert_eq!(loaded, records);
    }

    #[test]
    fn test_read_chinese_headers_and_percent_sign() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source.csv");
        std::fs::write(
            &path,
            "\u{feff}代码,名称,最新价,涨跌幅,成交量,成交额\n600519,Moutai,1800.5,1.23%,320000,580000000\n",
        )
        .unwrap();

        let loaded = read_snapshot(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].code, "600519");
        assert_eq!(loaded[0].name, "Moutai");
        assert_eq!(loaded[0].price, 1800.5);
        // Percent sign stripped, stored as points not fraction.
        assert_eq!(loaded[0].change, 1.23);
        assert_eq!(loaded[0].volume, 320000.0);
        assert_eq!(loaded[0].turnover, 5.8e8);
    }

    #[test]
    fn test_read_mixed_headers() {
        // A snapshot may arrive with partially renamed headers, 代码/名称
        // left untouched.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.csv");
        std::fs::write(
            &path,
            "代码,名称,price,change,volume,turnover\n000001,Ping An Bank,10.5,-0.5,1000,10500\n",
        )
        .unwrap();

        let loaded = read_snapshot(&path).unwrap();
        assert_eq!(loaded[0].code, "000001");
        assert_eq!(loaded[0].change, -0.5);
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.csv");
        std::fs::write(&path, "code,name,price\n600519,Moutai,1800.5\n").unwrap();

        let err = read_snapshot(&path).unwrap_err();
        assert!(err.to_string().contains("missing column"));
    }

    #[test]
    fn test_leading_zeros_survive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zeros.csv");
        std::fs::write(
            &path,
            "code,name,price,change,volume,turnover\n000333,Midea,55.2,0.8,2000,110400\n",
        )
        .unwrap();

        let loaded = read_snapshot(&path).unwrap();
        assert_eq!(loaded[0].code, "000333");
    }
}
