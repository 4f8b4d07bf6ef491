use plotters::prelude::*;

use crate::error::{AppError, Result};
use crate::models::StockRecord;

const CHART_SIZE: (u32, u32) = (900, 480);

const GREY: RGBColor = RGBColor(128, 128, 128);

/// Line chart of `price` indexed by row order, rendered as SVG text.
///
/// Callers must guard against an empty row set; here it is rejected outright.
pub fn price_chart_svg(rows: &[StockRecord], code: &str) -> Result<String> {
    if rows.is_empty() {
        return Err(AppError::InvalidInput(format!("no rows to chart for {}", code)));
    }

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let (y_min, y_max) = padded_range(rows.iter().map(|r| r.price));
        let mut chart = ChartBuilder::on(&root)
            .caption(format!("{} price trend", code), ("sans-serif", 22))
            .margin(12)
            .x_label_area_size(32)
            .y_label_area_size(56)
            .build_cartesian_2d(-0.5..rows.len() as f64 - 0.5, y_min..y_max)
            .map_err(chart_err)?;

        chart
            .configure_mesh()
            .x_desc("record")
            .y_desc("price")
            .draw()
            .map_err(chart_err)?;

        chart
            .draw_series(LineSeries::new(
                rows.iter().enumerate().map(|(i, r)| (i as f64, r.price)),
                &BLUE,
            ))
            .map_err(chart_err)?;
        chart
            .draw_series(
                rows.iter()
                    .enumerate()
                    .map(|(i, r)| Circle::new((i as f64, r.price), 3, BLUE.filled())),
            )
            .map_err(chart_err)?;

        root.present().map_err(chart_err)?;
    }
    Ok(svg)
}

/// Volume as bars on the left axis, percent change as a line on a right axis
/// fixed to [-10, 10] with "X.XX%" tick labels. Rendered as SVG text.
pub fn volume_change_chart_svg(rows: &[StockRecord], code: &str) -> Result<String> {
    if rows.is_empty() {
        return Err(AppError::InvalidInput(format!("no rows to chart for {}", code)));
    }

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let volume_top = rows.iter().map(|r| r.volume).fold(0.0f64, f64::max);
        let volume_top = if volume_top <= 0.0 { 1.0 } else { volume_top * 1.1 };
        let x_range = -0.5..rows.len() as f64 - 0.5;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("{} volume and percent change", code),
                ("sans-serif", 22),
            )
            .margin(12)
            .x_label_area_size(32)
            .y_label_area_size(64)
            .right_y_label_area_size(56)
            .build_cartesian_2d(x_range.clone(), 0.0..volume_top)
            .map_err(chart_err)?
            .set_secondary_coord(x_range, -10.0..10.0);

        chart
            .configure_mesh()
            .x_desc("record")
            .y_desc("volume")
            .draw()
            .map_err(chart_err)?;
        chart
            .configure_secondary_axes()
            .y_desc("change")
            .y_label_formatter(&|v| format!("{:.2}%", v))
            .draw()
            .map_err(chart_err)?;

        chart
            .draw_series(rows.iter().enumerate().map(|(i, r)| {
                Rectangle::new(
                    [(i as f64 - 0.4, 0.0), (i as f64 + 0.4, r.volume)],
                    GREY.filled(),
                )
            }))
            .map_err(chart_err)?;

        chart
            .draw_secondary_series(LineSeries::new(
                rows.iter().enumerate().map(|(i, r)| (i as f64, r.change)),
                &GREEN,
            ))
            .map_err(chart_err)?;
        chart
            .draw_secondary_series(
                rows.iter()
                    .enumerate()
                    .map(|(i, r)| Circle::new((i as f64, r.change), 3, GREEN.filled())),
            )
            .map_err(chart_err)?;

        root.present().map_err(chart_err)?;
    }
    Ok(svg)
}

fn chart_err<E: std::fmt::Display>(err: E) -> AppError {
    AppError::Chart(err.to_string())
}

/// Y range with headroom; degenerate inputs (single value) still get a
/// non-empty span.
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((max - min) * 0.1).max(max.abs().max(1.0) * 0.01);
    (min - pad, max + pad)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(price: f64, change: f64, volume: f64) -> StockRecord {
        StockRecord {
            code: "600519".to_string(),
            name: "Moutai".to_string(),
            price,
            change,
            volume,
            turnover: 0.0,
        }
    }

    #[test]
    fn test_price_chart_produces_svg() {
        let rows = vec![row(1800.5, 1.2, 320000.0), row(1812.0, 0.6, 280000.0)];
        let svg = price_chart_svg(&rows, "600519").unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn test_volume_chart_produces_svg() {
        let rows = vec![row(1800.5, 1.2, 320000.0), row(1812.0, -0.6, 280000.0)];
        let svg = volume_change_chart_svg(&rows, "600519").unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn test_single_row_does_not_degenerate() {
        let rows = vec![row(1800.5, 1.2, 320000.0)];
        assert!(price_chart_svg(&rows, "600519").is_ok());
        assert!(volume_change_chart_svg(&rows, "600519").is_ok());
    }

    #[test]
    fn test_empty_rows_are_rejected() {
        assert!(price_chart_svg(&[], "600519").is_err());
        assert!(volume_change_chart_svg(&[], "600519").is_err());
    }

    #[test]
    fn test_padded_range_spans_input() {
        let (lo, hi) = padded_range([10.0, 20.0].into_iter());
        assert!(lo < 10.0);
        assert!(hi > 20.0);
    }

    #[test]
    fn test_padded_range_single_value() {
        let (lo, hi) = padded_range([10.0].into_iter());
        assert!(lo < hi);
    }
}
