use std::collections::BTreeMap;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Color, Table};
use numbers_lib::stats::{CorrelationMatrix, heat_color, mean, running_mean};
use numbers_lib::stocks::PriceSeries;
use time::format_description::FormatItem;
use time::macros::format_description;

use crate::numbers_client::NumbersResponse;

const TIME_FORMAT: &[FormatItem<'static>] = format_description!("[hour]:[minute]:[second]");
const BAR_WIDTH: usize = 30;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS);
    table
}

fn money(value: Option<f64>) -> String {
    value
        .map(|v| format!("${v:.2}"))
        .unwrap_or_else(|| "n/a".to_string())
}

fn bar(value: f64, low: f64, high: f64) -> String {
    let filled = if high > low {
        (((value - low) / (high - low)) * BAR_WIDTH as f64).round() as usize
    } else {
        BAR_WIDTH
    };
    "█".repeat(filled.max(1))
}

fn format_numbers(numbers: &[i64]) -> String {
    let joined: Vec<String> = numbers.iter().map(i64::to_string).collect();
    format!("[{}]", joined.join(", "))
}

pub fn stocks_table(stocks: &BTreeMap<String, String>) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Company", "Ticker"]);
    for (name, ticker) in stocks {
        table.add_row(vec![name.as_str(), ticker.as_str()]);
    }
    table
}

/// Price line of one ticker with its overall and running mean.
pub fn chart_table(series: &PriceSeries) -> Table {
    let prices = series.prices();
    let average = mean(&prices).unwrap_or(0.0);
    let running = running_mean(&prices);
    let low = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let high = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut table = new_table();
    table.set_header(vec![
        Cell::new("Time"),
        Cell::new("Price").fg(Color::Blue),
        Cell::new("Running mean"),
        Cell::new(format!("Average {}", money(Some(average)))).fg(Color::Magenta),
    ]);
    for (point, running) in series.points.iter().zip(running) {
        let time = point
            .last_updated_at
            .format(TIME_FORMAT)
            .unwrap_or_else(|_| point.last_updated_at.to_string());
        let colour = if point.price >= average {
            Color::Blue
        } else {
            Color::Magenta
        };
        table.add_row(vec![
            Cell::new(time),
            Cell::new(money(Some(point.price))).set_alignment(CellAlignment::Right),
            Cell::new(money(Some(running))).set_alignment(CellAlignment::Right),
            Cell::new(bar(point.price, low, high)).fg(colour),
        ]);
    }
    table
}

pub fn series_stats_table(matrix: &CorrelationMatrix) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Ticker", "Mean", "Std Dev"]);
    for (ticker, stats) in matrix.tickers.iter().zip(&matrix.stats) {
        table.add_row(vec![
            ticker.clone(),
            money(stats.mean),
            money(stats.std_dev),
        ]);
    }
    table
}

/// Heatmap of pairwise correlations; cells without a defined correlation are
/// left uncoloured.
pub fn correlation_table(matrix: &CorrelationMatrix) -> Table {
    let mut table = new_table();
    let mut header = vec![Cell::new("")];
    header.extend(matrix.tickers.iter().map(Cell::new));
    table.set_header(header);

    for (row, ticker) in matrix.tickers.iter().enumerate() {
        let mut cells = vec![Cell::new(ticker)];
        for col in 0..matrix.len() {
            let cell = match matrix.get(row, col) {
                Some(r) => {
                    let (red, green, blue) = heat_color(r).to_rgb();
                    Cell::new(format!("{r:.2}"))
                        .bg(Color::Rgb {
                            r: red,
                            g: green,
                            b: blue,
                        })
                        .fg(Color::Black)
                }
                None => Cell::new("n/a"),
            };
            cells.push(cell.set_alignment(CellAlignment::Center));
        }
        table.add_row(cells);
    }
    table
}

pub fn window_report_table(report: &NumbersResponse) -> Table {
    let mut table = new_table();
    table.set_header(vec!["", "Value"]);
    table.add_row(vec![
        "Previous window".to_string(),
        format_numbers(&report.window_prev_state),
    ]);
    table.add_row(vec![
        "Current window".to_string(),
        format_numbers(&report.window_curr_state),
    ]);
    table.add_row(vec![
        "Numbers received".to_string(),
        format_numbers(&report.numbers),
    ]);
    table.add_row(vec!["Average".to_string(), format!("{:.2}", report.avg)]);
    table.add_row(vec![
        "Window size".to_string(),
        format!("{} numbers", report.window_curr_state.len()),
    ]);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use numbers_lib::stocks::PricePoint;
    use time::macros::datetime;

    fn series(ticker: &str, prices: &[f64]) -> PriceSeries {
        PriceSeries {
            ticker: ticker.to_string(),
            points: prices
                .iter()
                .enumerate()
                .map(|(i, &price)| PricePoint {
                    price,
                    last_updated_at: datetime!(2025-05-08 04:00:00 UTC)
                        + time::Duration::minutes(i as i64),
                })
                .collect(),
        }
    }

    #[test]
    fn test_bar_scales_between_extremes() {
        assert_eq!(bar(10.0, 10.0, 20.0).chars().count(), 1);
        assert_eq!(bar(20.0, 10.0, 20.0).chars().count(), BAR_WIDTH);
        assert_eq!(bar(15.0, 10.0, 20.0).chars().count(), BAR_WIDTH / 2);
        assert_eq!(bar(7.0, 7.0, 7.0).chars().count(), BAR_WIDTH);
    }

    #[test]
    fn test_chart_lists_each_point_with_running_mean() {
        let rendered = chart_table(&series("NVDA", &[100.0, 110.0, 90.0])).to_string();
        assert!(rendered.contains("Average $100.00"));
        assert!(rendered.contains("04:02:00"));
        assert!(rendered.contains("$105.00"));
    }

    #[test]
    fn test_correlation_table_marks_undefined_cells() {
        let matrix = CorrelationMatrix::compute(&[
            series("AAPL", &[1.0, 2.0, 3.0]),
            series("FLAT", &[4.0, 4.0, 4.0]),
        ]);
        let rendered = correlation_table(&matrix).to_string();
        assert!(rendered.contains("1.00"));
        assert!(rendered.contains("n/a"));
    }

    #[test]
    fn test_window_report() {
        let rendered = window_report_table(&NumbersResponse {
            window_prev_state: vec![1, 2, 3],
            window_curr_state: vec![1, 2, 3, 4],
            numbers: vec![2, 3, 4],
            avg: 2.5,
        })
        .to_string();
        assert!(rendered.contains("[1, 2, 3, 4]"));
        assert!(rendered.contains("2.50"));
        assert!(rendered.contains("4 numbers"));
    }
}
