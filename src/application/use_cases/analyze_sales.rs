// ============================================================
// ANALYZE SALES USE CASE
// ============================================================
// Orchestrate loading, column inference, aggregation and charting

use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use tracing::info;

use crate::domain::error::Result;
use crate::domain::report::{SalesAnalysis, SalesReport, SeriesPoint};
use crate::domain::table::RawTable;
use crate::infrastructure::chart::ChartRenderer;
use crate::infrastructure::csv::{date_parser, infer_columns, parse_numeric, TableLoader};
use crate::infrastructure::db::ReportRepository;

/// End-to-end analysis of one uploaded CSV.
pub struct AnalyzeSalesUseCase {
    repository: Arc<ReportRepository>,
    chart: ChartRenderer,
}

impl AnalyzeSalesUseCase {
    pub fn new(repository: Arc<ReportRepository>, chart: ChartRenderer) -> Self {
        Self { repository, chart }
    }

    /// Analyze, render the chart, and persist the finished report.
    ///
    /// Nothing is stored unless every stage succeeded.
    pub async fn execute(&self, bytes: &[u8], filename: &str) -> Result<SalesReport> {
        let analysis = analyze_bytes(bytes)?;

        let x_label = analysis.date_column.as_deref().unwrap_or("Records");
        let title = format!("Trend ({})", analysis.value_column);
        let chart_png = self.chart.render(&analysis.series, x_label, &title)?;

        let uploaded_at = Utc::now();
        let id = self
            .repository
            .insert_report(filename, uploaded_at, &analysis, &chart_png)
            .await?;

        Ok(SalesReport {
            id,
            filename: filename.to_string(),
            uploaded_at,
            value_column: analysis.value_column,
            date_column: analysis.date_column,
            total: analysis.total,
            average: analysis.average,
            series: analysis.series,
            chart_png,
        })
    }
}

/// The pure pipeline: Load -> Infer -> Clean -> Aggregate -> BuildSeries.
///
/// No I/O and no shared state; concurrent uploads each run their own pass
/// over their own table. Any stage failure aborts the whole analysis.
pub fn analyze_bytes(bytes: &[u8]) -> Result<SalesAnalysis> {
    let table = TableLoader::new().load(bytes)?;
    let selection = infer_columns(&table)?;

    let values = clean_values(&table, selection.value_index);
    let (total, average) = aggregate(&values);

    let series = match selection.date_index {
        Some(date_index) => dated_series(&table, date_index, &values),
        None => indexed_series(&values),
    };

    info!(
        value_column = %selection.value_column,
        date_column = selection.date_column.as_deref().unwrap_or("-"),
        rows = table.len(),
        points = series.len(),
        "analysis complete"
    );

    Ok(SalesAnalysis {
        value_column: selection.value_column,
        date_column: selection.date_column,
        total,
        average,
        series,
    })
}

/// Re-clean the chosen column. Failed cells stay missing; they are never
/// coerced to zero.
fn clean_values(table: &RawTable, value_index: usize) -> Vec<Option<f64>> {
    table.column(value_index).map(parse_numeric).collect()
}

/// Sum and mean over the parsed values, 0.0 for a column that yielded
/// nothing.
fn aggregate(values: &[Option<f64>]) -> (f64, f64) {
    let parsed: Vec<f64> = values.iter().filter_map(|v| *v).collect();
    if parsed.is_empty() {
        return (0.0, 0.0);
    }
    let total: f64 = parsed.iter().sum();
    (total, total / parsed.len() as f64)
}

/// Series for a table with a date column: rows sorted ascending by parsed
/// date, unparseable dates last, original order preserved within ties.
fn dated_series(table: &RawTable, date_index: usize, values: &[Option<f64>]) -> Vec<SeriesPoint> {
    let mut rows: Vec<(Option<NaiveDateTime>, usize)> = table
        .column(date_index)
        .map(date_parser::parse_date)
        .enumerate()
        .map(|(row, date)| (date, row))
        .collect();

    rows.sort_by_key(|(date, _)| (date.is_none(), *date));

    rows.into_iter()
        .filter_map(|(date, row)| {
            let value = values[row]?;
            let label = match date {
                Some(dt) => date_parser::format_label(&dt),
                None => {
                    let raw = table.rows[row][date_index].trim();
                    if raw.is_empty() {
                        row.to_string()
                    } else {
                        raw.to_string()
                    }
                }
            };
            Some(SeriesPoint::new(label, value))
        })
        .collect()
}

/// Series for a table without a date column: 0-based row indices as
/// labels, original order.
fn indexed_series(values: &[Option<f64>]) -> Vec<SeriesPoint> {
    values
        .iter()
        .enumerate()
        .filter_map(|(row, value)| value.map(|v| SeriesPoint::new(row.to_string(), v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::AppError;

    #[test]
    fn test_partial_garbage_still_qualifies() {
        let analysis = analyze_bytes(b"name,amount\nA,100\nB,200\nC,abc").unwrap();

        assert_eq!(analysis.value_column, "amount");
        assert_eq!(analysis.total, 300.0);
        assert_eq!(analysis.average, 150.0);
        // The garbage row is excluded from the series too.
        assert_eq!(
            analysis.series,
            vec![SeriesPoint::new("0", 100.0), SeriesPoint::new("1", 200.0)]
        );
    }

    #[test]
    fn test_no_date_column_uses_row_indices() {
        let analysis = analyze_bytes(b"x,y\n1,2\n3,4").unwrap();

        assert!(analysis.date_column.is_none());
        let labels: Vec<&str> = analysis.series.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["0", "1"]);
    }

    #[test]
    fn test_date_column_sorts_chronologically() {
        let analysis = analyze_bytes(b"date,sales\n2024-01-02,$50\n2024-01-01,$70").unwrap();

        assert_eq!(analysis.date_column.as_deref(), Some("date"));
        assert_eq!(
            analysis.series,
            vec![
                SeriesPoint::new("2024-01-01", 70.0),
                SeriesPoint::new("2024-01-02", 50.0),
            ]
        );
        assert_eq!(analysis.total, 120.0);
        assert_eq!(analysis.average, 60.0);
    }

    #[test]
    fn test_unparseable_dates_sort_last_in_original_order() {
        let analysis =
            analyze_bytes(b"date,sales\nlater,10\n2024-02-01,20\nsoon,30\n2024-01-01,40").unwrap();

        let labels: Vec<&str> = analysis.series.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["2024-01-01", "2024-02-01", "later", "soon"]);
    }

    #[test]
    fn test_currency_formats_are_cleaned() {
        let analysis = analyze_bytes(b"item,price\na,\"$1,200.50\"\nb,\xe2\x82\xb9300").unwrap();

        assert_eq!(analysis.value_column, "price");
        assert_eq!(analysis.total, 1500.50);
        assert_eq!(analysis.average, 750.25);
    }

    #[test]
    fn test_entirely_non_numeric_table_fails() {
        let err = analyze_bytes(b"name,city\nA,Pune\nB,Delhi").unwrap_err();
        assert!(matches!(err, AppError::NoNumericColumn(_)));
    }

    #[test]
    fn test_header_and_blank_lines_fail_with_empty_table() {
        let err = analyze_bytes(b"name,amount\n\n\n").unwrap_err();
        assert!(matches!(err, AppError::EmptyTable(_)));
    }

    #[test]
    fn test_aggregate_defaults_to_zero() {
        assert_eq!(aggregate(&[]), (0.0, 0.0));
        assert_eq!(aggregate(&[None, None]), (0.0, 0.0));
    }

    #[test]
    fn test_aggregate_exact_sum_and_mean() {
        let values = vec![Some(1.5), None, Some(2.5), Some(4.0)];
        let (total, average) = aggregate(&values);
        assert_eq!(total, 8.0);
        assert_eq!(average, 8.0 / 3.0);
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let bytes: &[u8] = b"date,sales\n2024-01-02,$50\n2024-01-01,$70\nbad,oops";
        let first = analyze_bytes(bytes).unwrap();
        let second = analyze_bytes(bytes).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_datetime_cells_keep_their_time_in_labels() {
        let analysis =
            analyze_bytes(b"time,kwh\n2024-01-01 10:30:00,5\n2024-01-01 09:00:00,7").unwrap();

        let labels: Vec<&str> = analysis.series.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["2024-01-01 09:00:00", "2024-01-01 10:30:00"]);
    }
}
