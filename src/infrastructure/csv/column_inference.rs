// ============================================================
// COLUMN INFERENCE
// ============================================================
// Pick the value column and the optional date column

use crate::domain::error::{AppError, Result};
use crate::domain::table::RawTable;

use super::numeric::parse_numeric;

/// Outcome of column inference over one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelection {
    pub value_index: usize,
    pub value_column: String,
    pub date_index: Option<usize>,
    pub date_column: Option<String>,
}

/// A column that passed the majority-numeric rule.
#[derive(Debug, Clone)]
struct NumericCandidate {
    index: usize,
    numeric_count: usize,
}

/// Select the value column and, if any name matches, the date column.
///
/// A column qualifies when strictly more than half of its cells parse as
/// numeric after cleaning, which tolerates sparse nulls and garbage. Among
/// qualifiers the highest count wins; equal counts resolve to the leftmost
/// column. Fails with `NoNumericColumn` when nothing qualifies.
pub fn infer_columns(table: &RawTable) -> Result<ColumnSelection> {
    let row_count = table.len();

    let mut candidates: Vec<NumericCandidate> = Vec::new();
    for index in 0..table.columns.len() {
        let numeric_count = table
            .column(index)
            .filter(|cell| parse_numeric(cell).is_some())
            .count();

        if numeric_count * 2 > row_count {
            candidates.push(NumericCandidate {
                index,
                numeric_count,
            });
        }
    }

    if candidates.is_empty() {
        return Err(AppError::NoNumericColumn(
            "No numeric column found".to_string(),
        ));
    }

    // Stable sort: equal counts keep their original column order, so the
    // leftmost qualifier wins ties.
    candidates.sort_by(|a, b| b.numeric_count.cmp(&a.numeric_count));
    let value_index = candidates[0].index;

    let date_index = table.columns.iter().position(|name| {
        let lower = name.to_lowercase();
        lower.contains("date") || lower.contains("time")
    });

    Ok(ColumnSelection {
        value_index,
        value_column: table.columns[value_index].clone(),
        date_index,
        date_column: date_index.map(|i| table.columns[i].clone()),
    })
}
