// ============================================================
// REPORT TYPES
// ============================================================
// Analysis output and the persisted report entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One plotted point: a label (ISO date or row index) and its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Result of the pure analysis pipeline, before any chart or storage work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesAnalysis {
    /// Column chosen to carry the quantity being summarized.
    pub value_column: String,

    /// Column chosen as the time axis, if any name matched.
    pub date_column: Option<String>,

    /// Sum of all successfully parsed values (0.0 when nothing parses).
    pub total: f64,

    /// Arithmetic mean of parsed values (0.0 when nothing parses).
    pub average: f64,

    /// Plottable points, chronologically sorted when a date column exists.
    pub series: Vec<SeriesPoint>,
}

/// The durable report created for one upload. Immutable after insertion;
/// the persistence store owns it from then on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesReport {
    /// Opaque identifier assigned by the store.
    pub id: String,

    /// Name of the uploaded file.
    pub filename: String,

    /// When the upload was analyzed.
    pub uploaded_at: DateTime<Utc>,

    pub value_column: String,
    pub date_column: Option<String>,
    pub total: f64,
    pub average: f64,
    pub series: Vec<SeriesPoint>,

    /// Rendered trend chart (PNG bytes).
    pub chart_png: Vec<u8>,
}

/// History-listing projection: everything except the heavy blobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub id: String,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub value_column: String,
    pub date_column: Option<String>,
    pub total: f64,
    pub average: f64,
}
