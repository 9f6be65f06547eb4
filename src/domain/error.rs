use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize)]
pub enum AppError {
    /// Byte stream could not be interpreted as text under any attempted encoding.
    Decode(String),
    /// Table has a header but no usable data rows.
    EmptyTable(String),
    /// No column passes the majority-numeric threshold.
    NoNumericColumn(String),
    NotFound(String),
    ValidationError(String),
    ParseError(String),
    DatabaseError(String),
    ChartError(String),
    PdfError(String),
    IoError(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Decode(msg) => write!(f, "Decode error: {}", msg),
            AppError::EmptyTable(msg) => write!(f, "Empty table: {}", msg),
            AppError::NoNumericColumn(msg) => write!(f, "No numeric column: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::ChartError(msg) => write!(f, "Chart error: {}", msg),
            AppError::PdfError(msg) => write!(f, "PDF error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
