// ============================================================
// TABLE LOADER
// ============================================================
// Decode raw bytes and parse them into a RawTable

use csv::ReaderBuilder;
use std::borrow::Cow;
use tracing::warn;

use crate::domain::error::{AppError, Result};
use crate::domain::table::RawTable;

/// Loads delimited text of unknown encoding into a [`RawTable`].
pub struct TableLoader {
    /// Delimiter byte (default: comma).
    delimiter: u8,
}

impl Default for TableLoader {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl TableLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Decode and parse a complete file.
    ///
    /// Fails with `EmptyTable` when no header or no usable data rows remain
    /// after dropping fully-blank rows.
    pub fn load(&self, bytes: &[u8]) -> Result<RawTable> {
        let text = decode_text(bytes)?;
        self.parse(&text)
    }

    fn parse(&self, text: &str) -> Result<RawTable> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(text.as_bytes());

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
            .iter()
            .map(|name| name.trim().to_string())
            .collect();

        if columns.is_empty() {
            return Err(AppError::EmptyTable("CSV is empty".to_string()));
        }

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AppError::ParseError(format!("Failed to parse CSV row {}: {}", index + 1, e))
            })?;

            // Align every row to the header width.
            let mut cells: Vec<String> = (0..columns.len())
                .map(|i| record.get(i).unwrap_or("").to_string())
                .collect();

            if cells.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }

            for cell in &mut cells {
                if cell.trim().is_empty() {
                    cell.clear();
                }
            }

            rows.push(cells);
        }

        if rows.is_empty() {
            return Err(AppError::EmptyTable("CSV is empty".to_string()));
        }

        Ok(RawTable { columns, rows })
    }
}

/// Decode bytes as UTF-8, falling back to Latin-1.
///
/// Latin-1 maps every byte value, so the fallback cannot fail; the
/// `Decode` error kind stays in the contract regardless.
fn decode_text(bytes: &[u8]) -> Result<String> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(text.to_string()),
        Err(_) => {
            warn!("upload is not valid UTF-8, decoding as Latin-1");
            let decoded: Cow<'_, str> = encoding_rs::mem::decode_latin1(bytes);
            Ok(decoded.into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_csv() {
        let table = TableLoader::new()
            .load(b"name,amount\nA,100\nB,200")
            .unwrap();

        assert_eq!(table.columns, vec!["name", "amount"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0], vec!["A", "100"]);
    }

    #[test]
    fn test_header_names_are_trimmed() {
        let table = TableLoader::new()
            .load(b" name , amount \nA,100")
            .unwrap();

        assert_eq!(table.columns, vec!["name", "amount"]);
    }

    #[test]
    fn test_blank_rows_are_dropped() {
        let table = TableLoader::new()
            .load(b"a,b\n1,2\n,\n   ,\n3,4")
            .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1], vec!["3", "4"]);
    }

    #[test]
    fn test_ragged_rows_are_aligned() {
        let table = TableLoader::new().load(b"a,b,c\n1,2\n1,2,3,4").unwrap();

        assert_eq!(table.rows[0], vec!["1", "2", ""]);
        assert_eq!(table.rows[1], vec!["1", "2", "3"]);
    }

    #[test]
    fn test_header_only_fails_with_empty_table() {
        let err = TableLoader::new().load(b"a,b\n\n\n").unwrap_err();
        assert!(matches!(err, AppError::EmptyTable(_)));
    }

    #[test]
    fn test_empty_input_fails_with_empty_table() {
        let err = TableLoader::new().load(b"").unwrap_err();
        assert!(matches!(err, AppError::EmptyTable(_)));
    }

    #[test]
    fn test_latin1_fallback() {
        // "café,prix\nnoisette,2" with an ISO-8859-1 e-acute (0xE9).
        let bytes = b"caf\xe9,prix\nnoisette,2";
        let table = TableLoader::new().load(bytes).unwrap();

        assert_eq!(table.columns[0], "café");
        assert_eq!(table.rows[0], vec!["noisette", "2"]);
    }

    #[test]
    fn test_quoted_cells() {
        let table = TableLoader::new()
            .load(b"name,amount\n\"Smith, Jane\",\"1,200\"")
            .unwrap();

        assert_eq!(table.rows[0], vec!["Smith, Jane", "1,200"]);
    }
}
