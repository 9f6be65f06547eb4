pub mod column_inference;
pub mod date_parser;
pub mod numeric;
pub mod table_loader;

pub use column_inference::{infer_columns, ColumnSelection};
pub use numeric::parse_numeric;
pub use table_loader::TableLoader;
