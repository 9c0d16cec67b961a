//! CSV ingestion: tokenizing and header resolution

pub mod columns;
pub mod tokenizer;

pub use columns::{ColumnMap, ColumnSpec, Field, MissingColumns, FEED_COLUMNS, UPLOAD_COLUMNS};
pub use tokenizer::{parse_csv_line, split_lines};
