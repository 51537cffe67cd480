pub mod models;
pub mod parser;
pub mod reader;

pub use models::{Field, HttpMethod, LogRecord, ProcessedTable, TableSummary};
pub use parser::{FIELD_EXTRACTORS, FieldExtractor, extract, extract_line};
pub use reader::{RawLogFile, load};
