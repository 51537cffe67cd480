//! Extraction of structured records from Apache-style access logs.
//!
//! [`load`] reads a file into a [`RawLogFile`], [`extract`] maps each line to
//! a [`LogRecord`] with one optional value per [`Field`].

pub mod error;
pub mod ingestion;
pub mod output;
pub mod storage;

pub use error::{AccessLogError, Result};
pub use ingestion::{
    Field, HttpMethod, LogRecord, ProcessedTable, RawLogFile, TableSummary, extract, load,
};
pub use storage::AccessLogDatabase;
