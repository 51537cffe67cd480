use crate::error::{AccessLogError, Result};
use crate::ingestion::{Field, LogRecord};
use rootcause::prelude::ResultExt;
use std::io::Write;

const ABSENT: &str = "NULL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Aligned plain-text columns
    Table,
}

pub fn write_records<W: Write>(out: &mut W, records: &[LogRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => write_json_lines(out, records),
        OutputFormat::Table => write_table(out, records),
    }
}

pub fn write_json_lines<W: Write>(out: &mut W, records: &[LogRecord]) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut *out, record)
            .map_err(AccessLogError::from)
            .attach("Failed to write record as JSON")?;
        writeln!(out)
            .map_err(AccessLogError::from)
            .attach("Failed to write output")?;
    }
    Ok(())
}

pub fn write_table<W: Write>(out: &mut W, records: &[LogRecord]) -> Result<()> {
    let mut widths: Vec<usize> = Field::ALL.iter().map(|f| f.as_str().len()).collect();
    for record in records {
        for (width, value) in widths.iter_mut().zip(record.values()) {
            *width = (*width).max(value.unwrap_or(ABSENT).chars().count());
        }
    }

    let header: Vec<&str> = Field::ALL.iter().map(|f| f.as_str()).collect();
    write_row(out, &header, &widths)?;
    for record in records {
        let row: Vec<&str> = record.values().iter().map(|v| v.unwrap_or(ABSENT)).collect();
        write_row(out, &row, &widths)?;
    }
    Ok(())
}

fn write_row<W: Write>(out: &mut W, cells: &[&str], widths: &[usize]) -> Result<()> {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = width))
        .collect::<Vec<_>>()
        .join("  ");

    writeln!(out, "{}", line.trim_end())
        .map_err(AccessLogError::from)
        .attach("Failed to write output")?;
    Ok(())
}
