use crate::error::{AccessLogError, Result};
use crate::ingestion::{Field, LogRecord, ProcessedTable};
use crate::storage::schema::{
    DEFAULT_TABLE, column_list, generate_create_table_sql, generate_insert_sql,
};
use duckdb::{Connection, params_from_iter};
use rootcause::prelude::*;

/// DuckDB-backed table of extracted records, queryable with SQL.
pub struct AccessLogDatabase {
    conn: Connection,
    table_name: String,
}

impl AccessLogDatabase {
    /// Create a new in-memory database with an empty access log table
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(AccessLogError::from)
            .attach("Failed to create in-memory DuckDB connection")?;

        let db = Self {
            conn,
            table_name: DEFAULT_TABLE.to_string(),
        };
        db.create_table()?;
        Ok(db)
    }

    /// Build an in-memory database and load every record of `table` into it.
    pub fn from_table(table: &ProcessedTable) -> Result<Self> {
        let mut db = Self::new_in_memory()?;
        db.insert_table(table)?;
        Ok(db)
    }

    fn create_table(&self) -> Result<()> {
        let create_sql = generate_create_table_sql(&self.table_name);
        tracing::debug!("Creating table with SQL: {}", create_sql);

        self.conn
            .execute_batch(&create_sql)
            .map_err(AccessLogError::from)
            .attach_with(|| format!("Failed to create table with SQL: {}", create_sql))?;

        Ok(())
    }

    /// Insert every record in a single transaction, keeping table order.
    pub fn insert_table(&mut self, table: &ProcessedTable) -> Result<usize> {
        tracing::info!("Inserting {} records into database", table.len());

        let insert_sql = generate_insert_sql(&self.table_name);
        tracing::debug!("Insert SQL: {}", insert_sql);

        let tx = self
            .conn
            .transaction()
            .map_err(AccessLogError::from)
            .attach("Failed to start transaction")?;

        let mut inserted = 0;
        for record in table {
            tx.execute(&insert_sql, params_from_iter(record.values()))
                .map_err(AccessLogError::from)
                .attach_with(|| {
                    format!("Failed to insert record {} with SQL: {}", inserted + 1, insert_sql)
                })?;

            inserted += 1;
        }

        tx.commit()
            .map_err(AccessLogError::from)
            .attach("Failed to commit transaction")?;

        tracing::info!("Successfully inserted {} records", inserted);

        Ok(inserted)
    }

    pub fn count_rows(&self) -> Result<usize> {
        let count: usize = self
            .conn
            .query_row(
                &format!("SELECT COUNT(*) FROM {}", self.table_name),
                [],
                |row| row.get(0),
            )
            .map_err(AccessLogError::from)
            .attach("Failed to count rows")?;

        Ok(count)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Query records with an optional WHERE clause, in insertion order.
    /// NULL columns come back as absent fields.
    pub fn query_records(&self, where_clause: Option<&str>) -> Result<Vec<LogRecord>> {
        if let Some(clause) = where_clause {
            if has_statement_separator(clause) {
                return Err(Report::new(AccessLogError::InvalidQuery(clause.to_string())));
            }
        }

        let sql = match where_clause {
            Some(clause) => format!(
                "SELECT {} FROM {} WHERE {} ORDER BY id",
                column_list(),
                self.table_name,
                clause
            ),
            None => format!("SELECT {} FROM {} ORDER BY id", column_list(), self.table_name),
        };

        tracing::debug!("Executing query: {}", sql);

        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(AccessLogError::from)
            .attach_with(|| format!("Failed to prepare query: {}", sql))?;

        let rows = stmt
            .query_map([], |row| {
                let mut record = LogRecord::default();
                for (i, field) in Field::ALL.iter().enumerate() {
                    record.set(*field, row.get::<_, Option<String>>(i)?);
                }
                Ok(record)
            })
            .map_err(AccessLogError::from)
            .attach_with(|| format!("Failed to query records with SQL: {}", sql))?;

        let records: std::result::Result<Vec<_>, _> = rows.collect();
        let records = records
            .map_err(AccessLogError::from)
            .attach("Failed to collect query results")?;

        tracing::info!("Query returned {} records", records.len());

        Ok(records)
    }

    /// Row counts per status code, ordered by status. Rows without a status
    /// are grouped under `None` and sort last.
    pub fn status_histogram(&self) -> Result<Vec<(Option<String>, usize)>> {
        let sql = format!(
            "SELECT status, COUNT(*) FROM {} GROUP BY status ORDER BY status NULLS LAST",
            self.table_name
        );

        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(AccessLogError::from)
            .attach_with(|| format!("Failed to prepare query: {}", sql))?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, Option<String>>(0)?, row.get::<_, usize>(1)?)))
            .map_err(AccessLogError::from)
            .attach("Failed to query status histogram")?;

        let mut histogram = Vec::new();
        for row_result in rows {
            let entry = row_result
                .map_err(AccessLogError::from)
                .attach("Failed to read histogram row")?;
            histogram.push(entry);
        }

        Ok(histogram)
    }
}

/// True when `clause` contains a `;` outside single-quoted literals and
/// double-quoted identifiers. Doubled quotes toggle twice and cancel out.
fn has_statement_separator(clause: &str) -> bool {
    let mut quote: Option<char> = None;
    for c in clause.chars() {
        match (quote, c) {
            (None, '\'' | '"') => quote = Some(c),
            (Some(open), _) if c == open => quote = None,
            (None, ';') => return true,
            _ => {}
        }
    }
    false
}
