use crate::ingestion::Field;

pub const DEFAULT_TABLE: &str = "access_logs";

/// Generate the CREATE statements for a table holding one column per field.
/// Every column is TEXT so absent values and raw tokens like `-` survive as
/// extracted.
pub fn generate_create_table_sql(table_name: &str) -> String {
    let mut sql = format!("CREATE SEQUENCE IF NOT EXISTS seq_{}_id START 1;\n", table_name);
    sql.push_str(&format!("CREATE TABLE {} (\n", table_name));
    sql.push_str("    id INTEGER PRIMARY KEY DEFAULT nextval('seq_");
    sql.push_str(table_name);
    sql.push_str("_id'),\n");

    let columns: Vec<String> = Field::ALL
        .iter()
        .map(|field| format!("    {} TEXT", field.as_str()))
        .collect();
    sql.push_str(&columns.join(",\n"));
    sql.push_str("\n)");
    sql
}

pub fn generate_insert_sql(table_name: &str) -> String {
    let placeholders: Vec<String> = (1..=Field::ALL.len()).map(|i| format!("?{}", i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table_name,
        column_list(),
        placeholders.join(", ")
    )
}

/// Column names in field order, comma separated.
pub fn column_list() -> String {
    Field::ALL
        .iter()
        .map(|field| field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
