pub mod database;
pub mod schema;

pub use database::AccessLogDatabase;
pub use schema::{DEFAULT_TABLE, generate_create_table_sql};
