use access_log_parser::error::{AccessLogError, Result};
use access_log_parser::output::{OutputFormat, write_records};
use access_log_parser::{AccessLogDatabase, ProcessedTable, extract, load};
use clap::Parser;
use rootcause::prelude::ResultExt;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Extract structured records from Apache access logs")]
struct Cli {
    /// Access log file to parse
    path: PathBuf,

    /// SQL condition applied to the extracted table, e.g. "status = '404'"
    #[arg(long = "where", value_name = "SQL")]
    filter: Option<String>,

    /// Maximum number of records to print
    #[arg(long)]
    limit: Option<usize>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let raw = match load(&cli.path) {
        Ok(raw) => raw,
        Err(report) => {
            match report.current_context() {
                AccessLogError::FileNotFound(path) => {
                    eprintln!("No log file at {}. Check the path.", path);
                }
                AccessLogError::EmptyInput(path) => {
                    eprintln!("{} is empty. Nothing to parse.", path);
                }
                _ => return Err(report),
            }
            std::process::exit(1);
        }
    };

    let table = extract(&raw);
    let db = AccessLogDatabase::from_table(&table).attach("Failed to load records into database")?;
    report_summary(&table, &db)?;

    let mut records = match cli.filter.as_deref() {
        Some(filter) => db
            .query_records(Some(filter))
            .attach_with(|| format!("Failed to apply filter: {}", filter))?,
        None => table.into_records(),
    };

    if let Some(limit) = cli.limit {
        records.truncate(limit);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_records(&mut out, &records, cli.format)?;

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn report_summary(table: &ProcessedTable, db: &AccessLogDatabase) -> Result<()> {
    let summary = table.summary();
    tracing::info!(
        "Extracted {} records, {} with every field present",
        summary.total,
        summary.complete
    );
    for (field, missing) in summary.absent.iter().filter(|(_, missing)| *missing > 0) {
        tracing::info!("  {}: absent in {} records", field, missing);
    }
    if let Some((first, last)) = summary.time_range {
        tracing::info!("Requests from {} to {}", first, last);
    }
    tracing::info!(
        "{} bytes sent, {} requests with a referrer",
        summary.bytes_sent,
        summary.with_referrer
    );

    for (status, count) in db.status_histogram()? {
        tracing::info!("  status {}: {}", status.as_deref().unwrap_or("(none)"), count);
    }
    Ok(())
}
