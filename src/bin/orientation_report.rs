//! Orientation status counts report
//! Run with: cargo run --release --bin orientation_report

use anyhow::{Context, Result};
use clap::Parser;
use slate_connect::config::SlateConfig;
use slate_connect::export::write_csv;
use slate_connect::utils::{format_duration, init_logging};
use std::path::PathBuf;

/// Orientation status counts since April 1, 2024
const ORIENTATION_STATUS_QUERY: &str = r#"
SELECT
    COALESCE(r.[status], 'register') AS status,
    COUNT(*) AS status_count
FROM [form.response] r
INNER JOIN [form] f ON (f.[id] = r.[form])
LEFT OUTER JOIN [form] fp ON (fp.[id] = f.[parent])
WHERE f.[type] = 'event'
AND ISNULL(f.[scope], fp.[scope]) = 'application'
AND f.date > '2024-04-01'
AND COALESCE(r.[status], 'register') IN ('register', 'attend', 'noshow', 'cancel')
AND LOWER(f.category) LIKE '%orientation%'
AND r.[record] IS NOT NULL
GROUP BY COALESCE(r.[status], 'register')
ORDER BY status
"#;

#[derive(Debug, Parser)]
#[command(name = "orientation_report", about = "Write orientation status counts to CSV")]
struct Args {
    /// Config file (defaults to <config dir>/slate-connect/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output file
    #[arg(long, short = 'o', default_value = "example.csv")]
    out: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let config = SlateConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    let mut conn = config.into_connection();

    let result = conn
        .execute_query(ORIENTATION_STATUS_QUERY)
        .await
        .context("Orientation status query failed")?;

    write_csv(&result, &args.out)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;

    tracing::info!(
        rows = result.row_count(),
        elapsed = %format_duration(result.execution_time),
        out = %args.out.display(),
        "report written"
    );

    conn.close().await?;
    Ok(())
}
