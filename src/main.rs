//! slate-connect: test, query and manage credentials for a Slate database

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use slate_connect::config::SlateConfig;
use slate_connect::db::{SlateConnection, DEFAULT_DRIVER, DEFAULT_PORT};
use slate_connect::export::{self, CsvOptions, ExportFormat};
use slate_connect::utils::{format_duration, format_number, init_logging};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "slate-connect", version, about)]
struct Cli {
    /// Config file (defaults to <config dir>/slate-connect/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Write a config file with the given connection settings.
    Init {
        #[arg(long)]
        username: String,
        #[arg(long)]
        database: String,
        #[arg(long)]
        hostname: String,
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
        #[arg(long, default_value = DEFAULT_DRIVER)]
        driver: String,
        /// Replace an existing config file.
        #[arg(long)]
        force: bool,
    },
    /// Run `SELECT 1` and report whether the database is reachable.
    Test,
    /// Prompt for a new password and store it in the keyring.
    ResetPassword,
    /// Run a query and write the results as CSV (or JSON for *.json).
    Query {
        /// SQL text to run.
        sql: Option<String>,

        /// Read the SQL from a file instead.
        #[arg(long, short = 'f', conflicts_with = "sql")]
        file: Option<PathBuf>,

        /// Write results here instead of stdout.
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,

        /// Field delimiter for CSV output.
        #[arg(long, short = 'd', default_value_t = ',')]
        delimiter: char,
    },
}

fn open_connection(config: Option<&Path>) -> Result<SlateConnection> {
    let config = SlateConfig::load(config).context("Failed to load configuration")?;
    Ok(config.into_connection())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.cmd {
        Cmd::Init {
            username,
            database,
            hostname,
            port,
            driver,
            force,
        } => {
            let Some(path) = cli.config.or_else(SlateConfig::default_path) else {
                bail!("No config directory on this platform; pass --config");
            };
            let config = SlateConfig {
                username,
                database,
                hostname,
                port,
                driver,
            };
            config
                .save(&path, force)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        Cmd::Test => {
            let mut conn = open_connection(cli.config.as_deref())?;
            let ok = conn.check_connection().await;
            conn.close().await?;
            if !ok {
                std::process::exit(1);
            }
        }
        Cmd::ResetPassword => {
            open_connection(cli.config.as_deref())?
                .reset_credential()
                .context("Failed to reset password")?;
        }
        Cmd::Query {
            sql,
            file,
            out,
            delimiter,
        } => {
            let sql = match (sql, file) {
                (Some(sql), _) => sql,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, None) => bail!("Provide SQL text or --file"),
            };
            if !delimiter.is_ascii() {
                bail!("Delimiter must be a single ASCII character");
            }

            let mut conn = open_connection(cli.config.as_deref())?;
            let result = conn.execute_query(&sql).await?;
            conn.close().await?;
            eprintln!(
                "{} row(s) in {}",
                format_number(result.row_count() as i64),
                format_duration(result.execution_time)
            );

            let options = CsvOptions {
                delimiter: delimiter as u8,
                ..CsvOptions::default()
            };
            match out {
                Some(path) if ExportFormat::from_path(&path) == ExportFormat::Json => {
                    export::write_json(&result, &path)?;
                }
                Some(path) => {
                    let file = std::fs::File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    export::write_csv_to(&result, std::io::BufWriter::new(file), options)?;
                }
                None => export::write_csv_to(&result, std::io::stdout().lock(), options)?,
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn init_defaults_port_and_driver() {
        let cli = Cli::try_parse_from([
            "slate-connect",
            "init",
            "--username",
            "jdoe",
            "--database",
            "slate",
            "--hostname",
            "slate.example.edu",
        ])
        .unwrap();

        match cli.cmd {
            Cmd::Init {
                port, driver, force, ..
            } => {
                assert_eq!(port, 1433);
                assert_eq!(driver, "ODBC+Driver+17+for+SQL+Server");
                assert!(!force);
            }
            other => panic!("parsed as {other:?}"),
        }
    }

    #[test]
    fn init_requires_hostname() {
        assert!(Cli::try_parse_from([
            "slate-connect",
            "init",
            "--username",
            "jdoe",
            "--database",
            "slate",
        ])
        .is_err());
    }
}
