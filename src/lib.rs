//! Keyring-backed SQL Server connection helper for Slate CRM databases.
//!
//! A [`SlateConnection`](db::SlateConnection) holds the connection parameters,
//! resolves the password from the OS keyring (prompting once when it is
//! missing), opens a session lazily and returns query results as a
//! [`QueryResult`](db::QueryResult) that can be written out with [`export`].
//!
//! ```no_run
//! use slate_connect::config::SlateConfig;
//!
//! # async fn run() -> slate_connect::Result<()> {
//! let mut conn = SlateConfig::load(None)?.into_connection();
//! let result = conn.execute_query("SELECT 1 AS one").await?;
//! slate_connect::export::write_csv(&result, "example.csv")?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod secret;
pub mod utils;

pub use error::{Result, SlateError};
