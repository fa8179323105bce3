//! Slate connection management

use crate::db::driver::{Driver, Session, TiberiusDriver};
use crate::db::params::ConnectionParams;
use crate::db::query::QueryResult;
use crate::error::{Result, SlateError};
use crate::secret::{Credential, KeyringStore, Prompter, SecretStore, TerminalPrompter, SECRET_NAMESPACE};
use crate::utils::format_duration;
use std::io::{self, Write};
use std::sync::Arc;

/// Query run by [`SlateConnection::test_connection`]
pub const TEST_QUERY: &str = "SELECT 1";

/// Keyring-backed connection to a Slate SQL Server database.
///
/// The session is opened on first use and kept until [`close`](Self::close)
/// or drop.
pub struct SlateConnection {
    params: ConnectionParams,
    secrets: Arc<dyn SecretStore>,
    prompter: Arc<dyn Prompter>,
    driver: Arc<dyn Driver>,
    session: Option<Box<dyn Session>>,
}

impl SlateConnection {
    /// Connection using the OS keyring, the terminal and the native TDS driver
    pub fn new(
        username: impl Into<String>,
        database: impl Into<String>,
        hostname: impl Into<String>,
        port: u16,
        driver: impl Into<String>,
    ) -> Self {
        Self::with_backends(
            ConnectionParams::new(username, database, hostname, port, driver),
            Arc::new(KeyringStore::new()),
            Arc::new(TerminalPrompter::new()),
            Arc::new(TiberiusDriver::new()),
        )
    }

    pub fn with_backends(
        params: ConnectionParams,
        secrets: Arc<dyn SecretStore>,
        prompter: Arc<dyn Prompter>,
        driver: Arc<dyn Driver>,
    ) -> Self {
        Self {
            params,
            secrets,
            prompter,
            driver,
            session: None,
        }
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Stored password for this user, asking for it (and storing it) if missing
    pub fn get_credential(&self) -> Result<Credential> {
        let username = &self.params.username;
        if let Some(credential) = self.secrets.get_secret(SECRET_NAMESPACE, username)? {
            return Ok(credential);
        }

        tracing::debug!(username = %username, "no stored password, prompting");
        let credential = self.prompt(&format!("Enter the password for {}: ", username))?;
        self.secrets
            .set_secret(SECRET_NAMESPACE, username, &credential)?;
        Ok(credential)
    }

    /// Ask for a new password and overwrite the stored one
    pub fn reset_credential(&self) -> Result<()> {
        self.reset_credential_with(&mut io::stdout().lock())
    }

    /// [`reset_credential`](Self::reset_credential), confirming on `out`
    pub fn reset_credential_with(&self, out: &mut impl Write) -> Result<()> {
        let username = &self.params.username;
        let credential = self.prompt(&format!("Enter the new password for {}: ", username))?;
        self.secrets
            .set_secret(SECRET_NAMESPACE, username, &credential)?;

        tracing::info!(username = %username, "password reset");
        writeln!(out, "Password has been reset successfully.")?;
        Ok(())
    }

    /// Open a new session. An existing session is closed first, so at most
    /// one is ever open.
    pub async fn connect(&mut self) -> Result<()> {
        let descriptor = {
            let credential = self.get_credential()?;
            self.params.descriptor(&credential)
        };

        if let Some(mut previous) = self.session.take() {
            tracing::debug!("closing existing session before reconnecting");
            if let Err(e) = previous.close().await {
                tracing::warn!(error = %e, "failed to close previous session");
            }
        }

        tracing::debug!(descriptor = %descriptor.redacted(), "opening session");
        self.session = Some(self.driver.open(&descriptor).await?);
        tracing::info!(
            host = %self.params.hostname,
            port = self.params.port,
            database = %self.params.database,
            "connected"
        );
        Ok(())
    }

    /// Run `sql`, connecting first if needed
    pub async fn execute_query(&mut self, sql: &str) -> Result<QueryResult> {
        if self.session.is_none() {
            self.connect().await?;
        }

        let session = self
            .session
            .as_mut()
            .ok_or_else(|| SlateError::Query("no open session".to_string()))?;

        let result = session.query(sql).await?;
        tracing::debug!(
            rows = result.row_count(),
            elapsed = %format_duration(result.execution_time),
            "query finished"
        );
        Ok(result)
    }

    /// Run [`TEST_QUERY`] and report whether it worked
    pub async fn test_connection(&mut self) -> Result<()> {
        self.execute_query(TEST_QUERY).await.map(|_| ())
    }

    /// Print-and-continue wrapper around [`test_connection`](Self::test_connection).
    /// Never fails; returns whether the test query succeeded.
    pub async fn check_connection(&mut self) -> bool {
        self.check_connection_with(&mut io::stdout()).await
    }

    /// [`check_connection`](Self::check_connection), reporting on `out`
    pub async fn check_connection_with(&mut self, out: &mut (impl Write + Send)) -> bool {
        // Reporting is best effort; a broken `out` must not turn into a failure
        match self.test_connection().await {
            Ok(()) => {
                let _ = writeln!(
                    out,
                    "Connection test successful. The database connection is working."
                );
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "connection test failed");
                let _ = writeln!(out, "Connection test failed: {}", e);
                false
            }
        }
    }

    /// Close the session if one is open
    pub async fn close(&mut self) -> Result<()> {
        if let Some(mut session) = self.session.take() {
            session.close().await?;
            tracing::info!("session closed");
        }
        Ok(())
    }

    fn prompt(&self, message: &str) -> Result<Credential> {
        self.prompter
            .prompt_secret(message)
            .map_err(|e| SlateError::credential_unavailable(&self.params.username, e.to_string()))
    }
}

impl std::fmt::Debug for SlateConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlateConnection")
            .field("params", &self.params)
            .field("connected", &self.is_connected())
            .finish()
    }
}
