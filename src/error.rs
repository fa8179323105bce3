//! Error types for slate_connect

use thiserror::Error;

/// Errors surfaced by the connection manager and its collaborators
#[derive(Error, Debug)]
pub enum SlateError {
    /// No stored secret and no way to ask for one
    #[error("Credential unavailable for '{principal}': {reason}")]
    CredentialUnavailable { principal: String, reason: String },

    /// The secret store itself failed (locked keyring, no backend, ...)
    #[error("Secret store error: {0}")]
    SecretStore(String),

    /// Opening a session failed
    #[error("Failed to connect to {host}:{port}: {message}")]
    Connection {
        host: String,
        port: u16,
        message: String,
    },

    /// Executing SQL failed
    #[error("Query failed: {0}")]
    Query(String),

    /// The connection descriptor string could not be understood
    #[error("Invalid connection descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SlateError {
    pub(crate) fn credential_unavailable(principal: &str, reason: impl Into<String>) -> Self {
        Self::CredentialUnavailable {
            principal: principal.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<csv::Error> for SlateError {
    fn from(e: csv::Error) -> Self {
        Self::Export(e.to_string())
    }
}

impl From<serde_json::Error> for SlateError {
    fn from(e: serde_json::Error) -> Self {
        Self::Export(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SlateError>;
