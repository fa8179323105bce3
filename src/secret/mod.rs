//! Credential storage and interactive password entry

mod keyring_store;
mod prompt;

pub use keyring_store::KeyringStore;
pub use prompt::{Prompter, TerminalPrompter};

use crate::error::Result;
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use zeroize::Zeroizing;

/// Keyring service name every password is stored under
pub const SECRET_NAMESPACE: &str = "SlateSQLConnection";

/// A password that is wiped from memory on drop and never printed
#[derive(Clone)]
pub struct Credential(Zeroizing<String>);

impl Credential {
    pub fn new(secret: String) -> Self {
        Self(Zeroizing::new(secret))
    }

    /// Borrow the plaintext. Keep the borrow short.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Credential {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

/// Durable secret storage keyed by (namespace, principal)
pub trait SecretStore: Send + Sync {
    /// Look up a secret; `Ok(None)` when nothing is stored
    fn get_secret(&self, namespace: &str, principal: &str) -> Result<Option<Credential>>;

    /// Store or overwrite a secret
    fn set_secret(&self, namespace: &str, principal: &str, secret: &Credential) -> Result<()>;
}

/// In-process secret store, useful for tests and non-interactive runs
#[derive(Default)]
pub struct MemorySecretStore {
    secrets: Mutex<HashMap<(String, String), Credential>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a secret under [`SECRET_NAMESPACE`]
    pub fn with_secret(self, principal: &str, secret: &str) -> Self {
        self.lock().insert(
            (SECRET_NAMESPACE.to_string(), principal.to_string()),
            Credential::from(secret),
        );
        self
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(String, String), Credential>> {
        self.secrets.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SecretStore for MemorySecretStore {
    fn get_secret(&self, namespace: &str, principal: &str) -> Result<Option<Credential>> {
        Ok(self
            .lock()
            .get(&(namespace.to_string(), principal.to_string()))
            .cloned())
    }

    fn set_secret(&self, namespace: &str, principal: &str, secret: &Credential) -> Result<()> {
        self.lock().insert(
            (namespace.to_string(), principal.to_string()),
            secret.clone(),
        );
        Ok(())
    }
}
