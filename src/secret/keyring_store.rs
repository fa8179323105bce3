//! OS keyring backend (macOS Keychain, Windows Credential Manager, Linux kernel keyring)

use super::{Credential, SecretStore};
use crate::error::{Result, SlateError};
use keyring::Entry;

/// Secret store backed by the platform keyring
#[derive(Clone, Copy, Debug, Default)]
pub struct KeyringStore;

impl KeyringStore {
    pub fn new() -> Self {
        Self
    }

    fn entry(namespace: &str, principal: &str) -> Result<Entry> {
        Entry::new(namespace, principal).map_err(|e| SlateError::SecretStore(e.to_string()))
    }
}

impl SecretStore for KeyringStore {
    fn get_secret(&self, namespace: &str, principal: &str) -> Result<Option<Credential>> {
        match Self::entry(namespace, principal)?.get_password() {
            Ok(password) => Ok(Some(Credential::new(password))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(SlateError::SecretStore(e.to_string())),
        }
    }

    fn set_secret(&self, namespace: &str, principal: &str, secret: &Credential) -> Result<()> {
        Self::entry(namespace, principal)?
            .set_password(secret.expose())
            .map_err(|e| SlateError::SecretStore(e.to_string()))?;
        tracing::debug!(namespace, principal, "stored secret in keyring");
        Ok(())
    }
}
