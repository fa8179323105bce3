//! Connection settings from a TOML file and environment variables

use crate::db::{ConnectionParams, SlateConnection, DEFAULT_DRIVER, DEFAULT_PORT};
use crate::error::{Result, SlateError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Everything needed to reach the Slate database, except the password
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlateConfig {
    pub username: String,
    pub database: String,
    pub hostname: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_driver")]
    pub driver: String,
}

/// File contents before environment overrides; any field may be missing
#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    username: Option<String>,
    database: Option<String>,
    hostname: Option<String>,
    port: Option<u16>,
    driver: Option<String>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_driver() -> String {
    DEFAULT_DRIVER.to_string()
}

impl SlateConfig {
    /// `<config dir>/slate-connect/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("slate-connect").join("config.toml"))
    }

    /// Load from `path` (must exist) or the default location (may be absent),
    /// then apply `SLATE_*` environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let partial = match path {
            Some(path) => PartialConfig::read(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => PartialConfig::read(&path)?,
                _ => PartialConfig::default(),
            },
        };

        partial
            .with_env(|key| std::env::var(key).ok())?
            .finish()
    }

    /// Parse a TOML document without consulting the environment
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| SlateError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| SlateError::Config(e.to_string()))
    }

    /// Write this config to `path`, creating parent directories. An existing
    /// file is only replaced when `overwrite` is set.
    pub fn save(&self, path: &Path, overwrite: bool) -> Result<()> {
        if path.exists() && !overwrite {
            return Err(SlateError::Config(format!(
                "{} already exists",
                path.display()
            )));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml()?)?;
        tracing::info!(path = %path.display(), "wrote config");
        Ok(())
    }

    pub fn connection_params(&self) -> ConnectionParams {
        ConnectionParams::new(
            self.username.clone(),
            self.database.clone(),
            self.hostname.clone(),
            self.port,
            self.driver.clone(),
        )
    }

    /// Connection backed by the OS keyring and the terminal prompt
    pub fn into_connection(self) -> SlateConnection {
        SlateConnection::new(
            self.username,
            self.database,
            self.hostname,
            self.port,
            self.driver,
        )
    }
}

impl PartialConfig {
    fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            SlateError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| SlateError::Config(format!("{}: {}", path.display(), e)))
    }

    fn with_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SLATE_USERNAME") {
            self.username = Some(v);
        }
        if let Some(v) = lookup("SLATE_DATABASE") {
            self.database = Some(v);
        }
        if let Some(v) = lookup("SLATE_HOSTNAME") {
            self.hostname = Some(v);
        }
        if let Some(v) = lookup("SLATE_PORT") {
            let port = v
                .trim()
                .parse()
                .map_err(|_| SlateError::Config(format!("SLATE_PORT is not a port: '{}'", v)))?;
            self.port = Some(port);
        }
        if let Some(v) = lookup("SLATE_DRIVER") {
            self.driver = Some(v);
        }
        Ok(self)
    }

    fn finish(self) -> Result<SlateConfig> {
        let required = |value: Option<String>, name: &str| {
            value
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| SlateError::Config(format!("missing required setting '{}'", name)))
        };

        Ok(SlateConfig {
            username: required(self.username, "username")?,
            database: required(self.database, "database")?,
            hostname: required(self.hostname, "hostname")?,
            port: self.port.unwrap_or(DEFAULT_PORT),
            driver: self.driver.unwrap_or_else(default_driver),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn from_toml_applies_defaults() {
        let config = SlateConfig::from_toml(
            r#"
            username = "jdoe"
            database = "slate"
            hostname = "slate.example.edu"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 1433);
        assert_eq!(config.driver, "ODBC+Driver+17+for+SQL+Server");
    }

    #[test]
    fn env_overrides_file() {
        let partial: PartialConfig = toml::from_str(
            r#"
            username = "jdoe"
            database = "slate"
            hostname = "old.example.edu"
            port = 1500
            "#,
        )
        .unwrap();

        let config = partial
            .with_env(env(&[("SLATE_HOSTNAME", "new.example.edu"), ("SLATE_PORT", "1433")]))
            .unwrap()
            .finish()
            .unwrap();

        assert_eq!(config.hostname, "new.example.edu");
        assert_eq!(config.port, 1433);
        assert_eq!(config.username, "jdoe");
    }

    #[test]
    fn env_alone_is_enough() {
        let config = PartialConfig::default()
            .with_env(env(&[
                ("SLATE_USERNAME", "u"),
                ("SLATE_DATABASE", "db"),
                ("SLATE_HOSTNAME", "h"),
                ("SLATE_DRIVER", "ODBC+Driver+18+for+SQL+Server"),
            ]))
            .unwrap()
            .finish()
            .unwrap();

        assert_eq!(
            config.connection_params(),
            ConnectionParams::new("u", "db", "h", 1433, "ODBC+Driver+18+for+SQL+Server")
        );
    }

    #[test]
    fn missing_required_setting_is_reported() {
        let err = PartialConfig::default()
            .with_env(env(&[("SLATE_USERNAME", "u"), ("SLATE_HOSTNAME", "h")]))
            .unwrap()
            .finish()
            .unwrap_err();
        assert!(err.to_string().contains("'database'"));
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = PartialConfig::default()
            .with_env(env(&[("SLATE_PORT", "14x3")]))
            .unwrap_err();
        assert!(matches!(err, SlateError::Config(_)));
    }

    #[test]
    fn load_reads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "username = \"jdoe\"\ndatabase = \"slate\"\nhostname = \"h\"\nport = 2433\n",
        )
        .unwrap();

        let partial = PartialConfig::read(&path).unwrap();
        let config = partial.with_env(|_| None).unwrap().finish().unwrap();
        assert_eq!(config.port, 2433);
        assert_eq!(config.database, "slate");
    }

    fn sample() -> SlateConfig {
        SlateConfig {
            username: "jdoe".into(),
            database: "slate".into(),
            hostname: "slate.example.edu".into(),
            port: 2433,
            driver: DEFAULT_DRIVER.into(),
        }
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        sample().save(&path, false).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("hostname = \"slate.example.edu\""));
        assert!(!content.to_lowercase().contains("password"));

        assert_eq!(SlateConfig::from_toml(&content).unwrap(), sample());
        let partial = PartialConfig::read(&path).unwrap();
        assert_eq!(partial.with_env(|_| None).unwrap().finish().unwrap(), sample());
    }

    #[test]
    fn save_refuses_to_clobber_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "keep me").unwrap();

        let err = sample().save(&path, false).unwrap_err();
        assert!(matches!(err, SlateError::Config(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep me");

        sample().save(&path, true).unwrap();
        let saved = SlateConfig::from_toml(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved, sample());
    }

    #[test]
    fn load_fails_for_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SlateConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, SlateError::Config(_)));
    }
}
