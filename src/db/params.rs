//! Connection parameters and the connection descriptor string

use crate::error::{Result, SlateError};
use crate::secret::Credential;
use std::fmt;
use zeroize::Zeroizing;

/// URL scheme of the connection descriptor
pub const DESCRIPTOR_SCHEME: &str = "mssql+pyodbc";

/// Default SQL Server port
pub const DEFAULT_PORT: u16 = 1433;

/// Default ODBC driver identifier, already in URL form
pub const DEFAULT_DRIVER: &str = "ODBC+Driver+17+for+SQL+Server";

/// Where and as whom to connect. Never carries the password.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionParams {
    pub username: String,
    pub database: String,
    pub hostname: String,
    pub port: u16,
    pub driver: String,
}

impl ConnectionParams {
    pub fn new(
        username: impl Into<String>,
        database: impl Into<String>,
        hostname: impl Into<String>,
        port: u16,
        driver: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            database: database.into(),
            hostname: hostname.into(),
            port,
            driver: driver.into(),
        }
    }

    /// Assemble the descriptor for these parameters and `credential`.
    ///
    /// Values are inserted verbatim; nothing is percent-encoded.
    pub fn descriptor(&self, credential: &Credential) -> ConnectionDescriptor {
        ConnectionDescriptor::new(format!(
            "{}://{}:{}@{},{}/{}?driver={}&Encrypt=yes&TrustServerCertificate=Yes",
            DESCRIPTOR_SCHEME,
            self.username,
            credential.expose(),
            self.hostname,
            self.port,
            self.database,
            self.driver,
        ))
    }
}

/// The assembled connection string. Contains the password, so it is wiped
/// on drop and only ever logged in redacted form.
pub struct ConnectionDescriptor(Zeroizing<String>);

impl ConnectionDescriptor {
    pub fn new(url: String) -> Self {
        Self(Zeroizing::new(url))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The descriptor with the password replaced by `***`
    pub fn redacted(&self) -> String {
        let url = self.as_str();
        let Some(start) = url.find("://").map(|i| i + 3) else {
            return "***".to_string();
        };
        let auth_end = url.rfind('@').filter(|&at| at >= start);
        match auth_end.and_then(|at| url[start..at].find(':').map(|c| (start + c, at))) {
            Some((colon, at)) => format!("{}:***{}", &url[..colon], &url[at..]),
            None => url.to_string(),
        }
    }

    /// Split the descriptor back into its components
    pub fn parse(&self) -> Result<DescriptorParts> {
        let url = self.as_str();

        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| invalid("missing '://'"))?;
        if !scheme.eq_ignore_ascii_case(DESCRIPTOR_SCHEME) && !scheme.eq_ignore_ascii_case("mssql")
        {
            return Err(invalid(format!("unsupported scheme '{}'", scheme)));
        }

        // The password may itself contain '@', so split on the last one
        let at = rest.rfind('@').ok_or_else(|| invalid("missing credentials"))?;
        let (auth, target) = (&rest[..at], &rest[at + 1..]);

        let (username, password) = auth
            .split_once(':')
            .ok_or_else(|| invalid("missing password"))?;
        if username.is_empty() {
            return Err(invalid("empty username"));
        }

        let (location, query) = match target.split_once('?') {
            Some((location, query)) => (location, Some(query)),
            None => (target, None),
        };

        let (host_port, database) = location
            .split_once('/')
            .ok_or_else(|| invalid("missing database name"))?;
        if database.is_empty() {
            return Err(invalid("empty database name"));
        }

        let (host, port) = match host_port.rsplit_once(',') {
            Some((host, port)) => {
                let port = port
                    .trim()
                    .parse::<u16>()
                    .map_err(|_| invalid(format!("invalid port '{}'", port)))?;
                (host, port)
            }
            None => (host_port, DEFAULT_PORT),
        };
        if host.is_empty() {
            return Err(invalid("empty host"));
        }

        let mut parts = DescriptorParts {
            host: host.to_string(),
            port,
            username: username.to_string(),
            password: Credential::from(password),
            database: database.to_string(),
            driver: None,
            encrypt: false,
            trust_server_certificate: false,
        };

        for pair in query.unwrap_or_default().split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key.to_ascii_lowercase().as_str() {
                "driver" => parts.driver = Some(value.to_string()),
                "encrypt" => parts.encrypt = parse_flag(key, value)?,
                "trustservercertificate" => parts.trust_server_certificate = parse_flag(key, value)?,
                _ => tracing::debug!(key, "ignoring unknown descriptor option"),
            }
        }

        Ok(parts)
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConnectionDescriptor")
            .field(&self.redacted())
            .finish()
    }
}

/// A parsed connection descriptor
#[derive(Debug)]
pub struct DescriptorParts {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Credential,
    pub database: String,
    pub driver: Option<String>,
    pub encrypt: bool,
    pub trust_server_certificate: bool,
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" => Ok(true),
        "no" | "false" | "0" => Ok(false),
        _ => Err(invalid(format!("invalid value '{}' for {}", value, key))),
    }
}

fn invalid(message: impl Into<String>) -> SlateError {
    SlateError::InvalidDescriptor(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_params() -> ConnectionParams {
        ConnectionParams::new("u", "db", "h", 1433, DEFAULT_DRIVER)
    }

    #[test]
    fn descriptor_matches_expected_format() {
        let descriptor = sample_params().descriptor(&Credential::from("p"));
        assert_eq!(
            descriptor.as_str(),
            "mssql+pyodbc://u:p@h,1433/db?driver=ODBC+Driver+17+for+SQL+Server&Encrypt=yes&TrustServerCertificate=Yes"
        );
    }

    #[test]
    fn redacted_hides_password() {
        let descriptor = sample_params().descriptor(&Credential::from("s3cr3t"));
        let redacted = descriptor.redacted();
        assert!(!redacted.contains("s3cr3t"));
        assert!(redacted.starts_with("mssql+pyodbc://u:***@h,1433/db?driver="));
        assert!(!format!("{descriptor:?}").contains("s3cr3t"));
    }

    #[test]
    fn redacted_hides_password_containing_at() {
        let descriptor = sample_params().descriptor(&Credential::from("p@ss"));
        assert_eq!(
            descriptor.redacted(),
            "mssql+pyodbc://u:***@h,1433/db?driver=ODBC+Driver+17+for+SQL+Server&Encrypt=yes&TrustServerCertificate=Yes"
        );
    }

    #[test]
    fn parse_reads_back_all_parts() {
        let params = ConnectionParams::new(
            "jdoe",
            "slate_prod",
            "slate.example.edu",
            14330,
            DEFAULT_DRIVER,
        );
        let parts = params.descriptor(&Credential::from("pw")).parse().unwrap();

        assert_eq!(parts.host, "slate.example.edu");
        assert_eq!(parts.port, 14330);
        assert_eq!(parts.username, "jdoe");
        assert_eq!(parts.password.expose(), "pw");
        assert_eq!(parts.database, "slate_prod");
        assert_eq!(parts.driver.as_deref(), Some(DEFAULT_DRIVER));
        assert!(parts.encrypt);
        assert!(parts.trust_server_certificate);
    }

    #[test]
    fn parse_keeps_password_with_special_chars() {
        let parts = sample_params()
            .descriptor(&Credential::from("a:b@c"))
            .parse()
            .unwrap();
        assert_eq!(parts.username, "u");
        assert_eq!(parts.password.expose(), "a:b@c");
        assert_eq!(parts.host, "h");
    }

    #[test]
    fn parse_defaults_port_and_flags() {
        let parts = ConnectionDescriptor::new("mssql://u:p@h/db".to_string())
            .parse()
            .unwrap();
        assert_eq!(parts.port, DEFAULT_PORT);
        assert!(!parts.encrypt);
        assert!(!parts.trust_server_certificate);
        assert!(parts.driver.is_none());
    }

    #[test]
    fn parse_rejects_bad_input() {
        for bad in [
            "postgres://u:p@h,1433/db",
            "mssql+pyodbc//u:p@h,1433/db",
            "mssql+pyodbc://u:p@h,notaport/db",
            "mssql+pyodbc://u:p@h,1433",
            "mssql+pyodbc://up@h,1433/db",
            "mssql+pyodbc://u:p@h,1433/db?Encrypt=maybe",
        ] {
            let err = ConnectionDescriptor::new(bad.to_string()).parse().unwrap_err();
            assert!(
                matches!(err, SlateError::InvalidDescriptor(_)),
                "{bad} gave {err:?}"
            );
        }
    }
}
