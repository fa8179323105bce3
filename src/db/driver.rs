//! Database driver seam and the native SQL Server (TDS) implementation

use crate::db::params::ConnectionDescriptor;
use crate::db::query::{extract_cell_value, CellValue, ColumnInfo, QueryResult};
use crate::error::{Result, SlateError};
use async_trait::async_trait;
use futures::TryStreamExt;
use std::time::Instant;
use tiberius::{AuthMethod, Client, Config, EncryptionLevel, QueryItem};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

/// Opens sessions from a connection descriptor
#[async_trait]
pub trait Driver: Send + Sync {
    async fn open(&self, descriptor: &ConnectionDescriptor) -> Result<Box<dyn Session>>;
}

/// An open connection that runs SQL
#[async_trait]
pub trait Session: Send {
    /// Run `sql` and collect its first result set
    async fn query(&mut self, sql: &str) -> Result<QueryResult>;

    /// Say goodbye to the server. The session is unusable afterwards.
    async fn close(&mut self) -> Result<()>;
}

/// Native TDS driver built on tiberius
#[derive(Clone, Copy, Debug, Default)]
pub struct TiberiusDriver;

impl TiberiusDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Driver for TiberiusDriver {
    async fn open(&self, descriptor: &ConnectionDescriptor) -> Result<Box<dyn Session>> {
        let parts = descriptor.parse()?;
        let connection_error = |message: String| SlateError::Connection {
            host: parts.host.clone(),
            port: parts.port,
            message,
        };

        let mut config = Config::new();

        config.host(&parts.host);
        config.port(parts.port);
        config.database(&parts.database);
        config.authentication(AuthMethod::sql_server(
            &parts.username,
            parts.password.expose(),
        ));

        if parts.trust_server_certificate {
            config.trust_cert();
        }

        config.encryption(if parts.encrypt {
            EncryptionLevel::Required
        } else {
            EncryptionLevel::Off
        });

        if let Some(driver) = &parts.driver {
            tracing::debug!(driver = %driver, "ODBC driver identifier not used by native TDS client");
        }

        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| connection_error(e.to_string()))?;

        tcp.set_nodelay(true)
            .map_err(|e| connection_error(e.to_string()))?;

        let client = Client::connect(config, tcp.compat_write())
            .await
            .map_err(|e| connection_error(format!("authentication failed: {}", e)))?;

        tracing::debug!(host = %parts.host, port = parts.port, database = %parts.database, "session opened");

        Ok(Box::new(TiberiusSession {
            client: Some(client),
        }))
    }
}

/// Session over a single tiberius client
pub struct TiberiusSession {
    client: Option<Client<Compat<TcpStream>>>,
}

#[async_trait]
impl Session for TiberiusSession {
    async fn query(&mut self, sql: &str) -> Result<QueryResult> {
        let client = self
            .client
            .as_mut()
            .ok_or_else(|| SlateError::Query("session is closed".to_string()))?;

        let start = Instant::now();
        let mut stream = client
            .simple_query(sql)
            .await
            .map_err(|e| SlateError::Query(e.to_string()))?;

        let mut columns: Vec<ColumnInfo> = Vec::new();
        let mut rows: Vec<Vec<CellValue>> = Vec::new();

        // Drain every item so the connection is ready for the next query,
        // but only keep the first result set
        while let Some(item) = stream
            .try_next()
            .await
            .map_err(|e| SlateError::Query(e.to_string()))?
        {
            match item {
                QueryItem::Metadata(meta) if meta.result_index() == 0 => {
                    columns = meta.columns().iter().map(ColumnInfo::from_column).collect();
                }
                QueryItem::Row(row) if row.result_index() == 0 => {
                    let values = row
                        .columns()
                        .iter()
                        .enumerate()
                        .map(|(i, col)| extract_cell_value(&row, i, col))
                        .collect();
                    rows.push(values);
                }
                _ => {}
            }
        }

        let mut result = QueryResult::new(columns, rows);
        result.execution_time = start.elapsed();
        Ok(result)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(client) = self.client.take() {
            client
                .close()
                .await
                .map_err(|e| SlateError::Query(e.to_string()))?;
        }
        Ok(())
    }
}
