//! Tests against a real SQL Server.
//!
//! Skipped unless `SLATE_TEST_HOST` is set. Other settings:
//!
//! | Environment Variable  | Default Value                   |
//! |-----------------------|---------------------------------|
//! | `SLATE_TEST_PORT`     | 1433                            |
//! | `SLATE_TEST_USER`     | "sa"                            |
//! | `SLATE_TEST_PASSWORD` | (required)                      |
//! | `SLATE_TEST_DATABASE` | "master"                        |
//!
//! ```bash
//! docker run -d -e ACCEPT_EULA=Y -e MSSQL_SA_PASSWORD='Str0ng!Passw0rd' \
//!   -p 1433:1433 mcr.microsoft.com/mssql/server:2022-latest
//! SLATE_TEST_HOST=localhost SLATE_TEST_PASSWORD='Str0ng!Passw0rd' cargo test --test live_server
//! ```

use slate_connect::db::{
    CellValue, ConnectionParams, SlateConnection, TiberiusDriver, DEFAULT_DRIVER,
};
use slate_connect::secret::{Credential, MemorySecretStore, Prompter};
use slate_connect::SlateError;
use std::io;
use std::sync::Arc;

struct NoPrompt;

impl Prompter for NoPrompt {
    fn prompt_secret(&self, _message: &str) -> io::Result<Credential> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "tests never prompt"))
    }
}

fn live_connection() -> Option<SlateConnection> {
    let host = std::env::var("SLATE_TEST_HOST").ok()?;
    let port = std::env::var("SLATE_TEST_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(1433);
    let user = std::env::var("SLATE_TEST_USER").unwrap_or_else(|_| "sa".to_string());
    let password = std::env::var("SLATE_TEST_PASSWORD").ok()?;
    let database = std::env::var("SLATE_TEST_DATABASE").unwrap_or_else(|_| "master".to_string());

    let store = MemorySecretStore::new().with_secret(&user, &password);
    Some(SlateConnection::with_backends(
        ConnectionParams::new(user, database, host, port, DEFAULT_DRIVER),
        Arc::new(store),
        Arc::new(NoPrompt),
        Arc::new(TiberiusDriver::new()),
    ))
}

#[tokio::test]
async fn select_one_against_server() {
    let Some(mut conn) = live_connection() else {
        eprintln!("SLATE_TEST_HOST not set, skipping");
        return;
    };

    conn.connect().await.expect("connect");
    let result = conn.execute_query("SELECT 1").await.expect("query");
    assert_eq!(result.scalar(), Some(&CellValue::Int(1)));
    conn.close().await.expect("close");
}

#[tokio::test]
async fn column_names_and_order_survive() {
    let Some(mut conn) = live_connection() else {
        return;
    };

    let result = conn
        .execute_query("SELECT 'attend' AS status, CAST(3 AS BIGINT) AS status_count, CAST(NULL AS INT) AS extra")
        .await
        .expect("query");

    let names: Vec<&str> = result.column_names().collect();
    assert_eq!(names, vec!["status", "status_count", "extra"]);
    assert_eq!(result.get(0, "status"), Some(&CellValue::String("attend".into())));
    assert_eq!(result.get(0, "status_count"), Some(&CellValue::Int(3)));
    assert_eq!(result.get(0, "extra"), Some(&CellValue::Null));
}

#[tokio::test]
async fn xml_columns_come_back_as_text() {
    let Some(mut conn) = live_connection() else {
        return;
    };

    let result = conn
        .execute_query("SELECT CAST('<a/>' AS XML) AS x, CAST(NULL AS XML) AS missing")
        .await
        .expect("query");

    assert_eq!(result.columns[0].type_name, "XML");
    match result.get(0, "x") {
        Some(CellValue::String(xml)) => assert!(xml.contains("<a"), "{xml}"),
        other => panic!("expected XML text, got {other:?}"),
    }
    assert_eq!(result.get(0, "missing"), Some(&CellValue::Null));
}

#[tokio::test]
async fn reconnect_keeps_one_working_session() {
    let Some(mut conn) = live_connection() else {
        return;
    };

    conn.connect().await.expect("connect");
    conn.connect().await.expect("reconnect");
    let result = conn.execute_query("SELECT 1").await.expect("query");
    assert_eq!(result.scalar(), Some(&CellValue::Int(1)));
    conn.close().await.expect("close");
    assert!(!conn.is_connected());
}

#[tokio::test]
async fn syntax_error_is_query_error() {
    let Some(mut conn) = live_connection() else {
        return;
    };

    let err = conn.execute_query("SELEC 1").await.unwrap_err();
    assert!(matches!(err, SlateError::Query(_)), "{err:?}");
}

#[tokio::test]
async fn unreachable_host_fails_test_without_panicking() {
    let store = MemorySecretStore::new().with_secret("u", "p");
    let mut conn = SlateConnection::with_backends(
        ConnectionParams::new("u", "db", "127.0.0.1", 1, DEFAULT_DRIVER),
        Arc::new(store),
        Arc::new(NoPrompt),
        Arc::new(TiberiusDriver::new()),
    );

    assert!(!conn.check_connection().await);
    assert!(!conn.is_connected());
}
