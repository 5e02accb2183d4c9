// ABOUTME: Connection and catalog operations
// ABOUTME: Handles connection testing, table/column listing, and raw read queries

use thiserror::Error;

use crate::config::ConnectionConfig;
use crate::db::clickhouse::{ClickHouseConnection, ClickHouseError};
use crate::models::{ColumnSchema, HealthStatus, ResultPage};

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Failed to connect to ClickHouse: {0}")]
    Failed(#[from] ClickHouseError),
}

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to connect to ClickHouse: {0}")]
    Connection(#[source] ClickHouseError),
    #[error("Catalog query failed: {0}")]
    Query(#[source] ClickHouseError),
}

/// Test connection to ClickHouse using the provided settings.
///
/// Returns `Ok(true)` once a session is open and the server answered a
/// version query; any failure surfaces as `ConnectionError`.
pub async fn test_connection(config: &ConnectionConfig) -> Result<bool, ConnectionError> {
    let conn = ClickHouseConnection::connect(config).await?;
    let version = conn.server_version().await?;

    log::info!(
        "Connected to ClickHouse {} at {}:{}",
        version,
        config.host,
        config.port
    );
    Ok(true)
}

/// Check overall health status
pub async fn health(config: &ConnectionConfig) -> HealthStatus {
    let mut connected = false;
    let mut server_version = None;

    if let Ok(conn) = ClickHouseConnection::connect(config).await {
        if let Ok(version) = conn.server_version().await {
            connected = true;
            server_version = Some(version);
        }
    }

    HealthStatus {
        connected,
        server_version,
    }
}

/// Get table names in the configured database, in server order
pub async fn list_tables(config: &ConnectionConfig) -> Result<Vec<String>, MetadataError> {
    let conn = connect(config).await?;
    conn.list_tables().await.map_err(MetadataError::Query)
}

/// Get column names for a table.
///
/// An absent table yields an empty list; only genuine introspection
/// failures raise `MetadataError`.
pub async fn list_columns(
    config: &ConnectionConfig,
    table: &str,
) -> Result<Vec<String>, MetadataError> {
    let conn = connect(config).await?;

    if !conn.table_exists(table).await.map_err(MetadataError::Query)? {
        log::debug!("Table '{}' not found in '{}'", table, config.database);
        return Ok(Vec::new());
    }

    conn.list_columns(table).await.map_err(MetadataError::Query)
}

/// Get column names and types for a table; empty when the table is absent
pub async fn describe_table(
    config: &ConnectionConfig,
    table: &str,
) -> Result<Vec<ColumnSchema>, MetadataError> {
    let conn = connect(config).await?;

    if !conn.table_exists(table).await.map_err(MetadataError::Query)? {
        return Ok(Vec::new());
    }

    conn.describe_table(table).await.map_err(MetadataError::Query)
}

/// Run an arbitrary read statement and return its columns and rows
pub async fn run_query(
    config: &ConnectionConfig,
    statement: &str,
) -> Result<ResultPage, MetadataError> {
    let conn = connect(config).await?;
    conn.query_compact(statement, &[])
        .await
        .map_err(MetadataError::Query)
}

async fn connect(config: &ConnectionConfig) -> Result<ClickHouseConnection, MetadataError> {
    ClickHouseConnection::connect(config)
        .await
        .map_err(MetadataError::Connection)
}
