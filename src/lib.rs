// ABOUTME: Main library for chferry
// ABOUTME: Contains module declarations and the public boundary surface

pub mod config;
pub mod db;
pub mod flatfile;
pub mod models;
pub mod ops;

pub use config::{AppConfig, ConfigError, ConnectionConfig};
pub use db::clickhouse::{ClickHouseConnection, ClickHouseError};
pub use models::{
    ColumnSchema, EndpointKind, HealthStatus, IngestionRequest, PreviewRow, ResultPage, TableRef,
};
pub use ops::connection::{
    describe_table, health, list_columns, list_tables, run_query, test_connection,
    ConnectionError, MetadataError,
};
pub use ops::ingestion::{export, ingest, preview, run_transfer, ExportError, IngestError};
