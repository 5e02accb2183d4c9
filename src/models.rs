// ABOUTME: Shared data models for chferry
// ABOUTME: Mirrors the wire structures of the original ingestion backend for API compatibility

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ConnectionConfig;
use crate::db::sql;

/// Fully-qualified identifier of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    pub database: String,
    pub name: String,
}

impl TableRef {
    pub fn new(database: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            name: name.into(),
        }
    }

    /// Backtick-quoted `database`.`table` form for statement text
    pub fn qualified(&self) -> String {
        format!(
            "{}.{}",
            sql::quote_ident(&self.database),
            sql::quote_ident(&self.name)
        )
    }
}

/// One column from result metadata or the system catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

/// Columns and rows of one read statement, in server order
#[derive(Debug, Clone)]
pub struct ResultPage {
    pub columns: Vec<ColumnSchema>,
    pub rows: Vec<Vec<Value>>,
}

/// A preview row: column name to value, preserving server column order
pub type PreviewRow = serde_json::Map<String, Value>;

/// Endpoint kind of an ingestion source or target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndpointKind {
    #[serde(rename = "CLICKHOUSE")]
    ClickHouse,
    #[serde(rename = "FLAT_FILE")]
    FlatFile,
}

/// Transfer request from the caller, one per ingest/export invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionRequest {
    #[serde(rename = "sourceType")]
    pub source_type: EndpointKind,
    #[serde(rename = "targetType")]
    pub target_type: EndpointKind,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub database: String,
    pub username: String,
    #[serde(rename = "jwtToken", default)]
    pub jwt_token: String,
    #[serde(rename = "tableName")]
    pub table_name: String,
    #[serde(rename = "selectedColumns", default)]
    pub selected_columns: Vec<String>,
    #[serde(rename = "filePath", default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub delimiter: Option<String>,
    #[serde(rename = "outputFileName", default)]
    pub output_file_name: Option<String>,
}

fn default_port() -> u16 {
    8123
}

impl IngestionRequest {
    /// Connection settings carried inside the request
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            host: self.host.clone(),
            port: self.port,
            database: self.database.clone(),
            username: self.username.clone(),
            password: String::new(),
            jwt_token: self.jwt_token.clone(),
        }
    }

    /// The table the request reads from or writes to
    pub fn table_ref(&self) -> TableRef {
        TableRef::new(self.database.clone(), self.table_name.clone())
    }

    /// Requested field delimiter, defaulting to comma
    pub fn delimiter_char(&self) -> char {
        self.delimiter
            .as_ref()
            .and_then(|d| d.chars().next())
            .unwrap_or(',')
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub connected: bool,
    #[serde(rename = "serverVersion", default)]
    pub server_version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_ref_qualified() {
        let table = TableRef::new("analytics", "events");
        assert_eq!(table.qualified(), "`analytics`.`events`");
    }

    #[test]
    fn test_ingestion_request_wire_names() {
        let json = r#"{
            "sourceType": "FLAT_FILE",
            "targetType": "CLICKHOUSE",
            "host": "localhost",
            "port": 8123,
            "database": "default",
            "username": "default",
            "jwtToken": "",
            "tableName": "trips",
            "selectedColumns": ["a", "b"],
            "filePath": "/tmp/trips.csv",
            "delimiter": ";"
        }"#;
        let request: IngestionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.source_type, EndpointKind::FlatFile);
        assert_eq!(request.target_type, EndpointKind::ClickHouse);
        assert_eq!(request.delimiter_char(), ';');
        assert_eq!(request.table_ref().qualified(), "`default`.`trips`");
    }

    #[test]
    fn test_delimiter_defaults_to_comma() {
        let json = r#"{
            "sourceType": "CLICKHOUSE",
            "targetType": "FLAT_FILE",
            "host": "localhost",
            "database": "default",
            "username": "default",
            "tableName": "trips"
        }"#;
        let request: IngestionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.port, 8123);
        assert_eq!(request.delimiter_char(), ',');
        assert!(request.output_file_name.is_none());
    }
}
