// ABOUTME: Row mover operations between ClickHouse and flat files
// ABOUTME: Ingest, export, preview, and the request-driven transfer entry point

use std::path::Path;
use thiserror::Error;

use crate::config::ConnectionConfig;
use crate::db::clickhouse::{ClickHouseConnection, ClickHouseError};
use crate::flatfile::{self, FlatFileError};
use crate::models::{EndpointKind, IngestionRequest, PreviewRow, ResultPage, TableRef};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to connect to ClickHouse: {0}")]
    Connection(#[source] ClickHouseError),
    #[error("Failed to parse delimited input: {0}")]
    Parse(#[from] FlatFileError),
    #[error("Column '{0}' is not present in the file header")]
    ColumnNotInHeader(String),
    #[error("Insert failed: {0}")]
    Insert(#[source] ClickHouseError),
    #[error("Failed to read rows: {0}")]
    Read(#[source] ClickHouseError),
    #[error("Failed to read source file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Ingestion request is missing field '{0}'")]
    MissingField(&'static str),
    #[error("Unsupported transfer direction: {from_kind:?} -> {target:?}")]
    UnsupportedDirection {
        from_kind: EndpointKind,
        target: EndpointKind,
    },
    #[error(transparent)]
    Export(#[from] ExportError),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to connect to ClickHouse: {0}")]
    Connection(#[source] ClickHouseError),
    #[error("Query failed: {0}")]
    Query(#[source] ClickHouseError),
    #[error("Failed to write output file: {0}")]
    Io(#[from] std::io::Error),
    #[error("No columns selected for export")]
    NoColumns,
}

/// Ingest delimited file content into a table.
///
/// The header row is the column-name source of truth: an empty `columns`
/// selection ingests every header column, and each selected column is
/// looked up in the header by name. All data rows are written as one
/// batched INSERT with no chunking, which puts a practical ceiling on
/// input size. Returns the number of ingested rows; a failed call may
/// leave partial effects on the target table.
pub async fn ingest(
    config: &ConnectionConfig,
    table: &str,
    columns: &[String],
    file_content: &str,
    delimiter: char,
) -> Result<u64, IngestError> {
    let conn = ClickHouseConnection::connect(config)
        .await
        .map_err(IngestError::Connection)?;

    let parsed = flatfile::parse_delimited(file_content, delimiter)?;

    let columns: Vec<String> = if columns.is_empty() {
        parsed.header.clone()
    } else {
        columns.to_vec()
    };

    let indices: Vec<usize> = columns
        .iter()
        .map(|column| {
            parsed
                .header
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| IngestError::ColumnNotInHeader(column.clone()))
        })
        .collect::<Result<_, _>>()?;

    let rows: Vec<Vec<Option<String>>> = parsed
        .rows
        .iter()
        .map(|row| indices.iter().map(|&index| row[index].clone()).collect())
        .collect();

    if rows.is_empty() {
        log::info!("No data rows in input; nothing ingested into '{}'", table);
        return Ok(0);
    }

    let table = TableRef::new(config.database.clone(), table);
    let count = conn
        .insert_rows(&table, &columns, &rows)
        .await
        .map_err(IngestError::Insert)?;

    log::info!("Ingested {} rows into {}", count, table.qualified());
    Ok(count)
}

/// Export table rows to a delimited file.
///
/// Writes a header line from `columns`, then one delimiter-joined line
/// per row in the value's plain string rendering. Embedded delimiters
/// and newlines are not escaped. Returns the number of exported rows.
pub async fn export(
    config: &ConnectionConfig,
    table: &str,
    columns: &[String],
    destination: &Path,
    delimiter: char,
) -> Result<u64, ExportError> {
    if columns.is_empty() {
        return Err(ExportError::NoColumns);
    }

    let conn = ClickHouseConnection::connect(config)
        .await
        .map_err(ExportError::Connection)?;

    let table = TableRef::new(config.database.clone(), table);
    let page = conn
        .select_columns(&table, columns)
        .await
        .map_err(ExportError::Query)?;

    let count = flatfile::write_delimited(destination, columns, &page.rows, delimiter).await?;

    log::info!(
        "Exported {} rows from {} to {}",
        count,
        table.qualified(),
        destination.display()
    );
    Ok(count)
}

/// Read up to `limit` rows of a table.
///
/// Column names come from the result metadata, not from the caller, and
/// each row preserves the server's column order.
pub async fn preview(
    config: &ConnectionConfig,
    table: &str,
    limit: u64,
) -> Result<Vec<PreviewRow>, IngestError> {
    let conn = ClickHouseConnection::connect(config)
        .await
        .map_err(IngestError::Connection)?;

    let table = TableRef::new(config.database.clone(), table);
    let page = conn
        .preview_rows(&table, limit)
        .await
        .map_err(IngestError::Read)?;

    Ok(page_to_preview(page))
}

/// Route an ingestion request to the matching mover.
///
/// Only file-to-table and table-to-file directions are supported.
pub async fn run_transfer(request: &IngestionRequest) -> Result<u64, IngestError> {
    match (request.source_type, request.target_type) {
        (EndpointKind::FlatFile, EndpointKind::ClickHouse) => {
            let path = request
                .file_path
                .as_deref()
                .ok_or(IngestError::MissingField("filePath"))?;
            let content = tokio::fs::read_to_string(path).await?;

            ingest(
                &request.connection_config(),
                &request.table_name,
                &request.selected_columns,
                &content,
                request.delimiter_char(),
            )
            .await
        }
        (EndpointKind::ClickHouse, EndpointKind::FlatFile) => {
            let output = request
                .output_file_name
                .as_deref()
                .ok_or(IngestError::MissingField("outputFileName"))?;

            let count = export(
                &request.connection_config(),
                &request.table_name,
                &request.selected_columns,
                Path::new(output),
                request.delimiter_char(),
            )
            .await?;
            Ok(count)
        }
        (source, target) => Err(IngestError::UnsupportedDirection { from_kind: source, target }),
    }
}

fn page_to_preview(page: ResultPage) -> Vec<PreviewRow> {
    let ResultPage { columns, rows } = page;

    rows.into_iter()
        .map(|row| {
            let mut mapped = PreviewRow::new();
            for (schema, value) in columns.iter().zip(row) {
                mapped.insert(schema.name.clone(), value);
            }
            mapped
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ColumnSchema;
    use serde_json::Value;

    fn request(source: EndpointKind, target: EndpointKind) -> IngestionRequest {
        IngestionRequest {
            source_type: source,
            target_type: target,
            host: "localhost".to_string(),
            port: 8123,
            database: "default".to_string(),
            username: "default".to_string(),
            jwt_token: String::new(),
            table_name: "trips".to_string(),
            selected_columns: vec!["a".to_string()],
            file_path: None,
            delimiter: None,
            output_file_name: None,
        }
    }

    #[test]
    fn test_page_to_preview_keeps_server_column_order() {
        let page = ResultPage {
            columns: vec![
                ColumnSchema {
                    name: "z".to_string(),
                    data_type: "String".to_string(),
                },
                ColumnSchema {
                    name: "a".to_string(),
                    data_type: "Nullable(String)".to_string(),
                },
            ],
            rows: vec![vec![
                Value::String("O'Brien".to_string()),
                Value::Null,
            ]],
        };

        let rows = page_to_preview(page);
        assert_eq!(rows.len(), 1);

        let keys: Vec<&String> = rows[0].keys().collect();
        assert_eq!(keys, vec!["z", "a"]);
        assert_eq!(rows[0]["z"], Value::String("O'Brien".to_string()));
        // NULL comes back as JSON null, never as the empty string
        assert_eq!(rows[0]["a"], Value::Null);
    }

    #[tokio::test]
    async fn test_transfer_rejects_same_kind_endpoints() {
        let result = run_transfer(&request(EndpointKind::FlatFile, EndpointKind::FlatFile)).await;
        assert!(matches!(
            result,
            Err(IngestError::UnsupportedDirection { .. })
        ));
    }

    #[tokio::test]
    async fn test_transfer_requires_file_path() {
        let result =
            run_transfer(&request(EndpointKind::FlatFile, EndpointKind::ClickHouse)).await;
        assert!(matches!(result, Err(IngestError::MissingField("filePath"))));
    }

    #[tokio::test]
    async fn test_transfer_requires_output_file_name() {
        let result =
            run_transfer(&request(EndpointKind::ClickHouse, EndpointKind::FlatFile)).await;
        assert!(matches!(
            result,
            Err(IngestError::MissingField("outputFileName"))
        ));
    }
}
