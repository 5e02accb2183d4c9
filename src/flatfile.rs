// ABOUTME: Delimited flat file handling for ingest and export
// ABOUTME: Parses header-led CSV input and writes naive delimiter-joined output

use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

#[derive(Error, Debug)]
pub enum FlatFileError {
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Input has no header row")]
    MissingHeader,
    #[error("Delimiter '{0}' is not a single-byte character")]
    UnsupportedDelimiter(char),
}

/// Parsed delimited input. The header row is the column-name source of
/// truth; data cells are `None` when empty or absent.
#[derive(Debug, Clone)]
pub struct DelimitedFile {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// Parse delimited text with a leading header row.
///
/// Rows shorter than the header are padded with absent cells; empty and
/// absent cells both become `None` so they ingest as SQL NULL.
pub fn parse_delimited(content: &str, delimiter: char) -> Result<DelimitedFile, FlatFileError> {
    let delimiter = delimiter_byte(delimiter)?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(content.as_bytes());

    let header: Vec<String> = reader
        .headers()
        .map_err(FlatFileError::Csv)?
        .iter()
        .map(str::to_string)
        .collect();

    if header.is_empty() || (header.len() == 1 && header[0].is_empty()) {
        return Err(FlatFileError::MissingHeader);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row = (0..header.len())
            .map(|index| match record.get(index) {
                Some("") | None => None,
                Some(value) => Some(value.to_string()),
            })
            .collect();
        rows.push(row);
    }

    Ok(DelimitedFile { header, rows })
}

fn delimiter_byte(delimiter: char) -> Result<u8, FlatFileError> {
    if delimiter.is_ascii() {
        Ok(delimiter as u8)
    } else {
        Err(FlatFileError::UnsupportedDelimiter(delimiter))
    }
}

/// Plain string rendering of a result cell: strings verbatim, null as an
/// empty field, everything else in its JSON form.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Write a header line and one delimiter-joined line per row.
///
/// Values containing the delimiter or newlines are not quoted or escaped;
/// that is the documented boundary of this format.
pub async fn write_delimited(
    path: &Path,
    columns: &[String],
    rows: &[Vec<Value>],
    delimiter: char,
) -> std::io::Result<u64> {
    let separator = delimiter.to_string();

    let mut output = String::new();
    output.push_str(&columns.join(&separator));
    output.push('\n');

    for row in rows {
        let line: Vec<String> = row.iter().map(cell_text).collect();
        output.push_str(&line.join(&separator));
        output.push('\n');
    }

    let file = File::create(path).await?;
    let mut writer = BufWriter::new(file);
    writer.write_all(output.as_bytes()).await?;
    writer.flush().await?;

    Ok(rows.len() as u64)
}
