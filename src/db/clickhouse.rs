// ABOUTME: ClickHouse connection management over the HTTP interface
// ABOUTME: Handles connection, catalog queries, and batch insert/select operations

use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::ConnectionConfig;
use crate::db::sql;
use crate::models::{ColumnSchema, ResultPage, TableRef};

#[derive(Error, Debug)]
pub enum ClickHouseError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected server response: {0}")]
    InvalidResponse(String),
}

/// Credential choice for one connection. A JWT token takes precedence
/// over username/password; with neither, the request is anonymous.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Auth {
    Bearer(String),
    Credentials { user: String, key: String },
    Anonymous,
}

impl Auth {
    fn from_config(config: &ConnectionConfig) -> Self {
        if !config.jwt_token.is_empty() {
            Auth::Bearer(config.jwt_token.clone())
        } else if !config.username.is_empty() || !config.password.is_empty() {
            Auth::Credentials {
                user: config.username.clone(),
                key: config.password.clone(),
            }
        } else {
            Auth::Anonymous
        }
    }

    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Auth::Bearer(token) => request.bearer_auth(token),
            Auth::Credentials { user, key } => {
                let mut request = request;
                if !user.is_empty() {
                    request = request.header("X-ClickHouse-User", user);
                }
                if !key.is_empty() {
                    request = request.header("X-ClickHouse-Key", key);
                }
                request
            }
            Auth::Anonymous => request,
        }
    }
}

pub struct ClickHouseConnection {
    http: Client,
    endpoint: Url,
    database: String,
    auth: Auth,
}

impl ClickHouseConnection {
    /// Connect to ClickHouse using the given connection settings.
    ///
    /// Issues one `SELECT 1` round trip before returning; callers never
    /// receive a handle the server is unreachable for or rejects.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, ClickHouseError> {
        let conn = Self {
            http: Client::new(),
            endpoint: endpoint_url(config)?,
            database: config.database.clone(),
            auth: Auth::from_config(config),
        };

        conn.ping().await?;

        Ok(conn)
    }

    async fn ping(&self) -> Result<(), ClickHouseError> {
        let response = self
            .request("SELECT 1", &[])
            .send()
            .await
            .map_err(|e| ClickHouseError::ConnectionFailed(e.to_string()))?;

        if !response.status().is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ClickHouseError::ConnectionFailed(detail.trim().to_string()));
        }
        Ok(())
    }

    /// Test connection by querying the server version
    pub async fn server_version(&self) -> Result<String, ClickHouseError> {
        let body = self.run("SELECT version()", &[]).await?;
        Ok(body.trim().to_string())
    }

    /// Get table names in the configured database, in server order
    pub async fn list_tables(&self) -> Result<Vec<String>, ClickHouseError> {
        let page = self
            .query_compact(
                "SELECT name FROM system.tables WHERE database = {db:String}",
                &[("db", &self.database)],
            )
            .await?;

        Ok(first_column_strings(page))
    }

    /// Check whether a table exists in the configured database
    pub async fn table_exists(&self, table: &str) -> Result<bool, ClickHouseError> {
        let page = self
            .query_compact(
                "SELECT count() FROM system.tables WHERE database = {db:String} AND name = {table:String}",
                &[("db", &self.database), ("table", table)],
            )
            .await?;

        let count = page
            .rows
            .first()
            .and_then(|row| row.first())
            .map(cell_u64)
            .unwrap_or(0);

        Ok(count > 0)
    }

    /// Get column names of a table, in catalog order
    pub async fn list_columns(&self, table: &str) -> Result<Vec<String>, ClickHouseError> {
        let page = self
            .query_compact(
                "SELECT name FROM system.columns WHERE database = {db:String} AND table = {table:String}",
                &[("db", &self.database), ("table", table)],
            )
            .await?;

        Ok(first_column_strings(page))
    }

    /// Get column names and ClickHouse types of a table
    pub async fn describe_table(&self, table: &str) -> Result<Vec<ColumnSchema>, ClickHouseError> {
        let page = self
            .query_compact(
                "SELECT name, type FROM system.columns WHERE database = {db:String} AND table = {table:String}",
                &[("db", &self.database), ("table", table)],
            )
            .await?;

        let columns = page
            .rows
            .into_iter()
            .filter_map(|row| {
                let mut cells = row.into_iter();
                match (cells.next(), cells.next()) {
                    (Some(Value::String(name)), Some(Value::String(data_type))) => {
                        Some(ColumnSchema { name, data_type })
                    }
                    _ => None,
                }
            })
            .collect();

        Ok(columns)
    }

    /// Insert pre-rendered rows as one batched statement.
    ///
    /// Every row goes into a single INSERT; callers must not pass an
    /// empty row set.
    pub async fn insert_rows(
        &self,
        table: &TableRef,
        columns: &[String],
        rows: &[Vec<Option<String>>],
    ) -> Result<u64, ClickHouseError> {
        let statement = sql::build_insert(table, columns, rows);
        self.execute(&statement).await?;
        Ok(rows.len() as u64)
    }

    /// Read the given columns of a table, in server row order
    pub async fn select_columns(
        &self,
        table: &TableRef,
        columns: &[String],
    ) -> Result<ResultPage, ClickHouseError> {
        self.query_compact(&sql::build_select(table, columns), &[])
            .await
    }

    /// Read up to `limit` rows of a table with result metadata
    pub async fn preview_rows(
        &self,
        table: &TableRef,
        limit: u64,
    ) -> Result<ResultPage, ClickHouseError> {
        self.query_compact(&sql::build_preview(table, limit), &[])
            .await
    }

    /// Run a read statement and parse its columns and rows
    pub async fn query_compact(
        &self,
        statement: &str,
        params: &[(&str, &str)],
    ) -> Result<ResultPage, ClickHouseError> {
        let body = self
            .run(&format!("{} FORMAT JSONCompact", statement), params)
            .await?;
        parse_compact(&body)
    }

    /// Run a statement, discarding any response body
    pub async fn execute(&self, statement: &str) -> Result<(), ClickHouseError> {
        self.run(statement, &[]).await.map(|_| ())
    }

    async fn run(&self, statement: &str, params: &[(&str, &str)]) -> Result<String, ClickHouseError> {
        let response = self.request(statement, params).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ClickHouseError::QueryFailed(body.trim().to_string()));
        }

        Ok(body)
    }

    fn request(&self, statement: &str, params: &[(&str, &str)]) -> RequestBuilder {
        // Server-side binding: {name:Type} placeholders in the statement,
        // values carried as param_<name> query parameters.
        let mut pairs: Vec<(String, String)> =
            vec![("database".to_string(), self.database.clone())];
        for (name, value) in params {
            pairs.push((format!("param_{}", name), (*value).to_string()));
        }

        let request = self
            .http
            .post(self.endpoint.clone())
            .query(&pairs)
            .body(statement.to_string());

        self.auth.apply(request)
    }
}

fn endpoint_url(config: &ConnectionConfig) -> Result<Url, ClickHouseError> {
    Url::parse(&format!("http://{}:{}/", config.host, config.port))
        .map_err(|e| ClickHouseError::ConnectionFailed(format!("invalid server address: {}", e)))
}

fn parse_compact(body: &str) -> Result<ResultPage, ClickHouseError> {
    #[derive(Deserialize)]
    struct Compact {
        meta: Vec<ColumnSchema>,
        #[serde(default)]
        data: Vec<Vec<Value>>,
    }

    let parsed: Compact = serde_json::from_str(body).map_err(|e| {
        ClickHouseError::InvalidResponse(format!("{} in body: {}", e, truncate(body, 200)))
    })?;

    Ok(ResultPage {
        columns: parsed.meta,
        rows: parsed.data,
    })
}

fn first_column_strings(page: ResultPage) -> Vec<String> {
    page.rows
        .into_iter()
        .filter_map(|row| match row.into_iter().next() {
            Some(Value::String(s)) => Some(s),
            _ => None,
        })
        .collect()
}

// JSON formats quote 64-bit integers by default, so counts may arrive as
// strings.
fn cell_u64(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::String(s) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
