//! Database session abstraction and its MySQL implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::config::DatabaseDefaults;
use common::errors::{AppError, AppResult};
use common::models::{ColumnDescriptor, ConnectParams, QueryRows};
use serde_json::Value;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, MySqlPool, Row, TypeInfo, ValueRef};

/// One open database session.
#[async_trait]
pub trait DbSession: Send + Sync {
    /// Table names in the order the engine returns them.
    async fn list_tables(&self) -> AppResult<Vec<String>>;

    /// Columns of `table` in declaration order.
    async fn table_columns(&self, table: &str) -> AppResult<Vec<ColumnDescriptor>>;

    /// Executes `sql` verbatim and materializes every row.
    async fn fetch_all(&self, sql: &str) -> AppResult<QueryRows>;

    /// Releases the underlying connection.
    async fn close(&self);
}

/// Opens database sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, params: &ConnectParams) -> AppResult<Box<dyn DbSession>>;
}

/// Opens MySQL sessions backed by a small sqlx pool.
pub struct MySqlConnector {
    connect_timeout: Duration,
    max_connections: u32,
}

impl MySqlConnector {
    pub fn new(defaults: &DatabaseDefaults) -> Self {
        Self {
            connect_timeout: Duration::from_secs(defaults.connect_timeout_secs),
            max_connections: defaults.max_connections.max(1),
        }
    }
}

#[async_trait]
impl Connector for MySqlConnector {
    async fn connect(&self, params: &ConnectParams) -> AppResult<Box<dyn DbSession>> {
        let options = MySqlConnectOptions::new()
            .host(&params.host)
            .port(params.port)
            .username(&params.username)
            .password(&params.password)
            .database(&params.database);

        let pool = MySqlPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.connect_timeout)
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;

        Ok(Box::new(MySqlSession { pool }))
    }
}

/// MySQL session.
pub struct MySqlSession {
    pool: MySqlPool,
}

#[async_trait]
impl DbSession for MySqlSession {
    async fn list_tables(&self) -> AppResult<Vec<String>> {
        let rows = sqlx::query("SHOW TABLES")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Introspection(e.to_string()))?;

        Ok(rows.iter().map(|row| text_at(row, 0)).collect())
    }

    async fn table_columns(&self, table: &str) -> AppResult<Vec<ColumnDescriptor>> {
        let sql = format!("SHOW COLUMNS FROM {}", quote_identifier(table));
        let rows = sqlx::raw_sql(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Introspection(e.to_string()))?;

        Ok(rows
            .iter()
            .map(|row| ColumnDescriptor {
                name: text_at(row, 0),
                data_type: text_at(row, 1),
            })
            .collect())
    }

    async fn fetch_all(&self, sql: &str) -> AppResult<QueryRows> {
        let started = Instant::now();
        let rows = sqlx::raw_sql(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::QueryExecution(e.to_string()))?;

        let columns = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        let rows = rows
            .iter()
            .map(|row| (0..row.len()).map(|i| decode_value(row, i)).collect())
            .collect();

        Ok(QueryRows {
            columns,
            rows,
            execution_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Wraps an identifier in backticks, doubling embedded backticks.
fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Reads a textual column, tolerating servers that report it as binary.
fn text_at(row: &MySqlRow, index: usize) -> String {
    row.try_get::<String, _>(index)
        .or_else(|_| {
            row.try_get::<Vec<u8>, _>(index)
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        })
        .unwrap_or_default()
}

/// Converts one result cell to JSON.
///
/// Rows come back over the text protocol, so the raw bytes are the value's
/// textual form whatever the column type.
fn decode_value(row: &MySqlRow, index: usize) -> Value {
    let type_name = match row.try_get_raw(index) {
        Ok(raw) => raw.type_info().name().to_string(),
        Err(_) => return Value::Null,
    };

    match row.try_get_unchecked::<Option<&[u8]>, _>(index) {
        Ok(bytes) => decode_text(&type_name, bytes),
        Err(_) => Value::Null,
    }
}

/// Maps a text-protocol cell to JSON by its MySQL type name.
///
/// Integers (including `TINYINT(1)`, reported as `BOOLEAN`) and floats become
/// numbers; everything else stays text. Bytes that are not UTF-8 render as
/// `<N bytes>`.
fn decode_text(type_name: &str, bytes: Option<&[u8]>) -> Value {
    let Some(bytes) = bytes else {
        return Value::Null;
    };
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(_) => return Value::String(format!("<{} bytes>", bytes.len())),
    };

    let number = match type_name {
        "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            text.parse::<i64>().ok().map(Value::from)
        }
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => text.parse::<u64>().ok().map(Value::from),
        "FLOAT" | "DOUBLE" => text
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        _ => None,
    };

    number.unwrap_or_else(|| Value::String(text.to_string()))
}
