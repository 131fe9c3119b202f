//! Query execution.

use common::errors::{AppError, AppResult};
use common::models::QueryRows;

use crate::db::DbSession;

/// Runs candidate queries against the open session.
///
/// The text is executed exactly as given, with no row limit.
pub struct QueryExecutor;

impl QueryExecutor {
    pub async fn execute(conn: Option<&dyn DbSession>, query: &str) -> AppResult<QueryRows> {
        let conn = conn.ok_or(AppError::NotConnected)?;

        match conn.fetch_all(query).await {
            Ok(rows) => {
                tracing::info!(
                    rows = rows.row_count(),
                    elapsed_ms = rows.execution_time_ms,
                    "查询执行完成"
                );
                Ok(rows)
            }
            Err(e) => {
                tracing::warn!(error = %e, query, "查询执行失败");
                Err(e)
            }
        }
    }
}
