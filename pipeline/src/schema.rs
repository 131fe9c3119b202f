//! Schema introspection.
//!
//! Turns the tables and columns of the open session into the canonical
//! text block used as prompt context.

use common::errors::{AppError, NOT_CONNECTED_MESSAGE};
use common::models::{SchemaDescription, TableDescriptor};

use crate::db::DbSession;

/// Enumerates every table and its columns.
///
/// Best-effort: if one table fails, the tables gathered before it are kept
/// and the failure is recorded in place of the rest.
pub async fn introspect(conn: &dyn DbSession) -> SchemaDescription {
    let mut schema = SchemaDescription::default();

    let tables = match conn.list_tables().await {
        Ok(tables) => tables,
        Err(e) => {
            tracing::warn!(error = %e, "列出数据表失败");
            schema.failure = Some(format!("Error fetching schema: {}", reason(&e)));
            return schema;
        }
    };

    for name in tables {
        match conn.table_columns(&name).await {
            Ok(columns) => schema.tables.push(TableDescriptor { name, columns }),
            Err(e) => {
                tracing::warn!(table = %name, error = %e, "读取表结构失败");
                schema.failure = Some(format!(
                    "Error fetching schema for table {}: {}",
                    name,
                    reason(&e)
                ));
                break;
            }
        }
    }

    tracing::info!(
        tables = schema.table_count(),
        complete = schema.is_complete(),
        "表结构已读取"
    );
    schema
}

/// Text form of the schema, or the "connect first" sentinel when there is
/// no session.
pub async fn describe_schema(conn: Option<&dyn DbSession>) -> String {
    match conn {
        Some(conn) => introspect(conn).await.render(),
        None => NOT_CONNECTED_MESSAGE.to_string(),
    }
}

fn reason(err: &AppError) -> String {
    match err {
        AppError::Introspection(reason) => reason.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDatabase;

    #[tokio::test]
    async fn test_single_table_exact_text() {
        let db = FakeDatabase::users();
        let text = describe_schema(Some(&db as &dyn DbSession)).await;
        assert_eq!(text, "Table users:\nid (INT)\nname (VARCHAR)");
    }

    #[tokio::test]
    async fn test_every_table_and_column_appears_once() {
        let db = FakeDatabase::new(vec![
            ("customers", vec![("customer_id", "int"), ("email", "varchar(255)")]),
            ("orders", vec![("order_id", "int"), ("placed_at", "datetime"), ("total", "decimal(10,2)")]),
            ("products", vec![("sku", "char(12)")]),
        ]);
        let text = describe_schema(Some(&db as &dyn DbSession)).await;

        for name in ["customers", "orders", "products"] {
            assert_eq!(text.matches(&format!("Table {}:", name)).count(), 1);
        }
        for column in ["customer_id", "email", "order_id", "placed_at", "total", "sku"] {
            assert_eq!(text.matches(&format!("\n{} (", column)).count(), 1, "{column}");
        }
        // engine order, not sorted
        let orders = text.find("Table orders:").unwrap();
        let products = text.find("Table products:").unwrap();
        assert!(text.starts_with("Table customers:"));
        assert!(orders < products);
    }

    #[tokio::test]
    async fn test_without_connection_returns_sentinel() {
        assert_eq!(describe_schema(None).await, "Please connect to the database first.");
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_prior_tables() {
        let mut db = FakeDatabase::new(vec![
            ("users", vec![("id", "INT")]),
            ("audit_log", vec![("id", "INT")]),
            ("orders", vec![("id", "INT")]),
        ]);
        db.fail_on_table = Some("audit_log".into());

        let schema = introspect(&db).await;
        assert_eq!(schema.table_count(), 1);
        assert_eq!(
            schema.render(),
            "Table users:\nid (INT)\n\nError fetching schema for table audit_log: SELECT command denied"
        );
    }

    #[tokio::test]
    async fn test_listing_failure() {
        let mut db = FakeDatabase::users();
        db.fail_listing = true;

        let schema = introspect(&db).await;
        assert!(schema.tables.is_empty());
        assert_eq!(schema.render(), "Error fetching schema: SHOW TABLES denied");
    }
}
