//! Connection lifecycle.
//!
//! Owns the single database session and the schema derived from it. The two
//! are stored together, so the schema can never be older than the
//! connection it describes.

use std::sync::Arc;

use common::errors::AppResult;
use common::models::{ConnectParams, ConnectionInfo, SchemaDescription};

use crate::db::{Connector, DbSession};
use crate::schema;

/// A live session together with its introspected schema.
pub struct ActiveConnection {
    session: Box<dyn DbSession>,
    schema: SchemaDescription,
    schema_text: String,
    info: ConnectionInfo,
}

impl ActiveConnection {
    pub fn session(&self) -> &dyn DbSession {
        self.session.as_ref()
    }

    pub fn schema(&self) -> &SchemaDescription {
        &self.schema
    }

    /// Rendered schema, computed once per connection.
    pub fn schema_text(&self) -> &str {
        &self.schema_text
    }

    pub fn info(&self) -> &ConnectionInfo {
        &self.info
    }
}

/// Manages at most one open connection.
///
/// Connecting while already connected replaces the old connection, but only
/// once the new one is open and introspected. A failed attempt leaves the
/// existing connection in place.
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    active: Option<ActiveConnection>,
}

impl ConnectionManager {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            active: None,
        }
    }

    /// Opens a session, introspects its schema, then installs both.
    pub async fn connect(&mut self, params: ConnectParams) -> AppResult<ConnectionInfo> {
        tracing::info!(
            host = %params.host,
            port = params.port,
            username = %params.username,
            database = %params.database,
            "正在连接数据库"
        );

        let session = match self.connector.connect(&params).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, kept_previous = self.active.is_some(), "数据库连接失败");
                return Err(e);
            }
        };

        let schema = schema::introspect(session.as_ref()).await;
        let info = ConnectionInfo::new(&params, schema.table_count());
        let active = ActiveConnection {
            schema_text: schema.render(),
            session,
            schema,
            info: info.clone(),
        };

        if let Some(previous) = self.active.replace(active) {
            previous.session.close().await;
            tracing::info!(
                previous = %previous.info.database,
                "已替换原有数据库连接"
            );
        }

        tracing::info!(database = %info.database, tables = info.table_count, "数据库已连接");
        Ok(info)
    }

    /// Closes the current connection. Returns `false` if there was none.
    pub async fn disconnect(&mut self) -> bool {
        match self.active.take() {
            Some(active) => {
                active.session.close().await;
                tracing::info!(database = %active.info.database, "数据库连接已关闭");
                true
            }
            None => false,
        }
    }

    pub fn active(&self) -> Option<&ActiveConnection> {
        self.active.as_ref()
    }

    pub fn session(&self) -> Option<&dyn DbSession> {
        self.active.as_ref().map(ActiveConnection::session)
    }

    pub fn schema(&self) -> Option<&SchemaDescription> {
        self.active.as_ref().map(ActiveConnection::schema)
    }

    pub fn info(&self) -> Option<&ConnectionInfo> {
        self.active.as_ref().map(ActiveConnection::info)
    }

    pub fn is_connected(&self) -> bool {
        self.active.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{params, FakeConnector, FakeDatabase};
    use common::errors::AppError;
    use std::sync::atomic::Ordering;

    fn manager(connector: FakeConnector) -> ConnectionManager {
        ConnectionManager::new(Arc::new(connector))
    }

    #[tokio::test]
    async fn test_connect_populates_schema() {
        let mut mgr = manager(FakeConnector::new("pw").with_database("rag_test", FakeDatabase::users()));

        let info = mgr.connect(params("rag_test", "pw")).await.unwrap();

        assert_eq!(info.database, "rag_test");
        assert_eq!(info.table_count, 1);
        assert!(mgr.is_connected());
        let active = mgr.active().unwrap();
        assert_eq!(active.schema_text(), "Table users:\nid (INT)\nname (VARCHAR)");
    }

    #[tokio::test]
    async fn test_rejected_credentials() {
        let mut mgr = manager(FakeConnector::new("pw").with_database("rag_test", FakeDatabase::users()));

        let err = mgr.connect(params("rag_test", "wrong")).await.unwrap_err();

        assert!(matches!(err, AppError::DatabaseConnection(_)));
        assert!(err.to_string().starts_with("Error connecting to database: Access denied"));
        assert!(!mgr.is_connected());
        assert!(mgr.schema().is_none());
    }

    #[tokio::test]
    async fn test_failed_reconnect_keeps_previous_connection() {
        let first = FakeDatabase::users();
        let mut mgr = manager(FakeConnector::new("pw").with_database("rag_test", first.clone()));
        mgr.connect(params("rag_test", "pw")).await.unwrap();

        let err = mgr.connect(params("missing", "pw")).await.unwrap_err();

        assert!(err.to_string().contains("Unknown database 'missing'"));
        assert_eq!(mgr.info().unwrap().database, "rag_test");
        assert_eq!(mgr.schema().unwrap().table_count(), 1);
        assert!(!first.is_closed());
    }

    #[tokio::test]
    async fn test_reconnect_replaces_and_closes_previous() {
        let first = FakeDatabase::users();
        let second = FakeDatabase::new(vec![
            ("orders", vec![("id", "int")]),
            ("items", vec![("sku", "varchar(12)")]),
        ]);
        let connector = FakeConnector::new("pw")
            .with_database("rag_test", first.clone())
            .with_database("shop", second);
        let mut mgr = manager(connector);

        mgr.connect(params("rag_test", "pw")).await.unwrap();
        mgr.connect(params("shop", "pw")).await.unwrap();

        assert!(first.is_closed());
        assert_eq!(mgr.info().unwrap().database, "shop");
        let text = mgr.active().unwrap().schema_text().to_string();
        assert!(text.contains("Table orders:"));
        assert!(!text.contains("Table users:"));
    }

    #[tokio::test]
    async fn test_disconnect() {
        let db = FakeDatabase::users();
        let connector = Arc::new(FakeConnector::new("pw").with_database("rag_test", db.clone()));
        let mut mgr = ConnectionManager::new(connector.clone());

        assert!(!mgr.disconnect().await);
        mgr.connect(params("rag_test", "pw")).await.unwrap();
        assert!(mgr.disconnect().await);

        assert!(db.is_closed());
        assert!(mgr.session().is_none());
        assert_eq!(connector.attempts.load(Ordering::SeqCst), 1);
    }
}
