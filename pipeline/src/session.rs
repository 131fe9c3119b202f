//! Per-user session context.

use std::sync::Arc;

use common::models::Transcript;
use uuid::Uuid;

use crate::connection::ConnectionManager;
use crate::db::Connector;

/// Everything one user session owns: its connection, schema and transcript.
///
/// Created at session start and passed to every pipeline call.
pub struct Session {
    id: Uuid,
    pub connection: ConnectionManager,
    pub transcript: Transcript,
}

impl Session {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        let id = Uuid::new_v4();
        tracing::info!(session_id = %id, "会话已创建");
        Self {
            id,
            connection: ConnectionManager::new(connector),
            transcript: Transcript::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Tears the session down, closing any open connection.
    pub async fn close(mut self) {
        self.connection.disconnect().await;
        tracing::info!(
            session_id = %self.id,
            entries = self.transcript.len(),
            "会话已结束"
        );
    }
}
