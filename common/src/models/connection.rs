//! Connection models.
//!
//! Parameters for the single database session and its public summary.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::config::DatabaseDefaults;

/// Parameters used to open a database session.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ConnectParams {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password (never serialized).
    #[serde(skip_serializing, default)]
    pub password: String,
    /// Database name.
    pub database: String,
}

impl std::fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

/// Request body for opening the session connection.
///
/// Omitted fields fall back to the configured defaults.
#[derive(Default, Deserialize, Validate, ToSchema)]
pub struct ConnectRequest {
    /// Database host.
    #[validate(length(min = 1, max = 255, message = "Host must be 1-255 characters"))]
    pub host: Option<String>,
    /// Database port.
    #[validate(range(min = 1, message = "Port must be positive"))]
    pub port: Option<u16>,
    /// Database username.
    #[validate(length(min = 1, max = 128, message = "Username must be 1-128 characters"))]
    pub username: Option<String>,
    /// Database password.
    #[serde(default)]
    pub password: String,
    /// Database name.
    #[validate(length(min = 1, max = 128, message = "Database must be 1-128 characters"))]
    pub database: Option<String>,
}

impl std::fmt::Debug for ConnectRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectRequest")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

impl ConnectRequest {
    /// Fills missing fields from the configured defaults.
    pub fn into_params(self, defaults: &DatabaseDefaults) -> ConnectParams {
        ConnectParams {
            host: self.host.unwrap_or_else(|| defaults.host.clone()),
            port: self.port.unwrap_or(defaults.port),
            username: self.username.unwrap_or_else(|| defaults.username.clone()),
            password: self.password,
            database: self.database.unwrap_or_else(|| defaults.database.clone()),
        }
    }
}

/// Summary of the live connection (excludes credentials).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ConnectionInfo {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database name.
    pub database: String,
    /// Number of tables found during introspection.
    pub table_count: usize,
    /// Connection timestamp (RFC 3339).
    pub connected_at: String,
}

impl ConnectionInfo {
    /// Builds the summary for freshly opened parameters.
    pub fn new(params: &ConnectParams, table_count: usize) -> Self {
        Self {
            host: params.host.clone(),
            port: params.port,
            username: params.username.clone(),
            database: params.database.clone(),
            table_count,
            connected_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let req = ConnectRequest {
            password: "secret".into(),
            ..Default::default()
        };
        let params = req.into_params(&DatabaseDefaults::default());
        assert_eq!(params.host, "localhost");
        assert_eq!(params.port, 3306);
        assert_eq!(params.username, "root");
        assert_eq!(params.database, "rag_test");
        assert_eq!(params.password, "secret");
    }

    #[test]
    fn test_password_is_hidden() {
        let params = ConnectParams {
            host: "localhost".into(),
            port: 3306,
            username: "root".into(),
            password: "hunter2".into(),
            database: "shop".into(),
        };
        let json = serde_json::to_string(&params).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(!format!("{:?}", params).contains("hunter2"));
    }

    #[test]
    fn test_request_debug_masks_password() {
        let req = ConnectRequest {
            host: Some("db.internal".into()),
            password: "hunter2".into(),
            ..Default::default()
        };
        let debug = format!("{:?}", req);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("db.internal"));
    }

    #[test]
    fn test_empty_host_is_rejected() {
        let req = ConnectRequest {
            host: Some(String::new()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }
}
