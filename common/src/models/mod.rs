//! Shared data models.

pub mod connection;
pub mod query;
pub mod schema;
pub mod transcript;

// Re-export commonly used types
pub use connection::{ConnectParams, ConnectRequest, ConnectionInfo};
pub use query::QueryRows;
pub use schema::{ColumnDescriptor, SchemaDescription, TableDescriptor};
pub use transcript::{ChatRequest, Role, Transcript, TranscriptEntry};
