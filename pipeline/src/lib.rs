//! 自然语言数据库问答流水线
//!
//! 一个问题依次经过：
//! - 查询生成（模型根据表结构把问题翻译成 SQL）
//! - 查询执行（在当前连接上原样执行）
//! - 回答生成（模型根据结果写出自然语言回答）
//!
//! 连接、表结构与对话记录保存在显式的 [`Session`] 中。

pub mod connection;
pub mod db;
pub mod executor;
pub mod llm;
pub mod orchestrator;
pub mod query_synthesizer;
pub mod response_synthesizer;
pub mod schema;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use connection::{ActiveConnection, ConnectionManager};
pub use db::{Connector, DbSession, MySqlConnector};
pub use executor::QueryExecutor;
pub use llm::{LlmClient, OllamaClient};
pub use orchestrator::{Pipeline, PipelineRun, Stage, StageFailure};
pub use query_synthesizer::QuerySynthesizer;
pub use response_synthesizer::ResponseSynthesizer;
pub use session::Session;
