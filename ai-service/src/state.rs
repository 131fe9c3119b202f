//! Application state for ai service.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use common::config::AppConfig;
use common::errors::AppResult;
use pipeline::{Connector, LlmClient, MySqlConnector, OllamaClient, Pipeline, Session};
use tokio::sync::Mutex;

/// Application state shared across handlers.
///
/// The service hosts one session; the mutex keeps at most one question (or
/// connection change) in flight.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub session: Arc<Mutex<Session>>,
    pub pipeline: Arc<Pipeline>,
    /// Mirrors the session's connection state for readers that must not
    /// wait on the session lock.
    pub connected: Arc<AtomicBool>,
}

impl AppState {
    /// Creates state backed by MySQL and the configured inference server.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let connector = Arc::new(MySqlConnector::new(&config.database));
        let llm = Arc::new(OllamaClient::new(&config.llm)?);
        tracing::info!(endpoint = %llm.endpoint(), model = %config.llm.model, "模型服务已配置");
        Ok(Self::with_parts(config, connector, llm))
    }

    /// Creates state from explicit collaborators.
    pub fn with_parts(
        config: AppConfig,
        connector: Arc<dyn Connector>,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        let pipeline = Pipeline::new(llm, config.llm.model.clone(), config.pipeline);
        Self {
            session: Arc::new(Mutex::new(Session::new(connector))),
            pipeline: Arc::new(pipeline),
            connected: Arc::new(AtomicBool::new(false)),
            config,
        }
    }
}
