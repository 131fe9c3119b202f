//! 问答会话服务模块

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use common::config::DatabaseDefaults;
use common::errors::{AppError, AppResult, NOT_CONNECTED_MESSAGE};
use common::models::{ConnectRequest, ConnectionInfo, TranscriptEntry};
use pipeline::{Pipeline, PipelineRun, Session};
use tokio::sync::Mutex;
use validator::Validate;

use crate::state::AppState;

/// 数据库问答服务
pub struct ChatService {
    session: Arc<Mutex<Session>>,
    pipeline: Arc<Pipeline>,
    connected: Arc<AtomicBool>,
    defaults: DatabaseDefaults,
}

impl ChatService {
    /// 创建新的问答服务实例
    pub fn new(state: &AppState) -> Self {
        Self {
            session: state.session.clone(),
            pipeline: state.pipeline.clone(),
            connected: state.connected.clone(),
            defaults: state.config.database.clone(),
        }
    }

    /// 连接数据库并读取表结构（已有连接时替换）
    pub async fn connect(&self, req: ConnectRequest) -> AppResult<ConnectionInfo> {
        req.validate()?;
        let params = req.into_params(&self.defaults);
        let mut session = self.session.lock().await;
        let result = session.connection.connect(params).await;
        self.connected.store(session.connection.is_connected(), Ordering::Release);
        result
    }

    /// 断开当前数据库连接
    pub async fn disconnect(&self) -> AppResult<()> {
        let closed = self.session.lock().await.connection.disconnect().await;
        self.connected.store(false, Ordering::Release);
        if closed {
            Ok(())
        } else {
            Err(AppError::NotConnected)
        }
    }

    /// 获取当前连接信息
    pub async fn connection(&self) -> AppResult<ConnectionInfo> {
        self.session
            .lock()
            .await
            .connection
            .info()
            .cloned()
            .ok_or(AppError::NotConnected)
    }

    /// 获取表结构文本（未连接时返回提示语）
    pub async fn schema(&self) -> String {
        match self.session.lock().await.connection.active() {
            Some(active) => active.schema_text().to_string(),
            None => NOT_CONNECTED_MESSAGE.to_string(),
        }
    }

    /// 提问并返回本次运行的结果
    pub async fn ask(&self, question: &str) -> (PipelineRun, u64) {
        let mut session = self.session.lock().await;
        let started = Instant::now();
        let run = self.pipeline.run(&mut session, question).await;
        (run, started.elapsed().as_millis() as u64)
    }

    /// 是否已连接数据库（不等待会话锁）
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// 获取完整对话记录
    pub async fn transcript(&self) -> Vec<TranscriptEntry> {
        self.session.lock().await.transcript.entries().to_vec()
    }
}
