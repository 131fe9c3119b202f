//! AI 智能查询服务
//!
//! 用自然语言询问已连接的 MySQL 数据库：
//! - 连接数据库并读取表结构
//! - 由本地模型把问题翻译成 SQL 并执行
//! - 由本地模型把查询结果总结为自然语言回答

mod handlers;
mod routes;
mod service;
mod state;

use std::sync::Arc;

use anyhow::Context;
use axum::{middleware, routing::get, Json, Router};
use common::config::AppConfig;
use common::middleware::request_id::request_id_middleware;
use state::AppState;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

pub(crate) const SERVICE_NAME: &str = "ai-service";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "AI 查询服务 API",
        version = "0.1.0",
        description = "自然语言数据库问答微服务"
    ),
    paths(
        handlers::connect,
        handlers::get_connection,
        handlers::disconnect,
        handlers::get_schema,
        handlers::chat,
        handlers::get_transcript,
        handlers::health_check,
    ),
    components(schemas(
        common::models::ConnectRequest,
        common::models::ConnectionInfo,
        common::models::ChatRequest,
        common::models::TranscriptEntry,
        common::models::Role,
        pipeline::PipelineRun,
        pipeline::StageFailure,
        pipeline::Stage,
        handlers::HealthResponse,
    )),
    tags(
        (name = "connection", description = "数据库连接端点"),
        (name = "chat", description = "问答端点"),
        (name = "health", description = "健康检查端点")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志追踪
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // 加载配置（含 .env）
    let config = AppConfig::load_with_service(SERVICE_NAME);

    // 创建应用状态
    let state = AppState::new(config.clone()).context("初始化应用状态失败")?;
    let session = state.session.clone();

    // 创建路由
    let app = create_router(state);

    // 启动服务
    let addr = config.bind_address();
    info!(service = SERVICE_NAME, address = %addr, "启动服务");

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("绑定地址失败: {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("服务启动失败")?;

    // 会话结束时关闭数据库连接
    match Arc::try_unwrap(session) {
        Ok(session) => session.into_inner().close().await,
        Err(shared) => {
            shared.lock().await.connection.disconnect().await;
        }
    }
    info!(service = SERVICE_NAME, "服务已停止");
    Ok(())
}

pub(crate) fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "无法监听退出信号");
    }
    info!("收到退出信号，正在关闭");
}
