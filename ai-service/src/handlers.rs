//! Handler模块

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use common::errors::AppError;
use common::middleware::RequestId;
use common::models::{ChatRequest, ConnectRequest, ConnectionInfo, TranscriptEntry};
use common::response::ApiResponse;
use pipeline::PipelineRun;

use crate::service::ChatService;
use crate::state::AppState;
use crate::SERVICE_NAME;

/// 连接数据库
#[utoipa::path(
    post,
    path = "/api/connection",
    tag = "connection",
    request_body = ConnectRequest,
    responses(
        (status = 200, description = "连接成功，表结构已读取", body = ApiResponse<ConnectionInfo>),
        (status = 400, description = "参数校验失败"),
        (status = 502, description = "数据库无法连接")
    )
)]
pub async fn connect(
    State(state): State<AppState>,
    Json(req): Json<ConnectRequest>,
) -> Result<Json<ApiResponse<ConnectionInfo>>, AppError> {
    let service = ChatService::new(&state);
    let info = service.connect(req).await?;
    Ok(Json(ApiResponse::ok_with_service(info, SERVICE_NAME)))
}

/// 获取当前连接
#[utoipa::path(
    get,
    path = "/api/connection",
    tag = "connection",
    responses(
        (status = 200, description = "当前连接信息", body = ApiResponse<ConnectionInfo>),
        (status = 409, description = "未连接数据库")
    )
)]
pub async fn get_connection(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ConnectionInfo>>, AppError> {
    let service = ChatService::new(&state);
    let info = service.connection().await?;
    Ok(Json(ApiResponse::ok_with_service(info, SERVICE_NAME)))
}

/// 断开数据库连接
#[utoipa::path(
    delete,
    path = "/api/connection",
    tag = "connection",
    responses(
        (status = 200, description = "连接已断开", body = ApiResponse<bool>),
        (status = 409, description = "未连接数据库")
    )
)]
pub async fn disconnect(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<bool>>, AppError> {
    let service = ChatService::new(&state);
    service.disconnect().await?;
    Ok(Json(ApiResponse::ok_with_service(true, SERVICE_NAME)))
}

/// 获取表结构描述
#[utoipa::path(
    get,
    path = "/api/schema",
    tag = "connection",
    responses(
        (status = 200, description = "表结构文本", body = ApiResponse<String>)
    )
)]
pub async fn get_schema(State(state): State<AppState>) -> Json<ApiResponse<String>> {
    let service = ChatService::new(&state);
    Json(ApiResponse::ok_with_service(service.schema().await, SERVICE_NAME))
}

/// 用自然语言提问
#[utoipa::path(
    post,
    path = "/api/chat",
    tag = "chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "问答结果（阶段错误以文本形式内联）", body = ApiResponse<PipelineRun>),
        (status = 400, description = "问题为空")
    )
)]
pub async fn chat(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ApiResponse<PipelineRun>>, AppError> {
    req.validate()?;
    let service = ChatService::new(&state);
    let (run, duration_ms) = service.ask(&req.question).await;
    Ok(Json(
        ApiResponse::ok_with_service(run, SERVICE_NAME)
            .with_request_id(request_id.as_str())
            .with_duration(duration_ms),
    ))
}

/// 获取对话记录
#[utoipa::path(
    get,
    path = "/api/transcript",
    tag = "chat",
    responses(
        (status = 200, description = "对话记录", body = ApiResponse<Vec<TranscriptEntry>>)
    )
)]
pub async fn get_transcript(State(state): State<AppState>) -> Json<ApiResponse<Vec<TranscriptEntry>>> {
    let service = ChatService::new(&state);
    Json(ApiResponse::ok_with_service(service.transcript().await, SERVICE_NAME))
}

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = ChatService::new(&state).is_connected();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        model: state.config.llm.model.clone(),
        connected,
    })
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub model: String,
    pub connected: bool,
}
