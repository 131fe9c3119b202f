//! 路由模块

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/connection",
            get(handlers::get_connection)
                .post(handlers::connect)
                .delete(handlers::disconnect),
        )
        .route("/api/schema", get(handlers::get_schema))
        .route("/api/chat", post(handlers::chat))
        .route("/api/transcript", get(handlers::get_transcript))
        .route("/api/health", get(handlers::health_check))
}
