pub mod config;
pub mod error;
pub mod gateway;
pub mod gemini;
pub mod prompt;

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use shared::{ChatRequest, ChatResponse};
use tower_http::trace::TraceLayer;

use error::GatewayError;
use gateway::Gateway;

pub struct AppState {
    pub gateway: Gateway,
}

pub fn app(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/api/chat", post(chat_handler))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn chat_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!("rejected chat request: {}", rejection.body_text());
            return GatewayError::BadRequest(rejection.body_text()).into_response();
        }
    };

    match state.gateway.chat(request).await {
        Ok(reply) => (StatusCode::OK, Json(ChatResponse::reply(reply))).into_response(),
        Err(e) => e.into_response(),
    }
}
