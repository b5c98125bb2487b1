pub mod chats;
pub mod summary;

use crate::error::{AppError, TranscriptError};
use crate::state::AppState;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub fn router(state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/health", axum::routing::get(chats::health))
        .route("/chats", axum::routing::get(chats::get_chats))
        .route(
            "/chats/:name/transcript",
            axum::routing::get(chats::get_transcript),
        )
        .route("/summary", axum::routing::post(summary::post_summary))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

pub(crate) fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Transcript(TranscriptError::StoreUnavailable { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Summary(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match &self {
            AppError::Transcript(_) => {
                format!("{}. Make sure Full Disk Access is granted.", self)
            }
            _ => self.to_string(),
        };
        error_response(status, message)
    }
}
