use crate::error::AppError;
use crate::models::{ChatListParams, ChatsResponse, TranscriptParams, TranscriptResponse};
use crate::services::messages::{fetch_chat_names, fetch_transcript};
use crate::state::AppState;
use crate::transcript::assemble;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::error;

use super::error_response;

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

pub async fn get_chats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ChatListParams>,
) -> Response {
    let db_path = state.settings.db_path.clone();
    let result =
        tokio::task::spawn_blocking(move || fetch_chat_names(&db_path, params.limit)).await;

    match result {
        Ok(Ok(chats)) => (StatusCode::OK, Json(ChatsResponse { chats })).into_response(),
        Ok(Err(e)) => {
            error!(target: "server", error = %e, "Failed to list chats");
            AppError::from(e).into_response()
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

pub async fn get_transcript(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<TranscriptParams>,
) -> Response {
    if params.limit == 0 {
        return error_response(StatusCode::BAD_REQUEST, "limit must be at least 1".to_string());
    }

    let db_path = state.settings.db_path.clone();
    let directory = state.directory.clone();
    let chat = name.clone();
    let result = tokio::task::spawn_blocking(move || {
        fetch_transcript(&db_path, &chat, params.limit, &directory)
    })
    .await;

    match result {
        Ok(Ok(transcript)) => {
            let lines = assemble(&transcript);
            let response = TranscriptResponse {
                chat: name,
                messages: transcript.into_messages(),
                lines,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(Err(e)) => {
            error!(target: "server", chat = %name, error = %e, "Failed to fetch transcript");
            AppError::from(e).into_response()
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
