use crate::error::AppError;
use crate::models::{SummaryRequest, SummaryResponse};
use crate::services::messages::fetch_transcript;
use crate::state::AppState;
use crate::summary::summarize_lines;
use crate::transcript::assemble;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{error, info};

use super::error_response;

pub async fn post_summary(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SummaryRequest>,
) -> Response {
    if request.messages == 0 || request.paragraphs == 0 {
        return error_response(
            StatusCode::BAD_REQUEST,
            "messages and paragraphs must be at least 1".to_string(),
        );
    }

    let db_path = state.settings.db_path.clone();
    let directory = state.directory.clone();
    let chat = request.chat.clone();
    let limit = request.messages;
    let fetched = tokio::task::spawn_blocking(move || {
        fetch_transcript(&db_path, &chat, limit, &directory)
    })
    .await;

    let transcript = match fetched {
        Ok(Ok(transcript)) => transcript,
        Ok(Err(e)) => {
            error!(target: "server", chat = %request.chat, error = %e, "Failed to fetch transcript");
            return AppError::from(e).into_response();
        }
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    let lines = assemble(&transcript);
    if lines.is_empty() {
        info!(target: "server", chat = %request.chat, "No messages to summarize");
        let response = SummaryResponse {
            summary: String::new(),
            lines,
        };
        return (StatusCode::OK, Json(response)).into_response();
    }

    match summarize_lines(&state.summary_client, &lines, request.paragraphs).await {
        Ok(summary) => (StatusCode::OK, Json(SummaryResponse { summary, lines })).into_response(),
        Err(e) => {
            error!(target: "server", chat = %request.chat, error = %e, "Summary request failed");
            AppError::from(e).into_response()
        }
    }
}
