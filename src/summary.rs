//! Summary generation for a chat transcript.

use crate::openrouter::{ChatMessage, OpenRouterClient, OpenRouterError};
use crate::transcript::render_for_request;
use tracing::info;

const SUMMARY_MAX_RETRIES: u32 = 2;

/// Ask the model for a `paragraphs`-paragraph summary of the transcript lines.
pub async fn summarize_lines(
    client: &OpenRouterClient,
    lines: &[String],
    paragraphs: usize,
) -> Result<String, OpenRouterError> {
    let prompt = render_for_request(lines, paragraphs);
    info!(
        target: "openrouter",
        model = client.model(),
        lines = lines.len(),
        paragraphs,
        "Requesting chat summary"
    );

    let summary = client
        .chat_completion_with_retry(
            vec![
                ChatMessage::system(prompt.system),
                ChatMessage::user(prompt.user),
            ],
            None,
            None,
            SUMMARY_MAX_RETRIES,
        )
        .await?;

    Ok(summary.trim().to_string())
}
