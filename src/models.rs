use serde::{Deserialize, Serialize};

/// One row of the chat query, before any decoding or contact lookup.
#[derive(Debug, Clone)]
pub struct RawMessageRow {
    pub text: Option<String>,
    pub attributed_body: Option<Vec<u8>>,
    /// Phone number, email, or the local-user sentinel.
    pub handle: String,
    /// Apple epoch nanoseconds
    pub date: i64,
}

/// A message with usable text and a display name for its sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMessage {
    pub speaker: String,
    pub text: String,
    /// Unix milliseconds
    pub time: i64,
}

#[derive(Deserialize)]
pub struct TranscriptParams {
    #[serde(default = "default_message_limit")]
    pub limit: usize,
}

#[derive(Deserialize)]
pub struct ChatListParams {
    #[serde(default = "default_chat_list_limit")]
    pub limit: usize,
}

pub fn default_message_limit() -> usize {
    50
}

pub fn default_paragraphs() -> usize {
    2
}

pub fn default_chat_list_limit() -> usize {
    50
}

#[derive(Serialize)]
pub struct ChatsResponse {
    pub chats: Vec<String>,
}

#[derive(Serialize)]
pub struct TranscriptResponse {
    pub chat: String,
    pub messages: Vec<ResolvedMessage>,
    pub lines: Vec<String>,
}

#[derive(Deserialize)]
pub struct SummaryRequest {
    pub chat: String,
    #[serde(default = "default_message_limit")]
    pub messages: usize,
    #[serde(default = "default_paragraphs")]
    pub paragraphs: usize,
}

#[derive(Serialize)]
pub struct SummaryResponse {
    pub summary: String,
    pub lines: Vec<String>,
}
