//! Summarize iMessage conversations from the local Messages store.
//!
//! The pipeline reads the most recent messages of a named chat from
//! `chat.db`, recovers text from archived message bodies, resolves senders
//! through a contacts file and renders `speaker: text` lines for a
//! summarization model.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod openrouter;
pub mod services;
pub mod state;
pub mod summary;
pub mod transcript;

pub use error::{AppError, DirectoryError, Result, TranscriptError};
pub use models::{RawMessageRow, ResolvedMessage};
pub use services::contacts::{normalize_phone, resolve, ContactDirectory};
pub use services::messages::{decode_attributed_body, fetch_messages_from_chat, fetch_transcript};
pub use transcript::{assemble, render_for_request, Transcript};
