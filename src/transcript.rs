//! Transcript assembly and prompt rendering.
//!
//! A [`Transcript`] is the chronological list of resolved messages for one
//! chat. It renders to `speaker: text` lines, which are what the summary
//! request carries.

use crate::models::ResolvedMessage;
use serde::Serialize;

/// System prompt for summaries. `{paragraphs}` is replaced with the requested
/// paragraph count.
const SUMMARY_PROMPT: &str = r#"You summarize group and one-on-one text message conversations between people in their early twenties.

Each input line has the form `sender: message`. Sender names are only there to help you follow who said what.
The sender `Me` is the person asking for this summary; refer to them as "you".
Refer to everyone else by name when describing what they said or did.

Input: a JSON array of message lines, oldest first.
Output: plain paragraphs of prose, no lists or headings.

Example input:
[
    "Alice Avery: hi squad",
    "Alice Avery: i am starting to plan my flight back to the states",
    "Alice Avery: would love to make it in time to take grad pics together",
    "Bob Brown: I did not plan on doing grad pics",
    "Bob Brown: finals week will probably be a little stressful",
    "Me: bob u cant not plan on doing grad pics...",
    "Me: alice maybe you come home a week early to take them with bob?",
    "Alice Avery: sounds good, i'll come back then"
]
Example output:
Alice wants to take grad pics with her friends when she flies back. Bob wasn't planning to because finals week will be stressful. You push back on Bob skipping them, and Alice agrees to come home a week early so the three of you can take them together.

Now summarize the conversation you are given.
Please output {paragraphs} paragraphs, with 3-4 sentences per paragraph."#;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Transcript {
    messages: Vec<ResolvedMessage>,
}

impl Transcript {
    /// Messages must already be oldest first.
    pub fn new(messages: Vec<ResolvedMessage>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[ResolvedMessage] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<ResolvedMessage> {
        self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

pub fn format_line(message: &ResolvedMessage) -> String {
    format!("{}: {}", message.speaker, message.text)
}

/// `speaker: text` lines in transcript order.
pub fn assemble(transcript: &Transcript) -> Vec<String> {
    transcript.messages().iter().map(format_line).collect()
}

/// The two halves of a summary request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryPrompt {
    /// Instructions, with the paragraph count filled in
    pub system: String,
    /// The lines as a JSON array
    pub user: String,
}

pub fn render_for_request(lines: &[String], paragraphs: usize) -> SummaryPrompt {
    SummaryPrompt {
        system: SUMMARY_PROMPT.replace("{paragraphs}", &paragraphs.to_string()),
        // A list of strings always serializes.
        user: serde_json::to_string_pretty(lines).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(speaker: &str, text: &str, time: i64) -> ResolvedMessage {
        ResolvedMessage {
            speaker: speaker.to_string(),
            text: text.to_string(),
            time,
        }
    }

    #[test]
    fn assemble_keeps_order() {
        let transcript = Transcript::new(vec![
            message("Alice Avery", "hi squad", 1),
            message("Me", "hey", 2),
            message("4083902616", "who is this", 3),
        ]);

        assert_eq!(
            assemble(&transcript),
            vec![
                "Alice Avery: hi squad".to_string(),
                "Me: hey".to_string(),
                "4083902616: who is this".to_string(),
            ]
        );
    }

    #[test]
    fn assemble_empty_transcript() {
        assert!(assemble(&Transcript::default()).is_empty());
    }

    #[test]
    fn prompt_carries_paragraph_count() {
        let prompt = render_for_request(&[], 4);
        assert!(prompt.system.contains("Please output 4 paragraphs"));
        assert!(!prompt.system.contains("{paragraphs}"));
        assert_eq!(prompt.user, "[]");
    }

    #[test]
    fn user_payload_is_json_array() {
        let lines = vec!["Me: hi".to_string(), "Bob: \"quoted\"".to_string()];
        let prompt = render_for_request(&lines, 2);
        let parsed: Vec<String> = serde_json::from_str(&prompt.user).expect("parse");
        assert_eq!(parsed, lines);
    }
}
