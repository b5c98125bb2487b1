use crate::error::TranscriptError;
use crate::models::{RawMessageRow, ResolvedMessage};
use crate::services::contacts::ContactDirectory;
use crate::transcript::Transcript;
use rusqlite::{params, Connection, OpenFlags};
use std::path::Path;
use tracing::{debug, info};

const APPLE_EPOCH: i64 = 978307200; // Seconds between 1970-01-01 and 2001-01-01

/// `COALESCE` value for messages with no handle row, i.e. sent from this Mac.
pub const LOCAL_USER_SENTINEL: &str = "Me";

/// Speaker label for the local user.
pub const LOCAL_USER_LABEL: &str = "Me";

// Newest first so the scan can stop as soon as enough usable messages are
// collected. ROWID breaks ties between messages sharing a timestamp.
const CHAT_MESSAGES_QUERY: &str = "
    SELECT
        m.text,
        m.attributedBody,
        COALESCE(h.id, 'Me') AS handle_value,
        m.date
    FROM message AS m
    JOIN chat_message_join AS cmj
        ON m.ROWID = cmj.message_id
    JOIN chat AS c
        ON cmj.chat_id = c.ROWID
    LEFT JOIN handle AS h
        ON (
            m.handle_id > 0
            AND m.handle_id = h.ROWID
        )
    WHERE c.display_name = ?1
    ORDER BY m.date DESC, m.ROWID DESC
";

/// Open the Messages store read-only.
pub fn open_chat_db(path: &Path) -> Result<Connection, TranscriptError> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|source| TranscriptError::StoreUnavailable {
        path: path.to_path_buf(),
        source,
    })
}

/// Most recent `limit` usable messages of the chat named `chat_name`, oldest
/// first.
///
/// The connection is opened here and dropped on every return path. Any
/// failure talking to the store, including a missing table, is reported as
/// [`TranscriptError::StoreUnavailable`]. A chat name that matches nothing
/// yields an empty transcript.
pub fn fetch_transcript(
    db_path: &Path,
    chat_name: &str,
    limit: usize,
    directory: &ContactDirectory,
) -> Result<Transcript, TranscriptError> {
    let conn = open_chat_db(db_path)?;
    fetch_messages_from_chat(&conn, chat_name, limit, directory).map_err(|e| match e {
        TranscriptError::Query(source) => TranscriptError::StoreUnavailable {
            path: db_path.to_path_buf(),
            source,
        },
        other => other,
    })
}

/// Scan the chat newest-first, keeping rows that yield text until `limit`
/// messages are accepted, then reverse into chronological order.
///
/// Rows with neither plain text nor a decodable body are skipped and don't
/// count toward `limit`.
pub fn fetch_messages_from_chat(
    conn: &Connection,
    chat_name: &str,
    limit: usize,
    directory: &ContactDirectory,
) -> Result<Transcript, TranscriptError> {
    let mut messages: Vec<ResolvedMessage> = Vec::new();
    if limit == 0 {
        return Ok(Transcript::new(messages));
    }

    let mut stmt = conn.prepare(CHAT_MESSAGES_QUERY)?;
    let mut rows = stmt.query(params![chat_name])?;
    let mut scanned = 0usize;

    while let Some(row) = rows.next()? {
        scanned += 1;
        let raw = RawMessageRow {
            text: row.get(0)?,
            attributed_body: row.get::<_, Option<Vec<u8>>>(1).ok().flatten(),
            handle: row.get(2)?,
            date: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
        };

        if let Some(message) = resolve_row(raw, directory) {
            messages.push(message);
            if messages.len() >= limit {
                break;
            }
        }
    }

    info!(
        target: "messages",
        chat = chat_name,
        scanned,
        accepted = messages.len(),
        limit,
        "Fetched chat transcript"
    );

    // Newest-first scan; flip to oldest-first for the transcript.
    messages.reverse();
    Ok(Transcript::new(messages))
}

/// Turn a raw row into a message, or `None` when it carries no usable text.
pub fn resolve_row(raw: RawMessageRow, directory: &ContactDirectory) -> Option<ResolvedMessage> {
    let text = row_text(&raw)?;
    Some(ResolvedMessage {
        speaker: speaker_for(&raw.handle, directory),
        text,
        time: convert_apple_time(raw.date),
    })
}

/// Plain text when it has content, else whatever the archived body decodes to.
pub fn row_text(raw: &RawMessageRow) -> Option<String> {
    if let Some(text) = raw.text.as_deref() {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }

    let body = raw.attributed_body.as_deref()?;
    let decoded = decode_attributed_body(body);
    let trimmed = decoded.trim();
    if trimmed.is_empty() {
        debug!(target: "messages", bytes = body.len(), "attributedBody produced no text");
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Display label for a sender handle.
pub fn speaker_for(handle: &str, directory: &ContactDirectory) -> String {
    if handle == LOCAL_USER_SENTINEL {
        return LOCAL_USER_LABEL.to_string();
    }
    let handle = handle.strip_prefix("+1").unwrap_or(handle);
    directory.resolve(handle)
}

/// Best-effort plaintext from an `attributedBody` archive.
///
/// The column holds a typedstream-archived `NSAttributedString`. Rather than
/// parse it, this cuts the text at class-name markers: drop everything from
/// `NSNumber` on, keep what follows `NSString`, cut at `NSDictionary`, then
/// strip the 6 characters of length prefix and 12 of trailing framing.
/// When `NSNumber` is absent the lossy UTF-8 text comes back as is, framing
/// bytes and all. Never fails; the result may be empty or noisy.
pub fn decode_attributed_body(data: &[u8]) -> String {
    let text = String::from_utf8_lossy(data);

    let Some(number_pos) = text.find("NSNumber") else {
        return text.into_owned();
    };
    let before_number = &text[..number_pos];

    let Some((_, after_string)) = before_number.split_once("NSString") else {
        return before_number.to_string();
    };

    let Some((content, _)) = after_string.split_once("NSDictionary") else {
        return after_string.to_string();
    };

    let chars: Vec<char> = content.chars().collect();
    if chars.len() <= BODY_PREFIX_CHARS + BODY_SUFFIX_CHARS {
        return String::new();
    }
    chars[BODY_PREFIX_CHARS..chars.len() - BODY_SUFFIX_CHARS]
        .iter()
        .collect()
}

const BODY_PREFIX_CHARS: usize = 6;
const BODY_SUFFIX_CHARS: usize = 12;

/// Named chats, most recently active first.
pub fn list_chat_names(conn: &Connection, limit: usize) -> Result<Vec<String>, TranscriptError> {
    let mut stmt = conn.prepare(
        "
        SELECT c.display_name
        FROM chat c
        LEFT JOIN chat_message_join cmj ON c.ROWID = cmj.chat_id
        LEFT JOIN message m ON cmj.message_id = m.ROWID
        WHERE c.display_name IS NOT NULL AND c.display_name != ''
        GROUP BY c.ROWID, c.display_name
        ORDER BY MAX(m.date) DESC
        LIMIT ?1
        ",
    )?;

    let names = stmt
        .query_map(params![limit as i64], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(names)
}

pub fn fetch_chat_names(db_path: &Path, limit: usize) -> Result<Vec<String>, TranscriptError> {
    let conn = open_chat_db(db_path)?;
    list_chat_names(&conn, limit).map_err(|e| match e {
        TranscriptError::Query(source) => TranscriptError::StoreUnavailable {
            path: db_path.to_path_buf(),
            source,
        },
        other => other,
    })
}

fn convert_apple_time(nanoseconds: i64) -> i64 {
    // Apple time is in nanoseconds since 2001-01-01
    // Convert to Unix milliseconds
    let seconds = nanoseconds / 1_000_000_000;
    (APPLE_EPOCH + seconds) * 1000
}
