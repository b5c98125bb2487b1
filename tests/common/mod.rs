#![allow(dead_code)]

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use tempfile::TempDir;

/// Attributed body that decodes to "hello".
pub const HELLO_BODY: &[u8] = b"\x04\x0bstreamtyped\x81\xe8\x03\x84\x01@\x84\x84\x84\x12NSAttributedString\x00\x84\x84\x08NSObject\x00\x85\x92\x84\x84\x84\x08NSString\x01\x94\x84\x01+\x05hello\x86\x84\x02iI\x01\x05\x92\x84\x84\x84\x0cNSDictionary\x00\x94\x84\x01i\x01\x92\x84\x96\x96\x1d__kIMMessagePartAttributeName\x86\x92\x84\x84\x84\x08NSNumber\x00\x84\x84\x07NSValue\x00\x94\x84\x01*\x84\x99\x99\x00\x86\x86\x86";

/// Body whose text between markers is too short to survive framing removal.
pub const EMPTY_BODY: &[u8] = b"NSStringtooshortNSDictionaryNSNumber";

const SCHEMA: &str = "
    CREATE TABLE chat (
        ROWID INTEGER PRIMARY KEY AUTOINCREMENT,
        chat_identifier TEXT,
        display_name TEXT
    );
    CREATE TABLE handle (
        ROWID INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL
    );
    CREATE TABLE message (
        ROWID INTEGER PRIMARY KEY AUTOINCREMENT,
        text TEXT,
        attributedBody BLOB,
        handle_id INTEGER DEFAULT 0,
        date INTEGER
    );
    CREATE TABLE chat_message_join (
        chat_id INTEGER REFERENCES chat (ROWID),
        message_id INTEGER REFERENCES message (ROWID),
        PRIMARY KEY (chat_id, message_id)
    );
";

/// A throwaway `chat.db` with the subset of the Messages schema the reader uses.
pub struct FixtureDb {
    dir: TempDir,
    path: PathBuf,
    conn: Connection,
}

impl FixtureDb {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("chat.db");
        let conn = Connection::open(&path).expect("open fixture db");
        conn.execute_batch(SCHEMA).expect("schema");
        Self { dir, path, conn }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn add_chat(&self, display_name: &str) -> i64 {
        self.conn
            .execute(
                "INSERT INTO chat (chat_identifier, display_name) VALUES (?1, ?2)",
                params![format!("chat{}", display_name.len()), display_name],
            )
            .expect("insert chat");
        self.conn.last_insert_rowid()
    }

    pub fn add_handle(&self, id: &str) -> i64 {
        self.conn
            .execute("INSERT INTO handle (id) VALUES (?1)", params![id])
            .expect("insert handle");
        self.conn.last_insert_rowid()
    }

    /// `handle_id` 0 means sent by the local user.
    pub fn add_message(
        &self,
        chat_id: i64,
        handle_id: i64,
        text: Option<&str>,
        body: Option<&[u8]>,
        date: i64,
    ) -> i64 {
        self.conn
            .execute(
                "INSERT INTO message (text, attributedBody, handle_id, date) VALUES (?1, ?2, ?3, ?4)",
                params![text, body, handle_id, date],
            )
            .expect("insert message");
        let message_id = self.conn.last_insert_rowid();
        self.conn
            .execute(
                "INSERT INTO chat_message_join (chat_id, message_id) VALUES (?1, ?2)",
                params![chat_id, message_id],
            )
            .expect("insert join");
        message_id
    }

    /// Plain-text message at `seconds` after the Apple epoch.
    pub fn add_text(&self, chat_id: i64, handle_id: i64, text: &str, seconds: i64) -> i64 {
        self.add_message(chat_id, handle_id, Some(text), None, seconds * 1_000_000_000)
    }
}

/// Write a contacts file in the harvested `{"data": {...}}` shape.
pub fn write_contacts(dir: &Path, entries: &[(&str, &str)]) -> PathBuf {
    let data: serde_json::Map<String, serde_json::Value> = entries
        .iter()
        .map(|(key, name)| (key.to_string(), serde_json::Value::String(name.to_string())))
        .collect();
    let path = dir.join("all-contacts.json");
    std::fs::write(&path, serde_json::json!({ "data": data }).to_string()).expect("write contacts");
    path
}
