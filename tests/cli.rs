mod common;

use std::path::Path;

use assert_cmd::Command;
use common::{write_contacts, FixtureDb, HELLO_BODY};
use predicates::prelude::*;

fn squad_fixture() -> FixtureDb {
    let db = FixtureDb::new();
    let chat = db.add_chat("Squad");
    let audrey = db.add_handle("+16508231082");
    db.add_text(chat, audrey, "hi squad", 10);
    db.add_text(chat, 0, "hey audrey", 20);
    db.add_message(chat, audrey, None, Some(HELLO_BODY), 30_000_000_000);
    db
}

fn command(db: &FixtureDb) -> Command {
    command_with_store(db, db.path())
}

fn command_with_store(db: &FixtureDb, store: &Path) -> Command {
    let contacts = write_contacts(db.dir(), &[("6508231082", "Audrey Zhang")]);
    let mut cmd = Command::cargo_bin("imessage-summary").expect("binary");
    cmd.current_dir(db.dir())
        .env_remove("OPENROUTER_API_KEY")
        .env_remove("IMESSAGE_DB_PATH")
        .env_remove("CONTACTS_PATH")
        .arg("--db")
        .arg(store)
        .arg("--contacts")
        .arg(contacts);
    cmd
}

#[test]
fn transcript_prints_speaker_lines() {
    let db = squad_fixture();

    command(&db)
        .args(["transcript", "--chat", "Squad"])
        .assert()
        .success()
        .stdout("Audrey Zhang: hi squad\nMe: hey audrey\nAudrey Zhang: hello\n");
}

#[test]
fn transcript_respects_message_limit() {
    let db = squad_fixture();

    command(&db)
        .args(["transcript", "-c", "Squad", "-m", "2"])
        .assert()
        .success()
        .stdout("Me: hey audrey\nAudrey Zhang: hello\n");
}

#[test]
fn transcript_json_output() {
    let db = squad_fixture();

    let output = command(&db)
        .args(["transcript", "--chat", "Squad", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    let messages = value["messages"].as_array().expect("messages");
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0]["speaker"], "Audrey Zhang");
    assert_eq!(messages[1]["text"], "hey audrey");
}

#[test]
fn summarize_without_prompt_prints_transcript() {
    let db = squad_fixture();

    command(&db)
        .args(["summarize", "--chat", "Squad", "--no-prompt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Me: hey audrey"));
}

#[test]
fn summarize_without_api_key_fails() {
    let db = squad_fixture();

    command(&db)
        .args(["summarize", "--chat", "Squad"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key not configured"));
}

#[test]
fn summarize_unknown_chat_is_not_an_error() {
    let db = squad_fixture();

    command(&db)
        .args(["summarize", "--chat", "NonexistentChat"])
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("No messages found"));
}

#[test]
fn zero_messages_is_rejected() {
    let db = squad_fixture();

    command(&db)
        .args(["transcript", "--chat", "Squad", "--messages", "0"])
        .assert()
        .failure();
}

#[test]
fn missing_store_reports_error() {
    let db = squad_fixture();
    let missing = db.dir().join("missing.db");

    command_with_store(&db, &missing)
        .args(["transcript", "--chat", "Squad"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error: message store unavailable"));
}

#[test]
fn chats_lists_named_chats() {
    let db = squad_fixture();

    command(&db)
        .arg("chats")
        .assert()
        .success()
        .stdout("Squad\n");
}
