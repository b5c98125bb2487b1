use crate::error::DirectoryError;
use crate::services::applescript::{osascript_stdout, run_osascript_output};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Reduce a phone number or email to the key used by the contacts file.
///
/// Emails (anything with an `@`) pass through unchanged. Phones keep only
/// their digits, and an 11-digit number with a leading US country code `1`
/// drops it. Inputs that don't end up with 10 digits are returned as the
/// partial digit string; they simply won't match a directory entry.
pub fn normalize_phone(raw: &str) -> String {
    let raw = raw.trim();
    if raw.contains('@') {
        return raw.to_string();
    }

    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 11 && digits.starts_with('1') {
        return digits[1..].to_string();
    }
    digits
}

/// On-disk shape of the contacts file: `{"data": {"6505551234": "Jane Doe"}}`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ContactsFile {
    #[serde(default)]
    data: HashMap<String, String>,
}

/// Read-only mapping from canonical key to display name.
///
/// Loaded once per run and passed by reference to whatever needs to resolve
/// a sender.
#[derive(Debug, Clone, Default)]
pub struct ContactDirectory {
    entries: HashMap<String, String>,
}

impl ContactDirectory {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn load(path: &Path) -> Result<Self, DirectoryError> {
        let raw = std::fs::read_to_string(path).map_err(|source| DirectoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ContactsFile =
            serde_json::from_str(&raw).map_err(|source| DirectoryError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        info!(
            target: "contacts",
            path = %path.display(),
            entries = file.data.len(),
            "Loaded contacts directory"
        );
        Ok(Self::new(file.data))
    }

    pub fn save(&self, path: &Path) -> Result<(), DirectoryError> {
        let file = ContactsFile {
            data: self.entries.clone(),
        };
        // Match the four-space indentation of the original contacts file.
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        file.serialize(&mut serializer)
            .map_err(|source| DirectoryError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        std::fs::write(path, out).map_err(|source| DirectoryError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Display name for a sender handle, or the handle itself when unknown.
    pub fn resolve(&self, handle: &str) -> String {
        let key = normalize_phone(handle);
        match self.entries.get(&key) {
            Some(name) => name.clone(),
            None => handle.to_string(),
        }
    }
}

pub fn resolve(handle: &str, directory: &ContactDirectory) -> String {
    directory.resolve(handle)
}

/// Split the textual form of an AppleScript list of `{name, phone}` pairs.
///
/// Contacts returns something like
/// `Jane Doe, item 1 of +16505551234, John Roe, (408) 555-0100`; names carry
/// no digits, identifiers either come as `item N of X` or contain a digit or
/// an `@`.
pub fn parse_applescript_output(raw_output: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut current_name: Option<String> = None;

    for token in raw_output.split(',').map(str::trim) {
        if token.starts_with("item ") {
            let identifier = strip_item_reference(token);
            if let Some(ref name) = current_name {
                pairs.push((name.clone(), identifier.to_string()));
            }
        } else if token.chars().any(|c| c.is_ascii_digit()) || token.contains('@') {
            if let Some(ref name) = current_name {
                pairs.push((name.clone(), token.to_string()));
            }
        } else {
            current_name = Some(token.to_string());
        }
    }

    pairs
}

/// `item 3 of +16505551234` -> `+16505551234`. Tokens that don't follow that
/// shape are returned trimmed.
fn strip_item_reference(token: &str) -> &str {
    let rest = match token.strip_prefix("item") {
        Some(rest) => rest,
        None => return token.trim(),
    };
    let rest = rest.trim_start();
    let index_len = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if index_len == 0 {
        return token.trim();
    }
    let rest = rest[index_len..].trim_start();
    match rest.strip_prefix("of") {
        Some(value) if value.starts_with(char::is_whitespace) => value.trim(),
        _ => token.trim(),
    }
}

/// Build a directory from parsed pairs. Later pairs win on duplicate keys and
/// identifiers that normalize to nothing are dropped.
pub fn build_directory(pairs: &[(String, String)]) -> ContactDirectory {
    let mut entries = HashMap::new();
    for (name, identifier) in pairs {
        let key = normalize_phone(identifier);
        if !key.is_empty() {
            entries.insert(key, name.clone());
        }
    }
    ContactDirectory::new(entries)
}

/// Harvest every phone number from Contacts and write the directory file.
///
/// Slow on large address books; only needed when the file is missing or stale.
pub fn harvest_contacts(path: &Path) -> Result<ContactDirectory, DirectoryError> {
    let started = Instant::now();
    let output = run_osascript_output(CONTACTS_EXPORT_SCRIPT)
        .map_err(|e| DirectoryError::Harvest(format!("failed to run osascript: {}", e)))?;

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if !stderr.is_empty() {
        warn!(target: "contacts", stderr = %stderr, "[applescript] Contacts export wrote to stderr");
    }
    if !output.status.success() {
        return Err(DirectoryError::Harvest(format!(
            "osascript exited with {}",
            output.status
        )));
    }

    let raw_output = osascript_stdout(output);
    let pairs = parse_applescript_output(&raw_output);
    let directory = build_directory(&pairs);
    directory.save(path)?;

    info!(
        target: "contacts",
        duration_ms = started.elapsed().as_millis(),
        pairs = pairs.len(),
        entries = directory.len(),
        path = %path.display(),
        "[applescript] Wrote contacts directory"
    );
    Ok(directory)
}

/// Load the directory, harvesting it first when the file does not exist yet.
pub fn load_or_harvest(path: &Path) -> Result<ContactDirectory, DirectoryError> {
    if path.exists() {
        return ContactDirectory::load(path);
    }
    info!(
        target: "contacts",
        path = %path.display(),
        "Contacts not loaded yet, harvesting from Contacts (first run is slow)"
    );
    harvest_contacts(path)
}

// AppleScript: no input; output is a flat list of name/phone pairs.
// Side effects: launches Contacts if it isn't running.
const CONTACTS_EXPORT_SCRIPT: &str = r#"tell application "Contacts"
    set namePhonePairs to {}
    set allPersons to every person
    repeat with p in allPersons
        set personName to name of p
        set phoneNumbers to value of phones of p

        repeat with phoneNumber in phoneNumbers
            copy {personName, phoneNumber} to the end of namePhonePairs
        end repeat
    end repeat

    return namePhonePairs
end tell"#;
