//! Runtime settings.
//!
//! Values come from the environment (after `.env.local` / `.env` are loaded by
//! `dotenvy`) and can be overridden by command-line flags.

use std::path::PathBuf;

use crate::error::{AppError, Result};
use crate::openrouter::{OpenRouterClient, OpenRouterError, DEFAULT_BASE_URL};

/// Default model used for summaries
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

pub const DEFAULT_CONTACTS_FILE: &str = "all-contacts.json";

const DB_PATH_ENV: &str = "IMESSAGE_DB_PATH";
const CONTACTS_PATH_ENV: &str = "CONTACTS_PATH";
const API_KEY_ENV: &str = "OPENROUTER_API_KEY";
const MODEL_ENV: &str = "OPENROUTER_MODEL";
const BASE_URL_ENV: &str = "OPENROUTER_BASE_URL";

#[derive(Debug, Clone)]
pub struct Settings {
    pub db_path: PathBuf,
    pub contacts_path: PathBuf,
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

/// Loads `.env.local` first so it takes precedence over `.env`.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::dotenv();
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let db_path = match env_value(DB_PATH_ENV) {
            Some(path) => PathBuf::from(path),
            None => default_db_path()?,
        };
        let contacts_path = env_value(CONTACTS_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTACTS_FILE));

        Ok(Self {
            db_path,
            contacts_path,
            api_key: env_value(API_KEY_ENV).unwrap_or_default(),
            model: env_value(MODEL_ENV).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: env_value(BASE_URL_ENV).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    pub fn with_overrides(mut self, db: Option<PathBuf>, contacts: Option<PathBuf>) -> Self {
        if let Some(db) = db {
            self.db_path = db;
        }
        if let Some(contacts) = contacts {
            self.contacts_path = contacts;
        }
        self
    }

    pub fn summary_client(&self) -> std::result::Result<OpenRouterClient, OpenRouterError> {
        Ok(OpenRouterClient::new(self.api_key.clone(), self.model.clone())?
            .with_base_url(self.base_url.clone()))
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(AppError::HomeDirectoryNotFound)?;
    Ok(home.join("Library").join("Messages").join("chat.db"))
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}
