pub mod applescript;
pub mod contacts;
pub mod messages;
