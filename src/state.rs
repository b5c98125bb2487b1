use crate::config::Settings;
use crate::openrouter::OpenRouterClient;
use crate::services::contacts::ContactDirectory;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    /// Loaded once at startup and never written.
    pub directory: Arc<ContactDirectory>,
    pub summary_client: OpenRouterClient,
}
