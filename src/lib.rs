use std::sync::Arc;

use crate::modules::chat::crud::HistoryStore;
use crate::services::llm::CompletionApi;

pub mod config;
pub mod modules;
pub mod services;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn HistoryStore>,
    /// `None` when the completion client could not be built at startup
    /// (missing API key); `/chat` answers service-unavailable in that case.
    pub llm: Option<Arc<dyn CompletionApi>>,
}
