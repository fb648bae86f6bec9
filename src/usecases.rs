//! Thin use cases the session dispatches through

use crate::domain::{ChatItem, ToolItem};
use crate::error::Result;
use crate::repository::ChatRepository;
use std::sync::Arc;

/// Send a user message to the routed backend
#[derive(Clone)]
pub struct SendMessage {
    repository: Arc<dyn ChatRepository>,
}

impl SendMessage {
    pub fn new(repository: Arc<dyn ChatRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, message: &str) -> Result<Vec<ChatItem>> {
        self.repository.send_message(message).await
    }
}

/// Load tools from both backends
#[derive(Clone)]
pub struct LoadTools {
    repository: Arc<dyn ChatRepository>,
}

impl LoadTools {
    pub fn new(repository: Arc<dyn ChatRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self) -> Result<Vec<ToolItem>> {
        self.repository.all_tools().await
    }
}

/// Fetch the combined summary
#[derive(Clone)]
pub struct GetSummary {
    repository: Arc<dyn ChatRepository>,
}

impl GetSummary {
    pub fn new(repository: Arc<dyn ChatRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self) -> Result<Vec<ChatItem>> {
        self.repository.summary().await
    }
}
