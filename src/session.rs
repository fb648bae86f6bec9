//! Chat session state and event handling
//!
//! [`ChatSession`] holds the visible conversation and reacts to
//! [`ChatEvent`]s coming from the terminal front end. Every item it
//! appends is persisted through the repository so the transcript survives
//! restarts.

use crate::domain::{ChatItem, ToolItem};
use crate::error::Result;
use crate::refresh::RefreshService;
use crate::repository::ChatRepository;
use crate::usecases::{GetSummary, LoadTools, SendMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Snapshot of what the front end displays
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    pub items: Vec<ChatItem>,
    pub input: String,
    pub is_sending: bool,
    pub error: Option<String>,
    pub tools: Vec<ToolItem>,
    pub show_tools: bool,
    pub is_refresh_running: bool,
}

/// User intents the session understands
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    InputChanged(String),
    SendPressed,
    ToolsPressed,
    ToolPicked(ToolItem),
    ToolsDialogDismissed,
    StartRefresh,
    StopRefresh,
}

/// The chat view-model
pub struct ChatSession {
    state: ChatState,
    repository: Arc<dyn ChatRepository>,
    send_message: SendMessage,
    load_tools: LoadTools,
    refresh: RefreshService,
}

impl ChatSession {
    pub fn new(repository: Arc<dyn ChatRepository>, refresh_interval: Duration) -> Self {
        let refresh = RefreshService::new(
            GetSummary::new(Arc::clone(&repository)),
            refresh_interval,
        );
        Self {
            state: ChatState::default(),
            send_message: SendMessage::new(Arc::clone(&repository)),
            load_tools: LoadTools::new(Arc::clone(&repository)),
            repository,
            refresh,
        }
    }

    /// Current state
    pub fn state(&self) -> &ChatState {
        &self.state
    }

    /// Batches published by the periodic refresh
    pub fn subscribe_updates(&self) -> broadcast::Receiver<Vec<ChatItem>> {
        self.refresh.subscribe()
    }

    /// Load the saved transcript into the visible list
    ///
    /// Returns the number of restored items; load failures are logged and
    /// leave the list empty.
    pub async fn restore(&mut self) -> usize {
        match self.repository.load_messages().await {
            Ok(items) => {
                tracing::debug!("Loaded {} messages from cache", items.len());
                self.state.items = items;
                self.state.items.len()
            }
            Err(e) => {
                tracing::error!("Failed to load cache: {}", e);
                0
            }
        }
    }

    /// Fetch tools from both backends into the state
    pub async fn load_tools(&mut self) {
        match self.load_tools.execute().await {
            Ok(tools) => self.state.tools = tools,
            Err(e) => tracing::error!("Failed to load tools: {}", e),
        }
    }

    /// Apply an event
    ///
    /// Returns the items appended while handling it, in order.
    pub async fn on_event(&mut self, event: ChatEvent) -> Vec<ChatItem> {
        match event {
            ChatEvent::InputChanged(text) => {
                self.state.input = text;
                Vec::new()
            }
            ChatEvent::SendPressed => self.send().await,
            ChatEvent::ToolsPressed => {
                self.state.show_tools = true;
                Vec::new()
            }
            ChatEvent::ToolPicked(tool) => {
                self.state.input = tool.sample_query;
                self.state.show_tools = false;
                Vec::new()
            }
            ChatEvent::ToolsDialogDismissed => {
                self.state.show_tools = false;
                Vec::new()
            }
            ChatEvent::StartRefresh => {
                self.refresh.start();
                self.state.is_refresh_running = true;
                Vec::new()
            }
            ChatEvent::StopRefresh => {
                self.refresh.stop();
                self.state.is_refresh_running = false;
                Vec::new()
            }
        }
    }

    /// Append a batch (e.g. from the periodic refresh) and save once
    pub async fn append_items(&mut self, items: Vec<ChatItem>) {
        if items.is_empty() {
            return;
        }
        tracing::debug!("Received {} items from refresh", items.len());
        self.state.items.extend(items);
        self.save().await;
    }

    /// Empty the visible list and delete the saved transcript
    pub async fn clear(&mut self) -> Result<()> {
        self.state.items.clear();
        self.state.error = None;
        self.repository.clear_messages().await
    }

    async fn send(&mut self) -> Vec<ChatItem> {
        let message = self.state.input.trim().to_string();
        if message.is_empty() {
            return Vec::new();
        }

        self.state.is_sending = true;
        self.state.input.clear();

        let mut appended = Vec::new();
        let user_item = ChatItem::user_text(message.clone());
        self.append_item(user_item.clone()).await;
        appended.push(user_item);

        match self.send_message.execute(&message).await {
            Ok(items) => {
                for item in items {
                    self.append_item(item.clone()).await;
                    appended.push(item);
                }
            }
            Err(e) => {
                tracing::error!("Failed to send message: {}", e);
                self.state.error = Some(e.to_string());
                let error_item = ChatItem::system_text(format!("❌ Error: {}", e));
                self.append_item(error_item.clone()).await;
                appended.push(error_item);
            }
        }

        self.state.is_sending = false;
        appended
    }

    async fn append_item(&mut self, item: ChatItem) {
        self.state.items.push(item);
        self.save().await;
    }

    async fn save(&self) {
        if let Err(e) = self.repository.save_messages(self.state.items.clone()).await {
            tracing::warn!("Failed to save transcript: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatPayload, ChatRole, ToolSource};
    use crate::error::CryptomoonError;
    use crate::test_utils::{sample_tool, FakeRepository};
    use tokio::time::timeout;

    fn session(repo: &Arc<FakeRepository>) -> ChatSession {
        let repo: Arc<dyn ChatRepository> = repo.clone();
        ChatSession::new(repo, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_send_appends_user_then_answer_and_saves_each() {
        let repo = Arc::new(FakeRepository::new());
        let mut session = session(&repo);

        session
            .on_event(ChatEvent::InputChanged("  btc price  ".to_string()))
            .await;
        let appended = session.on_event(ChatEvent::SendPressed).await;

        assert_eq!(appended.len(), 2);
        assert_eq!(appended[0].role, ChatRole::User);
        assert_eq!(appended[0].payload, ChatPayload::text("btc price"));
        assert_eq!(appended[1].payload, ChatPayload::text("echo: btc price"));
        assert_eq!(repo.sent(), vec!["btc price".to_string()]);
        assert_eq!(repo.save_count(), 2);
        assert_eq!(repo.stored(), session.state().items);

        let state = session.state();
        assert!(state.input.is_empty());
        assert!(!state.is_sending);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let repo = Arc::new(FakeRepository::new());
        let mut session = session(&repo);

        session
            .on_event(ChatEvent::InputChanged("   ".to_string()))
            .await;
        let appended = session.on_event(ChatEvent::SendPressed).await;

        assert!(appended.is_empty());
        assert!(repo.sent().is_empty());
        assert_eq!(repo.save_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_send_appends_error_item() {
        let repo = Arc::new(FakeRepository::new());
        repo.push_send_result(Err(CryptomoonError::Network("timeout".to_string()).into()));
        let mut session = session(&repo);

        session
            .on_event(ChatEvent::InputChanged("eth".to_string()))
            .await;
        let appended = session.on_event(ChatEvent::SendPressed).await;

        assert_eq!(appended.len(), 2);
        assert_eq!(appended[1].role, ChatRole::System);
        assert_eq!(
            appended[1].payload.as_text().unwrap(),
            "❌ Error: Network error: timeout"
        );
        assert_eq!(
            session.state().error.as_deref(),
            Some("Network error: timeout")
        );
        assert!(!session.state().is_sending);
    }

    #[tokio::test]
    async fn test_save_failure_does_not_block_conversation() {
        let repo = Arc::new(FakeRepository::new().with_failing_saves());
        let mut session = session(&repo);

        session
            .on_event(ChatEvent::InputChanged("sol".to_string()))
            .await;
        let appended = session.on_event(ChatEvent::SendPressed).await;
        assert_eq!(appended.len(), 2);
        assert_eq!(session.state().items.len(), 2);
    }

    #[tokio::test]
    async fn test_restore_loads_saved_transcript() {
        let saved = vec![ChatItem::user_text("earlier")];
        let repo = Arc::new(FakeRepository::new().with_stored(saved.clone()));
        let mut session = session(&repo);

        assert_eq!(session.restore().await, 1);
        assert_eq!(session.state().items, saved);
    }

    #[tokio::test]
    async fn test_tool_flow_copies_sample_query() {
        let tool = sample_tool("phase", ToolSource::Moon);
        let repo = Arc::new(FakeRepository::new().with_tools(vec![tool.clone()]));
        let mut session = session(&repo);

        session.load_tools().await;
        assert_eq!(session.state().tools.len(), 1);

        session.on_event(ChatEvent::ToolsPressed).await;
        assert!(session.state().show_tools);

        session.on_event(ChatEvent::ToolPicked(tool)).await;
        assert!(!session.state().show_tools);
        assert_eq!(session.state().input, "show phase");

        session.on_event(ChatEvent::ToolsPressed).await;
        session.on_event(ChatEvent::ToolsDialogDismissed).await;
        assert!(!session.state().show_tools);
    }

    #[tokio::test]
    async fn test_clear_empties_state_and_store() {
        let saved = vec![ChatItem::user_text("earlier")];
        let repo = Arc::new(FakeRepository::new().with_stored(saved));
        let mut session = session(&repo);
        session.restore().await;

        session.clear().await.unwrap();
        assert!(session.state().items.is_empty());
        assert!(repo.stored().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_events_toggle_state_and_publish() {
        let repo = Arc::new(FakeRepository::new());
        let mut session = session(&repo);
        let mut updates = session.subscribe_updates();

        session.on_event(ChatEvent::StartRefresh).await;
        assert!(session.state().is_refresh_running);

        let batch = timeout(Duration::from_secs(2), updates.recv())
            .await
            .unwrap()
            .unwrap();
        session.append_items(batch).await;
        assert_eq!(session.state().items.len(), 1);
        assert_eq!(repo.stored().len(), 1);

        session.on_event(ChatEvent::StopRefresh).await;
        assert!(!session.state().is_refresh_running);
    }
}
