//! Test utilities for Cryptomoon
//!
//! An in-memory [`ChatRepository`] with scripted answers plus sample
//! domain values shared by unit tests.

use crate::domain::{ChatItem, ChatPayload, CryptoPrediction, MoonPhase, ToolItem, ToolSource};
use crate::error::{CryptomoonError, Result};
use crate::repository::ChatRepository;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Scripted in-memory repository
///
/// Queued results are returned in order; once a queue is empty, sends
/// echo the message and summaries return a single `tick` text item.
#[derive(Default)]
pub struct FakeRepository {
    send_results: Mutex<VecDeque<Result<Vec<ChatItem>>>>,
    summary_results: Mutex<VecDeque<Result<Vec<ChatItem>>>>,
    tools: Vec<ToolItem>,
    stored: Mutex<Vec<ChatItem>>,
    sent: Mutex<Vec<String>>,
    saves: AtomicUsize,
    summary_calls: AtomicUsize,
    fail_saves: bool,
}

impl FakeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tools(mut self, tools: Vec<ToolItem>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_stored(self, items: Vec<ChatItem>) -> Self {
        *self.stored.lock().unwrap() = items;
        self
    }

    pub fn with_failing_saves(mut self) -> Self {
        self.fail_saves = true;
        self
    }

    pub fn push_send_result(&self, result: Result<Vec<ChatItem>>) {
        self.send_results.lock().unwrap().push_back(result);
    }

    pub fn push_summary_result(&self, result: Result<Vec<ChatItem>>) {
        self.summary_results.lock().unwrap().push_back(result);
    }

    pub fn stored(&self) -> Vec<ChatItem> {
        self.stored.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn summary_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatRepository for FakeRepository {
    async fn send_message(&self, message: &str) -> Result<Vec<ChatItem>> {
        self.sent.lock().unwrap().push(message.to_string());
        match self.send_results.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(vec![ChatItem::assistant(ChatPayload::text(format!(
                "echo: {}",
                message
            )))]),
        }
    }

    async fn summary(&self) -> Result<Vec<ChatItem>> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        match self.summary_results.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(vec![ChatItem::assistant(ChatPayload::text("tick"))]),
        }
    }

    async fn crypto_tools(&self) -> Result<Vec<ToolItem>> {
        Ok(self
            .tools
            .iter()
            .filter(|t| t.source == ToolSource::Crypto)
            .cloned()
            .collect())
    }

    async fn moon_tools(&self) -> Result<Vec<ToolItem>> {
        Ok(self
            .tools
            .iter()
            .filter(|t| t.source == ToolSource::Moon)
            .cloned()
            .collect())
    }

    async fn all_tools(&self) -> Result<Vec<ToolItem>> {
        Ok(self.tools.clone())
    }

    async fn current_moon_phase(&self) -> Result<MoonPhase> {
        Ok(sample_moon_phase(true))
    }

    async fn save_messages(&self, items: Vec<ChatItem>) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves {
            return Err(CryptomoonError::Storage("disk full".to_string()).into());
        }
        *self.stored.lock().unwrap() = items;
        Ok(())
    }

    async fn load_messages(&self) -> Result<Vec<ChatItem>> {
        Ok(self.stored())
    }

    async fn clear_messages(&self) -> Result<()> {
        self.stored.lock().unwrap().clear();
        Ok(())
    }
}

/// A moon phase, optionally carrying a bullish prediction
pub fn sample_moon_phase(with_prediction: bool) -> MoonPhase {
    MoonPhase {
        phase: "Waxing Gibbous".to_string(),
        phase_emoji: "🌔".to_string(),
        waxing: true,
        waning: false,
        lunar_age: 11.3,
        lunar_age_percent: 38.3,
        lunation_number: 1262,
        lunar_distance: 389_612.4,
        next_full_moon: Some("2026-10-26T04:11:00Z".to_string()),
        last_full_moon: Some("2026-09-27T12:49:00Z".to_string()),
        crypto_prediction: with_prediction.then(|| CryptoPrediction {
            trend: "bullish".to_string(),
            confidence: "medium".to_string(),
            reasoning: "Waxing phases historically precede rallies.".to_string(),
            recommendation: "Consider accumulating.".to_string(),
        }),
    }
}

/// A tool descriptor
pub fn sample_tool(id: &str, source: ToolSource) -> ToolItem {
    ToolItem {
        id: id.to_string(),
        title: id.to_uppercase(),
        description: format!("{} tool", id),
        sample_query: format!("show {}", id),
        source,
    }
}
