//! Domain model shared by every layer
//!
//! A conversation is an ordered list of [`ChatItem`]s. Items are immutable
//! once created and carry their payload variant (see [`payload`]).

pub mod payload;

pub use payload::{
    ChatPayload, CoinInfo, CoinPrice, CombinedReport, ContractAddress, CryptoPrediction,
    FearGreedIndex, FearGreedValue, MoonPhase, NewsItem, TrendOutlook, FEAR_GREED_DEFAULT_NAME,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Who produced a chat item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
    Tool,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
            ChatRole::System => "system",
            ChatRole::Tool => "tool",
        };
        write!(f, "{}", name)
    }
}

/// One entry of the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatItem {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Creation time, stored as epoch milliseconds
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub ts: DateTime<Utc>,
    pub role: ChatRole,
    pub payload: ChatPayload,
}

impl ChatItem {
    /// Create an item stamped with the current time
    pub fn new(role: ChatRole, payload: ChatPayload) -> Self {
        Self::with_timestamp(role, payload, now_millis())
    }

    /// Create an item with an explicit creation time
    pub fn with_timestamp(role: ChatRole, payload: ChatPayload, ts: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            ts,
            role,
            payload,
        }
    }

    /// User-authored text
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(ChatRole::User, ChatPayload::text(text))
    }

    /// Assistant item carrying any payload
    pub fn assistant(payload: ChatPayload) -> Self {
        Self::new(ChatRole::Assistant, payload)
    }

    /// System text, used for warnings and inline errors
    pub fn system_text(text: impl Into<String>) -> Self {
        Self::new(ChatRole::System, ChatPayload::text(text))
    }
}

/// Which backend a tool belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolSource {
    Crypto,
    Moon,
}

impl fmt::Display for ToolSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolSource::Crypto => write!(f, "crypto"),
            ToolSource::Moon => write!(f, "moon"),
        }
    }
}

/// A backend capability with a ready-made sample query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub sample_query: String,
    pub source: ToolSource,
}

/// Current time truncated to whole milliseconds
///
/// Items are persisted with millisecond precision, so creating them at the
/// same precision keeps a save/load cycle lossless.
pub fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_items_have_unique_ids() {
        let a = ChatItem::user_text("hi");
        let b = ChatItem::user_text("hi");
        assert_ne!(a.id, b.id);
        assert!(Uuid::parse_str(&a.id).is_ok());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
        assert_eq!(ChatRole::System.to_string(), "system");
    }

    #[test]
    fn test_item_timestamp_is_epoch_millis() {
        let ts = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        let item = ChatItem::with_timestamp(ChatRole::User, ChatPayload::text("x"), ts);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["ts"], 1_700_000_000_123_i64);
        assert_eq!(json["payload"]["type"], "text");
    }

    #[test]
    fn test_item_survives_json_cycle() {
        let item = ChatItem::system_text("⚠️ warning");
        let json = serde_json::to_string(&item).unwrap();
        let back: ChatItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_tool_item_serializes_sample_query_camel_case() {
        let tool = ToolItem {
            id: "moon".to_string(),
            title: "Moon".to_string(),
            description: "d".to_string(),
            sample_query: "moon phase".to_string(),
            source: ToolSource::Moon,
        };
        let json = serde_json::to_value(&tool).unwrap();
        assert_eq!(json["sampleQuery"], "moon phase");
        assert_eq!(json["source"], "moon");
    }
}
