use crate::domain::{ChatItem, MoonPhase};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Format version written with every transcript
pub const TRANSCRIPT_VERSION: u32 = 1;

fn default_transcript_version() -> u32 {
    TRANSCRIPT_VERSION
}

/// Persisted transcript window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptRecord {
    /// Format version the record was written with
    #[serde(default = "default_transcript_version")]
    pub version: u32,
    /// When the record was written
    #[serde(default, with = "chrono::serde::ts_milliseconds")]
    pub saved_at: DateTime<Utc>,
    /// Most recent chat items, oldest first
    #[serde(default)]
    pub items: Vec<ChatItem>,
}

impl TranscriptRecord {
    /// Record returned when nothing has been saved yet
    pub fn empty() -> Self {
        Self {
            version: TRANSCRIPT_VERSION,
            saved_at: DateTime::<Utc>::default(),
            items: Vec::new(),
        }
    }

    /// Wrap the trailing `limit` items of `items`
    pub fn from_trailing(items: &[ChatItem], limit: usize, saved_at: DateTime<Utc>) -> Self {
        let start = items.len().saturating_sub(limit);
        Self {
            version: TRANSCRIPT_VERSION,
            saved_at,
            items: items[start..].to_vec(),
        }
    }
}

/// Cached moon phase with its fetch time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoonPhaseRecord {
    pub moon_phase: MoonPhase,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub cached_at: DateTime<Utc>,
}

impl MoonPhaseRecord {
    /// Whether the record is younger than `ttl` at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.cached_at) < ttl
    }

    /// A record without a phase name carries no usable data
    pub fn is_empty(&self) -> bool {
        self.moon_phase.phase.trim().is_empty()
    }
}
