//! Wire types exchanged with both backends and their domain mapping
//!
//! Response items share one flat shape; `type` selects which of the
//! optional fields are meaningful. Fear-and-greed and coin items exist in
//! two shapes. An explicit `version` field picks the shape when present
//! (1 = legacy, 2 = extended); otherwise the shape is inferred from which
//! fields are filled.

use crate::domain::{
    ChatItem, ChatPayload, ChatRole, CoinInfo, CoinPrice, CombinedReport, CryptoPrediction,
    FearGreedIndex, FearGreedValue, MoonPhase, NewsItem, ToolItem, ToolSource,
    FEAR_GREED_DEFAULT_NAME,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response shape version for legacy items
pub const SHAPE_LEGACY: u32 = 1;
/// Response shape version for extended items
pub const SHAPE_EXTENDED: u32 = 2;

const DEFAULT_BASE_CURRENCY: &str = "USD";
const LEGACY_FEAR_GREED_VALUE: i32 = 50;
const LEGACY_FEAR_GREED_LABEL: &str = "Neutral";

/// `POST /chat` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequestDto {
    pub message: String,
    pub context: ChatContextDto,
}

/// Caller context sent with each message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatContextDto {
    pub locale: String,
    pub timezone: String,
}

impl Default for ChatContextDto {
    fn default() -> Self {
        Self {
            locale: "ru-RU".to_string(),
            timezone: "Europe/Moscow".to_string(),
        }
    }
}

/// List of typed response items
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponseDto {
    #[serde(default)]
    pub items: Vec<ChatResponseItemDto>,
}

impl ChatResponseDto {
    /// Map every item to a domain chat item
    pub fn into_domain(self) -> Vec<ChatItem> {
        self.items
            .into_iter()
            .map(ChatResponseItemDto::into_domain)
            .collect()
    }
}

/// One typed response item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponseItemDto {
    #[serde(rename = "type")]
    pub item_type: String,

    /// Explicit shape version, see [`SHAPE_LEGACY`] and [`SHAPE_EXTENDED`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,

    /// Creation time in epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,

    // text / combinedReport
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    // prices
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coins: Option<Vec<CoinPriceDto>>,

    // fearGreed, extended
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub now: Option<FearGreedValueDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yesterday: Option<FearGreedValueDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_week: Option<FearGreedValueDto>,

    // fearGreed, legacy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    // news
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<NewsItemDto>>,

    // coin, legacy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_24h: Option<f64>,

    // coin, extended
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coin: Option<CoinInfo>,

    // moonPhase / combinedReport
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moon_phase: Option<MoonPhase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<CryptoPrediction>,
}

/// Sentiment reading as sent by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FearGreedValueDto {
    pub value: i32,
    pub value_classification: String,
    pub timestamp: i64,
    #[serde(default)]
    pub update_time: Option<String>,
}

impl From<FearGreedValueDto> for FearGreedValue {
    fn from(dto: FearGreedValueDto) -> Self {
        Self {
            value: dto.value,
            value_classification: dto.value_classification,
            timestamp: dto.timestamp,
            update_time: dto.update_time,
        }
    }
}

/// Coin quote as sent by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinPriceDto {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub change_1h_pct: Option<f64>,
    #[serde(default)]
    pub change_1h_abs: Option<f64>,
}

impl From<CoinPriceDto> for CoinPrice {
    fn from(dto: CoinPriceDto) -> Self {
        Self {
            symbol: dto.symbol,
            name: dto.name,
            price: dto.price,
            change_1h_pct: dto.change_1h_pct,
            change_1h_abs: dto.change_1h_abs,
        }
    }
}

/// Headline as sent by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItemDto {
    pub title: String,
    #[serde(default)]
    pub source: Option<String>,
    pub time: i64,
    #[serde(default)]
    pub url: Option<String>,
}

impl From<NewsItemDto> for NewsItem {
    fn from(dto: NewsItemDto) -> Self {
        Self {
            title: dto.title,
            source: dto.source,
            time: dto.time,
            url: dto.url,
        }
    }
}

/// `GET /tools` body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolsResponseDto {
    #[serde(default)]
    pub tools: Vec<ToolItemDto>,
}

impl ToolsResponseDto {
    /// Map every tool, tagging it with the backend it came from
    pub fn into_domain(self, source: ToolSource) -> Vec<ToolItem> {
        self.tools
            .into_iter()
            .map(|tool| tool.into_domain(source))
            .collect()
    }
}

/// Tool descriptor as sent by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolItemDto {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sample_query: String,
}

impl ToolItemDto {
    pub fn into_domain(self, source: ToolSource) -> ToolItem {
        ToolItem {
            id: self.id,
            title: self.title,
            description: self.description,
            sample_query: self.sample_query,
            source,
        }
    }
}

/// Which of the two item shapes a response item uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemShape {
    Legacy,
    Extended,
}

impl ChatResponseItemDto {
    /// Wrap a moon phase into a response item
    pub fn moon_phase(moon_phase: MoonPhase, ts: i64) -> Self {
        Self {
            item_type: "moonPhase".to_string(),
            version: Some(SHAPE_EXTENDED),
            ts: Some(ts),
            moon_phase: Some(moon_phase),
            ..Default::default()
        }
    }

    /// Shape used by fear-and-greed and coin items
    ///
    /// An explicit `version` wins. Without one the extended shape is
    /// assumed when its distinguishing field is filled.
    pub fn shape(&self) -> ItemShape {
        match self.version {
            Some(SHAPE_LEGACY) => ItemShape::Legacy,
            Some(v) if v >= SHAPE_EXTENDED => ItemShape::Extended,
            _ => {
                if self.now.is_some() || self.coin.is_some() {
                    ItemShape::Extended
                } else {
                    ItemShape::Legacy
                }
            }
        }
    }

    /// Convert to a domain item
    ///
    /// Never fails: unknown types and items missing their required
    /// sub-object become text items carrying a diagnostic.
    pub fn into_domain(self) -> ChatItem {
        let ts = self
            .ts
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or_else(crate::domain::now_millis);
        let payload = self.into_payload();
        ChatItem::with_timestamp(ChatRole::Assistant, payload, ts)
    }

    fn into_payload(mut self) -> ChatPayload {
        let shape = self.shape();
        let item_type = std::mem::take(&mut self.item_type);
        match item_type.as_str() {
            "text" => ChatPayload::text(self.text.unwrap_or_default()),
            "prices" => ChatPayload::Prices {
                base: self
                    .base
                    .unwrap_or_else(|| DEFAULT_BASE_CURRENCY.to_string()),
                coins: self
                    .coins
                    .unwrap_or_default()
                    .into_iter()
                    .map(CoinPrice::from)
                    .collect(),
            },
            "fearGreed" => fear_greed_payload(shape, self),
            "news" => ChatPayload::News {
                items: self
                    .items
                    .unwrap_or_default()
                    .into_iter()
                    .map(NewsItem::from)
                    .collect(),
            },
            "coin" => coin_payload(shape, self),
            "moonPhase" => match self.moon_phase {
                Some(moon_phase) => ChatPayload::MoonPhase(moon_phase),
                None => ChatPayload::text("Malformed moonPhase item: missing moonPhase"),
            },
            "combinedReport" => match self.moon_phase {
                Some(moon_phase) => ChatPayload::CombinedReport(CombinedReport {
                    prediction: self
                        .prediction
                        .or_else(|| moon_phase.crypto_prediction.clone()),
                    moon_phase,
                    text: self.text.unwrap_or_default(),
                }),
                None => ChatPayload::text("Malformed combinedReport item: missing moonPhase"),
            },
            other => ChatPayload::text(format!("Unknown type: {}", other)),
        }
    }
}

fn fear_greed_payload(shape: ItemShape, dto: ChatResponseItemDto) -> ChatPayload {
    match shape {
        ItemShape::Extended => match dto.now {
            Some(now) => ChatPayload::FearGreed(FearGreedIndex {
                name: dto
                    .name
                    .unwrap_or_else(|| FEAR_GREED_DEFAULT_NAME.to_string()),
                now: now.into(),
                yesterday: dto.yesterday.map(FearGreedValue::from),
                last_week: dto.last_week.map(FearGreedValue::from),
            }),
            None => ChatPayload::text("Malformed fearGreed item: missing now"),
        },
        ItemShape::Legacy => ChatPayload::FearGreed(FearGreedIndex {
            name: FEAR_GREED_DEFAULT_NAME.to_string(),
            now: FearGreedValue {
                value: dto.value.unwrap_or(LEGACY_FEAR_GREED_VALUE),
                value_classification: dto
                    .label
                    .unwrap_or_else(|| LEGACY_FEAR_GREED_LABEL.to_string()),
                timestamp: dto
                    .ts
                    .unwrap_or_else(|| crate::domain::now_millis().timestamp_millis()),
                update_time: None,
            },
            yesterday: None,
            last_week: None,
        }),
    }
}

fn coin_payload(shape: ItemShape, dto: ChatResponseItemDto) -> ChatPayload {
    match shape {
        ItemShape::Extended => match dto.coin {
            Some(coin) => ChatPayload::Coin(Box::new(coin)),
            None => ChatPayload::text("Malformed coin item: missing coin"),
        },
        ItemShape::Legacy => {
            let symbol = dto.symbol.unwrap_or_default();
            ChatPayload::Coin(Box::new(CoinInfo {
                id: symbol.to_lowercase(),
                symbol,
                name: dto.name,
                description: dto.description,
                market_cap: dto.market_cap,
                price: dto.price,
                change_24h: dto.change_24h,
                ..Default::default()
            }))
        }
    }
}
