//! Chat payload variants
//!
//! Every chat item carries exactly one [`ChatPayload`]. The variant set is
//! closed; the `type` field selects the shape both on disk and in memory.

use serde::{Deserialize, Serialize};

/// Content of a chat entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChatPayload {
    /// Plain text, also used for inline error messages
    Text { text: String },

    /// Price board for a list of coins quoted in `base`
    Prices { base: String, coins: Vec<CoinPrice> },

    /// Fear and greed sentiment gauge
    FearGreed(FearGreedIndex),

    /// News headlines
    News { items: Vec<NewsItem> },

    /// Extended coin metadata
    Coin(Box<CoinInfo>),

    /// Lunar phase details with an optional market prediction
    MoonPhase(MoonPhase),

    /// Moon phase, free text and prediction bundled in one report
    CombinedReport(CombinedReport),
}

impl ChatPayload {
    /// Build a text payload
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Short variant name, used in logs and status output
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Prices { .. } => "prices",
            Self::FearGreed(_) => "fearGreed",
            Self::News { .. } => "news",
            Self::Coin(_) => "coin",
            Self::MoonPhase(_) => "moonPhase",
            Self::CombinedReport(_) => "combinedReport",
        }
    }

    /// Text content when this is a text payload
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// One coin quote on a price board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinPrice {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub change_1h_pct: Option<f64>,
    #[serde(default)]
    pub change_1h_abs: Option<f64>,
}

impl CoinPrice {
    /// Upper-cased ticker
    pub fn display_symbol(&self) -> String {
        self.symbol.to_uppercase()
    }

    /// Human name, falling back to the ticker
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.symbol)
    }
}

/// Default gauge title
pub const FEAR_GREED_DEFAULT_NAME: &str = "Fear and Greed Index";

/// Sentiment gauge with optional history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FearGreedIndex {
    #[serde(default = "default_fear_greed_name")]
    pub name: String,
    pub now: FearGreedValue,
    #[serde(default)]
    pub yesterday: Option<FearGreedValue>,
    #[serde(default)]
    pub last_week: Option<FearGreedValue>,
}

fn default_fear_greed_name() -> String {
    FEAR_GREED_DEFAULT_NAME.to_string()
}

/// A single sentiment reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FearGreedValue {
    pub value: i32,
    pub value_classification: String,
    /// Reading time in epoch milliseconds
    pub timestamp: i64,
    #[serde(default)]
    pub update_time: Option<String>,
}

/// A news headline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    #[serde(default)]
    pub source: Option<String>,
    /// Publication time in epoch milliseconds
    pub time: i64,
    #[serde(default)]
    pub url: Option<String>,
}

/// Contract deployment of a token on one chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAddress {
    pub blockchain: String,
    pub contract_address: String,
}

/// Extended coin metadata
///
/// Every field besides `id` and `symbol` is optional: the legacy shape
/// only fills `name`, `description`, `price`, `market_cap` and `change_24h`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinInfo {
    pub id: String,
    #[serde(default)]
    pub icon: Option<String>,
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub price_btc: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub available_supply: Option<f64>,
    #[serde(default)]
    pub total_supply: Option<f64>,
    #[serde(default)]
    pub fully_diluted_valuation: Option<f64>,
    #[serde(default)]
    pub price_change_1h: Option<f64>,
    #[serde(default)]
    pub price_change_1d: Option<f64>,
    #[serde(default)]
    pub price_change_1w: Option<f64>,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub reddit_url: Option<String>,
    #[serde(default)]
    pub twitter_url: Option<String>,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub contract_addresses: Option<Vec<ContractAddress>>,
    #[serde(default)]
    pub decimals: Option<u32>,
    #[serde(default)]
    pub explorers: Option<Vec<String>>,
    #[serde(default)]
    pub liquidity_score: Option<f64>,
    #[serde(default)]
    pub volatility_score: Option<f64>,
    #[serde(default)]
    pub market_cap_score: Option<f64>,
    #[serde(default)]
    pub risk_score: Option<f64>,
    #[serde(default)]
    pub avg_change: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub change_24h: Option<f64>,
}

impl CoinInfo {
    /// Upper-cased ticker
    pub fn display_symbol(&self) -> String {
        self.symbol.to_uppercase()
    }

    /// Human name, falling back to the ticker
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.symbol)
    }

    /// Headline daily change; the legacy `change_24h` fills in when the
    /// extended 1d change is missing
    pub fn headline_change(&self) -> Option<f64> {
        self.price_change_1d.or(self.change_24h)
    }
}

/// Market outlook derived from a free-text trend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendOutlook {
    Bullish,
    Bearish,
    Neutral,
}

/// Moon-correlated market prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoPrediction {
    pub trend: String,
    pub confidence: String,
    pub reasoning: String,
    pub recommendation: String,
}

impl CryptoPrediction {
    /// Classify the free-text trend
    pub fn outlook(&self) -> TrendOutlook {
        let trend = self.trend.to_lowercase();
        if trend.contains("bull") || trend.contains("positive") {
            TrendOutlook::Bullish
        } else if trend.contains("bear") || trend.contains("negative") {
            TrendOutlook::Bearish
        } else {
            TrendOutlook::Neutral
        }
    }
}

/// Lunar phase details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoonPhase {
    pub phase: String,
    pub phase_emoji: String,
    pub waxing: bool,
    pub waning: bool,
    pub lunar_age: f64,
    pub lunar_age_percent: f64,
    pub lunation_number: i64,
    pub lunar_distance: f64,
    #[serde(default)]
    pub next_full_moon: Option<String>,
    #[serde(default)]
    pub last_full_moon: Option<String>,
    #[serde(default)]
    pub crypto_prediction: Option<CryptoPrediction>,
}

impl MoonPhase {
    /// Direction of the lunar cycle
    pub fn direction_label(&self) -> &'static str {
        if self.waxing {
            "Waxing moon"
        } else if self.waning {
            "Waning moon"
        } else {
            "Neutral"
        }
    }
}

/// Moon phase bundled with free text and a prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedReport {
    pub moon_phase: MoonPhase,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub prediction: Option<CryptoPrediction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(trend: &str) -> CryptoPrediction {
        CryptoPrediction {
            trend: trend.to_string(),
            confidence: "medium".to_string(),
            reasoning: "r".to_string(),
            recommendation: "h".to_string(),
        }
    }

    #[test]
    fn test_payload_serializes_with_type_tag() {
        let payload = ChatPayload::text("hello");
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["text"], "hello");
    }

    #[test]
    fn test_fear_greed_payload_uses_camel_case_fields() {
        let payload = ChatPayload::FearGreed(FearGreedIndex {
            name: FEAR_GREED_DEFAULT_NAME.to_string(),
            now: FearGreedValue {
                value: 71,
                value_classification: "Greed".to_string(),
                timestamp: 1_700_000_000_000,
                update_time: None,
            },
            yesterday: None,
            last_week: None,
        });
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "fearGreed");
        assert_eq!(json["now"]["valueClassification"], "Greed");
        assert!(json.get("lastWeek").is_some());
    }

    #[test]
    fn test_coin_payload_reads_from_flat_tagged_object() {
        let json = r#"{"type":"coin","id":"bitcoin","symbol":"btc","priceChange1h":0.5,"change24h":-1.2}"#;
        let payload: ChatPayload = serde_json::from_str(json).unwrap();
        match payload {
            ChatPayload::Coin(coin) => {
                assert_eq!(coin.display_symbol(), "BTC");
                assert_eq!(coin.display_name(), "btc");
                assert_eq!(coin.price_change_1h, Some(0.5));
                assert_eq!(coin.headline_change(), Some(-1.2));
            }
            other => panic!("expected coin payload, got {:?}", other),
        }
    }

    #[test]
    fn test_headline_change_prefers_extended_field() {
        let coin = CoinInfo {
            id: "eth".to_string(),
            symbol: "eth".to_string(),
            price_change_1d: Some(3.0),
            change_24h: Some(9.0),
            ..Default::default()
        };
        assert_eq!(coin.headline_change(), Some(3.0));
    }

    #[test]
    fn test_prediction_outlook_classification() {
        assert_eq!(prediction("Bullish").outlook(), TrendOutlook::Bullish);
        assert_eq!(prediction("slightly positive").outlook(), TrendOutlook::Bullish);
        assert_eq!(prediction("BEARISH").outlook(), TrendOutlook::Bearish);
        assert_eq!(prediction("sideways").outlook(), TrendOutlook::Neutral);
    }

    #[test]
    fn test_coin_price_display_name_fallback() {
        let quote = CoinPrice {
            symbol: "sol".to_string(),
            name: None,
            price: 150.0,
            change_1h_pct: None,
            change_1h_abs: None,
        };
        assert_eq!(quote.display_name(), "sol");
        assert_eq!(quote.display_symbol(), "SOL");
    }
}
