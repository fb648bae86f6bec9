//! Chat repository
//!
//! Combines the two backend clients with the local cache: routes free-text
//! messages, collects tools from both backends, serves the moon phase
//! through a daily cache and assembles the combined summary.

use crate::api::{build_http_client, CryptoApi, CryptoClient, MoonApi, MoonClient};
use crate::api::dto::ChatContextDto;
use crate::config::Config;
use crate::domain::{ChatItem, ChatPayload, ChatRole, MoonPhase, ToolItem, ToolSource};
use crate::error::{CryptomoonError, Result};
use crate::report::build_market_report;
use crate::router::{detect_backend, BackendKind};
use crate::storage::CacheStore;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Operations the session and commands rely on
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Route a message to the matching backend and return its answer
    async fn send_message(&self, message: &str) -> Result<Vec<ChatItem>>;

    /// Fetch moon phase and market summary concurrently and merge them
    async fn summary(&self) -> Result<Vec<ChatItem>>;

    /// Tools offered by the crypto backend
    async fn crypto_tools(&self) -> Result<Vec<ToolItem>>;

    /// Tools offered by the moon backend
    async fn moon_tools(&self) -> Result<Vec<ToolItem>>;

    /// Tools from both backends; a failing side contributes nothing
    async fn all_tools(&self) -> Result<Vec<ToolItem>>;

    /// Current moon phase, served from the daily cache when fresh
    async fn current_moon_phase(&self) -> Result<MoonPhase>;

    /// Persist the transcript
    async fn save_messages(&self, items: Vec<ChatItem>) -> Result<()>;

    /// Restore the transcript
    async fn load_messages(&self) -> Result<Vec<ChatItem>>;

    /// Delete the saved transcript
    async fn clear_messages(&self) -> Result<()>;
}

/// Default [`ChatRepository`] backed by HTTP clients and a [`CacheStore`]
#[derive(Clone)]
pub struct Repository {
    crypto: Arc<dyn CryptoApi>,
    moon: Arc<dyn MoonApi>,
    cache: CacheStore,
    moon_refresh: Arc<Mutex<()>>,
    transcript_limit: usize,
    moon_ttl: Duration,
}

impl Repository {
    pub fn new(
        crypto: Arc<dyn CryptoApi>,
        moon: Arc<dyn MoonApi>,
        cache: CacheStore,
        transcript_limit: usize,
        moon_ttl: Duration,
    ) -> Self {
        Self {
            crypto,
            moon,
            cache,
            moon_refresh: Arc::new(Mutex::new(())),
            transcript_limit,
            moon_ttl,
        }
    }

    /// Wire HTTP clients and the cache store from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the cache
    /// directory cannot be created
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = build_http_client(&config.http)?;
        let context = ChatContextDto {
            locale: config.chat.locale.clone(),
            timezone: config.chat.timezone.clone(),
        };
        let crypto = CryptoClient::new(
            http.clone(),
            config.backends.crypto.base_url.clone(),
            context.clone(),
        );
        let moon = MoonClient::new(http, config.backends.moon.base_url.clone(), context);
        let cache = CacheStore::new(&config.cache)?;
        tracing::debug!("Cache directory: {}", cache.dir().display());

        Ok(Self::new(
            Arc::new(crypto),
            Arc::new(moon),
            cache,
            config.cache.transcript_limit,
            config.cache.moon_ttl()?,
        ))
    }

    /// Underlying cache store
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    async fn cached_moon_phase(&self) -> Option<MoonPhase> {
        let cache = self.cache.clone();
        let ttl = self.moon_ttl;
        let loaded = run_blocking(move || cache.require_moon_phase()).await;

        match loaded {
            Ok(record) if record.is_valid_at(Utc::now(), ttl) => {
                tracing::debug!("Using cached moon phase: {}", record.moon_phase.phase);
                Some(record.moon_phase)
            }
            Ok(_) => {
                tracing::debug!("Moon phase cache expired");
                None
            }
            Err(e) => {
                if let Some(CryptomoonError::NoData(_)) = e.downcast_ref::<CryptomoonError>() {
                    tracing::debug!("Moon phase cache empty or missing");
                } else {
                    tracing::error!("Failed to load moon phase cache, fetching from API: {}", e);
                }
                None
            }
        }
    }

    async fn fetch_and_cache_moon_phase(&self) -> Result<MoonPhase> {
        let moon_phase = self.moon.current_moon_phase().await?;

        let cache = self.cache.clone();
        let to_store = moon_phase.clone();
        if let Err(e) = run_blocking(move || cache.save_moon_phase(&to_store)).await {
            tracing::error!("Failed to save moon phase to cache: {}", e);
        }

        Ok(moon_phase)
    }
}

#[async_trait]
impl ChatRepository for Repository {
    async fn send_message(&self, message: &str) -> Result<Vec<ChatItem>> {
        let backend = detect_backend(message);
        tracing::debug!(backend = %backend, "Routing message");

        let response = match backend {
            BackendKind::Moon => self.moon.send_message(message).await?,
            BackendKind::Crypto => self.crypto.send_message(message).await?,
        };
        Ok(response.into_domain())
    }

    async fn summary(&self) -> Result<Vec<ChatItem>> {
        tracing::debug!("Starting combined summary fetch");

        let moon_repo = self.clone();
        let moon_task = tokio::spawn(async move { moon_repo.current_moon_phase().await });

        let crypto = Arc::clone(&self.crypto);
        let crypto_task = tokio::spawn(async move {
            crypto
                .get_summary()
                .await
                .map(|response| response.into_domain())
        });

        let (moon_result, crypto_result) = tokio::join!(moon_task, crypto_task);
        let moon_result = moon_result.map_err(|e| {
            tracing::error!("Moon phase task failed: {}", e);
            CryptomoonError::Task(format!("Failed to fetch combined summary: {}", e))
        })?;
        let crypto_result = crypto_result.map_err(|e| {
            tracing::error!("Crypto summary task failed: {}", e);
            CryptomoonError::Task(format!("Failed to fetch combined summary: {}", e))
        })?;

        let items = merge_summary(moon_result, crypto_result);
        tracing::debug!("Combined summary completed with {} items", items.len());
        Ok(items)
    }

    async fn crypto_tools(&self) -> Result<Vec<ToolItem>> {
        let tools = self.crypto.get_tools().await?;
        Ok(tools.into_domain(ToolSource::Crypto))
    }

    async fn moon_tools(&self) -> Result<Vec<ToolItem>> {
        let tools = self.moon.get_tools().await?;
        Ok(tools.into_domain(ToolSource::Moon))
    }

    async fn all_tools(&self) -> Result<Vec<ToolItem>> {
        let (crypto, moon) = tokio::join!(self.crypto_tools(), self.moon_tools());

        let crypto = crypto.unwrap_or_else(|e| {
            tracing::warn!("Crypto tools unavailable: {}", e);
            Vec::new()
        });
        let moon = moon.unwrap_or_else(|e| {
            tracing::warn!("Moon tools unavailable: {}", e);
            Vec::new()
        });

        tracing::debug!(
            "Loaded {} crypto tools and {} moon tools",
            crypto.len(),
            moon.len()
        );
        Ok(crypto.into_iter().chain(moon).collect())
    }

    async fn current_moon_phase(&self) -> Result<MoonPhase> {
        if let Some(moon_phase) = self.cached_moon_phase().await {
            return Ok(moon_phase);
        }

        // One fetch per process; late callers reuse what the first one cached.
        let _guard = self.moon_refresh.lock().await;
        if let Some(moon_phase) = self.cached_moon_phase().await {
            return Ok(moon_phase);
        }

        tracing::debug!("Fetching moon phase from API");
        self.fetch_and_cache_moon_phase().await
    }

    async fn save_messages(&self, items: Vec<ChatItem>) -> Result<()> {
        let cache = self.cache.clone();
        let limit = self.transcript_limit;
        run_blocking(move || cache.save_transcript(&items, limit)).await
    }

    async fn load_messages(&self) -> Result<Vec<ChatItem>> {
        let cache = self.cache.clone();
        let record = run_blocking(move || cache.load_transcript()).await?;
        Ok(record.items)
    }

    async fn clear_messages(&self) -> Result<()> {
        let cache = self.cache.clone();
        run_blocking(move || cache.clear_transcript()).await
    }
}

/// Merge the two summary branches into display order
///
/// The moon phase (or its error) comes first, then the market items (or
/// their error). A market report is appended only when both branches
/// succeeded and the moon phase carries a prediction.
pub fn merge_summary(
    moon: Result<MoonPhase>,
    crypto: Result<Vec<ChatItem>>,
) -> Vec<ChatItem> {
    let mut items = Vec::new();

    let moon_phase = match moon {
        Ok(moon_phase) => {
            tracing::debug!("Moon phase received: {}", moon_phase.phase);
            items.push(ChatItem::assistant(ChatPayload::MoonPhase(
                moon_phase.clone(),
            )));
            Some(moon_phase)
        }
        Err(e) => {
            tracing::error!("Failed to fetch moon phase: {}", e);
            items.push(ChatItem::system_text(format!(
                "⚠️ Failed to load moon phase: {}",
                e
            )));
            None
        }
    };

    let crypto_ok = match crypto {
        Ok(summary) => {
            tracing::debug!("Crypto summary received: {} items", summary.len());
            items.extend(summary);
            true
        }
        Err(e) => {
            tracing::error!("Failed to fetch crypto summary: {}", e);
            items.push(ChatItem::system_text(format!(
                "⚠️ Failed to load crypto data: {}",
                e
            )));
            false
        }
    };

    if crypto_ok {
        if let Some(moon_phase) = &moon_phase {
            if let Some(prediction) = &moon_phase.crypto_prediction {
                items.push(ChatItem::assistant(ChatPayload::text(build_market_report(
                    moon_phase, prediction,
                ))));
            }
        }
    }

    items
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CryptomoonError::Task(format!("Blocking cache task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::crypto::MockCryptoApi;
    use crate::api::dto::{ChatResponseDto, ChatResponseItemDto, ToolItemDto, ToolsResponseDto};
    use crate::api::moon::MockMoonApi;
    use crate::domain::CryptoPrediction;
    use tempfile::TempDir;

    fn moon_phase(prediction: bool) -> MoonPhase {
        MoonPhase {
            phase: "Waning Crescent".to_string(),
            phase_emoji: "🌘".to_string(),
            waxing: false,
            waning: true,
            lunar_age: 26.1,
            lunar_age_percent: 88.4,
            lunation_number: 1263,
            lunar_distance: 402_000.0,
            next_full_moon: Some("2026-11-24T14:53:00Z".to_string()),
            last_full_moon: None,
            crypto_prediction: prediction.then(|| CryptoPrediction {
                trend: "bearish".to_string(),
                confidence: "low".to_string(),
                reasoning: "Waning phases trail volume.".to_string(),
                recommendation: "Wait.".to_string(),
            }),
        }
    }

    fn text_response(text: &str) -> ChatResponseDto {
        ChatResponseDto {
            items: vec![ChatResponseItemDto {
                item_type: "text".to_string(),
                text: Some(text.to_string()),
                ..Default::default()
            }],
        }
    }

    fn tools(ids: &[&str]) -> ToolsResponseDto {
        ToolsResponseDto {
            tools: ids
                .iter()
                .map(|id| ToolItemDto {
                    id: id.to_string(),
                    title: id.to_uppercase(),
                    description: String::new(),
                    sample_query: format!("{} please", id),
                })
                .collect(),
        }
    }

    fn repository(crypto: MockCryptoApi, moon: MockMoonApi) -> (Repository, TempDir) {
        let dir = TempDir::new().unwrap();
        let cache = CacheStore::new_with_path(dir.path()).unwrap();
        let repo = Repository::new(
            Arc::new(crypto),
            Arc::new(moon),
            cache,
            500,
            Duration::hours(24),
        );
        (repo, dir)
    }

    #[test]
    fn test_merge_summary_both_ok_with_prediction() {
        let summary = vec![ChatItem::assistant(ChatPayload::text("prices"))];
        let items = merge_summary(Ok(moon_phase(true)), Ok(summary));

        assert_eq!(items.len(), 3);
        assert!(matches!(items[0].payload, ChatPayload::MoonPhase(_)));
        assert_eq!(items[0].role, ChatRole::Assistant);
        assert_eq!(items[1].payload, ChatPayload::text("prices"));
        let report = items[2].payload.as_text().unwrap();
        assert!(report.starts_with("📊 **MARKET ANALYSIS COMPLETE**"));
        assert!(report.contains("BEARISH"));
    }

    #[test]
    fn test_merge_summary_without_prediction_has_no_report() {
        let summary = vec![
            ChatItem::assistant(ChatPayload::text("a")),
            ChatItem::assistant(ChatPayload::text("b")),
        ];
        let items = merge_summary(Ok(moon_phase(false)), Ok(summary));
        assert_eq!(items.len(), 3);
        assert_eq!(items[2].payload, ChatPayload::text("b"));
    }

    #[test]
    fn test_merge_summary_crypto_failure_skips_report() {
        let items = merge_summary(
            Ok(moon_phase(true)),
            Err(CryptomoonError::Network("503".to_string()).into()),
        );
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0].payload, ChatPayload::MoonPhase(_)));
        assert_eq!(items[1].role, ChatRole::System);
        assert_eq!(
            items[1].payload.as_text().unwrap(),
            "⚠️ Failed to load crypto data: Network error: 503"
        );
    }

    #[test]
    fn test_merge_summary_moon_failure_comes_first() {
        let summary = vec![ChatItem::assistant(ChatPayload::text("prices"))];
        let items = merge_summary(
            Err(CryptomoonError::Network("timeout".to_string()).into()),
            Ok(summary),
        );
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].role, ChatRole::System);
        assert!(items[0]
            .payload
            .as_text()
            .unwrap()
            .starts_with("⚠️ Failed to load moon phase"));
        assert_eq!(items[1].payload, ChatPayload::text("prices"));
    }

    #[tokio::test]
    async fn test_send_message_routes_moon_keywords() {
        let mut crypto = MockCryptoApi::new();
        crypto.expect_send_message().times(0);
        let mut moon = MockMoonApi::new();
        moon.expect_send_message().times(1).returning(|_| {
            Ok(ChatResponseDto {
                items: vec![ChatResponseItemDto::moon_phase(moon_phase(false), 1)],
            })
        });

        let (repo, _dir) = repository(crypto, moon);
        let items = repo.send_message("Какая фаза луны?").await.unwrap();
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0].payload, ChatPayload::MoonPhase(_)));
    }

    #[tokio::test]
    async fn test_send_message_routes_other_text_to_crypto() {
        let mut crypto = MockCryptoApi::new();
        crypto
            .expect_send_message()
            .times(1)
            .returning(|_| Ok(text_response("BTC is 65k")));
        let mut moon = MockMoonApi::new();
        moon.expect_send_message().times(0);

        let (repo, _dir) = repository(crypto, moon);
        let items = repo.send_message("btc price").await.unwrap();
        assert_eq!(items[0].payload, ChatPayload::text("BTC is 65k"));
    }

    #[tokio::test]
    async fn test_send_message_propagates_backend_error() {
        let mut crypto = MockCryptoApi::new();
        crypto
            .expect_send_message()
            .returning(|_| Err(CryptomoonError::Network("down".to_string()).into()));
        let (repo, _dir) = repository(crypto, MockMoonApi::new());
        assert!(repo.send_message("eth").await.is_err());
    }

    #[tokio::test]
    async fn test_all_tools_degrades_failing_side_to_empty() {
        let mut crypto = MockCryptoApi::new();
        crypto
            .expect_get_tools()
            .returning(|| Ok(tools(&["prices", "news"])));
        let mut moon = MockMoonApi::new();
        moon.expect_get_tools()
            .returning(|| Err(CryptomoonError::Network("refused".to_string()).into()));

        let (repo, _dir) = repository(crypto, moon);
        let all = repo.all_tools().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|t| t.source == ToolSource::Crypto));
    }

    #[tokio::test]
    async fn test_all_tools_keeps_crypto_first() {
        let mut crypto = MockCryptoApi::new();
        crypto.expect_get_tools().returning(|| Ok(tools(&["prices"])));
        let mut moon = MockMoonApi::new();
        moon.expect_get_tools().returning(|| Ok(tools(&["phase"])));

        let (repo, _dir) = repository(crypto, moon);
        let all = repo.all_tools().await.unwrap();
        assert_eq!(all[0].source, ToolSource::Crypto);
        assert_eq!(all[1].source, ToolSource::Moon);
        assert_eq!(all[1].sample_query, "phase please");
    }

    #[tokio::test]
    async fn test_current_moon_phase_uses_fresh_cache() {
        let mut moon = MockMoonApi::new();
        moon.expect_current_moon_phase().times(0);
        let (repo, _dir) = repository(MockCryptoApi::new(), moon);
        repo.cache()
            .save_moon_phase_at(&moon_phase(false), Utc::now() - Duration::hours(2))
            .unwrap();

        let phase = repo.current_moon_phase().await.unwrap();
        assert_eq!(phase.phase, "Waning Crescent");
    }

    #[tokio::test]
    async fn test_current_moon_phase_refreshes_expired_cache() {
        let mut moon = MockMoonApi::new();
        moon.expect_current_moon_phase()
            .times(1)
            .returning(|| Ok(moon_phase(true)));
        let (repo, _dir) = repository(MockCryptoApi::new(), moon);
        repo.cache()
            .save_moon_phase_at(&moon_phase(false), Utc::now() - Duration::hours(30))
            .unwrap();

        let phase = repo.current_moon_phase().await.unwrap();
        assert!(phase.crypto_prediction.is_some());

        let record = repo.cache().load_moon_phase().unwrap().unwrap();
        assert!(record.is_valid_at(Utc::now(), Duration::hours(24)));
    }

    #[tokio::test]
    async fn test_current_moon_phase_corrupt_cache_falls_back_to_api() {
        let mut moon = MockMoonApi::new();
        moon.expect_current_moon_phase()
            .times(1)
            .returning(|| Ok(moon_phase(false)));
        let (repo, _dir) = repository(MockCryptoApi::new(), moon);
        std::fs::write(repo.cache().moon_phase_path(), "garbage").unwrap();

        let phase = repo.current_moon_phase().await.unwrap();
        assert_eq!(phase.phase, "Waning Crescent");

        let record = repo.cache().load_moon_phase().unwrap().unwrap();
        assert_eq!(record.moon_phase, phase);
    }

    #[tokio::test]
    async fn test_current_moon_phase_blank_cached_record_falls_back_to_api() {
        let mut moon = MockMoonApi::new();
        moon.expect_current_moon_phase()
            .times(1)
            .returning(|| Ok(moon_phase(false)));
        let (repo, _dir) = repository(MockCryptoApi::new(), moon);

        let mut blank = moon_phase(false);
        blank.phase = "  ".to_string();
        repo.cache().save_moon_phase(&blank).unwrap();

        let phase = repo.current_moon_phase().await.unwrap();
        assert_eq!(phase.phase, "Waning Crescent");
    }

    #[tokio::test]
    async fn test_current_moon_phase_survives_cache_write_failure() {
        let mut moon = MockMoonApi::new();
        moon.expect_current_moon_phase()
            .times(1)
            .returning(|| Ok(moon_phase(true)));
        let (repo, _dir) = repository(MockCryptoApi::new(), moon);
        std::fs::create_dir(repo.cache().moon_phase_path()).unwrap();

        let phase = repo.current_moon_phase().await.unwrap();
        assert!(phase.crypto_prediction.is_some());
        assert!(repo.cache().moon_phase_path().is_dir());
    }

    #[tokio::test]
    async fn test_concurrent_moon_refreshes_fetch_once() {
        let mut moon = MockMoonApi::new();
        moon.expect_current_moon_phase()
            .times(1)
            .returning(|| Ok(moon_phase(false)));
        let (repo, _dir) = repository(MockCryptoApi::new(), moon);

        let (a, b, c) = tokio::join!(
            repo.current_moon_phase(),
            repo.current_moon_phase(),
            repo.current_moon_phase()
        );
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
    }

    #[tokio::test]
    async fn test_transcript_round_trip_through_repository() {
        let (repo, _dir) = repository(MockCryptoApi::new(), MockMoonApi::new());
        let items = vec![
            ChatItem::user_text("hello"),
            ChatItem::system_text("❌ Error: boom"),
        ];
        repo.save_messages(items.clone()).await.unwrap();
        assert_eq!(repo.load_messages().await.unwrap(), items);

        repo.clear_messages().await.unwrap();
        assert!(repo.load_messages().await.unwrap().is_empty());
    }
}
