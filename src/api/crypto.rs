//! Crypto backend client
//!
//! Endpoints: `GET /tools`, `POST /chat`, `GET /summary`. Chat and summary
//! both answer with a list of typed response items.

use crate::api::dto::{ChatContextDto, ChatRequestDto, ChatResponseDto, ToolsResponseDto};
use crate::api::{decode_json, endpoint, transport_error};
use crate::error::Result;

use async_trait::async_trait;
use reqwest::Client;

/// Operations offered by the crypto backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CryptoApi: Send + Sync {
    /// Fetch tool descriptors
    async fn get_tools(&self) -> Result<ToolsResponseDto>;

    /// Send a free-text message
    async fn send_message(&self, message: &str) -> Result<ChatResponseDto>;

    /// Fetch the market summary
    async fn get_summary(&self) -> Result<ChatResponseDto>;
}

/// HTTP implementation of [`CryptoApi`]
///
/// # Examples
///
/// ```no_run
/// use cryptomoon::api::{build_http_client, CryptoApi, CryptoClient};
/// use cryptomoon::api::dto::ChatContextDto;
/// use cryptomoon::config::HttpConfig;
///
/// # async fn example() -> cryptomoon::error::Result<()> {
/// let http = build_http_client(&HttpConfig::default())?;
/// let client = CryptoClient::new(http, "http://localhost:8080", ChatContextDto::default());
/// let summary = client.get_summary().await?;
/// println!("{} items", summary.items.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CryptoClient {
    client: Client,
    base_url: String,
    context: ChatContextDto,
}

impl CryptoClient {
    pub fn new(client: Client, base_url: impl Into<String>, context: ChatContextDto) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            context,
        }
    }
}

#[async_trait]
impl CryptoApi for CryptoClient {
    async fn get_tools(&self) -> Result<ToolsResponseDto> {
        let url = endpoint(&self.base_url, "/tools");
        tracing::debug!("Fetching crypto tools from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error("Crypto tools", e))?;
        let tools: ToolsResponseDto = decode_json(response, "Crypto tools").await?;

        tracing::debug!("Crypto tools received: {} tools", tools.tools.len());
        Ok(tools)
    }

    async fn send_message(&self, message: &str) -> Result<ChatResponseDto> {
        let url = endpoint(&self.base_url, "/chat");
        tracing::debug!("Sending message to crypto backend: {}", message);

        let request = ChatRequestDto {
            message: message.to_string(),
            context: self.context.clone(),
        };
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error("Crypto chat", e))?;
        let chat: ChatResponseDto = decode_json(response, "Crypto chat").await?;

        tracing::debug!("Received {} response items", chat.items.len());
        Ok(chat)
    }

    async fn get_summary(&self) -> Result<ChatResponseDto> {
        let url = endpoint(&self.base_url, "/summary");
        tracing::debug!("Fetching summary from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error("Crypto summary", e))?;
        let summary: ChatResponseDto = decode_json(response, "Crypto summary").await?;

        tracing::debug!("Received {} summary items", summary.items.len());
        Ok(summary)
    }
}
