//! Moon-phase backend client
//!
//! Endpoints: `GET /moonphase/current`, `GET /tools`, `POST /chat`. The
//! chat endpoint answers with a bare moon phase, which this client wraps
//! into a one-item response list so callers see the same shape as the
//! crypto backend.

use crate::api::dto::{
    ChatContextDto, ChatRequestDto, ChatResponseDto, ChatResponseItemDto, ToolsResponseDto,
};
use crate::api::{decode_json, endpoint, transport_error};
use crate::domain::{now_millis, MoonPhase};
use crate::error::Result;

use async_trait::async_trait;
use reqwest::Client;

/// Operations offered by the moon backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MoonApi: Send + Sync {
    /// Fetch the current lunar phase
    async fn current_moon_phase(&self) -> Result<MoonPhase>;

    /// Fetch tool descriptors
    async fn get_tools(&self) -> Result<ToolsResponseDto>;

    /// Send a free-text message; the answer is a single `moonPhase` item
    async fn send_message(&self, message: &str) -> Result<ChatResponseDto>;
}

/// HTTP implementation of [`MoonApi`]
#[derive(Debug, Clone)]
pub struct MoonClient {
    client: Client,
    base_url: String,
    context: ChatContextDto,
}

impl MoonClient {
    pub fn new(client: Client, base_url: impl Into<String>, context: ChatContextDto) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            context,
        }
    }
}

#[async_trait]
impl MoonApi for MoonClient {
    async fn current_moon_phase(&self) -> Result<MoonPhase> {
        let url = endpoint(&self.base_url, "/moonphase/current");
        tracing::debug!("Fetching current moon phase from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error("Moon phase", e))?;
        let phase: MoonPhase = decode_json(response, "Moon phase").await?;

        tracing::debug!("Moon phase received: {} {}", phase.phase, phase.phase_emoji);
        Ok(phase)
    }

    async fn get_tools(&self) -> Result<ToolsResponseDto> {
        let url = endpoint(&self.base_url, "/tools");
        tracing::debug!("Fetching moon tools from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error("Moon tools", e))?;
        let tools: ToolsResponseDto = decode_json(response, "Moon tools").await?;

        tracing::debug!("Moon tools received: {} tools", tools.tools.len());
        Ok(tools)
    }

    async fn send_message(&self, message: &str) -> Result<ChatResponseDto> {
        let url = endpoint(&self.base_url, "/chat");
        tracing::debug!("Sending message to moon backend: {}", message);

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
            .map_err(|e| transport_error("Moon chat", e))?;
        let phase: MoonPhase = decode_json(response, "Moon chat").await?;

        tracing::debug!("Moon phase received from chat: {}", phase.phase);
        Ok(ChatResponseDto {
            items: vec![ChatResponseItemDto::moon_phase(
                phase,
                now_millis().timestamp_millis(),
            )],
        })
    }
}
