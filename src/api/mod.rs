//! HTTP clients for the two backends
//!
//! The crypto backend answers market questions and produces the summary;
//! the moon backend answers lunar questions and serves the current phase.
//! Both clients share the transport built by [`build_http_client`].

pub mod crypto;
pub mod dto;
pub mod moon;

pub use crypto::{CryptoApi, CryptoClient};
pub use moon::{MoonApi, MoonClient};

use crate::config::HttpConfig;
use crate::error::{CryptomoonError, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

/// Build the HTTP client shared by both backends
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized
pub fn build_http_client(config: &HttpConfig) -> Result<Client> {
    let client = Client::builder()
        .connect_timeout(config.connect_timeout())
        .timeout(config.request_timeout())
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| CryptomoonError::Network(format!("Failed to create HTTP client: {}", e)))?;
    Ok(client)
}

/// Join a base URL and an absolute endpoint path
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Check the status and decode a JSON body
///
/// Non-success statuses become [`CryptomoonError::Network`] carrying the
/// status and body text; undecodable bodies become
/// [`CryptomoonError::Deserialization`].
pub(crate) async fn decode_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        tracing::error!("{} request failed: {} - {}", what, status, error_text);
        return Err(CryptomoonError::Network(format!(
            "{} request failed with status {}: {}",
            what, status, error_text
        ))
        .into());
    }

    let body = response.text().await.map_err(|e| {
        CryptomoonError::Network(format!("Failed to read {} response: {}", what, e))
    })?;

    serde_json::from_str(&body).map_err(|e| {
        tracing::error!("Failed to parse {} response: {}", what, e);
        CryptomoonError::Deserialization(format!("Failed to parse {} response: {}", what, e))
            .into()
    })
}

/// Map a transport-level failure
pub(crate) fn transport_error(what: &str, err: reqwest::Error) -> anyhow::Error {
    tracing::error!("{} request failed: {}", what, err);
    CryptomoonError::Network(format!("{} request failed: {}", what, err)).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        assert_eq!(
            endpoint("http://localhost:8080/", "/tools"),
            "http://localhost:8080/tools"
        );
        assert_eq!(
            endpoint("http://localhost:8080/api", "/summary"),
            "http://localhost:8080/api/summary"
        );
    }

    #[test]
    fn test_build_http_client_with_defaults() {
        let client = build_http_client(&HttpConfig::default());
        assert!(client.is_ok());
    }
}
