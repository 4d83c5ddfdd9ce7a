//! HTTP transport.
//!
//! A `Transport` performs a single GET and hands back the status code and
//! body. Only a failure to obtain any response is an error here; 404s,
//! rate limits and the like are judged by the caller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use thiserror::Error;
use url::Url;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct Page {
    pub status: u16,
    pub body: String,
}

impl Page {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

#[derive(Error, Debug, Clone)]
#[error("{0}")]
pub struct TransportError(pub String);

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> std::result::Result<Page, TransportError>;
}

#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub timeout: Duration,
    pub user_agent: String,
    /// Sent as `Authorization: Bearer <token>` on every request.
    pub token: Option<String>,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("g2w/", env!("CARGO_PKG_VERSION")).to_string(),
            token: None,
        }
    }
}

/// Connection-reusing client shared by every request of a walk.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(settings: &TransportSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = settings.token.as_deref().filter(|t| !t.is_empty()) {
            if let Ok(mut value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            } else {
                tracing::warn!("[!] Ignoring token: not a valid header value");
            }
        }

        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> std::result::Result<Page, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(format!("failed to read body: {}", e)))?;
        Ok(Page::new(status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_identify_the_tool() {
        let settings = TransportSettings::default();
        assert!(settings.user_agent.starts_with("g2w/"));
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert!(settings.token.is_none());
    }

    #[test]
    fn builds_with_and_without_token() {
        assert!(HttpTransport::new(&TransportSettings::default()).is_ok());
        let settings = TransportSettings {
            token: Some("ghp_example".into()),
            ..TransportSettings::default()
        };
        assert!(HttpTransport::new(&settings).is_ok());
    }

    #[test]
    fn only_200_counts_as_ok() {
        assert!(Page::new(200, "").is_ok());
        assert!(!Page::new(204, "").is_ok());
        assert!(!Page::new(404, "").is_ok());
    }
}
