//! Canned-response transport for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use url::Url;

use crate::remote::transport::{Page, Transport, TransportError};

/// Serves pages by exact URL; unknown URLs answer 404.
#[derive(Default)]
pub struct MockTransport {
    pages: HashMap<String, Result<Page, TransportError>>,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, status: u16, body: &str) -> Self {
        self.pages.insert(url.to_string(), Ok(Page::new(status, body)));
        self
    }

    pub fn with_failure(mut self, url: &str, reason: &str) -> Self {
        self.pages
            .insert(url.to_string(), Err(TransportError(reason.to_string())));
        self
    }

    /// URLs requested so far, in request order.
    pub fn requested(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &Url) -> Result<Page, TransportError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        self.pages
            .get(url.as_str())
            .cloned()
            .unwrap_or_else(|| Ok(Page::new(404, "Not Found")))
    }
}
