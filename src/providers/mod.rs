//! Repository providers.
//!
//! A provider turns a repository URL into a `RepositoryWalker`. The registry
//! maps provider names and URL predicates to constructors; adding a hosting
//! service means registering one more `Provider`, dispatch stays untouched.
//!
//! - `github_html`: scrapes github.com directory pages (`github`)
//! - `github_api`: reads the GitHub contents API (`github-api`)

pub mod github_api;
pub mod github_html;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::error::{Result, WalkError};
use crate::models::WalkSummary;
use crate::remote::Transport;
use crate::walk::WalkOptions;
use crate::wordlist::EntrySink;

/// Runs a full job: connectivity check, branch resolution, tree walk.
#[async_trait]
pub trait RepositoryWalker: Send + Sync {
    fn name(&self) -> &'static str;

    async fn walk(&self, sink: &mut dyn EntrySink) -> Result<WalkSummary>;
}

#[derive(Debug, Clone)]
pub struct WalkTarget {
    pub url: Url,
    /// Branch or other reference; skips resolution when set.
    pub reference: Option<String>,
    pub api_base: Url,
    pub options: WalkOptions,
}

impl WalkTarget {
    pub fn new(url: Url, api_base: Url) -> Self {
        Self {
            url,
            reference: None,
            api_base,
            options: WalkOptions::default(),
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

pub type WalkerConstructor =
    fn(WalkTarget, Arc<dyn Transport>) -> Result<Box<dyn RepositoryWalker>>;

#[derive(Clone, Copy)]
pub struct Provider {
    pub name: &'static str,
    pub description: &'static str,
    pub matches: fn(&Url) -> bool,
    pub construct: WalkerConstructor,
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

pub struct ProviderRegistry {
    providers: Vec<Provider>,
}

impl ProviderRegistry {
    pub fn empty() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    pub fn register(&mut self, provider: Provider) -> &mut Self {
        self.providers.push(provider);
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name).collect()
    }

    /// The preferred provider if given, otherwise the first one matching `url`.
    pub fn select(&self, url: &Url, preferred: Option<&str>) -> Result<&Provider> {
        match preferred {
            Some(name) => {
                let provider = self
                    .providers
                    .iter()
                    .find(|p| p.name == name)
                    .ok_or_else(|| WalkError::UnsupportedProvider(format!("{} (unknown provider '{}')", url, name)))?;
                if (provider.matches)(url) {
                    Ok(provider)
                } else {
                    Err(WalkError::UnsupportedProvider(format!("{} with provider '{}'", url, name)))
                }
            }
            None => self
                .providers
                .iter()
                .find(|p| (p.matches)(url))
                .ok_or_else(|| WalkError::UnsupportedProvider(url.to_string())),
        }
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register(github_html::PROVIDER)
            .register(github_api::PROVIDER);
        registry
    }
}

fn is_web_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

pub(crate) fn is_github_web(url: &Url) -> bool {
    is_web_scheme(url)
        && url
            .host_str()
            .is_some_and(|h| h.eq_ignore_ascii_case("github.com") || h.eq_ignore_ascii_case("www.github.com"))
}
