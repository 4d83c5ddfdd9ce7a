//! GitHub contents-API DTOs.
//!
//! `GET /repos/{owner}/{repo}/contents/{path}` answers a JSON array of
//! `ContentItem` for directories. Error responses carry an `ApiErrorBody`.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ContentItem {
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    /// Repository-relative path, e.g. `src/lib.rs`.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(rename = "_links", default)]
    pub links: Option<ContentLinks>,
}

impl ContentItem {
    pub fn is_dir(&self) -> bool {
        self.item_type == "dir"
    }

    /// Link to this item's own listing: `_links.self`, then `url`.
    pub fn self_link(&self) -> Option<&str> {
        self.links
            .as_ref()
            .and_then(|l| l.self_link.as_deref())
            .or(self.url.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentLinks {
    #[serde(rename = "self", default)]
    pub self_link: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
}
