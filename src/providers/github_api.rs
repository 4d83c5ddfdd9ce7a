//! GitHub contents API.
//!
//! `GET /repos/{owner}/{repo}/contents/{path}[?ref=...]` lists a directory as
//! a JSON array; directories are followed through the `_links.self` link the
//! API hands out for them, so the reference sticks for the whole walk.
//!
//! No branch resolution request is needed: without a reference the API
//! serves the repository's default branch.
//!
//! Repository URLs are taken apart with a URL parser, not by stripping a
//! `https://github.com/` prefix. Host case, trailing slashes, query strings,
//! fragments and a `.git` suffix therefore make no difference.

use std::sync::Arc;

use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::{Result, WalkError};
use crate::models::{ApiErrorBody, ContentItem, EntryKind, ListedEntry, RepositoryEntry, WalkSummary};
use crate::providers::{Provider, RepositoryWalker, WalkTarget, is_github_web};
use crate::remote::{Page, Transport, ensure_reachable_with};
use crate::walk::{ListingSource, walk_tree};
use crate::wordlist::EntrySink;

pub const PROVIDER: Provider = Provider {
    name: "github-api",
    description: "GitHub contents API",
    matches: matches_url,
    construct: GithubApiWalker::construct,
};

pub const DEFAULT_API_BASE: &str = "https://api.github.com/";
const API_HOST: &str = "api.github.com";

fn matches_url(url: &Url) -> bool {
    is_github_web(url)
        || (url.scheme() == "https"
            && url.host_str().is_some_and(|h| h.eq_ignore_ascii_case(API_HOST)))
}

/// Where a walk starts inside a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCoordinates {
    pub owner: String,
    pub repo: String,
    pub reference: Option<String>,
    pub path: Vec<String>,
}

impl RepoCoordinates {
    /// Accepts `github.com/<owner>/<repo>[/tree/<ref>[/<path>..]]` and
    /// `api.github.com/repos/<owner>/<repo>[/contents/<path>..][?ref=<ref>]`.
    ///
    /// In the `tree` form only the first segment after `tree` is the
    /// reference; branch names containing `/` must be passed explicitly.
    pub fn from_url(url: &Url) -> Result<Self> {
        let invalid = |reason: &str| WalkError::InvalidRepositoryUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let segments: Vec<String> = url
            .path_segments()
            .map(|segments| {
                segments
                    .filter(|s| !s.is_empty())
                    .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();

        let is_api = url
            .host_str()
            .is_some_and(|h| h.eq_ignore_ascii_case(API_HOST));

        if is_api {
            return match segments.as_slice() {
                [repos, owner, repo, rest @ ..] if repos == "repos" => {
                    let path = match rest {
                        [] => Vec::new(),
                        [contents, path @ ..] if contents == "contents" => path.to_vec(),
                        _ => return Err(invalid("expected /repos/<owner>/<repo>/contents/...")),
                    };
                    let reference = url
                        .query_pairs()
                        .find(|(key, _)| key == "ref")
                        .map(|(_, value)| value.into_owned());
                    Ok(Self {
                        owner: owner.clone(),
                        repo: repo.clone(),
                        reference,
                        path,
                    })
                }
                _ => Err(invalid("expected /repos/<owner>/<repo>")),
            };
        }

        if !is_github_web(url) {
            return Err(invalid("not a GitHub URL"));
        }

        let (owner, repo, reference, path) = match segments.as_slice() {
            [owner, repo] => (owner, repo, None, Vec::new()),
            [owner, repo, tree, reference, path @ ..] if tree == "tree" => {
                (owner, repo, Some(reference.clone()), path.to_vec())
            }
            _ => {
                return Err(invalid(
                    "expected https://github.com/<owner>/<repo>[/tree/<ref>/<path>]",
                ));
            }
        };

        Ok(Self {
            owner: owner.clone(),
            repo: repo.strip_suffix(".git").unwrap_or(repo).to_string(),
            reference,
            path,
        })
    }

    pub fn repository_url(&self, api_base: &Url) -> Result<Url> {
        api_url(api_base, ["repos", self.owner.as_str(), self.repo.as_str()], None)
    }

    pub fn contents_url(&self, api_base: &Url, reference: Option<&str>) -> Result<Url> {
        let segments = ["repos", self.owner.as_str(), self.repo.as_str(), "contents"]
            .into_iter()
            .chain(self.path.iter().map(String::as_str));
        api_url(api_base, segments, reference)
    }
}

fn api_url<'a>(
    api_base: &Url,
    segments: impl IntoIterator<Item = &'a str>,
    reference: Option<&str>,
) -> Result<Url> {
    let mut url = api_base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|_| WalkError::InvalidRepositoryUrl {
            url: api_base.to_string(),
            reason: "API base cannot carry a path".into(),
        })?
        .pop_if_empty()
        .extend(segments);
    if let Some(reference) = reference {
        url.query_pairs_mut().append_pair("ref", reference);
    }
    Ok(url)
}

/// The API's throttling answer: 403 or 429 with a "rate limit" message.
pub fn rate_limit_message(page: &Page) -> Option<String> {
    if !matches!(page.status, 403 | 429) {
        return None;
    }
    let message = serde_json::from_str::<ApiErrorBody>(&page.body)
        .map(|body| body.message)
        .unwrap_or_else(|_| page.body.trim().to_string());
    message
        .to_ascii_lowercase()
        .contains("rate limit")
        .then_some(message)
}

pub fn parse_listing(body: &str, location: &Url) -> Result<Vec<ListedEntry>> {
    let items: Vec<ContentItem> =
        serde_json::from_str(body).map_err(|e| WalkError::MalformedListing {
            url: location.clone(),
            reason: format!("expected a JSON array of contents: {}", e),
        })?;

    Ok(items
        .into_iter()
        .map(|item| {
            let kind = if item.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            let reference = item
                .self_link()
                .and_then(|link| Url::parse(link).ok())
                .or_else(|| {
                    item.path
                        .as_deref()
                        .and_then(|path| contents_path(location, path))
                })
                .unwrap_or_else(|| nested(location, &item.name));
            ListedEntry::new(item.name, kind, reference)
        })
        .collect())
}

/// `.../repos/<owner>/<repo>/contents/<path>`, keeping `location`'s query.
fn contents_path(location: &Url, path: &str) -> Option<Url> {
    let segments: Vec<&str> = location.path_segments()?.collect();
    let repos = segments.iter().position(|s| *s == "repos")?;
    let contents = repos + 3;
    if segments.get(contents) != Some(&"contents") {
        return None;
    }

    let mut url = location.clone();
    {
        let mut parts = url.path_segments_mut().ok()?;
        for _ in contents + 1..segments.len() {
            parts.pop();
        }
        parts.extend(path.split('/').filter(|s| !s.is_empty()));
    }
    Some(url)
}

fn nested(location: &Url, name: &str) -> Url {
    let mut url = location.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(name);
    }
    url
}

pub struct GithubApiWalker {
    target: WalkTarget,
    coordinates: RepoCoordinates,
    transport: Arc<dyn Transport>,
}

impl GithubApiWalker {
    pub fn new(target: WalkTarget, transport: Arc<dyn Transport>) -> Result<Self> {
        let coordinates = RepoCoordinates::from_url(&target.url)?;
        Ok(Self {
            target,
            coordinates,
            transport,
        })
    }

    fn construct(
        target: WalkTarget,
        transport: Arc<dyn Transport>,
    ) -> Result<Box<dyn RepositoryWalker>> {
        Ok(Box::new(Self::new(target, transport)?))
    }

    /// The caller's reference wins over one embedded in the URL.
    pub fn reference(&self) -> Option<&str> {
        self.target
            .reference
            .as_deref()
            .or(self.coordinates.reference.as_deref())
    }
}

#[async_trait]
impl RepositoryWalker for GithubApiWalker {
    fn name(&self) -> &'static str {
        PROVIDER.name
    }

    async fn walk(&self, sink: &mut dyn EntrySink) -> Result<WalkSummary> {
        let api_base = &self.target.api_base;
        tracing::info!(
            "[+] Parsing repository {}/{} via {}",
            self.coordinates.owner,
            self.coordinates.repo,
            api_base
        );

        let repository = self.coordinates.repository_url(api_base)?;
        let rate_limited = |page: &Page| {
            rate_limit_message(page).map(|message| WalkError::RateLimited {
                url: repository.clone(),
                message,
            })
        };
        ensure_reachable_with(self.transport.as_ref(), &repository, &rate_limited).await?;

        match self.reference() {
            Some(reference) => tracing::info!("[+] Using reference: {}", reference),
            None => tracing::info!("[+] No reference given, listing the default branch"),
        }
        let root = self.coordinates.contents_url(api_base, self.reference())?;
        walk_tree(self, &root, &self.target.options, sink).await
    }
}

#[async_trait]
impl ListingSource for GithubApiWalker {
    async fn list(&self, location: &Url) -> Result<Vec<ListedEntry>> {
        let page = self
            .transport
            .get(location)
            .await
            .map_err(|e| WalkError::Unreachable {
                url: location.clone(),
                reason: e.to_string(),
            })?;

        if let Some(message) = rate_limit_message(&page) {
            return Err(WalkError::RateLimited {
                url: location.clone(),
                message,
            });
        }

        match page.status {
            200 => parse_listing(&page.body, location),
            404 => Err(WalkError::NotFound(location.clone())),
            status => Err(WalkError::BadStatus {
                url: location.clone(),
                status,
            }),
        }
    }

    fn child_location(&self, _listing: &Url, entry: &RepositoryEntry) -> Url {
        entry.reference.clone()
    }
}
