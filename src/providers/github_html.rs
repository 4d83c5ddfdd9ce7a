//! github.com directory pages.
//!
//! Reads the "folders and files" table GitHub renders for every directory.
//! Each row links the entry with an `aria-label` of the form
//! `<name>, (<Kind>)`, where `(Directory)` marks directories.
//!
//! Branch resolution: a URL without a `/tree/<branch>` part gets the branch
//! named by the landing page's branch picker, or the one the caller gave.
//! Child listings live at the parent listing URL plus the child's name.

use std::sync::Arc;

use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

use crate::error::{Result, WalkError};
use crate::models::{EntryKind, ListedEntry, RepositoryEntry, WalkSummary};
use crate::providers::{Provider, RepositoryWalker, WalkTarget, is_github_web};
use crate::remote::{Page, Transport, ensure_reachable};
use crate::walk::{ListingSource, walk_from_listing, walk_tree};
use crate::wordlist::EntrySink;

pub const PROVIDER: Provider = Provider {
    name: "github",
    description: "github.com web pages",
    matches: is_github_web,
    construct: GithubHtmlWalker::construct,
};

const LISTING_TABLE: &str = r#"table[aria-labelledby="folders-and-files"]"#;
const LISTING_ROW: &str = "tbody tr";
const ENTRY_LINK: &str = "a[aria-label]";
const BRANCH_LABEL: &str = "button#branch-picker-repos-header-ref-selector \
                            div.ref-selector-button-text-container span";
const DIRECTORY_KIND: &str = "(Directory)";

pub struct GithubHtmlWalker {
    target: WalkTarget,
    transport: Arc<dyn Transport>,
}

impl GithubHtmlWalker {
    pub fn new(target: WalkTarget, transport: Arc<dyn Transport>) -> Self {
        Self { target, transport }
    }

    fn construct(
        target: WalkTarget,
        transport: Arc<dyn Transport>,
    ) -> Result<Box<dyn RepositoryWalker>> {
        Ok(Box::new(Self::new(target, transport)))
    }

    /// Branch-qualified listing URL for the walk's root.
    fn root_location(&self, landing: &Page) -> Result<Url> {
        let url = &self.target.url;
        if !needs_branch(url) {
            if let Some(reference) = &self.target.reference {
                tracing::info!(
                    "[+] URL already names a tree, ignoring branch {}",
                    reference
                );
            }
            return Ok(url.clone());
        }

        let branch = match &self.target.reference {
            Some(reference) => reference.clone(),
            None => {
                let branch = parse_branch_name(&landing.body)?.ok_or_else(|| {
                    tracing::error!("[-] Failed to find branch picker on url: {}", url);
                    WalkError::BranchNotFound(url.clone())
                })?;
                tracing::info!("[+] Found branch: {}", branch);
                branch
            }
        };
        with_branch(url, &branch)
    }
}

#[async_trait]
impl RepositoryWalker for GithubHtmlWalker {
    fn name(&self) -> &'static str {
        PROVIDER.name
    }

    async fn walk(&self, sink: &mut dyn EntrySink) -> Result<WalkSummary> {
        tracing::info!("[+] Parsing site: {}", self.target.url);
        let landing = ensure_reachable(self.transport.as_ref(), &self.target.url).await?;
        let root = self.root_location(&landing)?;
        if !needs_branch(&self.target.url) {
            // Already a tree page: the landing page is the root listing.
            let listing = parse_listing(&landing.body, &root);
            return walk_from_listing(self, &root, listing, &self.target.options, sink).await;
        }
        walk_tree(self, &root, &self.target.options, sink).await
    }
}

#[async_trait]
impl ListingSource for GithubHtmlWalker {
    async fn list(&self, location: &Url) -> Result<Vec<ListedEntry>> {
        let page = self
            .transport
            .get(location)
            .await
            .map_err(|e| WalkError::Unreachable {
                url: location.clone(),
                reason: e.to_string(),
            })?;

        match page.status {
            200 => parse_listing(&page.body, location),
            404 => Err(WalkError::NotFound(location.clone())),
            status => Err(WalkError::BadStatus {
                url: location.clone(),
                status,
            }),
        }
    }

    fn child_location(&self, listing: &Url, entry: &RepositoryEntry) -> Url {
        let mut child = listing.clone();
        match child.path_segments_mut() {
            Ok(mut segments) => {
                segments
                    .pop_if_empty()
                    .extend(entry.bare_name().split('/').filter(|s| !s.is_empty()));
            }
            Err(()) => return entry.reference.clone(),
        }
        child
    }
}

/// True unless the URL already points into a `/<owner>/<repo>/tree/...` path.
pub fn needs_branch(url: &Url) -> bool {
    url.path_segments()
        .map(|mut segments| segments.nth(2) != Some("tree"))
        .unwrap_or(true)
}

pub fn with_branch(url: &Url, branch: &str) -> Result<Url> {
    let mut qualified = url.clone();
    qualified.set_query(None);
    qualified.set_fragment(None);
    qualified
        .path_segments_mut()
        .map_err(|_| WalkError::InvalidRepositoryUrl {
            url: url.to_string(),
            reason: "cannot append a branch to this URL".into(),
        })?
        .pop_if_empty()
        .push("tree")
        .extend(branch.split('/').filter(|s| !s.is_empty()));
    Ok(qualified)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| WalkError::Selector(format!("{}: {:?}", css, e)))
}

/// Name of the branch selected in the landing page's branch picker.
pub fn parse_branch_name(html: &str) -> Result<Option<String>> {
    let document = Html::parse_document(html);
    let label = selector(BRANCH_LABEL)?;
    Ok(document
        .select(&label)
        .next()
        .map(|span| span.text().collect::<String>().trim().to_string())
        .filter(|branch| !branch.is_empty()))
}

pub fn parse_listing(html: &str, location: &Url) -> Result<Vec<ListedEntry>> {
    let document = Html::parse_document(html);
    let (table, row, link) = (
        selector(LISTING_TABLE)?,
        selector(LISTING_ROW)?,
        selector(ENTRY_LINK)?,
    );

    let table = document
        .select(&table)
        .next()
        .ok_or_else(|| WalkError::MalformedListing {
            url: location.clone(),
            reason: "no folders-and-files table".into(),
        })?;

    let mut entries = Vec::new();
    for tr in table.select(&row) {
        let Some(anchor) = tr.select(&link).next() else {
            continue;
        };
        let Some((name, kind)) = anchor.value().attr("aria-label").and_then(split_label) else {
            continue;
        };
        let reference = anchor
            .value()
            .attr("href")
            .and_then(|href| location.join(href).ok())
            .unwrap_or_else(|| location.clone());
        entries.push(ListedEntry::new(name, kind, reference));
    }
    Ok(entries)
}

/// Splits `"<name>, (<Kind>)"`. Names may themselves contain commas.
fn split_label(label: &str) -> Option<(&str, EntryKind)> {
    let (name, kind) = label.rsplit_once(',')?;
    let kind = kind.trim();
    if name.is_empty() || !(kind.starts_with('(') && kind.ends_with(')')) {
        return None;
    }
    let kind = if kind == DIRECTORY_KIND {
        EntryKind::Directory
    } else {
        EntryKind::File
    };
    Some((name, kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::mock::MockTransport;
    use crate::wordlist::WordlistFile;
    use tempfile::tempdir;

    const ROOT: &str = "https://github.com/o/r";
    const TREE: &str = "https://github.com/o/r/tree/main";

    const LANDING: &str = r#"<html><body>
        <button id="branch-picker-repos-header-ref-selector" type="button">
          <div class="ref-selector-button-text-container">
            <span class="css-truncate-target">  main
            </span>
          </div>
        </button>
    </body></html>"#;

    fn listing(rows: &[(&str, &str)]) -> String {
        let rows: String = rows
            .iter()
            .map(|(label, href)| {
                format!(
                    r#"<tr class="react-directory-row"><td><div><a aria-label="{label}" href="{href}">x</a></div></td>
                       <td><a href="{href}">also x</a></td></tr>"#
                )
            })
            .collect();
        format!(
            r#"<html><body><table aria-labelledby="folders-and-files">
                <thead><tr><th>Name</th></tr></thead>
                <tbody>
                  <tr><td><a href="/o/r/tree/main">Parent directory</a></td></tr>
                  {rows}
                </tbody></table></body></html>"#
        )
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn walker(transport: Arc<MockTransport>, target: WalkTarget) -> GithubHtmlWalker {
        GithubHtmlWalker::new(target, transport)
    }

    fn target(s: &str) -> WalkTarget {
        WalkTarget::new(url(s), url("https://api.github.com/"))
    }

    #[test]
    fn detects_tree_urls() {
        assert!(needs_branch(&url(ROOT)));
        assert!(needs_branch(&url("https://github.com/o/r/")));
        assert!(needs_branch(&url("https://github.com/o/treehouse")));
        assert!(!needs_branch(&url(TREE)));
        assert!(!needs_branch(&url("https://github.com/o/r/tree/dev/src")));
    }

    #[test]
    fn appends_branch_segments() {
        assert_eq!(with_branch(&url(ROOT), "main").unwrap().as_str(), TREE);
        assert_eq!(
            with_branch(&url("https://github.com/o/r/?tab=readme-ov-file"), "main")
                .unwrap()
                .as_str(),
            TREE
        );
        assert_eq!(
            with_branch(&url(ROOT), "feature/login").unwrap().as_str(),
            "https://github.com/o/r/tree/feature/login"
        );
    }

    #[test]
    fn reads_branch_from_picker() {
        assert_eq!(parse_branch_name(LANDING).unwrap().as_deref(), Some("main"));
        assert_eq!(parse_branch_name("<html><button>main</button></html>").unwrap(), None);
    }

    #[test]
    fn parses_rows_in_page_order() {
        let html = listing(&[
            ("src, (Directory)", "/o/r/tree/main/src"),
            ("README.md, (File)", "/o/r/blob/main/README.md"),
            ("notes, draft.txt, (File)", "/o/r/blob/main/notes,%20draft.txt"),
            ("vendor, (Submodule)", "/other/vendor"),
        ]);
        let entries = parse_listing(&html, &url(TREE)).unwrap();
        let names: Vec<_> = entries.iter().map(|e| (e.name.as_str(), e.kind)).collect();
        assert_eq!(
            names,
            vec![
                ("src", EntryKind::Directory),
                ("README.md", EntryKind::File),
                ("notes, draft.txt", EntryKind::File),
                ("vendor", EntryKind::File),
            ]
        );
        assert_eq!(
            entries[0].reference.as_str(),
            "https://github.com/o/r/tree/main/src"
        );
    }

    #[test]
    fn missing_table_is_malformed() {
        let err = parse_listing("<html><body><p>rate limited</p></body></html>", &url(TREE))
            .unwrap_err();
        assert!(matches!(err, WalkError::MalformedListing { .. }));
    }

    #[test]
    fn labels_without_kind_are_skipped() {
        assert_eq!(split_label("Parent directory"), None);
        assert_eq!(split_label("a, b"), None);
        assert_eq!(split_label(", (File)"), None);
        assert_eq!(split_label("lib, (Directory)"), Some(("lib", EntryKind::Directory)));
    }

    #[test]
    fn child_location_extends_listing_url() {
        let walker = walker(Arc::new(MockTransport::new()), target(ROOT));
        let entry = RepositoryEntry::new(
            ListedEntry::new("my docs", EntryKind::Directory, url(TREE)),
            "",
        );
        assert_eq!(
            walker.child_location(&url(TREE), &entry).as_str(),
            "https://github.com/o/r/tree/main/my%20docs"
        );
        assert_eq!(
            walker
                .child_location(&url("https://github.com/o/r/tree/main/"), &entry)
                .as_str(),
            "https://github.com/o/r/tree/main/my%20docs"
        );
    }

    #[tokio::test]
    async fn walks_resolved_default_branch() {
        let transport = Arc::new(
            MockTransport::new()
                .with_page(ROOT, 200, LANDING)
                .with_page(
                    TREE,
                    200,
                    &listing(&[
                        ("a.txt, (File)", "/o/r/blob/main/a.txt"),
                        ("b, (Directory)", "/o/r/tree/main/b"),
                    ]),
                )
                .with_page(
                    "https://github.com/o/r/tree/main/b",
                    200,
                    &listing(&[("c.txt, (File)", "/o/r/blob/main/b/c.txt")]),
                ),
        );
        let walker = walker(transport.clone(), target(ROOT));

        let mut lines: Vec<String> = Vec::new();
        let summary = walker.walk(&mut lines).await.unwrap();
        assert_eq!(lines, vec!["a.txt", "b/", "b/c.txt"]);
        assert_eq!(summary.entries, 3);
        assert!(summary.is_complete());
        assert_eq!(
            transport.requested(),
            vec![ROOT, TREE, "https://github.com/o/r/tree/main/b"]
        );
    }

    #[tokio::test]
    async fn missing_subdirectory_is_logged_and_skipped() {
        let transport = Arc::new(
            MockTransport::new()
                .with_page(ROOT, 200, LANDING)
                .with_page(
                    TREE,
                    200,
                    &listing(&[
                        ("a.txt, (File)", "/o/r/blob/main/a.txt"),
                        ("b, (Directory)", "/o/r/tree/main/b"),
                        ("z.txt, (File)", "/o/r/blob/main/z.txt"),
                    ]),
                ),
        );
        let walker = walker(transport, target(ROOT));

        let mut lines: Vec<String> = Vec::new();
        let summary = walker.walk(&mut lines).await.unwrap();
        assert_eq!(lines, vec!["a.txt", "b/", "z.txt"]);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(
            summary.skipped[0].location.as_str(),
            "https://github.com/o/r/tree/main/b"
        );
    }

    #[tokio::test]
    async fn explicit_branch_skips_resolution() {
        let transport = Arc::new(
            MockTransport::new()
                .with_page(ROOT, 200, "<html>no picker here</html>")
                .with_page(
                    "https://github.com/o/r/tree/dev",
                    200,
                    &listing(&[("x.rs, (File)", "/o/r/blob/dev/x.rs")]),
                ),
        );
        let walker = walker(transport, target(ROOT).with_reference("dev"));

        let mut lines: Vec<String> = Vec::new();
        walker.walk(&mut lines).await.unwrap();
        assert_eq!(lines, vec!["x.rs"]);
    }

    #[tokio::test]
    async fn tree_url_is_walked_as_given() {
        let start = "https://github.com/o/r/tree/dev/src";
        let transport = Arc::new(
            MockTransport::new()
                .with_page(start, 200, &listing(&[("lib.rs, (File)", "/o/r/blob/dev/src/lib.rs")])),
        );
        let walker = walker(transport.clone(), target(start));

        let mut lines: Vec<String> = Vec::new();
        walker.walk(&mut lines).await.unwrap();
        assert_eq!(lines, vec!["lib.rs"]);
        // The connectivity check's page doubles as the root listing.
        assert_eq!(transport.requested(), vec![start]);
    }

    #[tokio::test]
    async fn missing_branch_picker_aborts() {
        let transport = Arc::new(MockTransport::new().with_page(ROOT, 200, "<html></html>"));
        let walker = walker(transport.clone(), target(ROOT));

        let mut lines: Vec<String> = Vec::new();
        let err = walker.walk(&mut lines).await.unwrap_err();
        assert!(matches!(err, WalkError::BranchNotFound(_)));
        assert!(lines.is_empty());
        assert_eq!(transport.requested(), vec![ROOT]);
    }

    #[tokio::test]
    async fn failed_preflight_creates_no_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("words.txt");
        let transport = Arc::new(MockTransport::new().with_failure(ROOT, "dns error"));
        let walker = walker(transport, target(ROOT));

        let mut sink = WordlistFile::new(&path, false);
        let err = walker.walk(&mut sink).await.unwrap_err();
        drop(sink);

        assert!(matches!(err, WalkError::Unreachable { .. }));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn preflight_404_fails_the_job() {
        let transport = Arc::new(MockTransport::new());
        let walker = walker(transport, target(ROOT));
        let mut lines: Vec<String> = Vec::new();
        let err = walker.walk(&mut lines).await.unwrap_err();
        assert!(matches!(err, WalkError::BadStatus { status: 404, .. }));
    }
}
