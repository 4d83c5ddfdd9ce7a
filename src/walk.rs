//! Provider-independent tree walker.
//!
//! Walks depth-first in pre-order over an explicit stack instead of call-stack
//! recursion. Each listing's entries are pushed in reverse so they pop in the
//! order the provider returned them; an entry is written before its own
//! listing is fetched. The output therefore matches a recursive walk line for
//! line: `a.txt`, `b/`, `b/c.txt`, `d.txt`.
//!
//! Failure containment: a listing that cannot be read (404, bad status,
//! missing structure, rate limit, transport failure) is logged, recorded in
//! the summary and skipped. Its siblings and ancestors carry on. Only sink
//! errors and internal errors stop the walk.
//!
//! Used by: every `RepositoryWalker` in `providers`

use async_trait::async_trait;
use url::Url;

use crate::error::{Result, WalkError};
use crate::models::{ListedEntry, RepositoryEntry, SkippedLocation, WalkSummary};
use crate::wordlist::EntrySink;

/// One provider's way of reading a directory listing.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Entries at `location`, in provider order.
    async fn list(&self, location: &Url) -> Result<Vec<ListedEntry>>;

    /// Where the listing of directory `entry`, found in `listing`, lives.
    fn child_location(&self, listing: &Url, entry: &RepositoryEntry) -> Url;
}

#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Deepest directory level whose listing is fetched; root is 0.
    pub max_depth: Option<usize>,
}

struct Pending {
    entry: RepositoryEntry,
    listing: Url,
}

pub async fn walk_tree<S>(
    source: &S,
    root: &Url,
    options: &WalkOptions,
    sink: &mut dyn EntrySink,
) -> Result<WalkSummary>
where
    S: ListingSource + ?Sized,
{
    let listing = source.list(root).await;
    walk_from_listing(source, root, listing, options, sink).await
}

/// Walks from a root listing the caller has already fetched.
pub async fn walk_from_listing<S>(
    source: &S,
    root: &Url,
    listing: Result<Vec<ListedEntry>>,
    options: &WalkOptions,
    sink: &mut dyn EntrySink,
) -> Result<WalkSummary>
where
    S: ListingSource + ?Sized,
{
    let mut summary = WalkSummary::default();
    let mut stack: Vec<Pending> = Vec::new();

    tracing::info!("[+] Now crawling: {}", root);
    queue(root, listing, "", &mut stack, &mut summary)?;

    while let Some(Pending { entry, listing }) = stack.pop() {
        let path = entry.path();
        tracing::info!("[+] Found repository item of type {}: {}", entry.kind, path);
        sink.record(&path)?;
        summary.entries += 1;

        if !entry.is_directory() {
            continue;
        }

        let child_depth = entry.depth() + 1;
        if options.max_depth.is_some_and(|max| child_depth > max) {
            tracing::info!("[+] Depth limit reached, not descending into {}", path);
            continue;
        }

        let child = source.child_location(&listing, &entry);
        let listed = source.list(&child).await;
        queue(&child, listed, &path, &mut stack, &mut summary)?;
    }

    Ok(summary)
}

/// Queues one listing's entries, containing recoverable errors.
fn queue(
    location: &Url,
    listing: Result<Vec<ListedEntry>>,
    parent_path: &str,
    stack: &mut Vec<Pending>,
    summary: &mut WalkSummary,
) -> Result<()> {
    match listing {
        Ok(listed) if listed.is_empty() => {
            tracing::error!("[-] Empty repository listing on url: {}", location);
            Ok(())
        }
        Ok(listed) => {
            stack.extend(listed.into_iter().rev().map(|item| Pending {
                entry: RepositoryEntry::new(item, parent_path),
                listing: location.clone(),
            }));
            Ok(())
        }
        Err(err) if err.is_recoverable() => {
            report(&err);
            summary.skipped.push(SkippedLocation {
                location: location.clone(),
                reason: err.to_string(),
                rate_limited: err.is_rate_limited(),
            });
            Ok(())
        }
        Err(err) => Err(err),
    }
}

fn report(err: &WalkError) {
    match err {
        WalkError::RateLimited { url, message } => tracing::warn!(
            "[!] Rate limit hit on {}: {} (entries below it are missing; authenticate with --token)",
            url,
            message
        ),
        other => tracing::error!("[-] {}", other),
    }
}
