//! Pre-flight connectivity check.
//!
//! Runs once before any branch resolution or walking. Fails on a transport
//! error or on anything but a 200, so a dead or mistyped URL never reaches
//! the walker. The landing page is returned for reuse.

use url::Url;

use crate::error::{Result, WalkError};
use crate::remote::transport::{Page, Transport};

pub async fn ensure_reachable(transport: &dyn Transport, url: &Url) -> Result<Page> {
    ensure_reachable_with(transport, url, &|_: &Page| None).await
}

/// Like `ensure_reachable`, but `classify` gets the first look at the
/// response, so a provider can name its own failure answers (throttling)
/// before they are reported as a bad status.
pub async fn ensure_reachable_with(
    transport: &dyn Transport,
    url: &Url,
    classify: &(dyn Fn(&Page) -> Option<WalkError> + Sync),
) -> Result<Page> {
    tracing::info!("[+] Checking connectivity: {}", url);

    let page = transport.get(url).await.map_err(|e| {
        tracing::error!("[-] Failed to reach {}: {}", url, e);
        WalkError::Unreachable {
            url: url.clone(),
            reason: e.to_string(),
        }
    })?;

    if let Some(err) = classify(&page) {
        if err.is_rate_limited() {
            tracing::warn!("[!] {} (authenticate with --token)", err);
        } else {
            tracing::error!("[-] {}", err);
        }
        return Err(err);
    }

    if !page.is_ok() {
        tracing::error!("[-] Invalid status code for {}: {}", url, page.status);
        return Err(WalkError::BadStatus {
            url: url.clone(),
            status: page.status,
        });
    }

    Ok(page)
}
