//! Error taxonomy for repository walks.
//!
//! Defines `WalkError` for every failure a walk can run into and classifies
//! which of them are contained at the directory that raised them.
//!
//! Recoverable (the subtree is skipped, the walk goes on):
//! - `NotFound`, `BadStatus`, `MalformedListing` → logged with `[-]`
//! - `RateLimited` → logged with `[!]`
//! - `Unreachable` when raised for a listing rather than the pre-flight check
//!
//! Everything else aborts the job.

use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("Unreachable: {url}: {reason}")]
    Unreachable { url: Url, reason: String },

    #[error("Invalid status code for {url}: {status}")]
    BadStatus { url: Url, status: u16 },

    #[error("Not found: {0}")]
    NotFound(Url),

    #[error("Failed to find repository listing on url {url}: {reason}")]
    MalformedListing { url: Url, reason: String },

    #[error("Rate limited on {url}: {message}")]
    RateLimited { url: Url, message: String },

    #[error("Could not determine the default branch of {0}")]
    BranchNotFound(Url),

    #[error("Invalid repository url {url}: {reason}")]
    InvalidRepositoryUrl { url: String, reason: String },

    #[error("No provider handles {0}")]
    UnsupportedProvider(String),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Invalid selector: {0}")]
    Selector(String),
}

impl WalkError {
    /// Whether the walker may skip the offending location and continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            WalkError::Unreachable { .. }
                | WalkError::BadStatus { .. }
                | WalkError::NotFound(_)
                | WalkError::MalformedListing { .. }
                | WalkError::RateLimited { .. }
        )
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, WalkError::RateLimited { .. })
    }
}

pub type Result<T> = std::result::Result<T, WalkError>;
