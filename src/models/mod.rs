//! Plain data types shared by the walker, the providers and the output sink.
//!
//! - `entry`: RepositoryEntry, ListedEntry, EntryKind, WalkSummary
//! - `github`: ContentItem, ContentLinks, ApiErrorBody for the contents API

pub mod entry;
pub mod github;

pub use entry::*;
pub use github::*;
