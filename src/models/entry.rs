//! Repository entries and walk results.
//!
//! - `ListedEntry`: one row exactly as a provider listing reported it
//! - `RepositoryEntry`: a listed row placed in the tree under its parent path
//! - `WalkSummary`: what a finished walk wrote and which locations it skipped

use std::fmt;

use url::Url;

/// Separator appended to directory names and used between path segments.
pub const SEPARATOR: char = '/';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::File => f.write_str("file"),
            EntryKind::Directory => f.write_str("directory"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedEntry {
    pub name: String,
    pub kind: EntryKind,
    pub reference: Url,
}

impl ListedEntry {
    pub fn new(name: impl Into<String>, kind: EntryKind, reference: Url) -> Self {
        Self {
            name: name.into(),
            kind,
            reference,
        }
    }
}

/// A discovered node. Never mutated after construction.
///
/// `parent_path + name` is the line written to the wordlist; directory
/// names already carry their trailing separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryEntry {
    pub name: String,
    pub kind: EntryKind,
    pub reference: Url,
    pub parent_path: String,
}

impl RepositoryEntry {
    pub fn new(listed: ListedEntry, parent_path: &str) -> Self {
        let mut name = listed.name;
        if listed.kind == EntryKind::Directory && !name.ends_with(SEPARATOR) {
            name.push(SEPARATOR);
        }
        Self {
            name,
            kind: listed.kind,
            reference: listed.reference,
            parent_path: parent_path.to_string(),
        }
    }

    pub fn path(&self) -> String {
        format!("{}{}", self.parent_path, self.name)
    }

    /// Name without the directory separator, as used in URLs.
    pub fn bare_name(&self) -> &str {
        self.name.trim_end_matches(SEPARATOR)
    }

    /// Number of directories above this entry; 0 at the repository root.
    pub fn depth(&self) -> usize {
        self.parent_path.matches(SEPARATOR).count()
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

#[derive(Debug, Clone)]
pub struct SkippedLocation {
    pub location: Url,
    pub reason: String,
    pub rate_limited: bool,
}

#[derive(Debug, Clone, Default)]
pub struct WalkSummary {
    /// Lines written to the sink.
    pub entries: usize,
    /// Listings that could not be read; their subtrees are missing.
    pub skipped: Vec<SkippedLocation>,
}

impl WalkSummary {
    pub fn rate_limited(&self) -> usize {
        self.skipped.iter().filter(|s| s.rate_limited).count()
    }

    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}
