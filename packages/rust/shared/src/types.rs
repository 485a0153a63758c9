//! Core domain types for wishlist compilation.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

// ---------------------------------------------------------------------------
// RepoRef
// ---------------------------------------------------------------------------

/// Coordinate of a remote repository (`owner/name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    /// Account or organization that owns the repository.
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

// ---------------------------------------------------------------------------
// SourceFile
// ---------------------------------------------------------------------------

/// A remote text file contributing to the wishlist.
///
/// Built once per listing call and read-only afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// File name (last path segment).
    pub name: String,
    /// Repository-relative path.
    pub path: String,
    /// Decoded inline content, when the listing carried it.
    pub content: Option<Vec<u8>>,
    /// Direct-download URL, used when inline content is absent.
    pub download_url: Option<Url>,
    /// Last-modified attribute, when known.
    pub last_modified: Option<DateTime<Utc>>,
}

impl SourceFile {
    /// A bare record with only a name and path.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            content: None,
            download_url: None,
            last_modified: None,
        }
    }

    /// Inline content, treating an empty body as absent.
    pub fn inline_content(&self) -> Option<&[u8]> {
        self.content.as_deref().filter(|c| !c.is_empty())
    }
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("content_len", &self.content.as_ref().map(Vec::len))
            .field("download_url", &self.download_url.as_ref().map(Url::as_str))
            .field("last_modified", &self.last_modified)
            .finish()
    }
}

/// A source file with its resolved ordering key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedSource {
    /// Timestamp the file was ordered by.
    pub resolved_at: DateTime<Utc>,
    pub file: SourceFile,
}

// ---------------------------------------------------------------------------
// ChangeEvent
// ---------------------------------------------------------------------------

/// A change-history record: one commit and the paths it touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Commit identifier.
    pub id: String,
    /// Author timestamp.
    pub timestamp: DateTime<Utc>,
    /// Repository-relative paths affected by the change.
    pub paths: BTreeSet<String>,
}

// ---------------------------------------------------------------------------
// OrderingStrategy
// ---------------------------------------------------------------------------

/// How source files are ordered before aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderingStrategy {
    /// Order by the earliest change event touching each file.
    #[default]
    History,
    /// Order by each file's last-modified attribute.
    LastModified,
}

impl OrderingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::History => "history",
            Self::LastModified => "last-modified",
        }
    }
}

impl fmt::Display for OrderingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
