//! Timeline data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::storage::AuthorMetadata;

/// Which upstream an item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Home timeline of the local user.
    FromTimeline,
    /// One of the configured search queries.
    FromSearch,
}

impl SourceKind {
    /// Notification category for items of this kind.
    #[must_use]
    pub const fn category(self) -> notify::Category {
        match self {
            Self::FromTimeline => notify::Category::Timeline,
            Self::FromSearch => notify::Category::Search,
        }
    }
}

/// Identity used to address the metadata cache.
///
/// Search results carry no reliable numeric id, so those authors are keyed by
/// handle instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorKey {
    /// Numeric account id.
    ById(u64),
    /// Account handle (without `@`).
    ByHandle(String),
}

impl AuthorKey {
    /// File name stem for this key, prefixed with the variant so an id and
    /// an all-digit handle never share an entry.
    #[must_use]
    pub fn file_stem(&self) -> String {
        match self {
            Self::ById(_) => format!("id_{}", self.path_segment()),
            Self::ByHandle(_) => format!("handle_{}", self.path_segment()),
        }
    }

    /// Bare value for use in a URL path; anything outside `[A-Za-z0-9_]`
    /// becomes `_`.
    #[must_use]
    pub fn path_segment(&self) -> String {
        match self {
            Self::ById(id) => id.to_string(),
            Self::ByHandle(handle) => sanitize(handle),
        }
    }
}

impl fmt::Display for AuthorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ById(id) => write!(f, "{id}"),
            Self::ByHandle(handle) => f.write_str(handle),
        }
    }
}

/// Replace every non-word character with `_`.
pub(crate) fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// A timeline or search entry awaiting notification.
///
/// Immutable after construction apart from [`Item::attach_metadata`].
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    text: String,
    author_id: Option<u64>,
    author_handle: String,
    avatar_url: Option<String>,
    created_at: DateTime<Utc>,
    source_kind: SourceKind,
    author_metadata: Option<AuthorMetadata>,
}

impl Item {
    /// Create an item from the home timeline.
    #[must_use]
    pub fn from_timeline(
        text: String,
        author_id: Option<u64>,
        author_handle: String,
        avatar_url: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            text,
            author_id,
            author_handle,
            avatar_url,
            created_at,
            source_kind: SourceKind::FromTimeline,
            author_metadata: None,
        }
    }

    /// Create an item from a search result. Search results have no author id.
    #[must_use]
    pub fn from_search(
        text: String,
        author_handle: String,
        avatar_url: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            text,
            author_id: None,
            author_handle,
            avatar_url,
            created_at,
            source_kind: SourceKind::FromSearch,
            author_metadata: None,
        }
    }

    /// Raw text as delivered upstream (may contain HTML entities).
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text with HTML entities decoded.
    pub fn decoded_text(&self) -> String {
        html_escape::decode_html_entities(&self.text).into_owned()
    }

    pub fn author_id(&self) -> Option<u64> {
        self.author_id
    }

    pub fn author_handle(&self) -> &str {
        &self.author_handle
    }

    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source_kind
    }

    pub fn author_metadata(&self) -> Option<&AuthorMetadata> {
        self.author_metadata.as_ref()
    }

    /// Cache key for this item's author: id when known, else handle.
    #[must_use]
    pub fn author_key(&self) -> AuthorKey {
        match self.author_id {
            Some(id) => AuthorKey::ById(id),
            None => AuthorKey::ByHandle(self.author_handle.clone()),
        }
    }

    /// Whether this item was written by `handle` (ASCII case-insensitive).
    #[must_use]
    pub fn is_authored_by(&self, handle: &str) -> bool {
        self.author_handle.eq_ignore_ascii_case(handle.trim_start_matches('@'))
    }

    /// Attach resolved author metadata.
    pub fn attach_metadata(&mut self, metadata: AuthorMetadata) {
        self.author_metadata = Some(metadata);
    }
}
