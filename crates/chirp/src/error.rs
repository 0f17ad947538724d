//! Error types for fetching, caching and persisting state.

use std::path::PathBuf;

use thiserror::Error;

/// Failure talking to an upstream endpoint.
///
/// Never fatal: sources turn these into "zero items for this request".
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, timeout, body read).
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx response.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Body was not the JSON shape we expect.
    #[error("malformed response from {url}: {reason}")]
    Malformed { url: String, reason: String },
}

/// Failure reading or writing persisted state.
///
/// Always fatal: continuing without persisted state risks duplicate delivery.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unreadable timestamp '{value}' in {}", path.display())]
    InvalidTimestamp { path: PathBuf, value: String },
}

/// Failure resolving author metadata.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The profile could not be fetched; callers degrade gracefully.
    #[error("profile fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The cache entry could not be written; fatal.
    #[error(transparent)]
    Persist(#[from] StoreError),
}

impl CacheError {
    /// Whether this error must stop the scheduler.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Persist(_))
    }
}
