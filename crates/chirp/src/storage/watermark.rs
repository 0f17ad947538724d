//! Persisted "last seen" watermark.

use chrono::{DateTime, Duration, Utc};
use std::path::{Path, PathBuf};

use super::write_atomic;
use crate::error::StoreError;
use crate::timeline::{timestamp, Item};

/// How far back the first run looks when no watermark exists.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 365;

/// Timestamp boundary: everything at or before it has been queued already.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Watermark(DateTime<Utc>);

impl Watermark {
    #[must_use]
    pub const fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    /// Watermark used when nothing has been persisted yet.
    #[must_use]
    pub fn initial(now: DateTime<Utc>) -> Self {
        Self(now - Duration::days(DEFAULT_LOOKBACK_DAYS))
    }

    /// The boundary timestamp.
    #[must_use]
    pub const fn at(&self) -> DateTime<Utc> {
        self.0
    }

    /// Advance past a freshly queued batch.
    ///
    /// Moves to the newest `created_at` in `queued`, or to `now` when the batch
    /// is empty. Never moves backwards.
    pub fn advance(&mut self, queued: &[Item], now: DateTime<Utc>) {
        let next = queued.iter().map(Item::created_at).max().unwrap_or(now);
        if next > self.0 {
            self.0 = next;
        }
    }
}

/// File-backed watermark storage.
///
/// The file holds a single timestamp in the upstream wire format so it can be
/// read and edited by hand.
#[derive(Debug, Clone)]
pub struct WatermarkStore {
    path: PathBuf,
}

impl WatermarkStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted watermark, if any.
    pub fn load(&self) -> Result<Option<Watermark>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let value = content.trim();
        timestamp::parse(value)
            .map(|ts| Some(Watermark::new(ts)))
            .ok_or_else(|| StoreError::InvalidTimestamp {
                path: self.path.clone(),
                value: value.to_string(),
            })
    }

    /// Read the persisted watermark or fall back to [`Watermark::initial`].
    pub fn load_or_initial(&self, now: DateTime<Utc>) -> Result<Watermark, StoreError> {
        Ok(self.load()?.unwrap_or_else(|| {
            tracing::info!(
                path = %self.path.display(),
                lookback_days = DEFAULT_LOOKBACK_DAYS,
                "No watermark found, starting from default lookback"
            );
            Watermark::initial(now)
        }))
    }

    /// Persist the watermark atomically (temp file, then rename).
    pub fn save(&self, watermark: &Watermark) -> Result<(), StoreError> {
        let line = format!("{}\n", timestamp::format(watermark.at()));
        write_atomic(&self.path, line.as_bytes())?;

        tracing::debug!(
            path = %self.path.display(),
            watermark = %watermark.at(),
            "Persisted watermark"
        );
        Ok(())
    }
}
