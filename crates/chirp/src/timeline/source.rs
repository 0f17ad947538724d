//! Incremental fetchers for the timeline and search endpoints.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::FetchError;

use super::parser::{EntryParser, ParsedPage};
use super::types::Item;

/// Ordering guarantee of an upstream feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedOrder {
    /// No ordering assumed; every entry is checked against the cutoff.
    #[default]
    Unordered,
    /// Entries arrive newest first, so scanning can stop at the cutoff.
    NewestFirst,
}

/// Result of fetching one source for one cycle.
///
/// Failures are reported alongside whatever items were retrieved; they never
/// abort the cycle.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// New items, in upstream order.
    pub items: Vec<Item>,
    /// Requests that failed this cycle.
    pub failures: Vec<FetchError>,
    /// Entries dropped as malformed.
    pub skipped: usize,
}

impl FetchOutcome {
    /// Outcome of a single failed request.
    #[must_use]
    pub fn failed(error: FetchError) -> Self {
        Self {
            failures: vec![error],
            ..Self::default()
        }
    }

    /// Whether at least one request failed.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }

    fn absorb(&mut self, other: Self) {
        self.items.extend(other.items);
        self.failures.extend(other.failures);
        self.skipped += other.skipped;
    }
}

/// A source of items newer than a watermark cutoff.
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Fetch items created strictly after `cutoff`.
    async fn fetch(&self, cutoff: DateTime<Utc>) -> FetchOutcome;
}

/// Keep the items newer than `cutoff` that were not written by `local_user`.
///
/// Every item is filtered on its own timestamp. With
/// [`FeedOrder::NewestFirst`] the scan additionally stops at the first item at
/// or before the cutoff.
pub fn select_new(
    items: Vec<Item>,
    cutoff: DateTime<Utc>,
    order: FeedOrder,
    local_user: &str,
) -> Vec<Item> {
    let mut selected = Vec::new();

    for item in items {
        if item.created_at() <= cutoff {
            if order == FeedOrder::NewestFirst {
                break;
            }
            continue;
        }
        if item.is_authored_by(local_user) {
            tracing::debug!(handle = item.author_handle(), "Skipping own item");
            continue;
        }
        selected.push(item);
    }

    selected
}

fn page_outcome(
    page: ParsedPage,
    cutoff: DateTime<Utc>,
    order: FeedOrder,
    local_user: &str,
) -> FetchOutcome {
    FetchOutcome {
        items: select_new(page.items, cutoff, order, local_user),
        failures: Vec::new(),
        skipped: page.skipped,
    }
}

/// Home timeline source.
pub struct TimelineSource {
    client: ApiClient,
    url: String,
    local_user: String,
    order: FeedOrder,
}

impl TimelineSource {
    #[must_use]
    pub fn new(client: ApiClient, url: String, local_user: String, order: FeedOrder) -> Self {
        Self {
            client,
            url,
            local_user,
            order,
        }
    }
}

#[async_trait]
impl ItemSource for TimelineSource {
    fn name(&self) -> &str {
        "timeline"
    }

    async fn fetch(&self, cutoff: DateTime<Utc>) -> FetchOutcome {
        let body = match self.client.get_json(&self.url, &[]).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(source = "timeline", error = %e, "Fetch failed");
                return FetchOutcome::failed(e);
            }
        };

        match EntryParser::timeline(&body) {
            Ok(page) => page_outcome(page, cutoff, self.order, &self.local_user),
            Err(reason) => {
                tracing::warn!(source = "timeline", %reason, "Unexpected response shape");
                FetchOutcome::failed(FetchError::Malformed {
                    url: self.url.clone(),
                    reason,
                })
            }
        }
    }
}

/// Saved-search source; each query is fetched independently.
pub struct SearchSource {
    client: ApiClient,
    url: String,
    queries: Vec<String>,
    local_user: String,
    order: FeedOrder,
}

impl SearchSource {
    #[must_use]
    pub fn new(
        client: ApiClient,
        url: String,
        queries: Vec<String>,
        local_user: String,
        order: FeedOrder,
    ) -> Self {
        Self {
            client,
            url,
            queries,
            local_user,
            order,
        }
    }

    async fn fetch_query(&self, query: &str, cutoff: DateTime<Utc>) -> FetchOutcome {
        let body = match self.client.get_json(&self.url, &[("q", query)]).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(source = "search", query, error = %e, "Fetch failed");
                return FetchOutcome::failed(e);
            }
        };

        match EntryParser::search(&body) {
            Ok(page) => page_outcome(page, cutoff, self.order, &self.local_user),
            Err(reason) => {
                tracing::warn!(source = "search", query, %reason, "Unexpected response shape");
                FetchOutcome::failed(FetchError::Malformed {
                    url: self.url.clone(),
                    reason,
                })
            }
        }
    }
}

#[async_trait]
impl ItemSource for SearchSource {
    fn name(&self) -> &str {
        "search"
    }

    async fn fetch(&self, cutoff: DateTime<Utc>) -> FetchOutcome {
        let mut outcome = FetchOutcome::default();

        for query in &self.queries {
            let result = self.fetch_query(query, cutoff).await;
            if result.items.is_empty() {
                tracing::debug!(query = %query, "No new search results");
            }
            outcome.absorb(result);
        }

        outcome
    }
}
