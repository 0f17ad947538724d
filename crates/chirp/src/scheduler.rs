//! Delivery scheduler.
//!
//! Drives the fetch → drain → wait cycle as an explicit state machine:
//!
//! ```text
//! Idle ──► Fetching ──► Draining ──► Waiting ──► Fetching ...
//!              │                        ▲
//!              └────── (nothing new) ───┘
//! ```
//!
//! [`DeliveryScheduler::step`] performs exactly one transition and tells the
//! caller when to call it again; [`DeliveryScheduler::run`] is the loop.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use notify::{Notification, Notifier};

use crate::classify::UrgencyClassifier;
use crate::error::CacheError;
use crate::storage::{AvatarCache, MetadataCache, Watermark, WatermarkStore};
use crate::timeline::{merge, Item, ItemSource};

/// Source of "now".
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Scheduler phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Fetching,
    Draining,
    Waiting,
}

/// When the next [`DeliveryScheduler::step`] is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Now,
    After(Duration),
}

/// Counters for one fetch-and-drain cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Items queued by the fetch.
    pub fetched: usize,
    /// Items handed to every channel without error.
    pub delivered: usize,
    /// Items at least one channel rejected.
    pub failed: usize,
    /// Delivered items flagged sticky.
    pub sticky: usize,
    /// Upstream requests that failed.
    pub fetch_failures: usize,
    /// Malformed upstream entries dropped.
    pub skipped: usize,
    /// Watermark after the fetch.
    pub watermark: Option<DateTime<Utc>>,
}

/// Everything the scheduler drives.
pub struct Components {
    pub timeline: Arc<dyn ItemSource>,
    pub search: Arc<dyn ItemSource>,
    pub store: WatermarkStore,
    pub metadata: MetadataCache,
    pub avatars: Option<AvatarCache>,
    pub classifier: UrgencyClassifier,
    pub notifier: Notifier,
}

pub struct DeliveryScheduler {
    state: SchedulerState,
    timeline: Arc<dyn ItemSource>,
    search: Arc<dyn ItemSource>,
    store: WatermarkStore,
    watermark: Watermark,
    queue: VecDeque<Item>,
    metadata: MetadataCache,
    avatars: Option<AvatarCache>,
    classifier: UrgencyClassifier,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
    tick_interval: Duration,
    min_poll_interval: Duration,
    cycle: CycleReport,
}

impl DeliveryScheduler {
    /// Build a scheduler in [`SchedulerState::Idle`], loading the persisted
    /// watermark (or the default lookback when there is none).
    pub fn new(components: Components, clock: Arc<dyn Clock>) -> Result<Self> {
        let watermark = components
            .store
            .load_or_initial(clock.now())
            .context("Failed to load watermark")?;

        info!(watermark = %watermark.at(), "Scheduler initialized");

        Ok(Self {
            state: SchedulerState::Idle,
            timeline: components.timeline,
            search: components.search,
            store: components.store,
            watermark,
            queue: VecDeque::new(),
            metadata: components.metadata,
            avatars: components.avatars,
            classifier: components.classifier,
            notifier: components.notifier,
            clock,
            tick_interval: Duration::from_secs(crate::config::DEFAULT_TICK_INTERVAL_SECS),
            min_poll_interval: Duration::from_secs(crate::config::DEFAULT_MIN_POLL_INTERVAL_SECS),
            cycle: CycleReport::default(),
        })
    }

    /// Override the tick and minimum poll intervals.
    #[must_use]
    pub fn with_intervals(mut self, tick: Duration, min_poll: Duration) -> Self {
        self.tick_interval = tick;
        self.min_poll_interval = min_poll;
        self
    }

    pub const fn state(&self) -> SchedulerState {
        self.state
    }

    pub const fn watermark(&self) -> Watermark {
        self.watermark
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Perform one state transition.
    ///
    /// Errors are fatal: they mean persisted state could not be written.
    pub async fn step(&mut self) -> Result<Wake> {
        match self.state {
            SchedulerState::Idle => {
                self.state = SchedulerState::Fetching;
                Ok(Wake::Now)
            }
            SchedulerState::Fetching => self.fetch().await,
            SchedulerState::Draining => self.drain_one().await,
            SchedulerState::Waiting => Ok(self.wait()),
        }
    }

    /// Run until `cancel` fires. Any queued items are dropped on cancellation.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<()> {
        info!(
            tick_secs = self.tick_interval.as_secs_f64(),
            min_poll_secs = self.min_poll_interval.as_secs_f64(),
            channels = self.notifier.channel_count(),
            "Starting delivery scheduler"
        );
        if !self.notifier.has_channels() {
            warn!("No notification channels enabled, items will be consumed silently");
        }

        loop {
            let wake = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                wake = self.step() => wake?,
            };

            if let Wake::After(delay) = wake {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(delay) => {}
                }
            }
        }

        info!(dropped = self.queue.len(), "Scheduler cancelled");
        self.queue.clear();
        Ok(())
    }

    /// One fetch followed by draining the whole queue at the tick cadence.
    pub async fn run_once(&mut self) -> Result<CycleReport> {
        self.state = SchedulerState::Fetching;
        let mut wake = self.step().await?;

        while self.state == SchedulerState::Draining {
            if let Wake::After(delay) = wake {
                tokio::time::sleep(delay).await;
            }
            wake = self.step().await?;
        }

        Ok(self.cycle.clone())
    }

    async fn fetch(&mut self) -> Result<Wake> {
        let cutoff = self.watermark.at();
        debug!(%cutoff, "Fetching new items");

        let timeline = self.timeline.fetch(cutoff).await;
        let search = self.search.fetch(cutoff).await;

        for (source, outcome) in [(&self.timeline, &timeline), (&self.search, &search)] {
            if outcome.is_degraded() {
                warn!(
                    source = source.name(),
                    failures = outcome.failures.len(),
                    "Source degraded this cycle"
                );
            }
        }

        let fetch_failures = timeline.failures.len() + search.failures.len();
        let skipped = timeline.skipped + search.skipped;
        let merged = merge(timeline.items, search.items);

        self.watermark.advance(&merged, self.clock.now());
        self.store
            .save(&self.watermark)
            .context("Failed to persist watermark")?;

        self.cycle = CycleReport {
            fetched: merged.len(),
            fetch_failures,
            skipped,
            watermark: Some(self.watermark.at()),
            ..CycleReport::default()
        };

        info!(
            queued = merged.len(),
            fetch_failures,
            skipped,
            watermark = %self.watermark.at(),
            "Fetch complete"
        );

        self.queue = merged.into();
        if self.queue.is_empty() {
            self.state = SchedulerState::Waiting;
            Ok(Wake::Now)
        } else {
            self.state = SchedulerState::Draining;
            Ok(Wake::After(self.tick_interval))
        }
    }

    async fn drain_one(&mut self) -> Result<Wake> {
        if let Some(item) = self.queue.pop_front() {
            self.deliver(item).await?;
        }

        if self.queue.is_empty() {
            info!(
                delivered = self.cycle.delivered,
                failed = self.cycle.failed,
                sticky = self.cycle.sticky,
                "Queue drained"
            );
            self.state = SchedulerState::Waiting;
            Ok(Wake::Now)
        } else {
            Ok(Wake::After(self.tick_interval))
        }
    }

    async fn deliver(&mut self, mut item: Item) -> Result<(), CacheError> {
        if item.author_metadata().is_none() {
            let key = item.author_key();
            match self.metadata.lookup(&key).await {
                Ok(metadata) => item.attach_metadata(metadata),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!(author = %key, error = %e, "Author metadata unavailable"),
            }
        }

        let urgency = self.classifier.classify(&item, item.author_metadata());

        let icon = match (&self.avatars, item.avatar_url()) {
            (Some(avatars), Some(url)) => avatars.resolve(url).await,
            _ => None,
        };

        let notification = Notification {
            category: item.source_kind().category(),
            title: item.author_handle().to_string(),
            body: item.decoded_text(),
            click_context: item.author_handle().to_string(),
            sticky: urgency.sticky,
            priority: urgency.priority,
            icon,
        };

        let mut ok = true;
        for (channel, result) in self.notifier.deliver(&notification).await {
            if let Err(e) = result {
                error!(channel, author = %notification.title, error = %e, "Notification failed");
                ok = false;
            }
        }

        debug!(
            author = %notification.title,
            created_at = %item.created_at(),
            sticky = urgency.sticky,
            ok,
            "Delivered item"
        );

        if ok {
            self.cycle.delivered += 1;
            if urgency.sticky {
                self.cycle.sticky += 1;
            }
        } else {
            self.cycle.failed += 1;
        }
        Ok(())
    }

    fn wait(&mut self) -> Wake {
        // A watermark in the future counts as zero elapsed time.
        let elapsed = (self.clock.now() - self.watermark.at())
            .to_std()
            .unwrap_or(Duration::ZERO);
        let remaining = self.min_poll_interval.saturating_sub(elapsed);

        if remaining.is_zero() {
            self.state = SchedulerState::Fetching;
            Wake::Now
        } else {
            debug!(remaining_secs = remaining.as_secs_f64(), "Waiting before next fetch");
            Wake::After(remaining)
        }
    }
}
