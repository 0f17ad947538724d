//! Timeline and search watcher.
//!
//! This crate provides:
//! - Incremental fetching of the home timeline and saved searches
//! - Chronological merging of new items
//! - A durable author profile cache and avatar cache
//! - Keyword and author based urgency classification
//! - A delivery scheduler that paces notifications and persists its watermark

pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod storage;
pub mod timeline;

// Re-export main types
pub use classify::{Urgency, UrgencyClassifier};
pub use client::{ApiClient, Credentials};
pub use config::WatchConfig;
pub use error::{CacheError, FetchError, StoreError};
pub use scheduler::{
    Clock, Components, CycleReport, DeliveryScheduler, SchedulerState, SystemClock, Wake,
};
pub use storage::{AuthorMetadata, MetadataCache, Watermark, WatermarkStore};
pub use timeline::{AuthorKey, FeedOrder, FetchOutcome, Item, ItemSource, SourceKind};
