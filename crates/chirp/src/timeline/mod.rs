//! Timeline and search fetching.
//!
//! Provides the incremental fetchers, upstream parsing and merge ordering.

mod merge;
mod parser;
mod source;
pub mod timestamp;
mod types;

pub use merge::merge;
pub use parser::{EntryParser, ParsedPage};
pub use source::{select_new, FeedOrder, FetchOutcome, ItemSource, SearchSource, TimelineSource};
pub use types::{AuthorKey, Item, SourceKind};

pub(crate) use types::sanitize;
