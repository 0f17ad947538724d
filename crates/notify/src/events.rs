//! Notification payload types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Where a notified item came from.
///
/// Desktop notifiers use this as the application/category name so that
/// timeline and search alerts can be configured separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// An item from the home timeline
    Timeline,
    /// An item matched by a saved search
    Search,
}

impl Category {
    /// Get display name for this category.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Timeline => "Timeline",
            Self::Search => "Search",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Normal delivery
    #[default]
    Normal,
    /// Urgent delivery
    High,
}

impl Priority {
    /// Urgency name understood by freedesktop notification daemons.
    #[must_use]
    pub const fn urgency(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::High => "critical",
        }
    }

    /// Get the Slack attachment color for this priority.
    #[must_use]
    pub const fn color(&self) -> &'static str {
        match self {
            Self::Normal => "#3498db", // Blue
            Self::High => "#e74c3c",   // Red
        }
    }
}

/// A single notification ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Notification category (source of the item).
    pub category: Category,
    /// Title line, usually the author handle.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Context resolved on click; the author handle.
    pub click_context: String,
    /// Whether the notification should stay until dismissed.
    pub sticky: bool,
    /// Delivery priority.
    pub priority: Priority,
    /// Local path of the icon image, if one could be resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<PathBuf>,
}

impl Notification {
    /// Resolve the click context into a profile URL under `profile_base`.
    #[must_use]
    pub fn click_url(&self, profile_base: &str) -> String {
        format!(
            "{}/{}",
            profile_base.trim_end_matches('/'),
            self.click_context.trim_start_matches('@')
        )
    }
}
