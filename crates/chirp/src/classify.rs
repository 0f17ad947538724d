//! Urgency classification for outgoing notifications.

use notify::Priority;

use crate::storage::AuthorMetadata;
use crate::timeline::Item;

/// How loudly an item should be announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Urgency {
    pub sticky: bool,
    pub priority: Priority,
}

impl Urgency {
    const fn from_sticky(sticky: bool) -> Self {
        Self {
            sticky,
            priority: if sticky { Priority::High } else { Priority::Normal },
        }
    }
}

/// Keyword and author based stickiness rules.
#[derive(Debug, Clone, Default)]
pub struct UrgencyClassifier {
    keywords: Vec<String>,
}

impl UrgencyClassifier {
    /// Build a classifier; keywords are matched case-insensitively as given,
    /// surrounding whitespace included. Blank ones are ignored.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().to_lowercase())
            .filter(|k| !k.trim().is_empty())
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Sticky when the decoded text contains a keyword or the author has
    /// notifications enabled.
    pub fn classify(&self, item: &Item, metadata: Option<&AuthorMetadata>) -> Urgency {
        let by_author = metadata.is_some_and(AuthorMetadata::notifications);
        if by_author {
            return Urgency::from_sticky(true);
        }

        if self.keywords.is_empty() {
            return Urgency::default();
        }

        let text = item.decoded_text().to_lowercase();
        let by_keyword = self.keywords.iter().any(|k| text.contains(k.as_str()));
        Urgency::from_sticky(by_keyword)
    }
}
