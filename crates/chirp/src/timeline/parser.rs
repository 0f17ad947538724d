//! Upstream JSON parsing.
//!
//! Malformed entries are skipped one by one; only a wrong top-level shape
//! fails the whole page.

use serde::Deserialize;
use serde_json::Value;

use super::timestamp;
use super::types::Item;

/// Items parsed from one response body.
#[derive(Debug, Default)]
pub struct ParsedPage {
    /// Items in upstream order.
    pub items: Vec<Item>,
    /// Entries dropped for missing or invalid fields.
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
struct TimelineStatus {
    text: String,
    created_at: String,
    user: TimelineUser,
}

#[derive(Debug, Deserialize)]
struct TimelineUser {
    #[serde(default)]
    id: Option<u64>,
    screen_name: String,
    #[serde(default)]
    profile_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    text: String,
    created_at: String,
    from_user: String,
    #[serde(default)]
    profile_image_url: Option<String>,
}

/// Parser for timeline and search responses.
pub struct EntryParser;

impl EntryParser {
    /// Parse a home timeline response: a JSON array of statuses.
    pub fn timeline(body: &Value) -> Result<ParsedPage, String> {
        let entries = body
            .as_array()
            .ok_or_else(|| "expected a JSON array of statuses".to_string())?;

        Ok(Self::collect(entries, |entry| {
            let status: TimelineStatus = serde_json::from_value(entry.clone()).ok()?;
            let created_at = timestamp::parse(&status.created_at)?;
            Some(Item::from_timeline(
                status.text,
                status.user.id,
                status.user.screen_name,
                status.user.profile_image_url,
                created_at,
            ))
        }))
    }

    /// Parse a search response.
    ///
    /// Accepts the legacy `{"results": [...]}` page and the v1.1
    /// `{"statuses": [...]}` page. Neither carries an author id.
    pub fn search(body: &Value) -> Result<ParsedPage, String> {
        if let Some(entries) = body.get("results").and_then(Value::as_array) {
            return Ok(Self::collect(entries, |entry| {
                let result: SearchResult = serde_json::from_value(entry.clone()).ok()?;
                let created_at = timestamp::parse(&result.created_at)?;
                Some(Item::from_search(
                    result.text,
                    result.from_user,
                    result.profile_image_url,
                    created_at,
                ))
            }));
        }

        let entries = body
            .get("statuses")
            .and_then(Value::as_array)
            .ok_or_else(|| "expected an object with a 'results' or 'statuses' array".to_string())?;

        Ok(Self::collect(entries, |entry| {
            let status: TimelineStatus = serde_json::from_value(entry.clone()).ok()?;
            let created_at = timestamp::parse(&status.created_at)?;
            Some(Item::from_search(
                status.text,
                status.user.screen_name,
                status.user.profile_image_url,
                created_at,
            ))
        }))
    }

    fn collect(entries: &[Value], parse: impl Fn(&Value) -> Option<Item>) -> ParsedPage {
        let mut page = ParsedPage::default();

        for entry in entries {
            match parse(entry) {
                Some(item) if !item.author_handle().is_empty() => page.items.push(item),
                _ => {
                    tracing::debug!(entry = %entry, "Skipping malformed entry");
                    page.skipped += 1;
                }
            }
        }

        page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::SourceKind;
    use serde_json::json;

    #[test]
    fn test_parse_timeline() {
        let body = json!([
            {
                "text": "second",
                "created_at": "Wed Aug 27 13:08:46 +0000 2008",
                "user": {"id": 12, "screen_name": "alice", "profile_image_url": "http://img/a.png"}
            },
            {
                "text": "first",
                "created_at": "Wed Aug 27 13:08:45 +0000 2008",
                "user": {"id": 13, "screen_name": "bob"}
            }
        ]);

        let page = EntryParser::timeline(&body).unwrap();
        assert_eq!(page.skipped, 0);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].text(), "second");
        assert_eq!(page.items[0].author_id(), Some(12));
        assert_eq!(page.items[0].avatar_url(), Some("http://img/a.png"));
        assert_eq!(page.items[0].source_kind(), SourceKind::FromTimeline);
        assert!(page.items[1].avatar_url().is_none());
    }

    #[test]
    fn test_parse_search() {
        let body = json!({
            "results": [{
                "text": "rust &amp; tokio",
                "created_at": "Wed, 27 Aug 2008 13:08:45 +0000",
                "from_user": "carol",
                "from_user_id": 99,
                "profile_image_url": "http://img/c.png"
            }]
        });

        let page = EntryParser::search(&body).unwrap();
        assert_eq!(page.items.len(), 1);
        let item = &page.items[0];
        assert_eq!(item.author_handle(), "carol");
        assert!(item.author_id().is_none());
        assert_eq!(item.source_kind(), SourceKind::FromSearch);
    }

    #[test]
    fn test_parse_search_statuses_page() {
        let body = json!({
            "statuses": [
                {
                    "text": "rust 1.90",
                    "created_at": "Wed Aug 27 13:08:45 +0000 2008",
                    "user": {"id": 99, "screen_name": "dana", "profile_image_url": "http://img/d.png"}
                },
                {"text": "no user", "created_at": "Wed Aug 27 13:08:45 +0000 2008"}
            ],
            "search_metadata": {"count": 2}
        });

        let page = EntryParser::search(&body).unwrap();
        assert_eq!(page.skipped, 1);
        assert_eq!(page.items.len(), 1);
        let item = &page.items[0];
        assert_eq!(item.author_handle(), "dana");
        assert!(item.author_id().is_none());
        assert_eq!(item.avatar_url(), Some("http://img/d.png"));
        assert_eq!(item.source_kind(), SourceKind::FromSearch);
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let body = json!([
            {"text": "no user", "created_at": "Wed Aug 27 13:08:45 +0000 2008"},
            {"text": "bad date", "created_at": "soon", "user": {"screen_name": "a"}},
            {"text": "empty handle", "created_at": "Wed Aug 27 13:08:45 +0000 2008", "user": {"screen_name": ""}},
            {"text": "ok", "created_at": "Wed Aug 27 13:08:45 +0000 2008", "user": {"screen_name": "a"}}
        ]);

        let page = EntryParser::timeline(&body).unwrap();
        assert_eq!(page.skipped, 3);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].text(), "ok");
    }

    #[test]
    fn test_wrong_shape_is_an_error() {
        assert!(EntryParser::timeline(&json!({"error": "nope"})).is_err());
        assert!(EntryParser::search(&json!([])).is_err());
        assert!(EntryParser::search(&json!({"errors": [{"code": 32}]})).is_err());
    }
}
