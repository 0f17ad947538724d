//! Merge fetched items into delivery order.

use super::types::Item;

/// Combine timeline and search results, oldest first.
///
/// The sort is stable, so items sharing a timestamp keep fetch order
/// (timeline before search).
pub fn merge(timeline: Vec<Item>, search: Vec<Item>) -> Vec<Item> {
    let mut merged = timeline;
    merged.extend(search);
    merged.sort_by_key(Item::created_at);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    fn timeline(handle: &str, millis: i64) -> Item {
        Item::from_timeline(String::new(), Some(1), handle.to_string(), None, at(millis))
    }

    fn search(handle: &str, millis: i64) -> Item {
        Item::from_search(String::new(), handle.to_string(), None, at(millis))
    }

    #[test]
    fn test_merge_interleaves_chronologically() {
        // Timeline arrives newest first, as upstream returns it.
        let merged = merge(
            vec![timeline("a", 2_000), timeline("a", 1_000)],
            vec![search("b", 1_500)],
        );

        let order: Vec<i64> = merged.iter().map(|i| i.created_at().timestamp_millis()).collect();
        assert_eq!(order, vec![1_000, 1_500, 2_000]);
    }

    #[test]
    fn test_merge_keeps_every_item() {
        let tl: Vec<Item> = (0..7).map(|i| timeline("a", (i * 37) % 11)).collect();
        let sr: Vec<Item> = (0..5).map(|i| search("b", (i * 13) % 7)).collect();

        let merged = merge(tl, sr);

        assert_eq!(merged.len(), 12);
        assert!(merged.windows(2).all(|w| w[0].created_at() <= w[1].created_at()));
    }

    #[test]
    fn test_merge_is_stable_for_ties() {
        let merged = merge(vec![timeline("first", 10)], vec![search("second", 10)]);
        assert_eq!(merged[0].author_handle(), "first");
        assert_eq!(merged[1].author_handle(), "second");
    }

    #[test]
    fn test_merge_empty_inputs() {
        assert!(merge(Vec::new(), Vec::new()).is_empty());
    }
}
