//! Posts and pages.

use super::{TagList, null_as_default};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, ops::Deref};

/// A single content unit. A page is a post with `page = true`:
/// it is reachable by slug but kept out of blog listings and feeds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    pub title: String,

    /// Slug, the URL path segment the post is served under.
    pub url: String,

    pub canonical: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,

    /// Publication date, the primary sort key.
    pub timestamp: DateTime<Utc>,

    pub lang: String,

    /// Raw markdown.
    pub content: String,

    pub published: bool,
    pub page: bool,

    #[serde(deserialize_with = "null_as_default")]
    pub tags: TagList,
}

impl Post {
    /// Newest first, then by title (ordinal) so equal timestamps still sort totally.
    pub fn compare(&self, other: &Self) -> Ordering {
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| self.title.cmp(&other.title))
    }
}

/// A post together with its storage ID.
#[derive(Debug, Clone, PartialEq)]
pub struct PostWithId {
    pub id: String,
    pub post: Post,
}

impl PostWithId {
    /// Same order as [`Post::compare`], with the ID as the final tie-breaker.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.post
            .compare(&other.post)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl Deref for PostWithId {
    type Target = Post;

    fn deref(&self) -> &Post {
        &self.post
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn post(title: &str, day: u32) -> Post {
        Post {
            title: title.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, day, 0, 0, 0).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn test_compare_equal() {
        assert_eq!(Post::default().compare(&Post::default()), Ordering::Equal);
        assert_eq!(post("foo", 26).compare(&post("foo", 26)), Ordering::Equal);
    }

    #[test]
    fn test_compare_title_on_equal_timestamp() {
        assert_eq!(post("1", 26).compare(&post("2", 26)), Ordering::Less);
        assert_eq!(post("2", 26).compare(&post("1", 26)), Ordering::Greater);
    }

    #[test]
    fn test_compare_newest_first() {
        assert_eq!(post("1", 25).compare(&post("2", 26)), Ordering::Greater);
        assert_eq!(post("2", 26).compare(&post("1", 25)), Ordering::Less);
    }

    #[test]
    fn test_compare_title_is_ordinal() {
        // Uppercase sorts before lowercase in byte order
        assert_eq!(post("Zed", 26).compare(&post("alpha", 26)), Ordering::Less);
    }

    #[test]
    fn test_with_id_breaks_ties_on_id() {
        let a = PostWithId { id: "a".into(), post: post("same", 26) };
        let b = PostWithId { id: "b".into(), post: post("same", 26) };
        assert_eq!(a.compare(&b), Ordering::Less);
        assert_eq!(a.title, "same");
    }

    #[test]
    fn test_decode_null_tags() {
        let post: Post = serde_json::from_str(r#"{"title":"x","tags":null}"#).unwrap();
        assert!(post.tags.is_empty());
    }

    #[test]
    fn test_decode_go_zero_time() {
        let post: Post =
            serde_json::from_str(r#"{"timestamp":"0001-01-01T00:00:00Z","published":true}"#)
                .unwrap();
        assert!(post.published);
        assert_eq!(post.timestamp.to_rfc3339(), "0001-01-01T00:00:00+00:00");
    }
}
