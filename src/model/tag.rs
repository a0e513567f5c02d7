//! Post tags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};

/// A tag name plus the time it was first assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    pub name: String,
    pub timestamp: DateTime<Utc>,
}

impl Tag {
    /// Case-insensitive ordering by name.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.name.to_lowercase().cmp(&other.name.to_lowercase())
    }
}

/// Ordered list of tags attached to a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagList(pub Vec<Tag>);

impl TagList {
    /// Parse a comma-separated tag field, e.g. `"rust, web"`.
    ///
    /// Every tag is stamped with the same `now`. Blank input yields an empty list.
    pub fn parse(s: &str) -> Self {
        Self::parse_at(s, Utc::now())
    }

    pub fn parse_at(s: &str, now: DateTime<Utc>) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Self::default();
        }

        let tags = trimmed
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| Tag {
                name: name.to_owned(),
                timestamp: now,
            })
            .collect();
        Self(tags)
    }

    /// Parse an edited tag field, keeping the original timestamp of tags
    /// that were already on the list.
    pub fn reparse(&self, s: &str) -> Self {
        let mut list = Self::parse(s);
        for tag in &mut list.0 {
            if let Some(old) = self.0.iter().find(|t| t.name == tag.name) {
                tag.timestamp = old.timestamp;
            }
        }
        list
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether any tag matches `name` exactly.
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|t| t.name == name)
    }
}

impl fmt::Display for TagList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tag) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(&tag.name)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a TagList {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
