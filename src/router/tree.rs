//! Per-method route trie.
//!
//! A pattern is split on `/` into segments:
//!
//! ```text
//! /dashboard/posts/:id/delete
//!  └ Literal("dashboard") └ Literal("posts") └ Param("id") └ Literal("delete")
//!
//! /assets/*path
//!  └ Literal("assets") └ Wildcard("path")
//! ```
//!
//! Matching walks the trie one path segment at a time and tries, at each
//! depth, the literal child first, then parameter children in registration
//! order, then the wildcard. A branch that dead-ends further down falls back
//! to the next candidate at the same depth, so the most specific complete
//! match wins.

use super::Handler;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    /// `:name`, captures exactly one non-empty segment.
    Param(String),
    /// `*name`, captures the rest of the path (possibly nothing). Last only.
    Wildcard(String),
}

/// Compile a pattern into segments.
///
/// # Panics
///
/// On a wildcard that is not the last segment, or a parameter without a
/// name. Patterns are fixed at registration time, so this is a programming
/// error rather than a runtime condition.
pub fn parse_pattern(pattern: &str) -> Vec<Segment> {
    let raw: Vec<&str> = split_path(pattern).collect();
    let last = raw.len().saturating_sub(1);

    raw.iter()
        .enumerate()
        .map(|(i, s)| {
            if let Some(name) = s.strip_prefix(':') {
                assert!(!name.is_empty(), "unnamed parameter in route `{pattern}`");
                Segment::Param(name.to_owned())
            } else if let Some(name) = s.strip_prefix('*') {
                assert!(i == last, "wildcard must be the last segment in route `{pattern}`");
                Segment::Wildcard(name.to_owned())
            } else {
                Segment::Literal((*s).to_owned())
            }
        })
        .collect()
}

/// Path segments without the leading slash. `/` has no segments; a trailing
/// slash produces a final empty segment.
pub fn split_path(path: &str) -> impl Iterator<Item = &str> {
    let path = path.strip_prefix('/').unwrap_or(path);
    path.split('/').filter(move |_| !path.is_empty())
}

#[derive(Default)]
pub struct Node {
    literals: Vec<(String, Node)>,
    params: Vec<(String, Node)>,
    wildcard: Option<(String, Arc<dyn Handler>)>,
    handler: Option<Arc<dyn Handler>>,
}

pub type Captures = Vec<(String, String)>;

impl Node {
    /// Attach `handler` under `segments`. Returns `false` when the exact
    /// pattern already had a handler; the earlier one is kept.
    pub fn insert(&mut self, segments: &[Segment], handler: Arc<dyn Handler>) -> bool {
        let Some((first, rest)) = segments.split_first() else {
            if self.handler.is_some() {
                return false;
            }
            self.handler = Some(handler);
            return true;
        };

        match first {
            Segment::Literal(name) => child(&mut self.literals, name).insert(rest, handler),
            Segment::Param(name) => child(&mut self.params, name).insert(rest, handler),
            Segment::Wildcard(name) => {
                if self.wildcard.is_some() {
                    return false;
                }
                self.wildcard = Some((name.clone(), handler));
                true
            }
        }
    }

    /// Find the handler for `segments`, collecting captured parameters.
    pub fn find(&self, segments: &[&str]) -> Option<(Arc<dyn Handler>, Captures)> {
        let mut captures = Vec::new();
        let handler = self.find_inner(segments, &mut captures)?;
        Some((Arc::clone(handler), captures))
    }

    fn find_inner<'a>(&'a self, segments: &[&str], captures: &mut Captures) -> Option<&'a Arc<dyn Handler>> {
        let Some((first, rest)) = segments.split_first() else {
            if let Some(handler) = &self.handler {
                return Some(handler);
            }
            // `/assets/*path` also matches `/assets`
            return self.wildcard.as_ref().map(|(name, handler)| {
                captures.push((name.clone(), String::new()));
                handler
            });
        };

        if let Some((_, node)) = self.literals.iter().find(|(name, _)| name == first)
            && let Some(handler) = node.find_inner(rest, captures)
        {
            return Some(handler);
        }

        if !first.is_empty() {
            for (name, node) in &self.params {
                let mark = captures.len();
                captures.push((name.clone(), (*first).to_owned()));
                if let Some(handler) = node.find_inner(rest, captures) {
                    return Some(handler);
                }
                captures.truncate(mark);
            }
        }

        self.wildcard.as_ref().map(|(name, handler)| {
            captures.push((name.clone(), segments.join("/")));
            handler
        })
    }
}

fn child<'a>(children: &'a mut Vec<(String, Node)>, name: &str) -> &'a mut Node {
    let index = match children.iter().position(|(n, _)| n == name) {
        Some(index) => index,
        None => {
            children.push((name.to_owned(), Node::default()));
            children.len() - 1
        }
    };
    &mut children[index].1
}
