//! Crawl-scoped set of visited URLs

use crate::url::strip_fragment;
use std::collections::HashSet;

/// Dedup set of fragment-stripped URLs for one crawl
///
/// The set only ever grows: once a URL is marked it stays marked for the
/// lifetime of the crawl that owns it. There is no TTL and no ranking.
#[derive(Debug, Default, Clone)]
pub struct VisitedSet {
    urls: HashSet<String>,
}

impl VisitedSet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the key under which `url` is tracked
    ///
    /// Anchor variants of one page collapse to a single key.
    pub fn normalize(url: &str) -> String {
        strip_fragment(url)
    }

    /// Returns true if `url` (or any of its anchor variants) was marked
    pub fn is_visited(&self, url: &str) -> bool {
        self.urls.contains(&Self::normalize(url))
    }

    /// Marks `url` as visited
    ///
    /// Returns true if the URL was not already present.
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.urls.insert(Self::normalize(url))
    }

    /// Number of distinct URLs marked so far
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Iterates over the normalized keys in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }
}
