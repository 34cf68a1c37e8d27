use memchr::memmem;

use crate::errors::{SearchError, SearchResult};

/// Counts literal occurrences of a keyword in raw bytes.
///
/// Matching is non-overlapping: after a hit the scan resumes at the end of the
/// match, so `"aa"` occurs twice in `"aaaa"` and once in `"aaa"`. The haystack
/// does not need to be valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatcher {
    pattern: String,
}

impl PatternMatcher {
    /// Creates a matcher for `pattern`. An empty pattern would match everywhere
    /// and is rejected.
    pub fn new(pattern: impl Into<String>) -> SearchResult<Self> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(SearchError::invalid_pattern("keyword must not be empty"));
        }
        Ok(Self { pattern })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Finds all non-overlapping matches as `(start, end)` byte ranges
    pub fn find_matches(&self, haystack: impl AsRef<[u8]>) -> Vec<(usize, usize)> {
        let needle = self.pattern.as_bytes();
        memmem::find_iter(haystack.as_ref(), needle)
            .map(|start| (start, start + needle.len()))
            .collect()
    }

    /// Number of non-overlapping matches in `haystack`
    pub fn count_matches(&self, haystack: impl AsRef<[u8]>) -> usize {
        memmem::find_iter(haystack.as_ref(), self.pattern.as_bytes()).count()
    }
}
