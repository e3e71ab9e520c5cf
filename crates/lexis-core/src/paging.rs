//! # Paging
//!
//! Listing and search results are cut into a window by the caller. The total
//! count always reflects the full result, not the window.

use crate::LexisError;
use crate::primitives::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use serde::Serialize;

/// Page size bounds, usually taken from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingLimits {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for PagingLimits {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_SIZE,
            max_limit: MAX_PAGE_SIZE,
        }
    }
}

/// A requested slice of a result sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start_index: usize,
    pub limit: usize,
}

impl Window {
    /// Build a window from optional request parameters.
    ///
    /// A missing limit takes the default; a limit above the maximum is
    /// clamped. A zero limit is rejected.
    pub fn resolve(
        start_index: Option<usize>,
        limit: Option<usize>,
        limits: PagingLimits,
    ) -> Result<Self, LexisError> {
        let limit = match limit {
            Some(0) => {
                return Err(LexisError::InvalidArgument(
                    "limit must be greater than zero".to_string(),
                ));
            }
            Some(n) => n.min(limits.max_limit),
            None => limits.default_limit.min(limits.max_limit),
        };
        Ok(Self {
            start_index: start_index.unwrap_or(0),
            limit,
        })
    }

    /// Cut `items` down to this window.
    #[must_use]
    pub fn apply<T>(self, items: Vec<T>) -> Page<T> {
        let total_count = items.len();
        let results: Vec<T> = items
            .into_iter()
            .skip(self.start_index)
            .take(self.limit)
            .collect();
        let has_more = self.start_index.saturating_add(results.len()) < total_count;
        Page {
            results,
            total_count,
            start_index: self.start_index,
            limit: self.limit,
            has_more,
        }
    }
}

impl Default for Window {
    fn default() -> Self {
        Self {
            start_index: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One window of results plus the size of the whole result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub results: Vec<T>,
    pub total_count: usize,
    pub start_index: usize,
    pub limit: usize,
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Convert every result, keeping the window metadata.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            results: self.results.into_iter().map(f).collect::<Result<_, _>>()?,
            total_count: self.total_count,
            start_index: self.start_index,
            limit: self.limit,
            has_more: self.has_more,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_defaults_and_clamps() {
        let limits = PagingLimits::default();
        let w = Window::resolve(None, None, limits).expect("window");
        assert_eq!(w, Window::default());

        let w = Window::resolve(Some(5), Some(10_000), limits).expect("window");
        assert_eq!(w.start_index, 5);
        assert_eq!(w.limit, MAX_PAGE_SIZE);

        assert!(Window::resolve(None, Some(0), limits).is_err());
    }

    #[test]
    fn apply_reports_full_total() {
        let page = Window { start_index: 20, limit: 10 }.apply((0..24).collect::<Vec<_>>());
        assert_eq!(page.results, vec![20, 21, 22, 23]);
        assert_eq!(page.total_count, 24);
        assert!(!page.has_more);

        let page = Window { start_index: 0, limit: 10 }.apply((0..24).collect::<Vec<_>>());
        assert!(page.has_more);
    }

    #[test]
    fn start_past_end_is_empty() {
        let page = Window { start_index: 100, limit: 10 }.apply(vec![1, 2, 3]);
        assert!(page.results.is_empty());
        assert_eq!(page.total_count, 3);
        assert!(!page.has_more);
    }
}
