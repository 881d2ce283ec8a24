use std::fmt;

/// Page index meaning "not yet initialized, defer the request".
pub const UNINITIALIZED_PAGE: i64 = -1;
pub const MAX_PAGE_SIZE: i64 = 1000;
pub const DEFAULT_PAGE_SIZE: i64 = 25;

/// Free-text filter. Empty means "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterState(String);

impl FilterState {
    pub fn new(text: impl Into<String>) -> Self {
        FilterState(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filter text with surrounding whitespace removed. This is what the
    /// backend sees.
    pub fn term(&self) -> &str {
        self.0.trim()
    }

    pub fn is_empty(&self) -> bool {
        self.term().is_empty()
    }
}

impl fmt::Display for FilterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a pagination setter, so callers know whether anything that
/// depends on the filter has to be invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationChange {
    Unchanged,
    Page,
    PageSize,
    Filter,
}

/// `(page_index, page_size, filter)` as one value.
///
/// Setters never fail: out-of-range input is clamped to the nearest valid
/// value. Changing the page size or the filter sends the user back to the
/// first page; an uninitialized state stays uninitialized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaginationState {
    page_index: i64,
    page_size: i64,
    filter: FilterState,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::uninitialized(DEFAULT_PAGE_SIZE)
    }
}

impl PaginationState {
    pub fn new(page_index: i64, page_size: i64) -> Self {
        Self {
            page_index: clamp_page_index(page_index),
            page_size: clamp_page_size(page_size),
            filter: FilterState::default(),
        }
    }

    pub fn uninitialized(page_size: i64) -> Self {
        Self::new(UNINITIALIZED_PAGE, page_size)
    }

    pub fn page_index(&self) -> i64 {
        self.page_index
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn is_initialized(&self) -> bool {
        self.page_index != UNINITIALIZED_PAGE
    }

    /// Number of pages needed for `total_rows` (at least one).
    pub fn page_count(&self, total_rows: u64) -> i64 {
        let page_size = u64::try_from(self.page_size).unwrap_or(1).max(1);
        let pages = total_rows.div_ceil(page_size).max(1);
        i64::try_from(pages).unwrap_or(i64::MAX)
    }

    pub fn set_page(&mut self, index: i64) -> PaginationChange {
        let index = clamp_page_index(index);
        if index == self.page_index {
            return PaginationChange::Unchanged;
        }
        self.page_index = index;
        PaginationChange::Page
    }

    pub fn set_page_size(&mut self, size: i64) -> PaginationChange {
        let size = clamp_page_size(size);
        if size == self.page_size {
            return PaginationChange::Unchanged;
        }
        self.page_size = size;
        self.rewind();
        PaginationChange::PageSize
    }

    pub fn set_filter(&mut self, text: &str) -> PaginationChange {
        if text == self.filter.as_str() {
            return PaginationChange::Unchanged;
        }
        let semantic_change = text.trim() != self.filter.term();
        self.filter = FilterState::new(text);
        if !semantic_change {
            // Whitespace-only edits keep the same query.
            return PaginationChange::Unchanged;
        }
        self.rewind();
        PaginationChange::Filter
    }

    /// Back to the first page, unless the request is still deferred.
    pub fn rewind(&mut self) {
        if self.is_initialized() {
            self.page_index = 0;
        }
    }
}

fn clamp_page_index(index: i64) -> i64 {
    index.max(UNINITIALIZED_PAGE)
}

fn clamp_page_size(size: i64) -> i64 {
    size.clamp(1, MAX_PAGE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_clamp_invalid_input() {
        let mut state = PaginationState::new(0, 10);

        state.set_page(-7);
        assert_eq!(state.page_index(), UNINITIALIZED_PAGE);

        state.set_page_size(0);
        assert_eq!(state.page_size(), 1);

        state.set_page_size(-3);
        assert_eq!(state.page_size(), 1);

        state.set_page_size(50_000);
        assert_eq!(state.page_size(), MAX_PAGE_SIZE);
    }

    #[test]
    fn page_size_change_resets_to_first_page() {
        let mut state = PaginationState::new(4, 10);

        let change = state.set_page_size(25);

        assert_eq!(change, PaginationChange::PageSize);
        assert_eq!(state.page_index(), 0);
        assert_eq!(state.page_size(), 25);
    }

    #[test]
    fn page_size_change_keeps_deferred_state() {
        let mut state = PaginationState::uninitialized(10);

        state.set_page_size(50);

        assert!(!state.is_initialized());
    }

    #[test]
    fn same_page_size_is_unchanged_and_keeps_page() {
        let mut state = PaginationState::new(3, 10);

        assert_eq!(state.set_page_size(10), PaginationChange::Unchanged);
        assert_eq!(state.page_index(), 3);
    }

    #[test]
    fn filter_change_rewinds_and_reports() {
        let mut state = PaginationState::new(2, 10);

        assert_eq!(state.set_filter("bolt"), PaginationChange::Filter);
        assert_eq!(state.page_index(), 0);
        assert_eq!(state.filter().term(), "bolt");
    }

    #[test]
    fn whitespace_only_filter_edit_is_not_a_query_change() {
        let mut state = PaginationState::new(2, 10);
        state.set_filter("bolt");
        state.set_page(2);

        assert_eq!(state.set_filter("bolt "), PaginationChange::Unchanged);
        assert_eq!(state.page_index(), 2);
        assert_eq!(state.filter().as_str(), "bolt ");
    }

    #[test]
    fn page_count_rounds_up() {
        let state = PaginationState::new(0, 10);

        assert_eq!(state.page_count(0), 1);
        assert_eq!(state.page_count(10), 1);
        assert_eq!(state.page_count(11), 2);
    }

    #[test]
    fn page_count_does_not_overflow_on_huge_totals() {
        let tens = PaginationState::new(0, 10);
        let ones = PaginationState::new(0, 1);

        assert_eq!(tens.page_count(i64::MAX as u64), i64::MAX / 10 + 1);
        assert_eq!(tens.page_count(u64::MAX), 1_844_674_407_370_955_162);
        assert_eq!(ones.page_count(u64::MAX), i64::MAX);
    }
}
