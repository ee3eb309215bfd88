//! Pure pagination over an ordered collection: the query layer counts and
//! slices, this module decides which page that slice is.

use serde::Serialize;
use std::{fmt::Display, num::NonZeroU64};

/// Fixed page size for the post list.
pub const POSTS_PER_PAGE: NonZeroU64 = NonZeroU64::new(4).unwrap();
/// Fixed page size for a post's comment thread.
pub const COMMENTS_PER_PAGE: NonZeroU64 = NonZeroU64::new(5).unwrap();
/// How many most-commented posts the sidebar shows.
pub const POPULAR_POSTS_COUNT: u64 = 5;

/// A 1-based page number.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct PageNumber(u64);

impl PageNumber {
    pub const FIRST: Self = Self(1);

    #[must_use]
    pub fn new(number: u64) -> Option<Self> {
        (number >= 1).then_some(Self(number))
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }

    /// Lenient request-parameter parse: a missing, non-numeric, or
    /// below-range value resolves to the first page. Clamping against the
    /// upper bound happens in [`Pagination::clamp`] once the total is known.
    #[must_use]
    pub fn from_param(raw: Option<&str>) -> Self {
        raw.and_then(|raw| raw.trim().parse().ok())
            .and_then(Self::new)
            .unwrap_or(Self::FIRST)
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

impl Display for PageNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// The resolved position of one page within a counted collection. An empty
/// collection still forms a single empty page.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct Pagination {
    number: PageNumber,
    per_page: NonZeroU64,
    total_items: u64,
    total_pages: u64,
}

impl Pagination {
    /// Clamps `requested` to the valid range for `total_items`: a request
    /// past the end lands on the last page.
    #[must_use]
    pub fn clamp(requested: PageNumber, per_page: NonZeroU64, total_items: u64) -> Self {
        let total_pages = total_items.div_ceil(per_page.get()).max(1);
        let number = PageNumber(requested.get().min(total_pages));

        Self {
            number,
            per_page,
            total_items,
            total_pages,
        }
    }

    #[must_use]
    pub fn number(self) -> PageNumber {
        self.number
    }

    #[must_use]
    pub fn total_items(self) -> u64 {
        self.total_items
    }

    #[must_use]
    pub fn total_pages(self) -> u64 {
        self.total_pages
    }

    #[must_use]
    pub fn offset(self) -> u64 {
        (self.number.get() - 1) * self.per_page.get()
    }

    #[must_use]
    pub fn limit(self) -> u64 {
        self.per_page.get()
    }

    #[must_use]
    pub fn has_previous(self) -> bool {
        self.number.get() > 1
    }

    #[must_use]
    pub fn has_next(self) -> bool {
        self.number.get() < self.total_pages
    }
}

/// One rendered page of items plus the pager state the client needs to build
/// page links.
#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: PageNumber,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(pagination: Pagination, items: Vec<T>) -> Self {
        Self {
            items,
            number: pagination.number(),
            per_page: pagination.limit(),
            total_items: pagination.total_items(),
            total_pages: pagination.total_pages(),
            has_previous: pagination.has_previous(),
            has_next: pagination.has_next(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::pager::{POSTS_PER_PAGE, Page, PageNumber, Pagination};
    use std::num::NonZeroU64;

    #[test]
    fn page_number_param_is_lenient() {
        assert_eq!(PageNumber::from_param(None), PageNumber::FIRST);
        assert_eq!(PageNumber::from_param(Some("")), PageNumber::FIRST);
        assert_eq!(PageNumber::from_param(Some("abc")), PageNumber::FIRST);
        assert_eq!(PageNumber::from_param(Some("0")), PageNumber::FIRST);
        assert_eq!(PageNumber::from_param(Some("-3")), PageNumber::FIRST);
        assert_eq!(PageNumber::from_param(Some(" 2 ")), PageNumber::new(2).unwrap());
        assert_eq!(PageNumber::from_param(Some("17")), PageNumber::new(17).unwrap());
    }

    #[test]
    fn five_items_make_two_pages_of_four() {
        let pagination = Pagination::clamp(PageNumber::new(2).unwrap(), POSTS_PER_PAGE, 5);

        assert_eq!(pagination.number().get(), 2);
        assert_eq!(pagination.total_pages(), 2);
        assert_eq!(pagination.offset(), 4);
        assert_eq!(pagination.limit(), 4);
        assert!(pagination.has_previous());
        assert!(!pagination.has_next());
    }

    #[test]
    fn out_of_range_request_clamps_to_last_page() {
        let pagination = Pagination::clamp(PageNumber::new(99).unwrap(), POSTS_PER_PAGE, 5);

        assert_eq!(pagination.number().get(), 2);
        assert_eq!(pagination.offset(), 4);
    }

    #[test]
    fn empty_collection_still_forms_one_page() {
        let pagination = Pagination::clamp(PageNumber::FIRST, POSTS_PER_PAGE, 0);

        assert_eq!(pagination.number(), PageNumber::FIRST);
        assert_eq!(pagination.total_pages(), 1);
        assert_eq!(pagination.offset(), 0);
        assert!(!pagination.has_previous());
        assert!(!pagination.has_next());
    }

    #[test]
    fn exact_multiple_has_no_overflow_page() {
        let pagination = Pagination::clamp(PageNumber::new(3).unwrap(), POSTS_PER_PAGE, 8);

        assert_eq!(pagination.total_pages(), 2);
        assert_eq!(pagination.number().get(), 2);
    }

    #[test]
    fn page_carries_pager_state() {
        let per_page = NonZeroU64::new(2).unwrap();
        let pagination = Pagination::clamp(PageNumber::FIRST, per_page, 3);
        let page = Page::new(pagination, vec!["a", "b"]);

        assert_eq!(page.items, vec!["a", "b"]);
        assert_eq!(page.number, PageNumber::FIRST);
        assert_eq!(page.total_items, 3);
        assert_eq!(page.total_pages, 2);
        assert!(!page.has_previous);
        assert!(page.has_next);
        assert!(!page.is_empty());
    }
}
