//! Page-number pagination for post listings.
//!
//! A [`PageWindow`] is computed from the total row count and the raw
//! `?page=` value before anything is fetched, so the query only loads the
//! rows of the selected page. Bad or out-of-range input is clamped rather
//! than rejected: a non-number means the first page, and anything past
//! either end means the last page.

use std::convert::Infallible;
use std::num::IntErrorKind;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use url::form_urlencoded;

/// Fixed page size of every post listing.
pub const POSTS_PER_PAGE: usize = 10;

/// `?page=` query parameter, kept raw so malformed values never reject the request.
#[derive(Debug, Default, Clone)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    /// Picks `page` out of a raw query string. A repeated key keeps its last value.
    pub fn from_query(query: Option<&str>) -> Self {
        let page = query.and_then(|q| {
            form_urlencoded::parse(q.as_bytes())
                .filter(|(key, _)| key == "page")
                .last()
                .map(|(_, value)| value.into_owned())
        });
        Self { page }
    }

    pub fn raw(&self) -> Option<&str> {
        self.page.as_deref()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for PageQuery {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_query(parts.uri.query()))
    }
}

/// The slice of a listing that a page number selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: usize,
    pub num_pages: usize,
    per_page: usize,
}

impl PageWindow {
    pub fn new(total: usize, per_page: usize, raw_page: Option<&str>) -> Self {
        let per_page = per_page.max(1);
        // An empty listing still renders one (empty) page.
        let num_pages = total.div_ceil(per_page).max(1);

        let number = match raw_page.map(str::trim).map(str::parse::<i64>) {
            None => 1,
            Some(Ok(n)) if n < 1 => num_pages,
            Some(Ok(n)) => usize::try_from(n).map_or(num_pages, |n| n.min(num_pages)),
            Some(Err(e))
                if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) =>
            {
                num_pages
            }
            Some(Err(_)) => 1,
        };

        Self {
            number,
            num_pages,
            per_page,
        }
    }

    pub fn offset(&self) -> usize {
        (self.number - 1) * self.per_page
    }

    pub fn limit(&self) -> usize {
        self.per_page
    }
}

/// A fetched page plus the metadata templates need for navigation.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow, total: usize) -> Self {
        Self {
            items,
            number: window.number,
            num_pages: window.num_pages,
            total,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_other_pages(&self) -> bool {
        self.num_pages > 1
    }

    pub fn previous_page_number(&self) -> usize {
        self.number.saturating_sub(1).max(1)
    }

    pub fn next_page_number(&self) -> usize {
        (self.number + 1).min(self.num_pages)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_reads_page_value() {
        assert_eq!(PageQuery::from_query(Some("page=3")).raw(), Some("3"));
        assert_eq!(PageQuery::from_query(Some("sort=new&page=%202")).raw(), Some(" 2"));
        assert_eq!(PageQuery::from_query(Some("sort=new")).raw(), None);
        assert_eq!(PageQuery::from_query(None).raw(), None);
    }

    #[test]
    fn repeated_page_key_keeps_last_value() {
        assert_eq!(PageQuery::from_query(Some("page=1&page=2")).raw(), Some("2"));
    }

    fn window(total: usize, raw: Option<&str>) -> PageWindow {
        PageWindow::new(total, POSTS_PER_PAGE, raw)
    }

    #[test]
    fn thirteen_items_split_ten_and_three() {
        let first = window(13, None);
        assert_eq!((first.number, first.num_pages), (1, 2));
        assert_eq!((first.offset(), first.limit()), (0, 10));

        let second = window(13, Some("2"));
        assert_eq!(second.number, 2);
        assert_eq!(second.offset(), 10);
        // 13 - 10 rows remain for the second page
        assert_eq!(13 - second.offset(), 3);
    }

    #[test]
    fn missing_or_garbage_page_is_first() {
        assert_eq!(window(30, None).number, 1);
        assert_eq!(window(30, Some("")).number, 1);
        assert_eq!(window(30, Some("abc")).number, 1);
        assert_eq!(window(30, Some("1.5")).number, 1);
    }

    #[test]
    fn out_of_range_page_clamps_to_last() {
        assert_eq!(window(13, Some("99")).number, 2);
        assert_eq!(window(13, Some("0")).number, 2);
        assert_eq!(window(13, Some("-3")).number, 2);
        assert_eq!(window(13, Some("99999999999999999999")).number, 2);
    }

    #[test]
    fn empty_listing_has_one_page() {
        let w = window(0, Some("5"));
        assert_eq!((w.number, w.num_pages, w.offset()), (1, 1, 0));
    }

    #[test]
    fn exact_multiple_has_no_trailing_page() {
        assert_eq!(window(20, None).num_pages, 2);
        assert_eq!(window(21, None).num_pages, 3);
    }

    #[test]
    fn page_navigation_flags() {
        let w = window(25, Some("2"));
        let page = Page::new(vec![0u8; 10], w, 25);
        assert!(page.has_previous());
        assert!(page.has_next());
        assert!(page.has_other_pages());
        assert_eq!(page.previous_page_number(), 1);
        assert_eq!(page.next_page_number(), 3);

        let single = Page::new(vec![1u8], window(1, None), 1);
        assert!(!single.has_previous());
        assert!(!single.has_next());
        assert!(!single.has_other_pages());
    }
}
