//! Pagination utilities.
//!
//! Provides [`Paginator`] and [`Page`]. The CRUD controller uses
//! [`Paginator::get_page`], which never fails: out-of-range numbers clamp to
//! the nearest valid page.
//!
//! # Examples
//!
//! ```
//! use eventos_views::pagination::Paginator;
//!
//! let items: Vec<i32> = (1..=12).collect();
//! let paginator = Paginator::new(items, 5);
//! assert_eq!(paginator.num_pages(), 3);
//! assert_eq!(paginator.count(), 12);
//!
//! let page = paginator.page(1).unwrap();
//! assert_eq!(page.object_list().len(), 5);
//! assert!(page.has_next());
//! assert!(!page.has_previous());
//!
//! assert_eq!(paginator.get_page(99).number(), 3);
//! ```

use std::fmt;
use std::ops::RangeInclusive;

use serde::Serialize;

/// Errors from strict page lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationError {
    /// The requested page is past the last page.
    EmptyPage,
    /// The page number was not a valid integer.
    PageNotAnInteger,
    /// The page number is below 1.
    InvalidPage(String),
}

impl fmt::Display for PaginationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPage => write!(f, "That page contains no results"),
            Self::PageNotAnInteger => write!(f, "That page number is not an integer"),
            Self::InvalidPage(msg) => write!(f, "Invalid page: {msg}"),
        }
    }
}

impl std::error::Error for PaginationError {}

/// Parses a raw `page` query value.
///
/// # Errors
///
/// Returns [`PaginationError::PageNotAnInteger`] when missing or non-numeric.
pub fn parse_page_number(raw: Option<&str>) -> Result<i64, PaginationError> {
    raw.map(str::trim)
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or(PaginationError::PageNotAnInteger)
}

/// Splits an ordered list into pages of a fixed size.
#[derive(Debug, Clone)]
pub struct Paginator<T> {
    object_list: Vec<T>,
    per_page: usize,
}

impl<T: Clone> Paginator<T> {
    /// Creates a paginator. A `per_page` of zero is treated as one.
    pub fn new(object_list: Vec<T>, per_page: usize) -> Self {
        Self {
            object_list,
            per_page: per_page.max(1),
        }
    }

    /// Total number of objects.
    pub fn count(&self) -> usize {
        self.object_list.len()
    }

    /// Objects per page.
    pub const fn per_page(&self) -> usize {
        self.per_page
    }

    /// Number of pages; an empty list still has one (empty) page.
    pub fn num_pages(&self) -> usize {
        self.count().div_ceil(self.per_page).max(1)
    }

    /// Valid page numbers (1-indexed, inclusive).
    pub fn page_range(&self) -> RangeInclusive<usize> {
        1..=self.num_pages()
    }

    /// Returns the requested page (1-indexed).
    ///
    /// # Errors
    ///
    /// Returns `InvalidPage` for 0 and `EmptyPage` past the last page.
    pub fn page(&self, number: usize) -> Result<Page<T>, PaginationError> {
        if number == 0 {
            return Err(PaginationError::InvalidPage(
                "That page number is less than 1".to_string(),
            ));
        }
        let num_pages = self.num_pages();
        if number > num_pages {
            return Err(PaginationError::EmptyPage);
        }

        let start = (number - 1) * self.per_page;
        let end = (start + self.per_page).min(self.count());

        Ok(Page {
            object_list: self.object_list[start..end].to_vec(),
            number,
            num_pages,
            per_page: self.per_page,
            count: self.count(),
        })
    }

    /// Returns the page nearest to `number`.
    ///
    /// Numbers below 1 give the first page; numbers past the end give the
    /// last page.
    pub fn get_page(&self, number: i64) -> Page<T> {
        let num_pages = self.num_pages();
        let clamped = usize::try_from(number.max(1)).map_or(num_pages, |n| n.min(num_pages));
        let start = (clamped - 1) * self.per_page;
        let end = (start + self.per_page).min(self.count());
        Page {
            object_list: self.object_list[start..end].to_vec(),
            number: clamped,
            num_pages,
            per_page: self.per_page,
            count: self.count(),
        }
    }

    /// Like [`Paginator::get_page`] for a raw query value; anything that is
    /// not an integer gives the first page.
    pub fn get_page_from_query(&self, raw: Option<&str>) -> Page<T> {
        self.get_page(parse_page_number(raw).unwrap_or(1))
    }
}

/// One page of results from a [`Paginator`].
#[derive(Debug, Clone)]
#[allow(clippy::struct_field_names)]
pub struct Page<T> {
    object_list: Vec<T>,
    number: usize,
    num_pages: usize,
    per_page: usize,
    count: usize,
}

impl<T> Page<T> {
    /// The items on this page.
    pub fn object_list(&self) -> &[T] {
        &self.object_list
    }

    /// Consumes the page, returning its items.
    pub fn into_object_list(self) -> Vec<T> {
        self.object_list
    }

    /// The 1-based page number.
    pub const fn number(&self) -> usize {
        self.number
    }

    /// Total number of pages.
    pub const fn num_pages(&self) -> usize {
        self.num_pages
    }

    /// Returns `true` if there is a next page.
    pub const fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    /// Returns `true` if there is a previous page.
    pub const fn has_previous(&self) -> bool {
        self.number > 1
    }

    /// Returns `true` if there are other pages.
    pub const fn has_other_pages(&self) -> bool {
        self.has_next() || self.has_previous()
    }

    /// The next page number.
    ///
    /// # Panics
    ///
    /// Panics if there is no next page. Use `has_next()` to check first.
    pub fn next_page_number(&self) -> usize {
        assert!(self.has_next(), "No next page");
        self.number + 1
    }

    /// The previous page number.
    ///
    /// # Panics
    ///
    /// Panics if there is no previous page. Use `has_previous()` to check first.
    pub fn previous_page_number(&self) -> usize {
        assert!(self.has_previous(), "No previous page");
        self.number - 1
    }

    /// 1-based index of the first item, or 0 on an empty page.
    pub fn start_index(&self) -> usize {
        if self.object_list.is_empty() {
            return 0;
        }
        (self.number - 1) * self.per_page + 1
    }

    /// 1-based index of the last item, or 0 on an empty page.
    pub fn end_index(&self) -> usize {
        if self.object_list.is_empty() {
            return 0;
        }
        self.start_index() + self.object_list.len() - 1
    }
}

impl<T: Serialize + Clone> Page<T> {
    /// A serializable view of the page for templates.
    pub fn to_context(&self) -> PageContext<T> {
        PageContext {
            object_list: self.object_list.clone(),
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            has_next: self.has_next(),
            has_previous: self.has_previous(),
            has_other_pages: self.has_other_pages(),
            next_page_number: self.has_next().then(|| self.number + 1),
            previous_page_number: self.has_previous().then(|| self.number - 1),
            start_index: self.start_index(),
            end_index: self.end_index(),
            page_range: (1..=self.num_pages).collect(),
        }
    }
}

/// The template view of a [`Page`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageContext<T> {
    /// Items on the page.
    pub object_list: Vec<T>,
    /// Current page number.
    pub number: usize,
    /// Total pages.
    pub num_pages: usize,
    /// Total items across pages.
    pub count: usize,
    /// Whether a next page exists.
    pub has_next: bool,
    /// Whether a previous page exists.
    pub has_previous: bool,
    /// Whether any other page exists.
    pub has_other_pages: bool,
    /// Next page number, if any.
    pub next_page_number: Option<usize>,
    /// Previous page number, if any.
    pub previous_page_number: Option<usize>,
    /// 1-based index of the first item.
    pub start_index: usize,
    /// 1-based index of the last item.
    pub end_index: usize,
    /// All page numbers.
    pub page_range: Vec<usize>,
}
