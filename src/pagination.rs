//! Page-number pagination shared by the stores and the API

use serde::Serialize;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Requested page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Parse raw query values.
    ///
    /// If either value is not a positive integer both fall back to the
    /// defaults. `page_size` is capped at [`MAX_PAGE_SIZE`].
    pub fn parse(page: Option<&str>, page_size: Option<&str>) -> Self {
        let page = page.map(str::trim).unwrap_or("1").parse::<u32>();
        let page_size = page_size.map(str::trim).unwrap_or("20").parse::<u32>();

        match (page, page_size) {
            (Ok(page), Ok(page_size)) if page > 0 && page_size > 0 => Self {
                page,
                page_size: page_size.min(MAX_PAGE_SIZE),
            },
            _ => Self::default(),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }

    /// Cut this page out of an in-memory list
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        items
            .into_iter()
            .skip(start)
            .take(self.page_size as usize)
            .collect()
    }
}

/// Paginated response wrapper
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub count: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(results: Vec<T>, count: u64, request: PageRequest) -> Self {
        let total_pages = count.div_ceil(u64::from(request.page_size));
        Self {
            count,
            page: request.page,
            page_size: request.page_size,
            total_pages,
            results,
        }
    }
}
