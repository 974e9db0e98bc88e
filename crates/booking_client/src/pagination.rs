use std::{fmt, num::NonZeroU32, ops::RangeInclusive};

use shared::{domain::Appointment, protocol::BookingsPayload};

use crate::error::PaginationError;

pub const PAGE_SIZE: u32 = 10;

/// 1-based page number; doubles as the appointments cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageIndex(NonZeroU32);

impl PageIndex {
    pub const FIRST: Self = Self(NonZeroU32::MIN);

    pub fn new(page: i64) -> Result<Self, PaginationError> {
        u32::try_from(page)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(PaginationError::PageOutOfRange(page))
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for PageIndex {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for PageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ceiling division of `total` by `page_size`. Zero items (or a zero page
/// size) means zero pages.
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// One page of appointments exactly as the backend returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
    pub page: PageIndex,
    pub appointments: Vec<Appointment>,
    pub total: u64,
}

impl PageResult {
    pub fn from_payload(page: PageIndex, payload: BookingsPayload) -> Self {
        Self {
            page,
            appointments: payload.appointments,
            total: payload.total,
        }
    }

    pub fn total_pages(&self) -> u32 {
        total_pages(self.total, PAGE_SIZE)
    }
}

/// Tracks which page the client is looking at.
///
/// There is no upper clamp: a page past the end is a valid request whose
/// fetch returns an empty list, and the view renders its empty state.
#[derive(Debug, Clone)]
pub struct Pagination {
    current: PageIndex,
    page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            current: PageIndex::FIRST,
            page_size: PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn set_page(&mut self, page: i64) -> Result<PageIndex, PaginationError> {
        let page = PageIndex::new(page)?;
        self.current = page;
        Ok(page)
    }

    pub fn current(&self) -> PageIndex {
        self.current
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total_pages(&self, total: u64) -> u32 {
        total_pages(total, self.page_size)
    }

    /// Page buttons to render for `total` items; empty when there are none.
    pub fn page_numbers(&self, total: u64) -> RangeInclusive<u32> {
        1..=self.total_pages(total)
    }

    pub fn is_current(&self, page: u32) -> bool {
        self.current.get() == page
    }
}

#[cfg(test)]
#[path = "tests/pagination_tests.rs"]
mod tests;
