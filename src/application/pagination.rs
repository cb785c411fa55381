//! Page-number pagination for the post listings.

use std::num::NonZeroU32;

/// Zero-based page index parsed leniently from a query string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageNumber(pub u32);

impl PageNumber {
    /// Anything that is not a non-negative integer is page zero.
    pub fn parse(raw: Option<&str>) -> Self {
        Self(raw.and_then(|value| value.trim().parse().ok()).unwrap_or(0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: PageNumber,
    pub limit: NonZeroU32,
}

impl PageRequest {
    pub fn new(page: PageNumber, limit: NonZeroU32) -> Self {
        Self { page, limit }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.0) * u64::from(self.limit.get())
    }

    pub fn links(&self, total: u64) -> PageLinks {
        let prev = self.page.0.checked_sub(1);
        let has_next = self.offset() + u64::from(self.limit.get()) < total;
        let next = has_next.then(|| self.page.0.saturating_add(1));
        PageLinks { prev, next }
    }
}

/// Neighbouring page numbers, present only when that page can hold posts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageLinks {
    pub prev: Option<u32>,
    pub next: Option<u32>,
}
