use serde::{Deserialize, Serialize};

pub const MAX_PAGE_SIZE: u32 = 100;

/// Page metadata returned alongside a slice of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u64,
}

impl PageMeta {
    pub fn new(page: u32, page_size: u32, total_items: u64) -> Self {
        Self {
            page,
            page_size,
            total_items,
            total_pages: total_pages(total_items, page_size),
        }
    }
}

pub fn total_pages(total_items: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total_items.div_ceil(u64::from(page_size))
}

/// Zero-based row offset of the first item on `page` (1-based).
pub fn offset(page: u32, page_size: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(page_size)
}

/// Checks `page >= 1` and `1 <= page_size <= MAX_PAGE_SIZE`.
pub fn validate_bounds(page: u32, page_size: u32) -> Result<(), String> {
    if page < 1 {
        return Err("page must be at least 1".to_string());
    }
    if page_size < 1 || page_size > MAX_PAGE_SIZE {
        return Err(format!("page_size must be between 1 and {}", MAX_PAGE_SIZE));
    }
    Ok(())
}
