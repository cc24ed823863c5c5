use crate::utils::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationSettings {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

/// A page request after coercion. Out-of-range input is corrected, never rejected:
/// `page < 1` becomes 1, `page_size < 1` becomes the default and anything above the
/// maximum is capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: Option<i64>, page_size: Option<i64>, settings: &PaginationSettings) -> Self {
        let page = match page {
            Some(p) if p >= 1 => u32::try_from(p).unwrap_or(u32::MAX),
            _ => 1,
        };

        let page_size = match page_size {
            Some(size) if size >= 1 => {
                u32::try_from(size.min(settings.max_page_size as i64)).unwrap_or(settings.max_page_size)
            }
            _ => settings.default_page_size.min(settings.max_page_size),
        };

        Self { page, page_size }
    }

    pub fn limit(&self) -> u64 {
        self.page_size as u64
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.page_size as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub page_size: u32,
    pub total_records: u64,
    pub total_pages: u64,
}

impl PaginationMeta {
    pub fn new(request: &PageRequest, total_records: u64) -> Self {
        Self {
            page: request.page,
            page_size: request.page_size,
            total_records,
            total_pages: total_records.div_ceil(request.page_size as u64),
        }
    }
}

/// One page of results: `{"data": [...], "pagination": {...}}` when serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> PaginationSettings {
        PaginationSettings::default()
    }

    #[test]
    fn test_defaults() {
        let req = PageRequest::new(None, None, &settings());
        assert_eq!(req, PageRequest { page: 1, page_size: 100 });
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn test_page_coercion() {
        assert_eq!(PageRequest::new(Some(0), None, &settings()).page, 1);
        assert_eq!(PageRequest::new(Some(-5), None, &settings()).page, 1);
        assert_eq!(PageRequest::new(Some(3), None, &settings()).page, 3);
    }

    #[test]
    fn test_page_size_coercion() {
        assert_eq!(PageRequest::new(None, Some(0), &settings()).page_size, 100);
        assert_eq!(PageRequest::new(None, Some(-1), &settings()).page_size, 100);
        assert_eq!(PageRequest::new(None, Some(5000), &settings()).page_size, 1000);
        assert_eq!(PageRequest::new(None, Some(2), &settings()).page_size, 2);
    }

    #[test]
    fn test_offset() {
        let req = PageRequest::new(Some(3), Some(25), &settings());
        assert_eq!(req.offset(), 50);
        assert_eq!(req.limit(), 25);
    }

    #[test]
    fn test_total_pages() {
        let req = PageRequest::new(None, Some(2), &settings());
        assert_eq!(PaginationMeta::new(&req, 5).total_pages, 3);
        assert_eq!(PaginationMeta::new(&req, 4).total_pages, 2);
        assert_eq!(PaginationMeta::new(&req, 0).total_pages, 0);
    }

    #[test]
    fn test_page_serialization() {
        let page = Page {
            data: vec![1, 2],
            pagination: PaginationMeta::new(&PageRequest::new(None, Some(2), &settings()), 5),
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["pagination"]["total_records"], 5);
        assert_eq!(json["pagination"]["total_pages"], 3);
        assert_eq!(json["data"].as_array().unwrap().len(), 2);
    }
}
