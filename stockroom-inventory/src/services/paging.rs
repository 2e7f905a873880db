use serde::Serialize;

/// Which slice of a listing to return. Pages count from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl PageRequest {
    pub const DEFAULT_PAGE_SIZE: usize = 10;

    pub fn new(page: usize, page_size: usize) -> Self {
        PageRequest { page, page_size }
    }

    /// Page 0 reads as page 1; a page size of 0 reads as the default.
    fn normalized(self) -> (usize, usize) {
        let size = if self.page_size == 0 {
            Self::DEFAULT_PAGE_SIZE
        } else {
            self.page_size
        };
        (self.page.max(1), size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::new(1, Self::DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub pages: usize,
    pub total: usize,
}

/// Cuts one page out of an already ordered listing.
pub(crate) fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let (page, size) = request.normalized();
    let total = items.len();
    let items = items
        .into_iter()
        .skip(size.saturating_mul(page - 1))
        .take(size)
        .collect();
    Page {
        items,
        page,
        pages: total.div_ceil(size),
        total,
    }
}
