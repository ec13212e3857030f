use serde::{Deserialize, Serialize};

/// One cached page of a listing. `items.len() <= page_size` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page: u64,
    pub page_size: u64,
}

impl<T> ListPage<T> {
    pub fn empty(page: u64, page_size: u64) -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            page,
            page_size,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(self.page_size)
    }
}

/// `{"data": ...}` wrapper used by resource endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Data<T> {
    pub data: T,
}

/// Wire shape of a Laravel length-aware paginator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub current_page: u64,
    pub per_page: u64,
}

impl<T> From<Paginated<T>> for ListPage<T> {
    fn from(p: Paginated<T>) -> Self {
        let mut items = p.data;
        items.truncate(p.per_page as usize);
        Self {
            items,
            total_count: p.total,
            page: p.current_page,
            page_size: p.per_page,
        }
    }
}
