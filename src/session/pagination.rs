//! Page-numbered default catalog, shown while the query is empty.

use crate::error::BackendError;
use crate::model::{CatalogPage, Course};

/// A catalog page request the orchestrator should send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

#[derive(Debug, Clone)]
pub struct PaginationController {
    current: CatalogPage,
    requested: Option<u32>,
}

impl PaginationController {
    pub fn new(page_size: u32) -> Self {
        Self {
            current: CatalogPage::empty(1, page_size.max(1)),
            requested: None,
        }
    }

    pub fn page(&self) -> &CatalogPage {
        &self.current
    }

    pub fn page_size(&self) -> u32 {
        self.current.size
    }

    pub fn requested(&self) -> Option<u32> {
        self.requested
    }

    /// The page paging moves from: the one in flight, else the one displayed
    pub fn target(&self) -> u32 {
        self.requested.unwrap_or(self.current.number)
    }

    /// Request page `n`, clamped to at least 1
    pub fn go_to_page(&mut self, n: u32) -> PageRequest {
        let page = n.max(1);
        self.requested = Some(page);
        PageRequest {
            page,
            size: self.current.size,
        }
    }

    pub fn next(&mut self) -> PageRequest {
        self.go_to_page(self.target().saturating_add(1))
    }

    /// No request at all when already on the first page
    pub fn prev(&mut self) -> Option<PageRequest> {
        let target = self.target();
        if target <= 1 {
            return None;
        }
        Some(self.go_to_page(target - 1))
    }

    /// Go back to page 1. Items from a later page are dropped at once so they
    /// are never shown under the page-1 label.
    pub fn reset_to_first(&mut self) -> PageRequest {
        if self.current.number != 1 {
            self.current = CatalogPage::empty(1, self.current.size);
        }
        self.go_to_page(1)
    }

    /// Apply a page response. Returns `false` when it was discarded.
    pub fn receive(&mut self, page: u32, result: Result<Vec<Course>, BackendError>) -> bool {
        if self.requested != Some(page) {
            tracing::debug!(
                "Discarding catalog page {} (waiting for {:?})",
                page,
                self.requested
            );
            return false;
        }
        self.requested = None;

        match result {
            Ok(items) => {
                self.current = CatalogPage {
                    number: page,
                    size: self.current.size,
                    items,
                };
            }
            Err(e) => {
                tracing::warn!(
                    "Catalog page {} failed, keeping page {}: {}",
                    page,
                    self.current.number,
                    e
                );
            }
        }
        true
    }
}
