//! Small shared types with no natural home in a single component crate.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `MediaFile` primary key.
pub type FileId = Uuid;

/// Broker-supplied task id, opaque to everything but the broker itself.
pub type TaskId = String;

/// Owning user/account id. Kept as an opaque `Uuid` since auth is out of
/// scope here; callers obtain it from whatever upstream authenticates
/// the request.
pub type OwnerId = Uuid;

/// A page of results plus an opaque cursor for the next page, used by
/// `mpo-db`'s listing queries (media files, tasks, collections).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self { items, next_cursor }
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
        }
    }

    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_page_has_no_more() {
        let page: Page<i32> = Page::empty();
        assert!(!page.has_more());
        assert!(page.items.is_empty());
    }

    #[test]
    fn page_with_cursor_reports_more() {
        let page = Page::new(vec![1, 2, 3], Some("cursor-1".to_string()));
        assert!(page.has_more());
        assert_eq!(page.items.len(), 3);
    }
}
