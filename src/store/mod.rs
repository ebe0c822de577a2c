//! Document store collaborator
//!
//! The store receives the items a page processor extracted, keyed by the
//! (site, keyword) unit that produced them. Store errors are logged by the
//! orchestrator and never abort a crawl.

use crate::registry::Site;
use std::collections::BTreeMap;
use std::sync::Mutex;
use thiserror::Error;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// One candidate item extracted from a search result page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageItem {
    /// Item title as displayed on the page
    pub title: String,

    /// Absolute link to the item
    pub link: String,

    /// Short description, when the page carries one
    pub description: Option<String>,
}

/// Receives extracted items, keyed by the unit that found them
pub trait DocumentStore {
    /// Stores a batch of items for one (site, keyword) unit
    ///
    /// Called once per fetched page that yielded items; a unit that paginates
    /// produces several calls with the same key.
    fn store(&self, site: &Site, keyword: &str, items: Vec<PageItem>) -> StoreResult<()>;
}

/// In-process store for embedding and tests
#[derive(Debug, Default)]
pub struct InMemoryStore {
    items: Mutex<BTreeMap<(String, String), Vec<PageItem>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items stored for one (site name, keyword) unit
    pub fn items_for(&self, site_name: &str, keyword: &str) -> Vec<PageItem> {
        self.items
            .lock()
            .unwrap()
            .get(&(site_name.to_string(), keyword.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// Total items stored across all units
    pub fn total_items(&self) -> usize {
        self.items.lock().unwrap().values().map(Vec::len).sum()
    }

    /// Distinct (site name, keyword) keys with at least one item
    pub fn keys(&self) -> Vec<(String, String)> {
        self.items.lock().unwrap().keys().cloned().collect()
    }
}

impl DocumentStore for InMemoryStore {
    fn store(&self, site: &Site, keyword: &str, items: Vec<PageItem>) -> StoreResult<()> {
        let mut map = self.items.lock().unwrap();
        map.entry((site.name.clone(), keyword.to_string()))
            .or_default()
            .extend(items);
        Ok(())
    }
}
