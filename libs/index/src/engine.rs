//! Search engine contract

use crate::{Document, IndexQuery, Result};
use async_trait::async_trait;

/// One page of a sorted search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based page index.
    pub page: usize,
    pub page_size: usize,
    /// Hits are ordered by this field, descending.
    pub sort_field: String,
    /// Stored fields to return; empty returns all of them.
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    pub hits: Vec<Document>,
    /// No further pages follow this one.
    pub is_last_page: bool,
}

/// Executes compiled queries against an event index.
///
/// Implementations are shared between concurrent request workers.
#[async_trait]
pub trait IndexEngine: Send + Sync {
    /// Every matching document, projected to `fields` (all fields when empty),
    /// in the engine's stable document order.
    async fn search_all(&self, query: &IndexQuery, fields: &[String]) -> Result<Vec<Document>>;

    /// One page of matching documents sorted by `request.sort_field`
    /// descending. Documents without the sort field are excluded.
    async fn search_page(&self, query: &IndexQuery, request: &PageRequest) -> Result<SearchPage>;
}
