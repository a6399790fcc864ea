//! Persistence contract.
//!
//! The runtime consumes persistence through this narrow, repository-like
//! interface; transaction and concurrency control are the engine's own
//! business. [`MemoryStore`] is the reference engine used by the demos and
//! tests.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::hooks::Document;
use crate::query::predicate::{Predicate, SortOrder};

/// Canonical string form of a document identifier: integers render without a
/// fractional part, strings stay as-is.
pub fn id_key(id: &Value) -> String {
    match id {
        Value::String(text) => text.clone(),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                int.to_string()
            } else {
                number.to_string()
            }
        }
        other => other.to_string(),
    }
}

/// Repository-like persistence contract per collection: the only surface the
/// CRUD and query services touch.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_all(&self, collection: &str) -> Result<Vec<Document>>;

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    async fn exists(&self, collection: &str, id: &str) -> Result<bool>;

    /// Persist a document, assigning an identifier when absent. Returns the
    /// stored document.
    async fn save(&self, collection: &str, doc: Document) -> Result<Document>;

    /// Remove by identifier, returning whether a document existed.
    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<bool>;

    /// Count documents matching the predicate (all documents when `None`).
    async fn count(&self, collection: &str, predicate: Option<&Predicate>) -> Result<u64>;

    /// Fetch documents matching the predicate, ordered by the given keys,
    /// optionally restricted to an `(offset, limit)` window.
    async fn select(
        &self,
        collection: &str,
        predicate: Option<&Predicate>,
        sort: &[SortOrder],
        window: Option<(u64, u32)>,
    ) -> Result<Vec<Document>>;
}
