//! In-memory reference engine.
//!
//! Documents live in per-collection maps behind a tokio `RwLock`; reads take
//! shared locks, writes exclusive ones. Integer identifiers are assigned
//! from a per-collection counter when a document arrives without one.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use super::{id_key, DocumentStore};
use crate::error::Result;
use crate::hooks::Document;
use crate::query::predicate::{compare_values, Predicate, SortOrder};

#[derive(Default)]
struct CollectionData {
    docs: BTreeMap<String, Document>,
    next_id: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, CollectionData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ordered(data: &CollectionData) -> Vec<Document> {
        let mut docs: Vec<Document> = data.docs.values().cloned().collect();
        // BTreeMap orders keys lexicographically; present documents in
        // insertion (id) order where ids are numeric.
        docs.sort_by(|a, b| {
            compare_values(a.get("id").unwrap_or(&Value::Null), b.get("id").unwrap_or(&Value::Null))
        });
        docs
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_all(&self, collection: &str) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).map(Self::ordered).unwrap_or_default())
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|data| data.docs.get(id).cloned()))
    }

    async fn exists(&self, collection: &str, id: &str) -> Result<bool> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).is_some_and(|data| data.docs.contains_key(id)))
    }

    async fn save(&self, collection: &str, mut doc: Document) -> Result<Document> {
        let mut collections = self.collections.write().await;
        let data = collections.entry(collection.to_string()).or_default();

        let missing_id = matches!(doc.get("id"), None | Some(Value::Null));
        if missing_id {
            data.next_id += 1;
            doc["id"] = json!(data.next_id);
        }

        let key = id_key(doc.get("id").unwrap_or(&Value::Null));
        data.docs.insert(key, doc.clone());
        Ok(doc)
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<bool> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(collection)
            .map(|data| data.docs.remove(id).is_some())
            .unwrap_or(false))
    }

    async fn count(&self, collection: &str, predicate: Option<&Predicate>) -> Result<u64> {
        let collections = self.collections.read().await;
        let count = collections
            .get(collection)
            .map(|data| {
                data.docs
                    .values()
                    .filter(|doc| predicate.map(|p| p.matches(doc)).unwrap_or(true))
                    .count()
            })
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn select(
        &self,
        collection: &str,
        predicate: Option<&Predicate>,
        sort: &[SortOrder],
        window: Option<(u64, u32)>,
    ) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        let mut docs: Vec<Document> = collections
            .get(collection)
            .map(Self::ordered)
            .unwrap_or_default()
            .into_iter()
            .filter(|doc| predicate.map(|p| p.matches(doc)).unwrap_or(true))
            .collect();

        // Stable multi-key sort: apply keys in reverse so the first listed
        // key dominates.
        for order in sort.iter().rev() {
            docs.sort_by(|a, b| {
                let left = a.get(&order.field).unwrap_or(&Value::Null);
                let right = b.get(&order.field).unwrap_or(&Value::Null);
                let ordering = compare_values(left, right);
                if order.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        if let Some((offset, limit)) = window {
            docs = docs.into_iter().skip(offset as usize).take(limit as usize).collect();
        }

        Ok(docs)
    }
}
