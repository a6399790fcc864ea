//! Generic query model: the `Where` filter AST, find options and response
//! envelopes.
//!
//! `Where` is the two-level map familiar from Payload-style APIs: the
//! reserved `and`/`or` keys hold nested clauses, every other key is a
//! field-path condition. A bare value condition (`{"title": "Hi"}`) promotes
//! to `equals`.

pub mod predicate;
pub mod service;
pub mod translate;

pub use predicate::{CmpOp, Predicate, SortOrder};
pub use service::QueryService;
pub use translate::WhereTranslator;

use std::collections::BTreeMap;

use serde::de::Error as DeError;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Nested filter expression: field conditions plus `and`/`or` composition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Where {
    pub and: Option<Vec<Where>>,
    pub or: Option<Vec<Where>>,
    /// Field-path -> operator set, insertion-stable by path
    pub fields: BTreeMap<String, WhereField>,
}

impl Where {
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when the clause contributes at least one condition. An empty
    /// `Where` translates to no predicate at all.
    pub fn has_conditions(&self) -> bool {
        self.and.as_ref().is_some_and(|list| !list.is_empty())
            || self.or.as_ref().is_some_and(|list| !list.is_empty())
            || !self.fields.is_empty()
    }

    pub fn field(mut self, path: impl Into<String>, condition: WhereField) -> Self {
        self.fields.insert(path.into(), condition);
        self
    }

    pub fn all_of(conditions: impl IntoIterator<Item = Where>) -> Self {
        Self { and: Some(conditions.into_iter().collect()), ..Self::default() }
    }

    pub fn any_of(conditions: impl IntoIterator<Item = Where>) -> Self {
        Self { or: Some(conditions.into_iter().collect()), ..Self::default() }
    }
}

impl<'de> Deserialize<'de> for Where {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = serde_json::Map::deserialize(deserializer)?;
        let mut clause = Where::default();

        for (key, value) in map {
            match key.as_str() {
                "and" => {
                    clause.and =
                        Some(serde_json::from_value(value).map_err(DeError::custom)?);
                }
                "or" => {
                    clause.or = Some(serde_json::from_value(value).map_err(DeError::custom)?);
                }
                _ => {
                    let condition = if value.is_object() {
                        serde_json::from_value::<WhereField>(value).map_err(DeError::custom)?
                    } else {
                        // Bare value: shorthand for equals
                        WhereField { equals: Some(value), ..WhereField::default() }
                    };
                    clause.fields.insert(key, condition);
                }
            }
        }

        Ok(clause)
    }
}

impl Serialize for Where {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut entries = serializer.serialize_map(None)?;
        if let Some(and) = &self.and {
            entries.serialize_entry("and", and)?;
        }
        if let Some(or) = &self.or {
            entries.serialize_entry("or", or)?;
        }
        for (path, condition) in &self.fields {
            entries.serialize_entry(path, condition)?;
        }
        entries.end()
    }
}

/// Per-field operator set. Unset operators contribute nothing; the geo
/// operators are accepted for wire compatibility but produce no predicate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhereField {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equals: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_equals: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub like: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_like: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub greater_than: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub greater_than_equal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub less_than: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub less_than_equal: Option<f64>,
    #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
    pub is_in: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_in: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub near: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub within: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intersects: Option<String>,
}

impl WhereField {
    pub fn equals(value: impl Into<Value>) -> Self {
        Self { equals: Some(value.into()), ..Self::default() }
    }

    pub fn contains(value: impl Into<String>) -> Self {
        Self { contains: Some(value.into()), ..Self::default() }
    }

    pub fn has_operators(&self) -> bool {
        self.equals.is_some()
            || self.not_equals.is_some()
            || self.contains.is_some()
            || self.like.is_some()
            || self.not_like.is_some()
            || self.greater_than.is_some()
            || self.greater_than_equal.is_some()
            || self.less_than.is_some()
            || self.less_than_equal.is_some()
            || self.is_in.is_some()
            || self.not_in.is_some()
            || self.all.is_some()
            || self.exists.is_some()
            || self.near.is_some()
            || self.within.is_some()
            || self.intersects.is_some()
    }
}

/// Options for a paginated find operation.
#[derive(Debug, Clone)]
pub struct FindOptions {
    pub collection: String,
    pub where_clause: Option<Where>,
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub sort: Option<String>,
    pub pagination: bool,
}

impl FindOptions {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            where_clause: None,
            limit: None,
            page: None,
            sort: None,
            pagination: true,
        }
    }

    pub fn with_where(mut self, clause: Where) -> Self {
        self.where_clause = Some(clause);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn without_pagination(mut self) -> Self {
        self.pagination = false;
        self
    }
}

/// Standard paginated-list response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedDocs<T> {
    pub docs: Vec<T>,
    pub total_docs: u64,
    pub limit: u32,
    pub total_pages: u32,
    pub page: Option<u32>,
    pub paging_counter: u32,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    pub prev_page: Option<u32>,
    pub next_page: Option<u32>,
}

impl<T> PaginatedDocs<T> {
    pub fn empty(limit: u32) -> Self {
        Self {
            docs: Vec::new(),
            total_docs: 0,
            limit,
            total_pages: 0,
            page: Some(1),
            paging_counter: 1,
            has_prev_page: false,
            has_next_page: false,
            prev_page: None,
            next_page: None,
        }
    }
}

/// Response wrapper for single-document endpoints: `{ "data": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}
