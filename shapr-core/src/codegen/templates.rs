//! Source templates rendered with `{{placeholder}}` substitution.

pub const HEADER: &str = "// Generated by shapr - do not edit.";

pub const ENTITY_TIMESTAMP_FIELDS: &str = r#"    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
"#;

pub const ENTITY: &str = r#"// Generated by shapr - do not edit.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct {{entity}} {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<{{id_type}}>,
{{field_lines}}
{{timestamp_lines}}
}
"#;

pub const REPOSITORY: &str = r#"// Generated by shapr - do not edit.

use std::sync::Arc;

use shapr_core::error::{Result, ShaprError};
use shapr_core::store::DocumentStore;

use super::{{entity_mod}}::{{entity}};

/// Repository for the `{{slug}}` collection, bound to [`{{entity}}`] with
/// `{{id_type}}` identifiers.
pub struct {{entity}}Repository {
    store: Arc<dyn DocumentStore>,
}

impl {{entity}}Repository {
    pub const SLUG: &'static str = "{{slug}}";

    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn find_all(&self) -> Result<Vec<{{entity}}>> {
        let docs = self.store.find_all(Self::SLUG).await?;
        docs.into_iter().map(from_document).collect()
    }

    pub async fn find_by_id(&self, id: {{id_type}}) -> Result<Option<{{entity}}>> {
        match self.store.find_by_id(Self::SLUG, &id.to_string()).await? {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn exists_by_id(&self, id: {{id_type}}) -> Result<bool> {
        self.store.exists(Self::SLUG, &id.to_string()).await
    }

    pub async fn save(&self, entity: {{entity}}) -> Result<{{entity}}> {
        let doc = to_document(&entity)?;
        from_document(self.store.save(Self::SLUG, doc).await?)
    }

    pub async fn delete_by_id(&self, id: {{id_type}}) -> Result<bool> {
        self.store.delete_by_id(Self::SLUG, &id.to_string()).await
    }
}

fn to_document(entity: &{{entity}}) -> Result<serde_json::Value> {
    serde_json::to_value(entity).map_err(|error| ShaprError::storage(error.to_string()))
}

fn from_document(doc: serde_json::Value) -> Result<{{entity}}> {
    serde_json::from_value(doc).map_err(|error| ShaprError::storage(error.to_string()))
}
"#;

pub const CONTROLLER: &str = r#"// Generated by shapr - do not edit.

use std::sync::Arc;

use shapr_core::access::{check_access, Caller};
use shapr_core::crud::CrudService;
use shapr_core::error::{Result, ShaprError};
use shapr_core::query::{DataResponse, FindOptions, PaginatedDocs, QueryService};

use super::{{entity_mod}}::{{entity}};

/// CRUD controller for `/api/{{slug}}`.
///
/// Every endpoint checks the collection's access rule before any other work;
/// mutations run the full hook pipeline through the runtime services.
pub struct {{entity}}Controller {
    crud: Arc<CrudService>,
    query: Arc<QueryService>,
}

impl {{entity}}Controller {
    pub const SLUG: &'static str = "{{slug}}";
    pub const BASE_PATH: &'static str = "/api/{{slug}}";

    pub fn new(crud: Arc<CrudService>, query: Arc<QueryService>) -> Self {
        Self { crud, query }
    }

    /// GET /api/{{slug}} - paginated list
    pub async fn list(
        &self,
        caller: &Caller,
        options: FindOptions,
    ) -> Result<PaginatedDocs<{{entity}}>> {
        let collection = self
            .crud
            .registry()
            .by_slug(Self::SLUG)
            .ok_or_else(|| ShaprError::not_found(Self::SLUG))?;
        check_access(&collection.access.read, caller)?;

        let mut options = options;
        options.collection = Self::SLUG.to_string();
        let page = self.query.find(&options).await?;

        let docs = page
            .docs
            .into_iter()
            .map(from_document)
            .collect::<Result<Vec<{{entity}}>>>()?;
        Ok(PaginatedDocs {
            docs,
            total_docs: page.total_docs,
            limit: page.limit,
            total_pages: page.total_pages,
            page: page.page,
            paging_counter: page.paging_counter,
            has_prev_page: page.has_prev_page,
            has_next_page: page.has_next_page,
            prev_page: page.prev_page,
            next_page: page.next_page,
        })
    }

    /// GET /api/{{slug}}/{id} - single document, None when absent
    pub async fn get_by_id(
        &self,
        caller: &Caller,
        id: {{id_type}},
    ) -> Result<Option<DataResponse<{{entity}}>>> {
        let collection = self
            .crud
            .registry()
            .by_slug(Self::SLUG)
            .ok_or_else(|| ShaprError::not_found(Self::SLUG))?;
        check_access(&collection.access.read, caller)?;

        match self.crud.get(Self::SLUG, caller, &id.to_string()).await? {
            Some(doc) => Ok(Some(DataResponse { data: from_document(doc)? })),
            None => Ok(None),
        }
    }

    /// POST /api/{{slug}} - create
    pub async fn create(
        &self,
        caller: &Caller,
        entity: {{entity}},
    ) -> Result<DataResponse<{{entity}}>> {
        let collection = self
            .crud
            .registry()
            .by_slug(Self::SLUG)
            .ok_or_else(|| ShaprError::not_found(Self::SLUG))?;
        check_access(&collection.access.create, caller)?;

        let doc = self.crud.create(Self::SLUG, caller, to_document(&entity)?).await?;
        Ok(DataResponse { data: from_document(doc)? })
    }

    /// PUT /api/{{slug}}/{id} - update, None when absent
    pub async fn update(
        &self,
        caller: &Caller,
        id: {{id_type}},
        entity: {{entity}},
    ) -> Result<Option<DataResponse<{{entity}}>>> {
        let collection = self
            .crud
            .registry()
            .by_slug(Self::SLUG)
            .ok_or_else(|| ShaprError::not_found(Self::SLUG))?;
        check_access(&collection.access.update, caller)?;

        match self.crud.update(Self::SLUG, caller, &id.to_string(), to_document(&entity)?).await? {
            Some(doc) => Ok(Some(DataResponse { data: from_document(doc)? })),
            None => Ok(None),
        }
    }

    /// DELETE /api/{{slug}}/{id} - returns whether a document was removed
    pub async fn delete(&self, caller: &Caller, id: {{id_type}}) -> Result<bool> {
        let collection = self
            .crud
            .registry()
            .by_slug(Self::SLUG)
            .ok_or_else(|| ShaprError::not_found(Self::SLUG))?;
        check_access(&collection.access.delete, caller)?;

        self.crud.delete(Self::SLUG, caller, &id.to_string()).await
    }
}

fn to_document(entity: &{{entity}}) -> Result<serde_json::Value> {
    serde_json::to_value(entity).map_err(|error| ShaprError::storage(error.to_string()))
}

fn from_document(doc: serde_json::Value) -> Result<{{entity}}> {
    serde_json::from_value(doc).map_err(|error| ShaprError::storage(error.to_string()))
}
"#;
