//! Paginated find orchestration: translator + count + sort + pagination +
//! read hooks, producing the standard envelope.

use std::sync::Arc;

use super::predicate::SortOrder;
use super::translate::WhereTranslator;
use super::{FindOptions, PaginatedDocs};
use crate::error::{Result, ShaprError};
use crate::hooks::{Document, HookExecutor};
use crate::schema::{CollectionDefinition, CollectionRegistry};
use crate::store::DocumentStore;

const DEFAULT_LIMIT: u32 = 10;

#[derive(Clone)]
pub struct QueryService {
    registry: Arc<CollectionRegistry>,
    store: Arc<dyn DocumentStore>,
    hooks: HookExecutor,
}

impl QueryService {
    pub fn new(
        registry: Arc<CollectionRegistry>,
        store: Arc<dyn DocumentStore>,
        hooks: HookExecutor,
    ) -> Self {
        Self { registry, store, hooks }
    }

    /// Find documents in the collection named by `options.collection`.
    pub async fn find(&self, options: &FindOptions) -> Result<PaginatedDocs<Document>> {
        let collection = self.registry.by_slug(&options.collection).ok_or_else(|| {
            ShaprError::not_found(format!("collection '{}' not found", options.collection))
        })?;
        self.find_in(collection, options).await
    }

    /// Find documents resolving the collection from an entity type name
    /// ("Post" -> posts). Unknown names are configuration errors naming the
    /// expected type.
    pub async fn find_by_entity(
        &self,
        entity: &str,
        options: &FindOptions,
    ) -> Result<PaginatedDocs<Document>> {
        let collection = self.registry.by_entity_name(entity)?;
        self.find_in(collection, options).await
    }

    async fn find_in(
        &self,
        collection: &CollectionDefinition,
        options: &FindOptions,
    ) -> Result<PaginatedDocs<Document>> {
        let slug = &collection.slug;

        let translator = WhereTranslator::new(collection, self.registry.config());
        let predicate = translator.translate(options.where_clause.as_ref())?;

        // Count under the same predicate for the total before windowing.
        let total_docs = self.store.count(slug, predicate.as_ref()).await?;

        let sort = parse_sort(options.sort.as_deref(), collection);

        let limit = options.limit.unwrap_or(DEFAULT_LIMIT);
        let page = options.page.unwrap_or(1).max(1);
        let paginated = options.pagination && limit > 0;
        let window = paginated.then(|| ((page as u64 - 1) * limit as u64, limit));

        let raw_docs = self.store.select(slug, predicate.as_ref(), &sort, window).await?;

        let mut docs = Vec::with_capacity(raw_docs.len());
        for doc in raw_docs {
            let doc = self.hooks.before_read(collection, doc)?;
            let doc = self.hooks.after_read(collection, doc, true)?;
            docs.push(doc);
        }

        let total_pages = if paginated && limit > 0 {
            total_docs.div_ceil(limit as u64) as u32
        } else {
            1
        };
        let has_prev_page = page > 1;
        let has_next_page = page < total_pages;

        Ok(PaginatedDocs {
            docs,
            total_docs,
            limit,
            total_pages,
            page: Some(page),
            paging_counter: (page - 1) * limit + 1,
            has_prev_page,
            has_next_page,
            prev_page: has_prev_page.then(|| page - 1),
            next_page: has_next_page.then(|| page + 1),
        })
    }
}

/// Parse a comma-separated sort expression; `-` prefixes mean descending.
/// Unknown field names are skipped rather than rejected.
fn parse_sort(expression: Option<&str>, collection: &CollectionDefinition) -> Vec<SortOrder> {
    let Some(expression) = expression else {
        return Vec::new();
    };

    expression
        .split(',')
        .filter_map(|entry| {
            let trimmed = entry.trim();
            if trimmed.is_empty() {
                return None;
            }
            let (descending, field) = match trimmed.strip_prefix('-') {
                Some(name) => (true, name),
                None => (false, trimmed),
            };
            if is_sortable(collection, field) {
                Some(SortOrder { field: field.to_string(), descending })
            } else {
                log::debug!("ignoring sort on unknown field '{}'", field);
                None
            }
        })
        .collect()
}

fn is_sortable(collection: &CollectionDefinition, field: &str) -> bool {
    field == "id"
        || (collection.timestamps && (field == "createdAt" || field == "updatedAt"))
        || collection.field(field).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{AccessControl, AccessRule, Caller};
    use crate::crud::CrudService;
    use crate::dsl::{self, CollectionBuilder};
    use crate::hooks::HookRegistry;
    use crate::query::Where;
    use crate::schema::ShaprConfig;
    use crate::store::MemoryStore;
    use serde_json::json;

    async fn seeded_service() -> QueryService {
        let config = ShaprConfig::builder()
            .collection(
                CollectionBuilder::new("Post")
                    .access(AccessControl {
                        create: AccessRule::Public,
                        read: AccessRule::Public,
                        update: AccessRule::Public,
                        delete: AccessRule::Public,
                    })
                    .field(dsl::text("title").required(true))
                    .field(dsl::number("views").integer_only(true)),
            )
            .build()
            .unwrap();
        let registry = Arc::new(CollectionRegistry::new(config).unwrap());
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let hooks = HookExecutor::new(Arc::new(HookRegistry::empty()));

        let crud = CrudService::new(registry.clone(), store.clone(), hooks.clone());
        for index in 1..=12 {
            crud.create(
                "posts",
                &Caller::anonymous(),
                json!({"title": format!("Post {index}"), "views": index}),
            )
            .await
            .unwrap();
        }

        QueryService::new(registry, store, hooks)
    }

    #[tokio::test]
    async fn paginates_with_envelope_math() {
        let service = seeded_service().await;

        let page1 = service
            .find(&FindOptions::new("posts").with_limit(5).with_page(1))
            .await
            .unwrap();
        assert_eq!(page1.docs.len(), 5);
        assert_eq!(page1.total_docs, 12);
        assert_eq!(page1.total_pages, 3);
        assert!(!page1.has_prev_page);
        assert!(page1.has_next_page);
        assert_eq!(page1.next_page, Some(2));
        assert_eq!(page1.paging_counter, 1);

        let page3 = service
            .find(&FindOptions::new("posts").with_limit(5).with_page(3))
            .await
            .unwrap();
        assert_eq!(page3.docs.len(), 2);
        assert!(page3.has_prev_page);
        assert!(!page3.has_next_page);
        assert_eq!(page3.prev_page, Some(2));
        assert_eq!(page3.paging_counter, 11);
    }

    #[tokio::test]
    async fn filters_and_counts_under_same_predicate() {
        let service = seeded_service().await;

        let clause: Where =
            serde_json::from_value(json!({"views": {"greater_than": 10}})).unwrap();
        let result = service
            .find(&FindOptions::new("posts").with_where(clause).with_limit(5))
            .await
            .unwrap();
        assert_eq!(result.total_docs, 2);
        assert_eq!(result.docs.len(), 2);
        assert!(!result.has_next_page);
    }

    #[tokio::test]
    async fn sorts_descending_and_skips_unknown_fields() {
        let service = seeded_service().await;

        let result = service
            .find(&FindOptions::new("posts").with_sort("-views,bogus").with_limit(3))
            .await
            .unwrap();
        let views: Vec<i64> =
            result.docs.iter().map(|doc| doc["views"].as_i64().unwrap()).collect();
        assert_eq!(views, vec![12, 11, 10]);
    }

    #[tokio::test]
    async fn pagination_disabled_fetches_everything() {
        let service = seeded_service().await;

        let result =
            service.find(&FindOptions::new("posts").without_pagination()).await.unwrap();
        assert_eq!(result.docs.len(), 12);
        assert_eq!(result.total_pages, 1);
    }

    #[tokio::test]
    async fn unknown_collection_is_not_found() {
        let service = seeded_service().await;
        let err = service.find(&FindOptions::new("ghosts")).await.unwrap_err();
        assert!(matches!(err, ShaprError::NotFound(_)));
    }

    #[tokio::test]
    async fn entity_name_lookup_resolves_or_names_expected_type() {
        let service = seeded_service().await;
        let result =
            service.find_by_entity("Post", &FindOptions::new("ignored")).await.unwrap();
        assert_eq!(result.total_docs, 12);

        let err = service.find_by_entity("Widget", &FindOptions::new("ignored")).await;
        assert!(err.unwrap_err().to_string().contains("Widget"));
    }
}
