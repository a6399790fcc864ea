//! CRUD pipelines: access check, hook stages and persistence in the exact
//! order every verb promises.
//!
//! Each pipeline runs the access check before any other work, threads hook
//! results forward stage by stage, and turns cancellation/absence into the
//! distinct errors the HTTP layer maps onto responses.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};

use crate::access::{check_access, Caller};
use crate::error::{Result, ShaprError};
use crate::hooks::{Document, HookExecutor, HookOperation};
use crate::schema::{CollectionDefinition, CollectionRegistry, IdKind};
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct CrudService {
    registry: Arc<CollectionRegistry>,
    store: Arc<dyn DocumentStore>,
    hooks: HookExecutor,
}

impl CrudService {
    pub fn new(
        registry: Arc<CollectionRegistry>,
        store: Arc<dyn DocumentStore>,
        hooks: HookExecutor,
    ) -> Self {
        Self { registry, store, hooks }
    }

    pub fn registry(&self) -> &CollectionRegistry {
        &self.registry
    }

    fn collection(&self, slug: &str) -> Result<&CollectionDefinition> {
        self.registry
            .by_slug(slug)
            .ok_or_else(|| ShaprError::not_found(format!("collection '{}' not found", slug)))
    }

    /// Create: beforeOperation -> beforeValidate -> beforeChange -> persist
    /// -> afterChange. Cancellation in beforeOperation aborts before anything
    /// is persisted.
    pub async fn create(&self, slug: &str, caller: &Caller, data: Document) -> Result<Document> {
        let collection = self.collection(slug)?;
        check_access(&collection.access.create, caller)?;

        let folded =
            self.hooks.before_operation(collection, HookOperation::Create, Some(data.clone()), None)?;
        let mut data = folded.unwrap_or(data);

        if let Some(validated) =
            self.hooks
                .before_validate(collection, HookOperation::Create, Some(data.clone()), None)?
        {
            data = validated;
        }

        data = self.hooks.before_change(collection, HookOperation::Create, data, None)?;

        prepare_for_insert(collection, &mut data);

        let saved = self.store.save(slug, data.clone()).await?;
        log::debug!("created document in '{}'", slug);

        self.hooks.after_change(collection, HookOperation::Create, &data, saved, None)
    }

    /// Read a single document, folding it through beforeRead then afterRead.
    /// `None` means not-found.
    pub async fn get(&self, slug: &str, caller: &Caller, id: &str) -> Result<Option<Document>> {
        let collection = self.collection(slug)?;
        check_access(&collection.access.read, caller)?;

        let Some(doc) = self.store.find_by_id(slug, id).await? else {
            return Ok(None);
        };

        let doc = self.hooks.before_read(collection, doc)?;
        let doc = self.hooks.after_read(collection, doc, false)?;
        Ok(Some(doc))
    }

    /// Unpaginated list with per-document read hooks (`find_many = true`).
    pub async fn list(&self, slug: &str, caller: &Caller) -> Result<Vec<Document>> {
        let collection = self.collection(slug)?;
        check_access(&collection.access.read, caller)?;

        let mut docs = Vec::new();
        for doc in self.store.find_all(slug).await? {
            let doc = self.hooks.before_read(collection, doc)?;
            let doc = self.hooks.after_read(collection, doc, true)?;
            docs.push(doc);
        }
        Ok(docs)
    }

    /// Update: existence pre-check guards entry into the same chain as
    /// create, with the pre-existing document threaded as `original_doc`.
    pub async fn update(
        &self,
        slug: &str,
        caller: &Caller,
        id: &str,
        data: Document,
    ) -> Result<Option<Document>> {
        let collection = self.collection(slug)?;
        check_access(&collection.access.update, caller)?;

        if !self.store.exists(slug, id).await? {
            return Ok(None);
        }
        let original = self.store.find_by_id(slug, id).await?;

        // The path identifier wins over whatever the body carried.
        let mut data = data;
        if let Some(original_id) = original.as_ref().and_then(|doc| doc.get("id")) {
            data["id"] = original_id.clone();
        }

        let id_value = json!(id);
        let folded = self.hooks.before_operation(
            collection,
            HookOperation::Update,
            Some(data.clone()),
            Some(&id_value),
        )?;
        let mut data = folded.unwrap_or(data);

        if let Some(validated) = self.hooks.before_validate(
            collection,
            HookOperation::Update,
            Some(data.clone()),
            original.as_ref(),
        )? {
            data = validated;
        }

        data = self.hooks.before_change(
            collection,
            HookOperation::Update,
            data,
            original.as_ref(),
        )?;

        prepare_for_update(collection, &mut data, original.as_ref());

        let saved = self.store.save(slug, data.clone()).await?;
        log::debug!("updated document '{}' in '{}'", id, slug);

        let doc = self.hooks.after_change(
            collection,
            HookOperation::Update,
            &data,
            saved,
            original.as_ref(),
        )?;
        Ok(Some(doc))
    }

    /// Delete: existence check, beforeDelete (may abort), removal, then
    /// afterDelete only because a prior snapshot existed.
    pub async fn delete(&self, slug: &str, caller: &Caller, id: &str) -> Result<bool> {
        let collection = self.collection(slug)?;
        check_access(&collection.access.delete, caller)?;

        if !self.store.exists(slug, id).await? {
            return Ok(false);
        }
        let snapshot = self.store.find_by_id(slug, id).await?;

        let id_value = json!(id);
        self.hooks.before_delete(collection, &id_value)?;

        self.store.delete_by_id(slug, id).await?;
        log::debug!("deleted document '{}' from '{}'", id, slug);

        if let Some(doc) = snapshot {
            self.hooks.after_delete(collection, &doc, &id_value)?;
        }

        Ok(true)
    }
}

/// Stamp createdAt/updatedAt and pre-assign UUID identifiers on insert.
fn prepare_for_insert(collection: &CollectionDefinition, data: &mut Document) {
    if collection.id_kind == IdKind::Uuid
        && matches!(data.get("id"), None | Some(Value::Null))
    {
        data["id"] = json!(uuid::Uuid::new_v4().to_string());
    }
    if collection.timestamps {
        let now = Utc::now().to_rfc3339();
        data["createdAt"] = json!(now);
        data["updatedAt"] = json!(now);
    }
}

/// Refresh updatedAt, carrying createdAt over from the original document.
fn prepare_for_update(
    collection: &CollectionDefinition,
    data: &mut Document,
    original: Option<&Document>,
) {
    if collection.timestamps {
        if data.get("createdAt").map_or(true, Value::is_null) {
            if let Some(created) = original.and_then(|doc| doc.get("createdAt")) {
                data["createdAt"] = created.clone();
            }
        }
        data["updatedAt"] = json!(Utc::now().to_rfc3339());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{AccessControl, AccessRule};
    use crate::dsl::{self, CollectionBuilder};
    use crate::hooks::{
        BeforeChangeArgs, BeforeOperationArgs, BeforeOperationOutcome, CollectionHooksConfig,
        HookRegistry,
    };
    use crate::query::predicate::{Predicate, SortOrder};
    use crate::schema::ShaprConfig;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store double that counts saves so tests can prove nothing was
    /// persisted after a cancellation.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        saves: AtomicUsize,
    }

    #[async_trait]
    impl DocumentStore for CountingStore {
        async fn find_all(&self, collection: &str) -> Result<Vec<Document>> {
            self.inner.find_all(collection).await
        }
        async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>> {
            self.inner.find_by_id(collection, id).await
        }
        async fn exists(&self, collection: &str, id: &str) -> Result<bool> {
            self.inner.exists(collection, id).await
        }
        async fn save(&self, collection: &str, doc: Document) -> Result<Document> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.inner.save(collection, doc).await
        }
        async fn delete_by_id(&self, collection: &str, id: &str) -> Result<bool> {
            self.inner.delete_by_id(collection, id).await
        }
        async fn count(&self, collection: &str, predicate: Option<&Predicate>) -> Result<u64> {
            self.inner.count(collection, predicate).await
        }
        async fn select(
            &self,
            collection: &str,
            predicate: Option<&Predicate>,
            sort: &[SortOrder],
            window: Option<(u64, u32)>,
        ) -> Result<Vec<Document>> {
            self.inner.select(collection, predicate, sort, window).await
        }
    }

    fn open_access() -> AccessControl {
        AccessControl {
            create: AccessRule::Public,
            read: AccessRule::Public,
            update: AccessRule::Public,
            delete: AccessRule::Public,
        }
    }

    fn service_with(
        hooks: Option<CollectionHooksConfig>,
        store: Arc<dyn DocumentStore>,
    ) -> CrudService {
        let mut builder = CollectionBuilder::new("Post")
            .access(open_access())
            .field(dsl::text("title").required(true))
            .field(dsl::textarea("content"));
        if let Some(hooks) = hooks {
            builder = builder.hooks(hooks);
        }
        let config = ShaprConfig::builder().collection(builder).build().unwrap();
        let registry = Arc::new(CollectionRegistry::new(config).unwrap());
        CrudService::new(registry, store, HookExecutor::new(Arc::new(HookRegistry::empty())))
    }

    #[tokio::test]
    async fn create_runs_hooks_and_stamps_timestamps() {
        let hooks = CollectionHooksConfig::builder()
            .before_change(|args: &BeforeChangeArgs<'_>| {
                let mut doc = args.data.clone();
                let title = doc["title"].as_str().unwrap_or_default().to_uppercase();
                doc["title"] = json!(title);
                Ok(doc)
            })
            .build();
        let service = service_with(Some(hooks), Arc::new(MemoryStore::new()));

        let doc = service
            .create("posts", &Caller::anonymous(), json!({"title": "hi", "content": "x"}))
            .await
            .unwrap();

        assert_eq!(doc["title"], "HI");
        assert_eq!(doc["id"], json!(1));
        assert!(doc["createdAt"].is_string());
        assert!(doc["updatedAt"].is_string());
    }

    #[tokio::test]
    async fn cancelled_create_never_touches_the_store() {
        let hooks = CollectionHooksConfig::builder()
            .before_operation(|_args: &BeforeOperationArgs<'_>| Ok(BeforeOperationOutcome::Cancel))
            .build();
        let store = Arc::new(CountingStore::default());
        let service = service_with(Some(hooks), store.clone());

        let err = service
            .create("posts", &Caller::anonymous(), json!({"title": "hi"}))
            .await
            .unwrap_err();

        assert!(matches!(err, ShaprError::OperationCancelled { .. }));
        assert_eq!(store.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn update_threads_original_and_reports_missing() {
        let store = Arc::new(MemoryStore::new());
        let hooks = CollectionHooksConfig::builder()
            .before_change(|args: &BeforeChangeArgs<'_>| {
                // The original document must be visible during update.
                if args.operation == HookOperation::Update {
                    assert!(args.original_doc.is_some());
                }
                Ok(args.data.clone())
            })
            .build();
        let service = service_with(Some(hooks), store);

        let created = service
            .create("posts", &Caller::anonymous(), json!({"title": "v1", "content": "c"}))
            .await
            .unwrap();
        let id = created["id"].to_string();

        let updated = service
            .update("posts", &Caller::anonymous(), &id, json!({"title": "v2"}))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["title"], "v2");
        assert_eq!(updated["id"], created["id"]);
        assert_eq!(updated["createdAt"], created["createdAt"]);

        let missing =
            service.update("posts", &Caller::anonymous(), "999", json!({"title": "x"})).await;
        assert!(matches!(missing, Ok(None)));
    }

    #[tokio::test]
    async fn delete_skips_after_delete_when_absent() {
        use std::sync::atomic::AtomicBool;
        static AFTER_DELETE_RAN: AtomicBool = AtomicBool::new(false);

        let hooks = CollectionHooksConfig::builder()
            .after_delete(|_args: &crate::hooks::AfterDeleteArgs<'_>| {
                AFTER_DELETE_RAN.store(true, Ordering::SeqCst);
                Ok(())
            })
            .build();
        let service = service_with(Some(hooks), Arc::new(MemoryStore::new()));

        let removed = service.delete("posts", &Caller::anonymous(), "999").await.unwrap();
        assert!(!removed);
        assert!(!AFTER_DELETE_RAN.load(Ordering::SeqCst));

        service
            .create("posts", &Caller::anonymous(), json!({"title": "t", "content": ""}))
            .await
            .unwrap();
        assert!(service.delete("posts", &Caller::anonymous(), "1").await.unwrap());
        assert!(AFTER_DELETE_RAN.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn access_check_runs_before_anything_else() {
        let config = ShaprConfig::builder()
            .collection(CollectionBuilder::new("Secret").field(dsl::text("code")))
            .build()
            .unwrap();
        let registry = Arc::new(CollectionRegistry::new(config).unwrap());
        let store = Arc::new(CountingStore::default());
        let service = CrudService::new(
            registry,
            store.clone(),
            HookExecutor::new(Arc::new(HookRegistry::empty())),
        );

        let err = service
            .create("secrets", &Caller::anonymous(), json!({"code": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ShaprError::AccessDenied(_)));
        assert_eq!(store.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_slug_is_not_found() {
        let service = service_with(None, Arc::new(MemoryStore::new()));
        let err = service.get("ghosts", &Caller::anonymous(), "1").await.unwrap_err();
        assert!(matches!(err, ShaprError::NotFound(_)));
    }
}
