//! Stage-by-stage hook execution.
//!
//! For every stage the executor first applies the collection's inline DSL
//! hooks, then the registry-matched instance hooks, folding each hook's
//! result into the running value. Hooks run synchronously and sequentially
//! within the request's handling path; an error from any hook aborts the
//! remaining pipeline for that request only.

use std::sync::Arc;

use super::{
    AfterChangeArgs, AfterDeleteArgs, AfterReadArgs, BeforeChangeArgs, BeforeDeleteArgs,
    BeforeOperationArgs, BeforeOperationOutcome, BeforeReadArgs, BeforeValidateArgs,
    CollectionHooks, Document, HookOperation, HookRegistry,
};
use crate::error::{Result, ShaprError};
use crate::schema::CollectionDefinition;

#[derive(Clone)]
pub struct HookExecutor {
    registry: Arc<HookRegistry>,
}

impl HookExecutor {
    pub fn new(registry: Arc<HookRegistry>) -> Self {
        Self { registry }
    }

    /// Executor with no registered instance hooks; DSL hooks still apply.
    pub fn without_registry() -> Self {
        Self { registry: Arc::new(HookRegistry::empty()) }
    }

    fn discovered<'a>(
        &'a self,
        collection: &CollectionDefinition,
    ) -> &'a [Arc<dyn CollectionHooks>] {
        self.registry.hooks_for_collection(collection)
    }

    /// Run beforeOperation hooks. A cancellation from any hook is
    /// operation-fatal and surfaces as [`ShaprError::OperationCancelled`];
    /// otherwise the folded (possibly substituted) data is returned.
    pub fn before_operation(
        &self,
        collection: &CollectionDefinition,
        operation: HookOperation,
        data: Option<Document>,
        id: Option<&Document>,
    ) -> Result<Option<Document>> {
        let mut data = data;

        if let Some(config) = &collection.hooks {
            for hook in &config.before_operation {
                let args = BeforeOperationArgs { collection, operation, data: data.as_ref(), id };
                match hook(&args)? {
                    BeforeOperationOutcome::Continue(next) => data = next,
                    BeforeOperationOutcome::Cancel => {
                        return Err(ShaprError::OperationCancelled {
                            collection: collection.slug.clone(),
                        })
                    }
                }
            }
        }

        for hook in self.discovered(collection) {
            let args = BeforeOperationArgs { collection, operation, data: data.as_ref(), id };
            match hook.before_operation(&args)? {
                BeforeOperationOutcome::Continue(next) => data = next,
                BeforeOperationOutcome::Cancel => {
                    return Err(ShaprError::OperationCancelled {
                        collection: collection.slug.clone(),
                    })
                }
            }
        }

        Ok(data)
    }

    /// Run beforeValidate hooks. A hook returning `None` skips only its own
    /// effect, preserving the pre-stage value.
    pub fn before_validate(
        &self,
        collection: &CollectionDefinition,
        operation: HookOperation,
        data: Option<Document>,
        original_doc: Option<&Document>,
    ) -> Result<Option<Document>> {
        let mut data = data;

        if let Some(config) = &collection.hooks {
            for hook in &config.before_validate {
                let args =
                    BeforeValidateArgs { collection, operation, data: data.as_ref(), original_doc };
                if let Some(next) = hook(&args)? {
                    data = Some(next);
                }
            }
        }

        for hook in self.discovered(collection) {
            let args =
                BeforeValidateArgs { collection, operation, data: data.as_ref(), original_doc };
            if let Some(next) = hook.before_validate(&args)? {
                data = Some(next);
            }
        }

        Ok(data)
    }

    /// Run beforeChange hooks; every hook must return the (possibly modified)
    /// data.
    pub fn before_change(
        &self,
        collection: &CollectionDefinition,
        operation: HookOperation,
        data: Document,
        original_doc: Option<&Document>,
    ) -> Result<Document> {
        let mut data = data;

        if let Some(config) = &collection.hooks {
            for hook in &config.before_change {
                let args = BeforeChangeArgs { collection, operation, data: &data, original_doc };
                data = hook(&args)?;
            }
        }

        for hook in self.discovered(collection) {
            let args = BeforeChangeArgs { collection, operation, data: &data, original_doc };
            data = hook.before_change(&args)?;
        }

        Ok(data)
    }

    /// Run afterChange hooks over the persisted document.
    pub fn after_change(
        &self,
        collection: &CollectionDefinition,
        operation: HookOperation,
        data: &Document,
        doc: Document,
        previous_doc: Option<&Document>,
    ) -> Result<Document> {
        let mut doc = doc;

        if let Some(config) = &collection.hooks {
            for hook in &config.after_change {
                let args =
                    AfterChangeArgs { collection, operation, data, doc: &doc, previous_doc };
                doc = hook(&args)?;
            }
        }

        for hook in self.discovered(collection) {
            let args = AfterChangeArgs { collection, operation, data, doc: &doc, previous_doc };
            doc = hook.after_change(&args)?;
        }

        Ok(doc)
    }

    pub fn before_read(
        &self,
        collection: &CollectionDefinition,
        doc: Document,
    ) -> Result<Document> {
        let mut doc = doc;

        if let Some(config) = &collection.hooks {
            for hook in &config.before_read {
                let args = BeforeReadArgs { collection, doc: &doc };
                doc = hook(&args)?;
            }
        }

        for hook in self.discovered(collection) {
            let args = BeforeReadArgs { collection, doc: &doc };
            doc = hook.before_read(&args)?;
        }

        Ok(doc)
    }

    pub fn after_read(
        &self,
        collection: &CollectionDefinition,
        doc: Document,
        find_many: bool,
    ) -> Result<Document> {
        let mut doc = doc;

        if let Some(config) = &collection.hooks {
            for hook in &config.after_read {
                let args = AfterReadArgs { collection, doc: &doc, find_many };
                doc = hook(&args)?;
            }
        }

        for hook in self.discovered(collection) {
            let args = AfterReadArgs { collection, doc: &doc, find_many };
            doc = hook.after_read(&args)?;
        }

        Ok(doc)
    }

    /// Run beforeDelete hooks; an error from any hook aborts the deletion.
    pub fn before_delete(&self, collection: &CollectionDefinition, id: &Document) -> Result<()> {
        if let Some(config) = &collection.hooks {
            for hook in &config.before_delete {
                hook(&BeforeDeleteArgs { collection, id })?;
            }
        }

        for hook in self.discovered(collection) {
            hook.before_delete(&BeforeDeleteArgs { collection, id })?;
        }

        Ok(())
    }

    /// Run afterDelete hooks; callers invoke this only when a document
    /// actually existed before removal.
    pub fn after_delete(
        &self,
        collection: &CollectionDefinition,
        doc: &Document,
        id: &Document,
    ) -> Result<()> {
        if let Some(config) = &collection.hooks {
            for hook in &config.after_delete {
                hook(&AfterDeleteArgs { collection, doc, id })?;
            }
        }

        for hook in self.discovered(collection) {
            hook.after_delete(&AfterDeleteArgs { collection, doc, id })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::CollectionHooksConfig;
    use serde_json::json;

    struct UppercaseTitle;

    impl CollectionHooks for UppercaseTitle {
        fn collection(&self) -> &str {
            "Post"
        }

        fn before_change(&self, args: &BeforeChangeArgs<'_>) -> Result<Document> {
            let mut doc = args.data.clone();
            if let Some(title) = doc.get("title").and_then(|t| t.as_str()) {
                let upper = title.to_uppercase();
                doc["title"] = json!(upper);
            }
            Ok(doc)
        }
    }

    struct CancelEverything;

    impl CollectionHooks for CancelEverything {
        fn collection(&self) -> &str {
            "Post"
        }

        fn before_operation(
            &self,
            _args: &BeforeOperationArgs<'_>,
        ) -> Result<BeforeOperationOutcome> {
            Ok(BeforeOperationOutcome::Cancel)
        }
    }

    fn post_collection() -> CollectionDefinition {
        CollectionDefinition::new("Post")
    }

    #[test]
    fn dsl_hooks_run_before_registry_hooks() {
        // The DSL hook appends "-dsl", the instance hook uppercases; the
        // final title proves the DSL hook ran first.
        let mut collection = post_collection();
        collection.hooks = Some(
            CollectionHooksConfig::builder()
                .before_change(|args: &BeforeChangeArgs<'_>| {
                    let mut doc = args.data.clone();
                    let title = doc["title"].as_str().unwrap_or_default().to_string();
                    doc["title"] = json!(format!("{}-dsl", title));
                    Ok(doc)
                })
                .build(),
        );

        let registry = HookRegistry::new(vec![Arc::new(UppercaseTitle)]);
        let executor = HookExecutor::new(Arc::new(registry));

        let result = executor
            .before_change(&collection, HookOperation::Create, json!({"title": "hi"}), None)
            .unwrap();
        assert_eq!(result["title"], "HI-DSL");
    }

    #[test]
    fn cancellation_is_operation_fatal() {
        let collection = post_collection();
        let registry = HookRegistry::new(vec![Arc::new(CancelEverything)]);
        let executor = HookExecutor::new(Arc::new(registry));

        let err = executor
            .before_operation(&collection, HookOperation::Create, Some(json!({})), None)
            .unwrap_err();
        assert!(matches!(err, ShaprError::OperationCancelled { .. }));
    }

    #[test]
    fn before_validate_none_keeps_prior_data() {
        let mut collection = post_collection();
        collection.hooks = Some(
            CollectionHooksConfig::builder()
                .before_validate(|_args: &BeforeValidateArgs<'_>| Ok(None))
                .build(),
        );
        let executor = HookExecutor::without_registry();

        let data = executor
            .before_validate(
                &collection,
                HookOperation::Create,
                Some(json!({"title": "kept"})),
                None,
            )
            .unwrap();
        assert_eq!(data.unwrap()["title"], "kept");
    }

    #[test]
    fn hook_failure_propagates() {
        let mut collection = post_collection();
        collection.hooks = Some(
            CollectionHooksConfig::builder()
                .before_delete(|args: &BeforeDeleteArgs<'_>| {
                    Err(ShaprError::hook(args.collection.slug.clone(), "beforeDelete", "nope"))
                })
                .build(),
        );
        let executor = HookExecutor::without_registry();

        let err = executor.before_delete(&collection, &json!(1)).unwrap_err();
        assert!(matches!(err, ShaprError::Hook { .. }));
    }

    #[test]
    fn unmatched_collection_runs_no_instance_hooks() {
        let registry = HookRegistry::new(vec![Arc::new(UppercaseTitle)]);
        let executor = HookExecutor::new(Arc::new(registry));
        let collection = CollectionDefinition::new("Category");

        let doc = executor
            .before_change(&collection, HookOperation::Create, json!({"title": "low"}), None)
            .unwrap();
        assert_eq!(doc["title"], "low");
    }
}
