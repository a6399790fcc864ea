//! Explicit hook registration and collection matching.
//!
//! Instance hooks are handed to the registry at startup by the composition
//! root; there is no container scanning or type introspection. Each hook
//! declares its binding tag through [`CollectionHooks::collection`], and the
//! registry indexes instances by that tag.

use std::collections::HashMap;
use std::sync::Arc;

use super::CollectionHooks;
use crate::schema::{slug_to_type_name, CollectionDefinition};

#[derive(Default)]
pub struct HookRegistry {
    by_binding: HashMap<String, Vec<Arc<dyn CollectionHooks>>>,
    count: usize,
}

impl HookRegistry {
    /// Index the given hook instances by binding tag, preserving registration
    /// order within each tag.
    pub fn new(hooks: Vec<Arc<dyn CollectionHooks>>) -> Self {
        let mut by_binding: HashMap<String, Vec<Arc<dyn CollectionHooks>>> = HashMap::new();
        let count = hooks.len();
        for hook in hooks {
            by_binding.entry(hook.collection().to_string()).or_default().push(hook);
        }
        log::debug!("hook registry built: {} instances, {} bindings", count, by_binding.len());
        Self { by_binding, count }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Hooks registered under an exact binding tag.
    pub fn hooks_for_binding(&self, binding: &str) -> &[Arc<dyn CollectionHooks>] {
        self.by_binding.get(binding).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Hooks for a collection. Matching tries, in order: the collection name,
    /// the entity name derived from the slug, then the raw slug. The first
    /// non-empty match wins; no match at all simply means no hooks.
    pub fn hooks_for_collection(
        &self,
        collection: &CollectionDefinition,
    ) -> &[Arc<dyn CollectionHooks>] {
        let by_name = self.hooks_for_binding(&collection.name);
        if !by_name.is_empty() {
            return by_name;
        }

        let by_entity = self.hooks_for_binding(&slug_to_type_name(&collection.slug));
        if !by_entity.is_empty() {
            return by_entity;
        }

        self.hooks_for_binding(&collection.slug)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tagged(&'static str);

    impl CollectionHooks for Tagged {
        fn collection(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn matches_by_collection_name_first() {
        let registry =
            HookRegistry::new(vec![Arc::new(Tagged("Post")), Arc::new(Tagged("posts"))]);
        let collection = CollectionDefinition::new("Post");
        let matched = registry.hooks_for_collection(&collection);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].collection(), "Post");
    }

    #[test]
    fn falls_back_to_entity_name_then_slug() {
        // Binding declared against the entity name derived from the slug
        let registry = HookRegistry::new(vec![Arc::new(Tagged("Category"))]);
        let mut collection = CollectionDefinition::new("CategoryCollection");
        collection.slug = "categories".into();
        assert_eq!(registry.hooks_for_collection(&collection).len(), 1);

        // Binding declared against the raw slug
        let registry = HookRegistry::new(vec![Arc::new(Tagged("categories"))]);
        assert_eq!(registry.hooks_for_collection(&collection).len(), 1);
    }

    #[test]
    fn unmatched_collection_gets_no_hooks() {
        let registry = HookRegistry::new(vec![Arc::new(Tagged("Post"))]);
        let collection = CollectionDefinition::new("Product");
        assert!(registry.hooks_for_collection(&collection).is_empty());
    }

    #[test]
    fn registration_order_is_preserved() {
        let registry =
            HookRegistry::new(vec![Arc::new(Tagged("Post")), Arc::new(Tagged("Post"))]);
        assert_eq!(registry.hooks_for_binding("Post").len(), 2);
        assert_eq!(registry.len(), 2);
    }
}
