//! Collection lookup by slug, name or entity type name.
//!
//! Built once at startup from a validated [`ShaprConfig`] and shared
//! read-only across request handlers. The entity-name index replaces the
//! original runtime's conventional class loading: every generated entity
//! type name maps to its slug here, so a lookup miss is a configuration
//! diagnostic rather than a class-loading failure.

use std::collections::HashMap;
use std::sync::Arc;

use super::{slug_to_type_name, CollectionDefinition, ShaprConfig};
use crate::error::{Result, ShaprError};

#[derive(Debug)]
pub struct CollectionRegistry {
    config: Arc<ShaprConfig>,
    by_slug: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
    /// Entity type name ("Post") -> collection index
    by_entity: HashMap<String, usize>,
}

impl CollectionRegistry {
    /// Build the registry, validating the configuration first. Duplicate
    /// slugs fail here so a broken config never reaches request handling.
    pub fn new(config: ShaprConfig) -> Result<Self> {
        config.validate()?;

        let mut by_slug = HashMap::new();
        let mut by_name = HashMap::new();
        let mut by_entity = HashMap::new();
        for (index, collection) in config.collections.iter().enumerate() {
            by_slug.insert(collection.slug.clone(), index);
            by_name.insert(collection.name.clone(), index);
            by_entity.insert(slug_to_type_name(&collection.slug), index);
        }

        Ok(Self { config: Arc::new(config), by_slug, by_name, by_entity })
    }

    pub fn config(&self) -> &ShaprConfig {
        &self.config
    }

    pub fn all(&self) -> &[CollectionDefinition] {
        &self.config.collections
    }

    pub fn by_slug(&self, slug: &str) -> Option<&CollectionDefinition> {
        self.by_slug.get(slug).map(|&index| &self.config.collections[index])
    }

    pub fn by_name(&self, name: &str) -> Option<&CollectionDefinition> {
        self.by_name.get(name).map(|&index| &self.config.collections[index])
    }

    pub fn exists(&self, slug: &str) -> bool {
        self.by_slug.contains_key(slug)
    }

    /// Resolve a collection from an entity type name ("Post" -> posts). A
    /// miss names the expected type to aid debugging of naming-convention
    /// mismatches.
    pub fn by_entity_name(&self, entity: &str) -> Result<&CollectionDefinition> {
        self.by_entity
            .get(entity)
            .map(|&index| &self.config.collections[index])
            .ok_or_else(|| {
                ShaprError::configuration(format!(
                    "no collection found for entity type '{}'; expected a collection whose slug \
                     derives that type name",
                    entity
                ))
            })
    }
}
