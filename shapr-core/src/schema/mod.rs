//! Collection schema model.
//!
//! A [`CollectionDefinition`] is the typed, immutable description of one
//! collection: its fields, access rules and admin metadata. Definitions are
//! built once at configuration-load time (by the builder DSL or the text
//! parser) and read by every request-handling path for the lifetime of the
//! process.

pub mod client;
pub mod field;
pub mod registry;

pub use client::{ClientAccessControl, ClientCollectionSchema, ClientFieldSchema, SchemaResponse};
pub use field::{FieldAdminConfig, FieldDefinition, FieldPosition, FieldType};
pub use registry::CollectionRegistry;

use std::collections::BTreeMap;

use crate::access::AccessControl;
use crate::error::{Result, ShaprError};
use crate::hooks::CollectionHooksConfig;

/// Identifier kind for a collection's primary key. Propagates into the
/// generated repository and controller signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdKind {
    /// 64-bit integer, auto-assigned by the store when absent
    #[default]
    Long,
    /// 32-bit integer
    Int,
    /// Arbitrary string key
    String,
    /// UUID v4, generated by the runtime when absent
    Uuid,
}

impl IdKind {
    /// Rust type spelled into generated source.
    pub fn rust_type(&self) -> &'static str {
        match self {
            IdKind::Long => "i64",
            IdKind::Int => "i32",
            IdKind::String => "String",
            IdKind::Uuid => "uuid::Uuid",
        }
    }
}

/// Labels for the collection in singular and plural forms.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Labels {
    pub singular: String,
    pub plural: String,
}

/// Admin-panel configuration for a collection.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionAdminConfig {
    pub use_as_title: Option<String>,
    pub default_columns: Vec<String>,
    pub hidden: bool,
    pub group: Option<String>,
    pub description: Option<String>,
}

impl Default for CollectionAdminConfig {
    fn default() -> Self {
        Self {
            use_as_title: None,
            default_columns: vec!["id".to_string()],
            hidden: false,
            group: None,
            description: None,
        }
    }
}

/// Complete definition of a collection: the unit the DSL front-ends produce
/// and everything downstream (codegen, hooks, query) consumes.
#[derive(Debug, Clone)]
pub struct CollectionDefinition {
    /// Pascal-cased collection name, e.g. "Post"
    pub name: String,
    /// URL-safe plural identifier, e.g. "posts"
    pub slug: String,
    pub labels: Labels,
    /// Ordered field list; order is preserved into generated source
    pub fields: Vec<FieldDefinition>,
    pub access: AccessControl,
    pub admin: CollectionAdminConfig,
    /// When set, the runtime stamps createdAt/updatedAt on writes
    pub timestamps: bool,
    pub soft_delete: bool,
    pub id_kind: IdKind,
    /// Inline function hooks attached in the DSL. Discovered instance hooks
    /// live in the [`crate::hooks::HookRegistry`] instead.
    pub hooks: Option<CollectionHooksConfig>,
}

impl CollectionDefinition {
    /// Definition with derived slug/labels and defaults everywhere else.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            slug: pluralize(&name.to_lowercase()),
            labels: Labels { singular: name.clone(), plural: pluralize(&name) },
            name,
            fields: Vec::new(),
            access: AccessControl::default(),
            admin: CollectionAdminConfig::default(),
            timestamps: true,
            soft_delete: false,
            id_kind: IdKind::default(),
            hooks: None,
        }
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Entity type name derived from the slug ("posts" -> "Post").
    pub fn entity_name(&self) -> String {
        slug_to_type_name(&self.slug)
    }
}

/// Ordered set of collection definitions, the root of a Shapr configuration.
#[derive(Debug, Clone, Default)]
pub struct ShaprConfig {
    pub collections: Vec<CollectionDefinition>,
}

impl ShaprConfig {
    pub fn new(collections: Vec<CollectionDefinition>) -> Self {
        Self { collections }
    }

    /// Start a builder-DSL configuration.
    pub fn builder() -> crate::dsl::ShaprConfigBuilder {
        crate::dsl::ShaprConfigBuilder::new()
    }

    pub fn collection_by_slug(&self, slug: &str) -> Option<&CollectionDefinition> {
        self.collections.iter().find(|c| c.slug == slug)
    }

    pub fn collection_by_name(&self, name: &str) -> Option<&CollectionDefinition> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// Merge several configurations into one, validating slug uniqueness
    /// across the union. Duplicate slugs are a hard configuration error; the
    /// diagnostic enumerates every duplicate and the colliding collection
    /// names.
    pub fn merge(parts: impl IntoIterator<Item = ShaprConfig>) -> Result<ShaprConfig> {
        let collections: Vec<CollectionDefinition> =
            parts.into_iter().flat_map(|p| p.collections).collect();
        validate_unique_slugs(&collections)?;
        Ok(ShaprConfig { collections })
    }

    /// Validate this configuration (currently: slug uniqueness).
    pub fn validate(&self) -> Result<()> {
        validate_unique_slugs(&self.collections)
    }
}

/// Fail fast when two collections share a slug. The error message names every
/// offending slug together with the colliding collection names.
pub fn validate_unique_slugs(collections: &[CollectionDefinition]) -> Result<()> {
    let mut by_slug: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for collection in collections {
        by_slug.entry(&collection.slug).or_default().push(&collection.name);
    }

    let duplicates: Vec<String> = by_slug
        .iter()
        .filter(|(_, names)| names.len() > 1)
        .map(|(slug, names)| format!("slug '{}' used by collections [{}]", slug, names.join(", ")))
        .collect();

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(ShaprError::configuration(format!(
            "duplicate collection slugs: {}",
            duplicates.join("; ")
        )))
    }
}

/// Pluralization heuristic shared by both DSL front-ends: trailing "y" not
/// preceded by a vowel becomes "ies"; sibilant endings take "es"; everything
/// else takes "s". Irregular nouns are out of scope.
pub fn pluralize(name: &str) -> String {
    let ends_with_any =
        |suffixes: &[&str]| suffixes.iter().any(|suffix| name.ends_with(suffix));

    if name.ends_with('y') && !ends_with_any(&["ay", "ey", "oy", "uy"]) {
        format!("{}ies", &name[..name.len() - 1])
    } else if ends_with_any(&["s", "x", "z", "ch", "sh"]) {
        format!("{}es", name)
    } else {
        format!("{}s", name)
    }
}

/// Reverse of [`pluralize`] for regular nouns.
pub fn singularize(name: &str) -> String {
    if let Some(stem) = name.strip_suffix("ies") {
        return format!("{}y", stem);
    }
    if let Some(stem) = name.strip_suffix("es") {
        if ["s", "x", "z", "ch", "sh"].iter().any(|suffix| stem.ends_with(suffix)) {
            return stem.to_string();
        }
    }
    if let Some(stem) = name.strip_suffix('s') {
        return stem.to_string();
    }
    name.to_string()
}

/// Derive an entity type name from a slug: singularize, then pascal-case on
/// `-`/`_` boundaries ("blog-posts" -> "BlogPost").
pub fn slug_to_type_name(slug: &str) -> String {
    singularize(slug)
        .split(['-', '_'])
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pluralize_heuristics() {
        assert_eq!(pluralize("post"), "posts");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("church"), "churches");
        assert_eq!(pluralize("dish"), "dishes");
        assert_eq!(pluralize("quiz"), "quizes");
        assert_eq!(pluralize("class"), "classes");
    }

    #[test]
    fn singularize_reverses_pluralize() {
        for name in ["post", "category", "day", "box", "church", "dish", "class"] {
            assert_eq!(singularize(&pluralize(name)), name, "round trip for {}", name);
        }
    }

    #[test]
    fn slug_to_type_name_pascal_cases() {
        assert_eq!(slug_to_type_name("posts"), "Post");
        assert_eq!(slug_to_type_name("categories"), "Category");
        assert_eq!(slug_to_type_name("blog-posts"), "BlogPost");
        assert_eq!(slug_to_type_name("order_items"), "OrderItem");
    }

    #[test]
    fn name_round_trips_through_slug() {
        // pluralize(singularize(typeName(pluralize(n)))) reproduces the
        // original pascal-cased name for regular nouns.
        for name in ["Post", "Category", "Product", "Box"] {
            let slug = pluralize(&name.to_lowercase());
            let entity = slug_to_type_name(&slug);
            assert_eq!(entity, *name);
        }
    }

    #[test]
    fn derived_slug_and_labels() {
        let collection = CollectionDefinition::new("Category");
        assert_eq!(collection.slug, "categories");
        assert_eq!(collection.labels.singular, "Category");
        assert_eq!(collection.labels.plural, "Categories");
        assert!(collection.timestamps);
    }

    #[test]
    fn merge_rejects_duplicate_slugs() {
        let mut first = CollectionDefinition::new("Post");
        first.slug = "posts".into();
        let mut second = CollectionDefinition::new("Article");
        second.slug = "posts".into();

        let err = ShaprConfig::merge([
            ShaprConfig::new(vec![first]),
            ShaprConfig::new(vec![second]),
        ])
        .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("posts"));
        assert!(message.contains("Post"));
        assert!(message.contains("Article"));
    }

    #[test]
    fn merge_accepts_distinct_slugs() {
        let merged = ShaprConfig::merge([
            ShaprConfig::new(vec![CollectionDefinition::new("Post")]),
            ShaprConfig::new(vec![CollectionDefinition::new("Category")]),
        ])
        .unwrap();
        assert_eq!(merged.collections.len(), 2);
    }
}
