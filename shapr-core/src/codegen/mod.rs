//! Source generation: one collection definition in, Rust source text out.
//!
//! For every collection the generator emits a typed entity struct, a
//! repository bound to the entity and its identifier type, and a CRUD
//! controller for `/api/{slug}` that runs the access check and hook pipeline
//! through the runtime services. Templates are plain constants rendered with
//! placeholder substitution.

mod templates;

use crate::schema::{CollectionDefinition, FieldType, ShaprConfig};

/// A generated source file: relative path plus rendered content.
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Generator;

impl Generator {
    pub fn new() -> Self {
        Self
    }

    /// Generate entity, repository and controller source for one collection.
    pub fn generate_collection(&self, collection: &CollectionDefinition) -> Vec<GeneratedFile> {
        let entity = collection.entity_name();
        let module = to_snake_case(&entity);

        vec![
            GeneratedFile {
                path: format!("{}.rs", module),
                content: self.render_entity(collection),
            },
            GeneratedFile {
                path: format!("{}_repository.rs", module),
                content: self.render_repository(collection),
            },
            GeneratedFile {
                path: format!("{}_controller.rs", module),
                content: self.render_controller(collection),
            },
        ]
    }

    /// Generate source for a whole configuration, plus the module index.
    pub fn generate_config(&self, config: &ShaprConfig) -> Vec<GeneratedFile> {
        let mut files = Vec::new();
        let mut modules = Vec::new();

        for collection in &config.collections {
            let module = to_snake_case(&collection.entity_name());
            modules.push(format!("pub mod {};", module));
            modules.push(format!("pub mod {}_repository;", module));
            modules.push(format!("pub mod {}_controller;", module));
            files.extend(self.generate_collection(collection));
        }

        files.push(GeneratedFile {
            path: "mod.rs".to_string(),
            content: format!("{}\n{}\n", templates::HEADER, modules.join("\n")),
        });
        files
    }

    fn render_entity(&self, collection: &CollectionDefinition) -> String {
        let mut field_lines = String::new();
        for field in &collection.fields {
            let rust_name = to_snake_case(&field.name);
            let base_type = field.field_type.rust_type();
            let (ty, skip_none) = match &field.field_type {
                // Checkboxes always carry a value; everything optional wraps.
                FieldType::Checkbox { .. } => (base_type.to_string(), false),
                other if other.is_required() => (base_type.to_string(), false),
                _ => (format!("Option<{}>", base_type), true),
            };
            if skip_none {
                field_lines
                    .push_str("    #[serde(skip_serializing_if = \"Option::is_none\")]\n");
            }
            field_lines.push_str(&format!("    pub {}: {},\n", rust_name, ty));
        }

        let timestamp_lines = if collection.timestamps {
            templates::ENTITY_TIMESTAMP_FIELDS
        } else {
            ""
        };

        render(
            templates::ENTITY,
            &[
                ("entity", &collection.entity_name()),
                ("id_type", collection.id_kind.rust_type()),
                ("field_lines", field_lines.trim_end()),
                ("timestamp_lines", timestamp_lines.trim_end()),
            ],
        )
    }

    fn render_repository(&self, collection: &CollectionDefinition) -> String {
        let entity = collection.entity_name();
        render(
            templates::REPOSITORY,
            &[
                ("entity", &entity),
                ("entity_mod", &to_snake_case(&entity)),
                ("id_type", collection.id_kind.rust_type()),
                ("slug", &collection.slug),
            ],
        )
    }

    fn render_controller(&self, collection: &CollectionDefinition) -> String {
        let entity = collection.entity_name();
        render(
            templates::CONTROLLER,
            &[
                ("entity", &entity),
                ("entity_mod", &to_snake_case(&entity)),
                ("id_type", collection.id_kind.rust_type()),
                ("slug", &collection.slug),
            ],
        )
    }
}

fn render(template: &str, substitutions: &[(&str, &str)]) -> String {
    let mut output = template.to_string();
    for (placeholder, value) in substitutions {
        output = output.replace(&format!("{{{{{}}}}}", placeholder), value);
    }
    output
}

/// "BlogPost" -> "blog_post", "publishedAt" -> "published_at".
pub fn to_snake_case(name: &str) -> String {
    let mut snake = String::with_capacity(name.len() + 4);
    for (index, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if index > 0 {
                snake.push('_');
            }
            snake.extend(ch.to_lowercase());
        } else {
            snake.push(ch);
        }
    }
    snake
}
