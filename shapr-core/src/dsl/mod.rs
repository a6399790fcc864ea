//! Builder front-end for collection definitions.
//!
//! Nested configuration blocks from the declarative DSL become explicit
//! chained builders: a [`CollectionBuilder`] per collection, free
//! field-constructor functions ([`text`], [`number`], [`relationship`], ...)
//! per field, and struct literals for access/admin configuration. Validation
//! happens at each `build()` and fails fast with an error naming the
//! offending entry.
//!
//! The text front-end in [`parser`] produces identical output for equivalent
//! source.

pub mod parser;

use crate::access::AccessControl;
use crate::error::{Result, ShaprError};
use crate::hooks::CollectionHooksConfig;
use crate::schema::{
    validate_unique_slugs, CollectionAdminConfig, CollectionDefinition, FieldAdminConfig,
    FieldDefinition, FieldType, IdKind, ShaprConfig,
};

/// Root builder: accumulates collections and validates slug uniqueness at
/// `build()`.
#[derive(Default)]
pub struct ShaprConfigBuilder {
    collections: Vec<CollectionBuilder>,
}

impl ShaprConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collection(mut self, collection: CollectionBuilder) -> Self {
        self.collections.push(collection);
        self
    }

    pub fn build(self) -> Result<ShaprConfig> {
        let collections: Vec<CollectionDefinition> = self
            .collections
            .into_iter()
            .map(CollectionBuilder::build)
            .collect::<Result<_>>()?;
        validate_unique_slugs(&collections)?;
        Ok(ShaprConfig::new(collections))
    }
}

/// Builder for one collection. Starts from derived slug/labels and admin-only
/// access, mirroring the defaults of [`CollectionDefinition::new`].
pub struct CollectionBuilder {
    definition: CollectionDefinition,
    errors: Vec<String>,
}

impl CollectionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { definition: CollectionDefinition::new(name), errors: Vec::new() }
    }

    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.definition.slug = slug.into();
        self
    }

    pub fn singular_label(mut self, label: impl Into<String>) -> Self {
        self.definition.labels.singular = label.into();
        self
    }

    pub fn plural_label(mut self, label: impl Into<String>) -> Self {
        self.definition.labels.plural = label.into();
        self
    }

    pub fn timestamps(mut self, enabled: bool) -> Self {
        self.definition.timestamps = enabled;
        self
    }

    pub fn soft_delete(mut self, enabled: bool) -> Self {
        self.definition.soft_delete = enabled;
        self
    }

    pub fn id_kind(mut self, kind: IdKind) -> Self {
        self.definition.id_kind = kind;
        self
    }

    pub fn access(mut self, access: AccessControl) -> Self {
        self.definition.access = access;
        self
    }

    pub fn admin(mut self, admin: CollectionAdminConfig) -> Self {
        self.definition.admin = admin;
        self
    }

    pub fn hooks(mut self, hooks: CollectionHooksConfig) -> Self {
        self.definition.hooks = Some(hooks);
        self
    }

    /// Append a field. Invalid field specs are collected and reported
    /// together at `build()`.
    pub fn field(mut self, field: impl IntoFieldDefinition) -> Self {
        match field.into_field() {
            Ok(definition) => self.definition.fields.push(definition),
            Err(error) => self.errors.push(error.to_string()),
        }
        self
    }

    pub fn build(self) -> Result<CollectionDefinition> {
        if self.errors.is_empty() {
            Ok(self.definition)
        } else {
            Err(ShaprError::configuration(format!(
                "invalid collection '{}': {}",
                self.definition.name,
                self.errors.join("; ")
            )))
        }
    }
}

/// Conversion from a field builder into a validated [`FieldDefinition`].
pub trait IntoFieldDefinition {
    fn into_field(self) -> Result<FieldDefinition>;
}

impl IntoFieldDefinition for FieldDefinition {
    fn into_field(self) -> Result<FieldDefinition> {
        Ok(self)
    }
}

macro_rules! common_field_methods {
    () => {
        pub fn label(mut self, label: impl Into<String>) -> Self {
            self.label = Some(label.into());
            self
        }

        pub fn description(mut self, description: impl Into<String>) -> Self {
            self.description = Some(description.into());
            self
        }

        pub fn admin(mut self, admin: FieldAdminConfig) -> Self {
            self.admin = admin;
            self
        }
    };
}

fn assemble(
    name: String,
    field_type: FieldType,
    label: Option<String>,
    description: Option<String>,
    admin: FieldAdminConfig,
) -> FieldDefinition {
    FieldDefinition { name, field_type, label, description, admin }
}

// ---------------------------------------------------------------------------
// Field builders
// ---------------------------------------------------------------------------

/// Start a text field.
pub fn text(name: impl Into<String>) -> TextFieldBuilder {
    TextFieldBuilder {
        name: name.into(),
        max_length: 255,
        min_length: 0,
        required: false,
        unique: false,
        default_value: None,
        label: None,
        description: None,
        admin: FieldAdminConfig::default(),
    }
}

pub struct TextFieldBuilder {
    name: String,
    max_length: u32,
    min_length: u32,
    required: bool,
    unique: bool,
    default_value: Option<String>,
    label: Option<String>,
    description: Option<String>,
    admin: FieldAdminConfig,
}

impl TextFieldBuilder {
    common_field_methods!();

    pub fn max_length(mut self, value: u32) -> Self {
        self.max_length = value;
        self
    }

    pub fn min_length(mut self, value: u32) -> Self {
        self.min_length = value;
        self
    }

    pub fn required(mut self, value: bool) -> Self {
        self.required = value;
        self
    }

    pub fn unique(mut self, value: bool) -> Self {
        self.unique = value;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

impl IntoFieldDefinition for TextFieldBuilder {
    fn into_field(self) -> Result<FieldDefinition> {
        Ok(assemble(
            self.name,
            FieldType::Text {
                max_length: self.max_length,
                min_length: self.min_length,
                required: self.required,
                unique: self.unique,
                default_value: self.default_value,
            },
            self.label,
            self.description,
            self.admin,
        ))
    }
}

/// Start a textarea field.
pub fn textarea(name: impl Into<String>) -> TextareaFieldBuilder {
    TextareaFieldBuilder {
        name: name.into(),
        required: false,
        default_value: None,
        label: None,
        description: None,
        admin: FieldAdminConfig::default(),
    }
}

pub struct TextareaFieldBuilder {
    name: String,
    required: bool,
    default_value: Option<String>,
    label: Option<String>,
    description: Option<String>,
    admin: FieldAdminConfig,
}

impl TextareaFieldBuilder {
    common_field_methods!();

    pub fn required(mut self, value: bool) -> Self {
        self.required = value;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

impl IntoFieldDefinition for TextareaFieldBuilder {
    fn into_field(self) -> Result<FieldDefinition> {
        Ok(assemble(
            self.name,
            FieldType::Textarea { required: self.required, default_value: self.default_value },
            self.label,
            self.description,
            self.admin,
        ))
    }
}

/// Start a number field.
pub fn number(name: impl Into<String>) -> NumberFieldBuilder {
    NumberFieldBuilder {
        name: name.into(),
        integer_only: false,
        min: None,
        max: None,
        required: false,
        default_value: None,
        label: None,
        description: None,
        admin: FieldAdminConfig::default(),
    }
}

pub struct NumberFieldBuilder {
    name: String,
    integer_only: bool,
    min: Option<f64>,
    max: Option<f64>,
    required: bool,
    default_value: Option<f64>,
    label: Option<String>,
    description: Option<String>,
    admin: FieldAdminConfig,
}

impl NumberFieldBuilder {
    common_field_methods!();

    pub fn integer_only(mut self, value: bool) -> Self {
        self.integer_only = value;
        self
    }

    pub fn min(mut self, value: f64) -> Self {
        self.min = Some(value);
        self
    }

    pub fn max(mut self, value: f64) -> Self {
        self.max = Some(value);
        self
    }

    pub fn required(mut self, value: bool) -> Self {
        self.required = value;
        self
    }

    pub fn default_value(mut self, value: f64) -> Self {
        self.default_value = Some(value);
        self
    }
}

impl IntoFieldDefinition for NumberFieldBuilder {
    fn into_field(self) -> Result<FieldDefinition> {
        Ok(assemble(
            self.name,
            FieldType::Number {
                integer_only: self.integer_only,
                min: self.min,
                max: self.max,
                required: self.required,
                default_value: self.default_value,
            },
            self.label,
            self.description,
            self.admin,
        ))
    }
}

/// Start a checkbox field.
pub fn checkbox(name: impl Into<String>) -> CheckboxFieldBuilder {
    CheckboxFieldBuilder {
        name: name.into(),
        default_value: false,
        label: None,
        description: None,
        admin: FieldAdminConfig::default(),
    }
}

pub struct CheckboxFieldBuilder {
    name: String,
    default_value: bool,
    label: Option<String>,
    description: Option<String>,
    admin: FieldAdminConfig,
}

impl CheckboxFieldBuilder {
    common_field_methods!();

    pub fn default_value(mut self, value: bool) -> Self {
        self.default_value = value;
        self
    }
}

impl IntoFieldDefinition for CheckboxFieldBuilder {
    fn into_field(self) -> Result<FieldDefinition> {
        Ok(assemble(
            self.name,
            FieldType::Checkbox { default_value: self.default_value },
            self.label,
            self.description,
            self.admin,
        ))
    }
}

/// Start an email field.
pub fn email(name: impl Into<String>) -> EmailFieldBuilder {
    EmailFieldBuilder {
        name: name.into(),
        required: false,
        unique: false,
        label: None,
        description: None,
        admin: FieldAdminConfig::default(),
    }
}

pub struct EmailFieldBuilder {
    name: String,
    required: bool,
    unique: bool,
    label: Option<String>,
    description: Option<String>,
    admin: FieldAdminConfig,
}

impl EmailFieldBuilder {
    common_field_methods!();

    pub fn required(mut self, value: bool) -> Self {
        self.required = value;
        self
    }

    pub fn unique(mut self, value: bool) -> Self {
        self.unique = value;
        self
    }
}

impl IntoFieldDefinition for EmailFieldBuilder {
    fn into_field(self) -> Result<FieldDefinition> {
        Ok(assemble(
            self.name,
            FieldType::Email { required: self.required, unique: self.unique },
            self.label,
            self.description,
            self.admin,
        ))
    }
}

/// Start a date field.
pub fn date(name: impl Into<String>) -> DateFieldBuilder {
    DateFieldBuilder {
        name: name.into(),
        required: false,
        default_now: false,
        date_only: false,
        label: None,
        description: None,
        admin: FieldAdminConfig::default(),
    }
}

pub struct DateFieldBuilder {
    name: String,
    required: bool,
    default_now: bool,
    date_only: bool,
    label: Option<String>,
    description: Option<String>,
    admin: FieldAdminConfig,
}

impl DateFieldBuilder {
    common_field_methods!();

    pub fn required(mut self, value: bool) -> Self {
        self.required = value;
        self
    }

    pub fn default_now(mut self, value: bool) -> Self {
        self.default_now = value;
        self
    }

    pub fn date_only(mut self, value: bool) -> Self {
        self.date_only = value;
        self
    }
}

impl IntoFieldDefinition for DateFieldBuilder {
    fn into_field(self) -> Result<FieldDefinition> {
        Ok(assemble(
            self.name,
            FieldType::Date {
                required: self.required,
                default_now: self.default_now,
                date_only: self.date_only,
            },
            self.label,
            self.description,
            self.admin,
        ))
    }
}

/// Start a relationship field. `relation_to` must be set to a non-blank
/// target slug before `build()`.
pub fn relationship(name: impl Into<String>) -> RelationshipFieldBuilder {
    RelationshipFieldBuilder {
        name: name.into(),
        relation_to: String::new(),
        has_many: false,
        required: false,
        label: None,
        description: None,
        admin: FieldAdminConfig::default(),
    }
}

pub struct RelationshipFieldBuilder {
    name: String,
    relation_to: String,
    has_many: bool,
    required: bool,
    label: Option<String>,
    description: Option<String>,
    admin: FieldAdminConfig,
}

impl RelationshipFieldBuilder {
    common_field_methods!();

    pub fn relation_to(mut self, target: impl Into<String>) -> Self {
        self.relation_to = target.into();
        self
    }

    pub fn has_many(mut self, value: bool) -> Self {
        self.has_many = value;
        self
    }

    pub fn required(mut self, value: bool) -> Self {
        self.required = value;
        self
    }
}

impl IntoFieldDefinition for RelationshipFieldBuilder {
    fn into_field(self) -> Result<FieldDefinition> {
        if self.relation_to.trim().is_empty() {
            return Err(ShaprError::configuration(format!(
                "relationTo must be specified for relationship field '{}'",
                self.name
            )));
        }
        Ok(assemble(
            self.name,
            FieldType::Relationship {
                relation_to: self.relation_to,
                has_many: self.has_many,
                required: self.required,
            },
            self.label,
            self.description,
            self.admin,
        ))
    }
}
