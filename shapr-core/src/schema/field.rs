//! Field definitions and the closed set of field types.

use serde_json::{json, Map, Value};

/// Closed set of supported field types. Each variant carries its own
/// validation-relevant attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// Short text, bounded by maxLength
    Text {
        max_length: u32,
        min_length: u32,
        required: bool,
        unique: bool,
        default_value: Option<String>,
    },
    /// Unbounded text
    Textarea { required: bool, default_value: Option<String> },
    /// Numeric, integer-only when flagged
    Number {
        integer_only: bool,
        min: Option<f64>,
        max: Option<f64>,
        required: bool,
        default_value: Option<f64>,
    },
    /// Boolean with a default
    Checkbox { default_value: bool },
    /// Text with email semantics
    Email { required: bool, unique: bool },
    /// Timestamp, optionally date-only or defaulted to "now"
    Date { required: bool, default_now: bool, date_only: bool },
    /// Reference to another collection by slug
    Relationship { relation_to: String, has_many: bool, required: bool },
}

impl FieldType {
    /// Client-facing type tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::Text { .. } => "text",
            FieldType::Textarea { .. } => "textarea",
            FieldType::Number { .. } => "number",
            FieldType::Checkbox { .. } => "checkbox",
            FieldType::Email { .. } => "email",
            FieldType::Date { .. } => "date",
            FieldType::Relationship { .. } => "relationship",
        }
    }

    pub fn is_required(&self) -> bool {
        match self {
            FieldType::Text { required, .. }
            | FieldType::Textarea { required, .. }
            | FieldType::Number { required, .. }
            | FieldType::Email { required, .. }
            | FieldType::Date { required, .. }
            | FieldType::Relationship { required, .. } => *required,
            FieldType::Checkbox { .. } => false,
        }
    }

    pub fn is_unique(&self) -> bool {
        match self {
            FieldType::Text { unique, .. } | FieldType::Email { unique, .. } => *unique,
            _ => false,
        }
    }

    /// Whether comparison operators should treat values as numbers. Anything
    /// else is compared as an epoch-millisecond instant.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Number { .. })
    }

    pub fn is_relationship(&self) -> bool {
        matches!(self, FieldType::Relationship { .. })
    }

    /// Target collection slug for relationship fields.
    pub fn relation_target(&self) -> Option<&str> {
        match self {
            FieldType::Relationship { relation_to, .. } => Some(relation_to),
            _ => None,
        }
    }

    /// Rust type spelled into generated entity structs. Optionality is
    /// layered on top by the generator based on [`Self::is_required`].
    pub fn rust_type(&self) -> &'static str {
        match self {
            FieldType::Text { .. } | FieldType::Textarea { .. } | FieldType::Email { .. } => {
                "String"
            }
            FieldType::Number { integer_only: true, .. } => "i64",
            FieldType::Number { .. } => "f64",
            FieldType::Checkbox { .. } => "bool",
            FieldType::Date { .. } => "chrono::DateTime<chrono::Utc>",
            FieldType::Relationship { has_many: true, .. } => "Vec<serde_json::Value>",
            FieldType::Relationship { .. } => "serde_json::Value",
        }
    }

    /// Client-visible per-type configuration map. Key names match the wire
    /// format consumed by the admin frontend.
    pub fn config_map(&self) -> Map<String, Value> {
        let value = match self {
            FieldType::Text { max_length, min_length, default_value, .. } => json!({
                "maxLength": max_length,
                "minLength": min_length,
                "defaultValue": default_value,
            }),
            FieldType::Textarea { default_value, .. } => json!({
                "defaultValue": default_value,
            }),
            FieldType::Number { integer_only, min, max, default_value, .. } => json!({
                "integerOnly": integer_only,
                "min": min,
                "max": max,
                "defaultValue": default_value,
            }),
            FieldType::Checkbox { default_value } => json!({
                "defaultValue": default_value,
            }),
            FieldType::Email { .. } => json!({}),
            FieldType::Date { default_now, date_only, .. } => json!({
                "dateOnly": date_only,
                "defaultNow": default_now,
            }),
            FieldType::Relationship { relation_to, has_many, .. } => json!({
                "relationTo": relation_to,
                "hasMany": has_many,
            }),
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

/// Placement of a field in the admin UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldPosition {
    #[default]
    Main,
    Sidebar,
}

/// Admin-panel configuration for a single field.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldAdminConfig {
    pub hidden: bool,
    pub read_only: bool,
    pub position: FieldPosition,
    pub width: Option<String>,
}

/// A named field within a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: FieldType,
    pub label: Option<String>,
    pub description: Option<String>,
    pub admin: FieldAdminConfig,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            label: None,
            description: None,
            admin: FieldAdminConfig::default(),
        }
    }

    /// Display label, defaulting to the capitalized field name.
    pub fn display_label(&self) -> String {
        self.label.clone().unwrap_or_else(|| {
            let mut chars = self.name.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
    }
}
