//! Client-facing schema projection.
//!
//! The admin frontend builds forms and list views from these shapes, served
//! by `GET /api/_schema`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{CollectionAdminConfig, CollectionDefinition, FieldDefinition, Labels};
use crate::access::{AccessControl, AccessRule};

/// Response wrapper for the schema listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaResponse {
    pub collections: Vec<ClientCollectionSchema>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientCollectionSchema {
    pub name: String,
    pub slug: String,
    pub labels: Labels,
    pub fields: Vec<ClientFieldSchema>,
    pub access: ClientAccessControl,
    pub admin: CollectionAdminConfig,
    pub timestamps: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientFieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub label: String,
    pub required: bool,
    pub unique: bool,
    pub config: Map<String, Value>,
}

/// Access rules encoded as strings: `public`, `authenticated`, `deny` or
/// `roles:a,b`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientAccessControl {
    pub create: String,
    pub read: String,
    pub update: String,
    pub delete: String,
}

impl ClientCollectionSchema {
    pub fn from_definition(definition: &CollectionDefinition) -> Self {
        Self {
            name: definition.name.clone(),
            slug: definition.slug.clone(),
            labels: definition.labels.clone(),
            fields: definition.fields.iter().map(ClientFieldSchema::from_definition).collect(),
            access: ClientAccessControl::from_access(&definition.access),
            admin: definition.admin.clone(),
            timestamps: definition.timestamps,
        }
    }
}

impl ClientFieldSchema {
    pub fn from_definition(field: &FieldDefinition) -> Self {
        Self {
            name: field.name.clone(),
            field_type: field.field_type.type_name().to_string(),
            label: field.display_label(),
            required: field.field_type.is_required(),
            unique: field.field_type.is_unique(),
            config: field.field_type.config_map(),
        }
    }
}

impl ClientAccessControl {
    pub fn from_access(access: &AccessControl) -> Self {
        Self {
            create: access.create.as_client_string(),
            read: access.read.as_client_string(),
            update: access.update.as_client_string(),
            delete: access.delete.as_client_string(),
        }
    }
}

impl AccessRule {
    /// String encoding used by the schema endpoint.
    pub fn as_client_string(&self) -> String {
        match self {
            AccessRule::Public => "public".to_string(),
            AccessRule::Authenticated => "authenticated".to_string(),
            AccessRule::Deny => "deny".to_string(),
            AccessRule::Roles(roles) => format!("roles:{}", roles.join(",")),
        }
    }
}
