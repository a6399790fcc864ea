//! Convenient imports for applications built on Shapr.

pub use crate::access::{check_access, AccessControl, AccessRule, Caller};
pub use crate::config::ShaprSettings;
pub use crate::crud::CrudService;
pub use crate::dsl::{
    checkbox, date, email, number, relationship, text, textarea, CollectionBuilder,
    ShaprConfigBuilder,
};
pub use crate::error::{Result, ShaprError};
pub use crate::hooks::{
    CollectionHooks, CollectionHooksConfig, Document, HookOperation, HookRegistry,
};
pub use crate::query::{DataResponse, FindOptions, PaginatedDocs, QueryService, Where, WhereField};
pub use crate::schema::{
    ClientCollectionSchema, CollectionAdminConfig, CollectionDefinition, CollectionRegistry,
    FieldDefinition, FieldType, IdKind, ShaprConfig,
};
pub use crate::store::{DocumentStore, MemoryStore};
pub use crate::ShaprServer;
