//! Lifecycle hooks around CRUD operations.
//!
//! Hooks come from two orthogonal sources: inline function hooks attached in
//! the DSL ([`CollectionHooksConfig`]) and instance hooks implementing
//! [`CollectionHooks`], registered explicitly with the
//! [`HookRegistry`](registry::HookRegistry). For every stage, DSL hooks run
//! first, then registry hooks, each folding its result into the running
//! value.
//!
//! Documents are untyped JSON objects at this layer; typed access lives in
//! generated code.

pub mod executor;
pub mod registry;

pub use executor::HookExecutor;
pub use registry::HookRegistry;

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::schema::CollectionDefinition;

/// Runtime document representation.
pub type Document = Value;

/// The operation a hook is running under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOperation {
    Create,
    Update,
    Delete,
    Read,
    ReadDistinct,
    Count,
}

impl fmt::Display for HookOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookOperation::Create => "create",
            HookOperation::Update => "update",
            HookOperation::Delete => "delete",
            HookOperation::Read => "read",
            HookOperation::ReadDistinct => "read_distinct",
            HookOperation::Count => "count",
        };
        f.write_str(name)
    }
}

/// Outcome of a beforeOperation hook: continue (optionally substituting the
/// operation's data) or cancel the whole operation.
#[derive(Debug, Clone)]
pub enum BeforeOperationOutcome {
    Continue(Option<Document>),
    Cancel,
}

// ---------------------------------------------------------------------------
// Stage arguments
// ---------------------------------------------------------------------------

pub struct BeforeOperationArgs<'a> {
    pub collection: &'a CollectionDefinition,
    pub operation: HookOperation,
    pub data: Option<&'a Document>,
    pub id: Option<&'a Document>,
}

pub struct BeforeValidateArgs<'a> {
    pub collection: &'a CollectionDefinition,
    pub operation: HookOperation,
    pub data: Option<&'a Document>,
    pub original_doc: Option<&'a Document>,
}

pub struct BeforeChangeArgs<'a> {
    pub collection: &'a CollectionDefinition,
    pub operation: HookOperation,
    pub data: &'a Document,
    pub original_doc: Option<&'a Document>,
}

pub struct AfterChangeArgs<'a> {
    pub collection: &'a CollectionDefinition,
    pub operation: HookOperation,
    /// The data that was sent to the store
    pub data: &'a Document,
    /// The persisted document, folded through prior afterChange hooks
    pub doc: &'a Document,
    pub previous_doc: Option<&'a Document>,
}

pub struct BeforeReadArgs<'a> {
    pub collection: &'a CollectionDefinition,
    pub doc: &'a Document,
}

pub struct AfterReadArgs<'a> {
    pub collection: &'a CollectionDefinition,
    pub doc: &'a Document,
    /// True when the document is one element of a list fetch
    pub find_many: bool,
}

pub struct BeforeDeleteArgs<'a> {
    pub collection: &'a CollectionDefinition,
    pub id: &'a Document,
}

pub struct AfterDeleteArgs<'a> {
    pub collection: &'a CollectionDefinition,
    pub doc: &'a Document,
    pub id: &'a Document,
}

// ---------------------------------------------------------------------------
// Instance hooks
// ---------------------------------------------------------------------------

/// Lifecycle callbacks bound to one collection.
///
/// Implementations declare their binding through [`CollectionHooks::collection`]
/// — an explicit tag, matched by the registry against the collection name,
/// the entity name derived from its slug, and the raw slug, in that order.
/// Every stage has a pass-through default, so implementors override only what
/// they need; an absent override behaves as if the stage did not exist, while
/// a failing override aborts the pipeline for that request.
pub trait CollectionHooks: Send + Sync {
    /// Binding tag: the collection name, entity name or slug this hook
    /// attaches to.
    fn collection(&self) -> &str;

    /// Runs before any operation. Returning
    /// [`BeforeOperationOutcome::Cancel`] aborts the whole operation with an
    /// explicit error.
    fn before_operation(&self, args: &BeforeOperationArgs<'_>) -> Result<BeforeOperationOutcome> {
        Ok(BeforeOperationOutcome::Continue(args.data.cloned()))
    }

    /// Runs before validation on create/update. Returning `None` keeps the
    /// pre-stage data.
    fn before_validate(&self, args: &BeforeValidateArgs<'_>) -> Result<Option<Document>> {
        Ok(args.data.cloned())
    }

    /// Last chance to modify data before it is persisted.
    fn before_change(&self, args: &BeforeChangeArgs<'_>) -> Result<Document> {
        Ok(args.data.clone())
    }

    /// Runs after the change has been persisted.
    fn after_change(&self, args: &AfterChangeArgs<'_>) -> Result<Document> {
        Ok(args.doc.clone())
    }

    fn before_read(&self, args: &BeforeReadArgs<'_>) -> Result<Document> {
        Ok(args.doc.clone())
    }

    fn after_read(&self, args: &AfterReadArgs<'_>) -> Result<Document> {
        Ok(args.doc.clone())
    }

    /// Runs before removal; an error aborts the deletion.
    fn before_delete(&self, _args: &BeforeDeleteArgs<'_>) -> Result<()> {
        Ok(())
    }

    /// Runs after removal, only when the document existed.
    fn after_delete(&self, _args: &AfterDeleteArgs<'_>) -> Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Inline function hooks (DSL)
// ---------------------------------------------------------------------------

pub type BeforeOperationFn =
    Arc<dyn Fn(&BeforeOperationArgs<'_>) -> Result<BeforeOperationOutcome> + Send + Sync>;
pub type BeforeValidateFn =
    Arc<dyn Fn(&BeforeValidateArgs<'_>) -> Result<Option<Document>> + Send + Sync>;
pub type BeforeChangeFn = Arc<dyn Fn(&BeforeChangeArgs<'_>) -> Result<Document> + Send + Sync>;
pub type AfterChangeFn = Arc<dyn Fn(&AfterChangeArgs<'_>) -> Result<Document> + Send + Sync>;
pub type BeforeReadFn = Arc<dyn Fn(&BeforeReadArgs<'_>) -> Result<Document> + Send + Sync>;
pub type AfterReadFn = Arc<dyn Fn(&AfterReadArgs<'_>) -> Result<Document> + Send + Sync>;
pub type BeforeDeleteFn = Arc<dyn Fn(&BeforeDeleteArgs<'_>) -> Result<()> + Send + Sync>;
pub type AfterDeleteFn = Arc<dyn Fn(&AfterDeleteArgs<'_>) -> Result<()> + Send + Sync>;

/// Function hooks attached directly in the DSL. These always run before
/// registry-discovered instance hooks.
#[derive(Clone, Default)]
pub struct CollectionHooksConfig {
    pub before_operation: Vec<BeforeOperationFn>,
    pub before_validate: Vec<BeforeValidateFn>,
    pub before_change: Vec<BeforeChangeFn>,
    pub after_change: Vec<AfterChangeFn>,
    pub before_read: Vec<BeforeReadFn>,
    pub after_read: Vec<AfterReadFn>,
    pub before_delete: Vec<BeforeDeleteFn>,
    pub after_delete: Vec<AfterDeleteFn>,
}

impl CollectionHooksConfig {
    pub fn builder() -> CollectionHooksBuilder {
        CollectionHooksBuilder::default()
    }

    pub fn is_empty(&self) -> bool {
        self.before_operation.is_empty()
            && self.before_validate.is_empty()
            && self.before_change.is_empty()
            && self.after_change.is_empty()
            && self.before_read.is_empty()
            && self.after_read.is_empty()
            && self.before_delete.is_empty()
            && self.after_delete.is_empty()
    }
}

impl fmt::Debug for CollectionHooksConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionHooksConfig")
            .field("before_operation", &self.before_operation.len())
            .field("before_validate", &self.before_validate.len())
            .field("before_change", &self.before_change.len())
            .field("after_change", &self.after_change.len())
            .field("before_read", &self.before_read.len())
            .field("after_read", &self.after_read.len())
            .field("before_delete", &self.before_delete.len())
            .field("after_delete", &self.after_delete.len())
            .finish()
    }
}

/// Chained builder for [`CollectionHooksConfig`].
#[derive(Default)]
pub struct CollectionHooksBuilder {
    config: CollectionHooksConfig,
}

impl CollectionHooksBuilder {
    pub fn before_operation<F>(mut self, hook: F) -> Self
    where
        F: Fn(&BeforeOperationArgs<'_>) -> Result<BeforeOperationOutcome> + Send + Sync + 'static,
    {
        self.config.before_operation.push(Arc::new(hook));
        self
    }

    pub fn before_validate<F>(mut self, hook: F) -> Self
    where
        F: Fn(&BeforeValidateArgs<'_>) -> Result<Option<Document>> + Send + Sync + 'static,
    {
        self.config.before_validate.push(Arc::new(hook));
        self
    }

    pub fn before_change<F>(mut self, hook: F) -> Self
    where
        F: Fn(&BeforeChangeArgs<'_>) -> Result<Document> + Send + Sync + 'static,
    {
        self.config.before_change.push(Arc::new(hook));
        self
    }

    pub fn after_change<F>(mut self, hook: F) -> Self
    where
        F: Fn(&AfterChangeArgs<'_>) -> Result<Document> + Send + Sync + 'static,
    {
        self.config.after_change.push(Arc::new(hook));
        self
    }

    pub fn before_read<F>(mut self, hook: F) -> Self
    where
        F: Fn(&BeforeReadArgs<'_>) -> Result<Document> + Send + Sync + 'static,
    {
        self.config.before_read.push(Arc::new(hook));
        self
    }

    pub fn after_read<F>(mut self, hook: F) -> Self
    where
        F: Fn(&AfterReadArgs<'_>) -> Result<Document> + Send + Sync + 'static,
    {
        self.config.after_read.push(Arc::new(hook));
        self
    }

    pub fn before_delete<F>(mut self, hook: F) -> Self
    where
        F: Fn(&BeforeDeleteArgs<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.config.before_delete.push(Arc::new(hook));
        self
    }

    pub fn after_delete<F>(mut self, hook: F) -> Self
    where
        F: Fn(&AfterDeleteArgs<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.config.after_delete.push(Arc::new(hook));
        self
    }

    pub fn build(self) -> CollectionHooksConfig {
        self.config
    }
}
