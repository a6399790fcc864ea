//! Shapr - Core
//!
//! A schema-driven headless CMS toolkit for Rust: declarative collections in,
//! REST CRUD + query APIs out.
//!
//! # Overview
//!
//! Collections are declared once - with the fluent builder DSL or as DSL
//! source text - and compiled into everything else: persistence repositories
//! and HTTP controllers (via the code generator), a schema endpoint for
//! dynamic frontends, and a runtime that mediates every document operation
//! through access rules and lifecycle hooks.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use shapr_core::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ShaprConfig::builder()
//!         .collection(
//!             CollectionBuilder::new("Post")
//!                 .access(AccessControl { read: AccessRule::Public, ..Default::default() })
//!                 .field(text("title").required(true).max_length(200))
//!                 .field(textarea("content")),
//!         )
//!         .build()?;
//!
//!     ShaprServer::new(config).serve().await
//! }
//! ```
//!
//! # Architecture
//!
//! - [`schema`] - typed collection model, merge validation, client projection
//! - [`dsl`] - builder front-end and the text parser (both produce the same model)
//! - [`access`] - access rules and the caller-identity evaluator
//! - [`hooks`] - lifecycle pipeline, explicit hook registry, executor
//! - [`query`] - Where AST, predicate translation, paginated find service
//! - [`crud`] - per-verb pipelines combining access, hooks and persistence
//! - [`store`] - repository-like persistence contract + in-memory engine
//! - [`codegen`] - per-collection source generation (entity/repository/controller)
//! - [`http`] - hyper server exposing `/api/{slug}` and `/api/_schema`

pub mod access;
pub mod codegen;
pub mod config;
pub mod crud;
pub mod dsl;
pub mod error;
pub mod hooks;
pub mod http;
pub mod logging;
pub mod query;
pub mod schema;
pub mod store;

// Prelude module for convenient imports
pub mod prelude;

// Re-exports of main types
pub use access::{check_access, AccessControl, AccessRule, Caller};
pub use error::{Result, ShaprError};
pub use http::ShaprServer;
pub use schema::{CollectionDefinition, ShaprConfig};
