//! Shapr Blog - sample application
//!
//! Demonstrates the whole pipeline in one binary:
//! - collections declared with the builder DSL (public posts, admin-gated
//!   categories)
//! - an instance hook bound to `Post` by its explicit tag
//! - inline DSL hooks on the same collection
//! - the generated-API surface served over HTTP with the in-memory store
//!
//! Try it:
//!
//! ```bash
//! cargo run --bin blog
//! curl -X POST localhost:8080/api/posts \
//!     -H 'content-type: application/json' -d '{"title":"hello","content":"world"}'
//! curl 'localhost:8080/api/posts?where={"title":{"contains":"HELLO"}}'
//! curl localhost:8080/api/_schema
//! ```

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use serde_json::json;
use shapr_core::hooks::{AfterChangeArgs, BeforeChangeArgs, BeforeValidateArgs};
use shapr_core::prelude::*;

/// Hooks for the Post collection, matched by the explicit binding tag.
struct PostHooks;

impl CollectionHooks for PostHooks {
    fn collection(&self) -> &str {
        "Post"
    }

    /// Uppercase titles before validation.
    fn before_validate(
        &self,
        args: &BeforeValidateArgs<'_>,
    ) -> shapr_core::Result<Option<Document>> {
        let Some(data) = args.data else {
            return Ok(None);
        };
        let mut doc = data.clone();
        if let Some(title) = doc.get("title").and_then(|title| title.as_str()) {
            let upper = title.to_uppercase();
            doc["title"] = json!(upper);
        }
        Ok(Some(doc))
    }

    /// Default publishedAt to "now" when the author left it out.
    fn before_change(&self, args: &BeforeChangeArgs<'_>) -> shapr_core::Result<Document> {
        let mut doc = args.data.clone();
        if doc.get("publishedAt").map_or(true, |value| value.is_null()) {
            doc["publishedAt"] = json!(Utc::now().to_rfc3339());
        }
        Ok(doc)
    }

    fn after_change(&self, args: &AfterChangeArgs<'_>) -> shapr_core::Result<Document> {
        log::info!(
            "post {} {}d: {}",
            args.doc.get("id").cloned().unwrap_or_default(),
            args.operation,
            args.doc.get("title").and_then(|title| title.as_str()).unwrap_or("<untitled>")
        );
        Ok(args.doc.clone())
    }
}

fn blog_config() -> shapr_core::Result<ShaprConfig> {
    ShaprConfig::builder()
        .collection(
            CollectionBuilder::new("Post")
                .slug("posts")
                .access(AccessControl {
                    create: AccessRule::Public,
                    read: AccessRule::Public,
                    update: AccessRule::roles(["admin", "editor"]),
                    delete: AccessRule::roles(["admin"]),
                })
                .field(text("title").required(true).max_length(200))
                .field(textarea("content"))
                .field(date("publishedAt"))
                .field(number("views").integer_only(true))
                .field(relationship("category").relation_to("categories"))
                .admin(CollectionAdminConfig {
                    use_as_title: Some("title".into()),
                    default_columns: vec!["id".into(), "title".into(), "publishedAt".into()],
                    ..CollectionAdminConfig::default()
                })
                // Inline hook: reject empty titles outright.
                .hooks(
                    CollectionHooksConfig::builder()
                        .before_change(|args: &BeforeChangeArgs<'_>| {
                            let title = args
                                .data
                                .get("title")
                                .and_then(|title| title.as_str())
                                .unwrap_or_default();
                            if title.trim().is_empty() {
                                return Err(ShaprError::hook(
                                    args.collection.slug.clone(),
                                    "beforeChange",
                                    "title must not be blank",
                                ));
                            }
                            Ok(args.data.clone())
                        })
                        .build(),
                ),
        )
        .collection(
            CollectionBuilder::new("Category")
                .access(AccessControl {
                    read: AccessRule::Public,
                    ..AccessControl::default()
                })
                .field(text("name").required(true).unique(true))
                .field(textarea("description"))
                .admin(CollectionAdminConfig {
                    use_as_title: Some("name".into()),
                    ..CollectionAdminConfig::default()
                }),
        )
        .build()
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = ShaprSettings::load()?;
    shapr_core::logging::init(&settings.logging);

    let config = blog_config()?;

    ShaprServer::new(config)
        .with_settings(settings)
        .with_store(Arc::new(MemoryStore::new()))
        .register_hook(Arc::new(PostHooks))
        .serve()
        .await
}
