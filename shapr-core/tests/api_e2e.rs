//! End-to-end API tests: a real server over a TCP listener, driven with
//! reqwest.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use shapr_core::hooks::{AfterDeleteArgs, BeforeChangeArgs};
use shapr_core::prelude::*;

/// Post hook used across scenarios: uppercases titles before persisting.
struct UppercasePostTitles;

impl CollectionHooks for UppercasePostTitles {
    fn collection(&self) -> &str {
        "Post"
    }

    fn before_change(&self, args: &BeforeChangeArgs<'_>) -> shapr_core::Result<Document> {
        let mut doc = args.data.clone();
        if let Some(title) = doc.get("title").and_then(Value::as_str) {
            let upper = title.to_uppercase();
            doc["title"] = json!(upper);
        }
        Ok(doc)
    }
}

/// Category hook recording whether afterDelete ever fired.
struct CategoryDeleteProbe {
    after_delete_ran: Arc<AtomicBool>,
}

impl CollectionHooks for CategoryDeleteProbe {
    fn collection(&self) -> &str {
        "Category"
    }

    fn after_delete(&self, _args: &AfterDeleteArgs<'_>) -> shapr_core::Result<()> {
        self.after_delete_ran.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn blog_config() -> ShaprConfig {
    ShaprConfig::builder()
        .collection(
            CollectionBuilder::new("Post")
                .slug("posts")
                .access(AccessControl {
                    create: AccessRule::Public,
                    read: AccessRule::Public,
                    update: AccessRule::Public,
                    delete: AccessRule::Public,
                })
                .field(text("title").required(true).max_length(200))
                .field(textarea("content"))
                .field(number("views").integer_only(true)),
        )
        .collection(
            CollectionBuilder::new("Category")
                .access(AccessControl {
                    create: AccessRule::roles(["admin"]),
                    read: AccessRule::Public,
                    update: AccessRule::roles(["admin"]),
                    delete: AccessRule::roles(["admin"]),
                })
                .field(text("name").required(true).unique(true)),
        )
        .build()
        .unwrap()
}

async fn spawn_server(server: ShaprServer) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = server.serve_on(listener).await;
    });
    format!("http://{}", address)
}

async fn blog_server() -> (String, Arc<AtomicBool>) {
    let after_delete_ran = Arc::new(AtomicBool::new(false));
    let server = ShaprServer::new(blog_config())
        .register_hook(Arc::new(UppercasePostTitles))
        .register_hook(Arc::new(CategoryDeleteProbe {
            after_delete_ran: after_delete_ran.clone(),
        }));
    (spawn_server(server).await, after_delete_ran)
}

#[tokio::test]
async fn create_runs_hooks_and_wraps_response() {
    let (base, _) = blog_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/posts", base))
        .json(&json!({"title": "Hi", "content": "x"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["id"], json!(1));
    assert_eq!(body["data"]["title"], "HI");
    assert_eq!(body["data"]["content"], "x");
    assert!(body["data"]["createdAt"].is_string());
}

#[tokio::test]
async fn filtered_query_paginates_matching_rows_only() {
    let (base, _) = blog_server().await;
    let client = reqwest::Client::new();

    for (title, views) in [("Hi", 1), ("Hi", 2), ("Other", 3)] {
        let response = client
            .post(format!("{}/api/posts", base))
            .json(&json!({"title": title, "views": views}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
    }

    // The beforeChange hook uppercased every title.
    let response = client
        .get(format!("{}/api/posts", base))
        .query(&[
            ("where", r#"{"title":{"equals":"HI"}}"#),
            ("limit", "5"),
            ("page", "1"),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["totalDocs"], json!(2));
    assert_eq!(body["docs"].as_array().unwrap().len(), 2);
    assert_eq!(body["hasNextPage"], json!(false));
    assert_eq!(body["hasPrevPage"], json!(false));
    assert_eq!(body["page"], json!(1));
    assert_eq!(body["pagingCounter"], json!(1));
}

#[tokio::test]
async fn delete_of_missing_document_is_404_with_no_side_effects() {
    let (base, after_delete_ran) = blog_server().await;
    let client = reqwest::Client::new();

    let response = client
        .delete(format!("{}/api/categories/999", base))
        .header("x-shapr-user", "root")
        .header("x-shapr-roles", "admin")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    assert!(!after_delete_ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn delete_of_existing_document_returns_204_and_fires_after_delete() {
    let (base, after_delete_ran) = blog_server().await;
    let client = reqwest::Client::new();

    let created = client
        .post(format!("{}/api/categories", base))
        .header("x-shapr-user", "root")
        .header("x-shapr-roles", "admin")
        .json(&json!({"name": "tech"}))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), 201);

    let response = client
        .delete(format!("{}/api/categories/1", base))
        .header("x-shapr-user", "root")
        .header("x-shapr-roles", "admin")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 204);
    assert!(after_delete_ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn schema_endpoint_lists_every_collection_with_field_config() {
    let (base, _) = blog_server().await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{}/api/_schema", base)).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();

    let collections = body["collections"].as_array().unwrap();
    assert_eq!(collections.len(), 2);

    let posts = collections.iter().find(|c| c["slug"] == "posts").unwrap();
    let title = posts["fields"]
        .as_array()
        .unwrap()
        .iter()
        .find(|field| field["name"] == "title")
        .unwrap();
    assert_eq!(title["type"], "text");
    assert_eq!(title["config"]["maxLength"], json!(200));
    assert_eq!(posts["access"]["create"], "public");

    let categories = collections.iter().find(|c| c["slug"] == "categories").unwrap();
    assert_eq!(categories["access"]["create"], "roles:admin");
}

#[tokio::test]
async fn schema_endpoint_serves_single_collection_or_404() {
    let (base, _) = blog_server().await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{}/api/_schema/posts", base)).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "Post");

    let missing = client.get(format!("{}/api/_schema/widgets", base)).send().await.unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn access_rules_gate_by_role_headers() {
    let (base, _) = blog_server().await;
    let client = reqwest::Client::new();

    // Anonymous caller cannot create categories
    let anonymous = client
        .post(format!("{}/api/categories", base))
        .json(&json!({"name": "blocked"}))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status(), 403);

    // Prefix-convention roles still match
    let prefixed = client
        .post(format!("{}/api/categories", base))
        .header("x-shapr-user", "ops")
        .header("x-shapr-roles", "ROLE_admin")
        .json(&json!({"name": "allowed"}))
        .send()
        .await
        .unwrap();
    assert_eq!(prefixed.status(), 201);
}

#[tokio::test]
async fn malformed_where_json_is_a_400() {
    let (base, _) = blog_server().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/posts", base))
        .query(&[("where", "{not json")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "invalid_query");
}

#[tokio::test]
async fn unknown_field_path_in_where_is_a_400() {
    let (base, _) = blog_server().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/posts", base))
        .query(&[("where", r#"{"bogus":{"equals":1}}"#)])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn update_and_get_round_trip_with_404_for_missing() {
    let (base, _) = blog_server().await;
    let client = reqwest::Client::new();

    let created: Value = client
        .post(format!("{}/api/posts", base))
        .json(&json!({"title": "First", "content": "v1"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["data"]["id"].as_i64().unwrap();

    let updated = client
        .put(format!("{}/api/posts/{}", base, id))
        .json(&json!({"title": "Second", "content": "v2"}))
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status(), 200);
    let body: Value = updated.json().await.unwrap();
    assert_eq!(body["data"]["title"], "SECOND");

    let fetched: Value = client
        .get(format!("{}/api/posts/{}", base, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["data"]["content"], "v2");

    let missing = client
        .put(format!("{}/api/posts/999", base))
        .json(&json!({"title": "nope"}))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}
