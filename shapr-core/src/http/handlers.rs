//! Request dispatch for the collection API.
//!
//! Routes handled per collection, mounted at `/api/{slug}`:
//! list/query (GET), create (POST), get/update/delete by id (GET/PUT/DELETE),
//! plus the schema endpoints under `/api/_schema`.

use std::collections::HashMap;
use std::sync::Arc;

use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::{Method, Request, StatusCode, Uri};
use serde_json::Value;

use super::error::{
    body_from, error_response, json_error, json_response, method_not_allowed, not_found, Resp,
};
use super::CallerResolver;
use crate::access::{check_access, Caller};
use crate::crud::CrudService;
use crate::error::ShaprError;
use crate::query::{FindOptions, QueryService, Where};
use crate::schema::{ClientCollectionSchema, CollectionRegistry, SchemaResponse};

pub struct ShaprApi {
    registry: Arc<CollectionRegistry>,
    crud: CrudService,
    query: QueryService,
    caller_resolver: CallerResolver,
    max_body_bytes: usize,
}

impl ShaprApi {
    pub fn new(
        registry: Arc<CollectionRegistry>,
        crud: CrudService,
        query: QueryService,
        caller_resolver: CallerResolver,
        max_body_bytes: usize,
    ) -> Self {
        Self { registry, crud, query, caller_resolver, max_body_bytes }
    }

    pub fn registry(&self) -> &CollectionRegistry {
        &self.registry
    }

    /// Dispatch one request. Never returns an error; failures become JSON
    /// error responses.
    pub async fn handle(&self, req: Request<Incoming>) -> Resp {
        let caller = (self.caller_resolver)(&req);
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let segments: Vec<String> =
            path.split('/').filter(|s| !s.is_empty()).map(str::to_string).collect();

        log::debug!("{} {}", method, path);

        match segments.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
            ["api", "_schema"] => match method {
                Method::GET => self.schema_list(),
                _ => method_not_allowed("GET"),
            },
            ["api", "_schema", slug] => match method {
                Method::GET => self.schema_single(slug),
                _ => method_not_allowed("GET"),
            },
            ["api", slug] => match method {
                Method::GET => self.find(slug, req.uri(), &caller).await,
                Method::POST => self.create(slug, req, &caller).await,
                _ => method_not_allowed("GET, POST"),
            },
            ["api", slug, id] => {
                let slug = slug.to_string();
                let id = id.to_string();
                match method {
                    Method::GET => self.get(&slug, &id, &caller).await,
                    Method::PUT => self.update(&slug, &id, req, &caller).await,
                    Method::DELETE => self.delete(&slug, &id, &caller).await,
                    _ => method_not_allowed("GET, PUT, DELETE"),
                }
            }
            _ => not_found(),
        }
    }

    // =========================================================================
    // SCHEMA ENDPOINTS (/api/_schema)
    // =========================================================================

    fn schema_list(&self) -> Resp {
        let response = SchemaResponse {
            collections: self
                .registry
                .all()
                .iter()
                .map(ClientCollectionSchema::from_definition)
                .collect(),
        };
        match serde_json::to_string(&response) {
            Ok(body) => json_response(StatusCode::OK, body),
            Err(error) => error_response(&ShaprError::storage(error.to_string())),
        }
    }

    fn schema_single(&self, slug: &str) -> Resp {
        match self.registry.by_slug(slug) {
            Some(collection) => {
                let schema = ClientCollectionSchema::from_definition(collection);
                match serde_json::to_string(&schema) {
                    Ok(body) => json_response(StatusCode::OK, body),
                    Err(error) => error_response(&ShaprError::storage(error.to_string())),
                }
            }
            None => not_found(),
        }
    }

    // =========================================================================
    // COLLECTION ENDPOINTS (/api/{slug})
    // =========================================================================

    /// GET /api/{slug}?where=&limit=&page=&sort=&pagination=
    async fn find(&self, slug: &str, uri: &Uri, caller: &Caller) -> Resp {
        let Some(collection) = self.registry.by_slug(slug) else {
            return not_found();
        };
        if let Err(error) = check_access(&collection.access.read, caller) {
            return error_response(&error);
        }

        let params = query_params(uri);
        let mut options = FindOptions::new(slug);

        if let Some(raw) = params.get("where") {
            if !raw.trim().is_empty() {
                match serde_json::from_str::<Where>(raw) {
                    Ok(clause) => options.where_clause = Some(clause),
                    Err(error) => {
                        return json_error(
                            StatusCode::BAD_REQUEST,
                            "invalid_query",
                            &format!("Invalid where clause: {}", error),
                        )
                    }
                }
            }
        }
        match parse_number(&params, "limit") {
            Ok(limit) => options.limit = limit,
            Err(response) => return response,
        }
        match parse_number(&params, "page") {
            Ok(page) => options.page = page,
            Err(response) => return response,
        }
        options.sort = params.get("sort").cloned();
        options.pagination =
            params.get("pagination").map(|flag| flag != "false").unwrap_or(true);

        match self.query.find(&options).await {
            Ok(page) => match serde_json::to_string(&page) {
                Ok(body) => json_response(StatusCode::OK, body),
                Err(error) => error_response(&ShaprError::storage(error.to_string())),
            },
            Err(error) => error_response(&error),
        }
    }

    /// POST /api/{slug}
    async fn create(&self, slug: &str, req: Request<Incoming>, caller: &Caller) -> Resp {
        let data = match self.read_json_body(req).await {
            Ok(data) => data,
            Err(response) => return *response,
        };

        match self.crud.create(slug, caller, data).await {
            Ok(doc) => json_response(
                StatusCode::CREATED,
                serde_json::json!({ "data": doc }).to_string(),
            ),
            Err(error) => error_response(&error),
        }
    }

    /// GET /api/{slug}/{id}
    async fn get(&self, slug: &str, id: &str, caller: &Caller) -> Resp {
        match self.crud.get(slug, caller, id).await {
            Ok(Some(doc)) => {
                json_response(StatusCode::OK, serde_json::json!({ "data": doc }).to_string())
            }
            Ok(None) => not_found(),
            Err(error) => error_response(&error),
        }
    }

    /// PUT /api/{slug}/{id}
    async fn update(&self, slug: &str, id: &str, req: Request<Incoming>, caller: &Caller) -> Resp {
        let data = match self.read_json_body(req).await {
            Ok(data) => data,
            Err(response) => return *response,
        };

        match self.crud.update(slug, caller, id, data).await {
            Ok(Some(doc)) => {
                json_response(StatusCode::OK, serde_json::json!({ "data": doc }).to_string())
            }
            Ok(None) => not_found(),
            Err(error) => error_response(&error),
        }
    }

    /// DELETE /api/{slug}/{id}
    async fn delete(&self, slug: &str, id: &str, caller: &Caller) -> Resp {
        match self.crud.delete(slug, caller, id).await {
            Ok(true) => hyper::Response::builder()
                .status(StatusCode::NO_CONTENT)
                .body(body_from(bytes::Bytes::new()))
                .unwrap(),
            Ok(false) => not_found(),
            Err(error) => error_response(&error),
        }
    }

    /// Enforce content type and body size, then parse the JSON body.
    async fn read_json_body(&self, req: Request<Incoming>) -> Result<Value, Box<Resp>> {
        if !has_json_content_type(&req) {
            return Err(Box::new(json_error(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_media_type",
                "expected application/json",
            )));
        }

        if let Some(length) = content_length(&req) {
            if length > self.max_body_bytes {
                return Err(Box::new(json_error(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "payload_too_large",
                    &format!("request body too large (max {} bytes)", self.max_body_bytes),
                )));
            }
        }

        let bytes = match req.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(_) => {
                return Err(Box::new(json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_body",
                    "Invalid body",
                )))
            }
        };
        if bytes.len() > self.max_body_bytes {
            return Err(Box::new(json_error(
                StatusCode::PAYLOAD_TOO_LARGE,
                "payload_too_large",
                &format!("request body too large (max {} bytes)", self.max_body_bytes),
            )));
        }

        serde_json::from_slice(&bytes).map_err(|_| {
            Box::new(json_error(StatusCode::BAD_REQUEST, "invalid_json", "Invalid JSON"))
        })
    }
}

fn parse_number(
    params: &HashMap<String, String>,
    name: &str,
) -> Result<Option<u32>, Resp> {
    match params.get(name) {
        None => Ok(None),
        Some(raw) => raw.parse::<u32>().map(Some).map_err(|_| {
            json_error(
                StatusCode::BAD_REQUEST,
                "invalid_query",
                &format!("invalid {} parameter: '{}'", name, raw),
            )
        }),
    }
}

/// Percent-decoded query parameters.
fn query_params(uri: &Uri) -> HashMap<String, String> {
    uri.query()
        .map(|query| {
            query
                .split('&')
                .filter_map(|pair| {
                    let mut parts = pair.splitn(2, '=');
                    let key = parts.next()?;
                    let value = parts.next().unwrap_or("");
                    Some((
                        urlencoding::decode(key).ok()?.into_owned(),
                        urlencoding::decode(value).ok()?.into_owned(),
                    ))
                })
                .collect()
        })
        .unwrap_or_default()
}

#[inline]
fn has_json_content_type(req: &Request<Incoming>) -> bool {
    req.headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_ascii_lowercase().contains("application/json"))
        .unwrap_or(false)
}

#[inline]
fn content_length(req: &Request<Incoming>) -> Option<usize> {
    req.headers()
        .get("content-length")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok())
}
