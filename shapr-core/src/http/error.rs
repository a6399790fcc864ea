//! JSON response and error helpers with a uniform shape:
//! `{"error":"snake_code","message":"Human readable detail"}`.

use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::{Response, StatusCode};
use std::convert::Infallible;

use crate::error::ShaprError;

pub type RespBody = BoxBody<Bytes, Infallible>;
pub type Resp = Response<RespBody>;

#[inline]
pub fn body_from<T: Into<Bytes>>(data: T) -> RespBody {
    Full::new(data.into()).boxed()
}

pub fn json_response(status: StatusCode, body: String) -> Resp {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(body_from(body))
        .unwrap()
}

pub fn json_error(status: StatusCode, code: &str, message: &str) -> Resp {
    let body = serde_json::json!({ "error": code, "message": message }).to_string();
    json_response(status, body)
}

/// 405 Method Not Allowed with an Allow header
pub fn method_not_allowed(allowed: &str) -> Resp {
    let body =
        serde_json::json!({ "error": "method_not_allowed", "allow": allowed }).to_string();
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header("content-type", "application/json")
        .header("allow", allowed)
        .body(body_from(body))
        .unwrap()
}

pub fn not_found() -> Resp {
    json_error(StatusCode::NOT_FOUND, "not_found", "Not found")
}

/// Map the error taxonomy onto status codes. Cancellation gets its own code,
/// distinct from access-denied and not-found.
pub fn error_response(error: &ShaprError) -> Resp {
    let (status, code) = match error {
        ShaprError::Configuration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error"),
        ShaprError::AccessDenied(_) => (StatusCode::FORBIDDEN, "access_denied"),
        ShaprError::OperationCancelled { .. } => (StatusCode::CONFLICT, "operation_cancelled"),
        ShaprError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        ShaprError::InvalidQuery(_) => (StatusCode::BAD_REQUEST, "invalid_query"),
        ShaprError::Hook { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "hook_failed"),
        ShaprError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
    };
    json_error(status, code, &error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_distinct_statuses() {
        let denied = error_response(&ShaprError::access_denied("no"));
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);

        let cancelled =
            error_response(&ShaprError::OperationCancelled { collection: "posts".into() });
        assert_eq!(cancelled.status(), StatusCode::CONFLICT);

        let missing = error_response(&ShaprError::not_found("x"));
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let invalid = error_response(&ShaprError::invalid_query("bad"));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn messages_are_json_escaped() {
        let response = json_error(StatusCode::BAD_REQUEST, "invalid_query", "broken \"quote\"");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
