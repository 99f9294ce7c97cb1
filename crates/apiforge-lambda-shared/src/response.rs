//! Response records and per-status builders.
//!
//! The gateway expects `{"statusCode": .., "body": ".."}` where the body is
//! always text. Builders accept any `Serialize` value: text (`str`,
//! `String`, or a `Value::String`) is passed through as-is, everything else
//! is encoded as compact JSON. Values that merely serialize to a JSON string,
//! such as unit enum variants or timestamps, are encoded.

use std::any::TypeId;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Response returned to API Gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub body: String,
}

impl ApiResponse {
    /// Build a response with the given status and a serialized body.
    pub fn new<T: Serialize + ?Sized + 'static>(status: StatusCode, body: &T) -> Self {
        Self {
            status_code: status.as_u16(),
            body: render_body(body),
        }
    }

    /// Build a response whose body is already text.
    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            body: body.into(),
        }
    }

    /// Decode the body as JSON.
    pub fn json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }
}

/// Conventional success payload: a message plus optional data.
///
/// # Example
///
/// ```
/// use apiforge_lambda_shared::{ok, DefaultResponse};
/// use serde_json::json;
///
/// let response = ok(&DefaultResponse::new("created lead").with_data(json!({"id": 7})));
/// assert_eq!(response.status_code, 200);
/// assert_eq!(response.body, r#"{"message":"created lead","data":{"id":7}}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultResponse<T = Value> {
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> DefaultResponse<T> {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: T) -> Self {
        self.data = Some(data);
        self
    }
}

/// Types whose string form is the body text itself.
fn is_text<T: ?Sized + 'static>() -> bool {
    let id = TypeId::of::<T>();
    id == TypeId::of::<str>()
        || id == TypeId::of::<String>()
        || id == TypeId::of::<&'static str>()
        || id == TypeId::of::<Value>()
}

fn render_body<T: Serialize + ?Sized + 'static>(body: &T) -> String {
    match serde_json::to_string(body) {
        Ok(encoded) if is_text::<T>() && encoded.starts_with('"') => {
            serde_json::from_str(&encoded).unwrap_or(encoded)
        }
        Ok(encoded) => encoded,
        Err(e) => {
            warn!(error = %e, "response body could not be serialized; sending empty body");
            String::new()
        }
    }
}

/// 200 OK.
pub fn ok<T: Serialize + ?Sized + 'static>(body: &T) -> ApiResponse {
    ApiResponse::new(StatusCode::OK, body)
}

/// 201 Created.
pub fn created<T: Serialize + ?Sized + 'static>(body: &T) -> ApiResponse {
    ApiResponse::new(StatusCode::CREATED, body)
}

/// 202 Accepted.
pub fn accepted<T: Serialize + ?Sized + 'static>(body: &T) -> ApiResponse {
    ApiResponse::new(StatusCode::ACCEPTED, body)
}

/// 204 No Content, always with an empty body.
pub fn no_content() -> ApiResponse {
    ApiResponse::text(StatusCode::NO_CONTENT, "")
}

/// 400 Bad Request.
pub fn bad_request<T: Serialize + ?Sized + 'static>(body: &T) -> ApiResponse {
    ApiResponse::new(StatusCode::BAD_REQUEST, body)
}

/// 401 Unauthorized.
pub fn unauthorized<T: Serialize + ?Sized + 'static>(body: &T) -> ApiResponse {
    ApiResponse::new(StatusCode::UNAUTHORIZED, body)
}

/// 403 Forbidden.
pub fn forbidden<T: Serialize + ?Sized + 'static>(body: &T) -> ApiResponse {
    ApiResponse::new(StatusCode::FORBIDDEN, body)
}

/// 404 Not Found.
pub fn not_found<T: Serialize + ?Sized + 'static>(body: &T) -> ApiResponse {
    ApiResponse::new(StatusCode::NOT_FOUND, body)
}

/// 405 Method Not Allowed.
pub fn method_not_allowed<T: Serialize + ?Sized + 'static>(body: &T) -> ApiResponse {
    ApiResponse::new(StatusCode::METHOD_NOT_ALLOWED, body)
}

/// 409 Conflict.
pub fn conflict<T: Serialize + ?Sized + 'static>(body: &T) -> ApiResponse {
    ApiResponse::new(StatusCode::CONFLICT, body)
}

/// 415 Unsupported Media Type.
pub fn unsupported_media_type<T: Serialize + ?Sized + 'static>(body: &T) -> ApiResponse {
    ApiResponse::new(StatusCode::UNSUPPORTED_MEDIA_TYPE, body)
}

/// 422 Unprocessable Entity.
pub fn unprocessable_entity<T: Serialize + ?Sized + 'static>(body: &T) -> ApiResponse {
    ApiResponse::new(StatusCode::UNPROCESSABLE_ENTITY, body)
}

/// 429 Too Many Requests.
pub fn too_many_requests<T: Serialize + ?Sized + 'static>(body: &T) -> ApiResponse {
    ApiResponse::new(StatusCode::TOO_MANY_REQUESTS, body)
}

/// 500 Internal Server Error.
pub fn internal_server_error<T: Serialize + ?Sized + 'static>(body: &T) -> ApiResponse {
    ApiResponse::new(StatusCode::INTERNAL_SERVER_ERROR, body)
}

/// 501 Not Implemented.
pub fn not_implemented<T: Serialize + ?Sized + 'static>(body: &T) -> ApiResponse {
    ApiResponse::new(StatusCode::NOT_IMPLEMENTED, body)
}

/// 502 Bad Gateway.
pub fn bad_gateway<T: Serialize + ?Sized + 'static>(body: &T) -> ApiResponse {
    ApiResponse::new(StatusCode::BAD_GATEWAY, body)
}

/// 503 Service Unavailable.
pub fn service_unavailable<T: Serialize + ?Sized + 'static>(body: &T) -> ApiResponse {
    ApiResponse::new(StatusCode::SERVICE_UNAVAILABLE, body)
}

/// 504 Gateway Timeout.
pub fn gateway_timeout<T: Serialize + ?Sized + 'static>(body: &T) -> ApiResponse {
    ApiResponse::new(StatusCode::GATEWAY_TIMEOUT, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HttpErrorKind;
    use serde_json::json;
    use std::collections::BTreeMap;

    type Builder = fn(&Value) -> ApiResponse;

    fn builders() -> Vec<(Builder, u16)> {
        vec![
            (ok::<Value>, 200),
            (created::<Value>, 201),
            (accepted::<Value>, 202),
            (bad_request::<Value>, 400),
            (unauthorized::<Value>, 401),
            (forbidden::<Value>, 403),
            (not_found::<Value>, 404),
            (method_not_allowed::<Value>, 405),
            (conflict::<Value>, 409),
            (unsupported_media_type::<Value>, 415),
            (unprocessable_entity::<Value>, 422),
            (too_many_requests::<Value>, 429),
            (internal_server_error::<Value>, 500),
            (not_implemented::<Value>, 501),
            (bad_gateway::<Value>, 502),
            (service_unavailable::<Value>, 503),
            (gateway_timeout::<Value>, 504),
        ]
    }

    #[test]
    fn test_builders_set_status_and_encode_structured_bodies() {
        let body = json!({"message": "hi", "data": {"nested": [1, 2, 3]}});
        for (build, status) in builders() {
            let response = build(&body);
            assert_eq!(response.status_code, status);
            assert_eq!(response.json().unwrap(), body, "status {status}");
        }
    }

    #[test]
    fn test_builders_pass_strings_through() {
        for (build, status) in builders() {
            let response = build(&json!("already text"));
            assert_eq!(response.body, "already text", "status {status}");
        }
        assert_eq!(ok("plain").body, "plain");
        assert_eq!(ok(&String::from(r#"{"a":1}"#)).body, r#"{"a":1}"#);
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    enum Stage {
        Prospect,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct LeadName(String);

    #[test]
    fn test_string_like_values_are_encoded_as_json() {
        let response = ok(&Stage::Prospect);
        assert_eq!(response.body, r#""Prospect""#);
        assert_eq!(serde_json::from_str::<Stage>(&response.body).unwrap(), Stage::Prospect);

        let response = ok(&LeadName("Ada".into()));
        assert_eq!(serde_json::from_str::<LeadName>(&response.body).unwrap(), LeadName("Ada".into()));

        let response = ok(&'x');
        assert_eq!(serde_json::from_str::<char>(&response.body).unwrap(), 'x');

        let response = ok(&HttpErrorKind::NotFound);
        assert_eq!(response.json().unwrap(), json!("NotFound"));
    }

    #[test]
    fn test_no_content_has_empty_body() {
        let response = no_content();
        assert_eq!(response.status_code, 204);
        assert!(response.body.is_empty());
    }

    #[test]
    fn test_unserializable_body_yields_empty_body() {
        // Non-string map keys cannot be represented in JSON.
        let mut map = BTreeMap::new();
        map.insert(vec![1u8], "value");
        let response = internal_server_error(&map);
        assert_eq!(response.status_code, 500);
        assert!(response.body.is_empty());
    }

    #[test]
    fn test_api_response_wire_format() {
        let response = created(&json!({"id": 1}));
        let wire = serde_json::to_value(&response).unwrap();
        assert_eq!(wire, json!({"statusCode": 201, "body": "{\"id\":1}"}));
    }

    #[test]
    fn test_default_response_omits_missing_data() {
        let body: DefaultResponse = DefaultResponse::new("deleted");
        assert_eq!(ok(&body).body, r#"{"message":"deleted"}"#);
    }
}
