//! API Gateway proxy events and the typed request handed to handlers.

use std::collections::HashMap;

use lambda_runtime::Context;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Raw API Gateway proxy event (REST and HTTP API payloads).
///
/// Only the fields the pipeline reads are modelled; everything else in the
/// request context is kept as raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayEvent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: HashMap<String, String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub path_parameters: HashMap<String, String>,

    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,

    #[serde(default)]
    pub body: Option<String>,

    #[serde(default)]
    pub is_base64_encoded: bool,

    /// REST API (payload v1) method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,

    /// REST API (payload v1) path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// HTTP API (payload v2) path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_path: Option<String>,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub request_context: Value,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ApiGatewayEvent {
    /// Look up a header by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        header_lookup(&self.headers, name)
    }

    /// HTTP method from either payload version.
    pub fn method(&self) -> Option<&str> {
        self.http_method
            .as_deref()
            .or_else(|| self.request_context["http"]["method"].as_str())
    }

    /// Request path from either payload version.
    pub fn request_path(&self) -> Option<&str> {
        self.raw_path.as_deref().or(self.path.as_deref())
    }
}

fn header_lookup<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Claims produced by a successful token verification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(pub Map<String, Value>);

impl Claims {
    pub fn get(&self, claim: &str) -> Option<&Value> {
        self.0.get(claim)
    }

    /// The `sub` claim, when present.
    pub fn subject(&self) -> Option<&str> {
        self.get("sub").and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A single handler invocation.
///
/// `T` is the body type. With body parsing enabled it is deserialized from
/// the parsed JSON body; without it, from the raw body text (a JSON string)
/// or `null` when there is no body, so `Option<String>` receives the body
/// untouched.
#[derive(Debug, Clone)]
pub struct Request<T> {
    pub headers: HashMap<String, String>,
    pub path_parameters: HashMap<String, String>,
    pub query_string_parameters: Option<HashMap<String, String>>,
    pub method: Option<String>,
    pub path: Option<String>,
    pub body: T,
    /// Set when the route is authenticated.
    pub claims: Option<Claims>,
    pub context: Context,
}

impl<T> Request<T> {
    pub(crate) fn from_event(
        event: ApiGatewayEvent,
        body: T,
        claims: Option<Claims>,
        context: Context,
    ) -> Self {
        let method = event.method().map(String::from);
        let path = event.request_path().map(String::from);
        Self {
            headers: event.headers,
            path_parameters: event.path_parameters,
            query_string_parameters: event.query_string_parameters,
            method,
            path,
            body,
            claims,
            context,
        }
    }

    /// Look up a header by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        header_lookup(&self.headers, name)
    }

    pub fn path_parameter(&self, name: &str) -> Option<&str> {
        self.path_parameters.get(name).map(String::as_str)
    }

    pub fn query_parameter(&self, name: &str) -> Option<&str> {
        self.query_string_parameters
            .as_ref()
            .and_then(|params| params.get(name))
            .map(String::as_str)
    }

    pub fn request_id(&self) -> &str {
        &self.context.request_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_rest_payload() {
        let event: ApiGatewayEvent = serde_json::from_value(json!({
            "httpMethod": "POST",
            "path": "/leads/7",
            "headers": {"Content-Type": "application/json"},
            "pathParameters": {"id": "7"},
            "queryStringParameters": null,
            "body": "{\"name\":\"Ada\"}",
            "isBase64Encoded": false
        }))
        .unwrap();

        assert_eq!(event.method(), Some("POST"));
        assert_eq!(event.request_path(), Some("/leads/7"));
        assert_eq!(event.path_parameters.get("id").map(String::as_str), Some("7"));
        assert!(event.query_string_parameters.is_none());
        assert_eq!(event.body.as_deref(), Some("{\"name\":\"Ada\"}"));
    }

    #[test]
    fn test_deserialize_http_api_payload() {
        let event: ApiGatewayEvent = serde_json::from_value(json!({
            "rawPath": "/",
            "headers": {"accept": "*/*"},
            "requestContext": {"http": {"method": "GET", "path": "/"}}
        }))
        .unwrap();

        assert_eq!(event.method(), Some("GET"));
        assert_eq!(event.request_path(), Some("/"));
        assert!(event.body.is_none());
        assert!(!event.is_base64_encoded);
    }

    #[test]
    fn test_null_maps_become_empty() {
        let event: ApiGatewayEvent =
            serde_json::from_value(json!({"headers": null, "pathParameters": null})).unwrap();
        assert!(event.headers.is_empty());
        assert!(event.path_parameters.is_empty());
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let mut event = ApiGatewayEvent::default();
        event
            .headers
            .insert("Authorization".to_string(), "Bearer abc".to_string());

        assert_eq!(event.header("authorization"), Some("Bearer abc"));
        assert_eq!(event.header("AUTHORIZATION"), Some("Bearer abc"));
        assert_eq!(event.header("x-missing"), None);
    }

    #[test]
    fn test_request_accessors() {
        let mut event = ApiGatewayEvent::default();
        event.path_parameters.insert("id".into(), "42".into());
        event.query_string_parameters = Some(HashMap::from([("page".into(), "2".into())]));

        let request = Request::from_event(event, (), None, Context::default());
        assert_eq!(request.path_parameter("id"), Some("42"));
        assert_eq!(request.query_parameter("page"), Some("2"));
        assert_eq!(request.query_parameter("size"), None);
        assert!(request.claims.is_none());
    }

    #[test]
    fn test_claims_subject() {
        let claims: Claims = serde_json::from_value(json!({"sub": "user_1", "org": "acme"})).unwrap();
        assert_eq!(claims.subject(), Some("user_1"));
        assert_eq!(claims.get("org"), Some(&json!("acme")));
    }
}
