//! JSON request body parsing.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use http::header::CONTENT_TYPE;
use serde_json::{json, Value};

use super::{Invocation, Middleware};
use crate::error::{BoxError, HttpError};

const MALFORMED_JSON: &str = "Invalid or malformed JSON was provided";

/// `application/json` or any `application/*+json`, parameters allowed.
fn is_json_media_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

/// Replaces the invocation body with the parsed JSON document.
///
/// Requests without a body parse as `null` whatever their content type.
/// Otherwise a non-JSON `Content-Type` fails with 415 and an undecodable or
/// malformed body with 422.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBodyParser;

impl JsonBodyParser {
    pub fn new() -> Self {
        Self
    }

    fn parse(event_body: &str, base64_encoded: bool) -> Result<Value, HttpError> {
        let malformed = |reason: String| {
            HttpError::unprocessable_entity(MALFORMED_JSON).with_details(json!({ "reason": reason }))
        };

        let text = if base64_encoded {
            let bytes = STANDARD
                .decode(event_body.trim())
                .map_err(|e| malformed(e.to_string()))?;
            String::from_utf8(bytes).map_err(|e| malformed(e.to_string()))?
        } else {
            event_body.to_string()
        };

        serde_json::from_str(&text).map_err(|e| malformed(e.to_string()))
    }
}

#[async_trait]
impl Middleware for JsonBodyParser {
    fn name(&self) -> &'static str {
        "json-body-parser"
    }

    async fn before(&self, invocation: &mut Invocation) -> Result<(), BoxError> {
        let body = match invocation.event.body.as_deref() {
            Some(body) if !body.is_empty() => body,
            _ => {
                invocation.body = Value::Null;
                return Ok(());
            }
        };

        let content_type = invocation.event.header(CONTENT_TYPE.as_str()).unwrap_or_default();
        if !is_json_media_type(content_type) {
            return Err(HttpError::unsupported_media_type("Unsupported Media Type")
                .with_details(json!({ "contentType": content_type }))
                .into());
        }

        invocation.body = Self::parse(body, invocation.event.is_base64_encoded)?;
        Ok(())
    }
}
