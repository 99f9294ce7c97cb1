//! Removal of storage keys from outgoing responses.

use async_trait::async_trait;
use serde_json::Value;

use super::{Invocation, Middleware};
use crate::error::{BoxError, HttpError};
use crate::keys::omit_keys;
use crate::logger::{Logger, Meta};

/// Strips `pk` and `sk` from the `data` member of JSON response bodies.
///
/// `data` may be an object or an array; non-object array elements pass
/// through. Empty bodies are left alone. A body that is not JSON fails the
/// invocation with 500.
pub struct StripInternalFields {
    logger: Logger,
}

impl StripInternalFields {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

fn strip_data(data: &mut Value) {
    match data {
        Value::Array(items) => {
            for item in items.iter_mut() {
                if let Some(stripped) = omit_keys(item, &[]) {
                    *item = stripped;
                }
            }
        }
        Value::Object(_) => {
            if let Some(stripped) = omit_keys(data, &[]) {
                *data = stripped;
            }
        }
        _ => {}
    }
}

/// Rewrite `body` compactly with internal keys removed from `data`.
fn strip_body(body: &str) -> serde_json::Result<String> {
    let mut document: Value = serde_json::from_str(body)?;
    if let Some(data) = document.get_mut("data") {
        strip_data(data);
    }
    serde_json::to_string(&document)
}

#[async_trait]
impl Middleware for StripInternalFields {
    fn name(&self) -> &'static str {
        "strip-internal-fields"
    }

    async fn after(&self, invocation: &mut Invocation) -> Result<(), BoxError> {
        let Some(response) = invocation.response.as_mut() else {
            return Ok(());
        };
        if response.body.is_empty() {
            return Ok(());
        }

        match strip_body(&response.body) {
            Ok(body) => {
                response.body = body;
                Ok(())
            }
            Err(e) => {
                self.logger.error_with("Error in after middleware:", Meta::error(&e));
                Err(HttpError::internal_server_error(format!("Internal Server Error: {}", e)).into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ApiGatewayEvent;
    use crate::logger::{LogLevel, LoggerConfig};
    use crate::response::{no_content, ok, ApiResponse};
    use crate::test_utils::capture_logger;
    use lambda_runtime::Context;
    use serde_json::json;

    async fn run_after(response: ApiResponse) -> (Result<(), BoxError>, Invocation, String) {
        let (logger, logs) = capture_logger(LoggerConfig {
            level: LogLevel::Info,
            production: true,
        });
        let mut inv = Invocation::new(ApiGatewayEvent::default(), Context::default());
        inv.response = Some(response);

        let result = StripInternalFields::new(logger).after(&mut inv).await;
        (result, inv, logs.contents())
    }

    #[tokio::test]
    async fn test_strips_object_data() {
        let (result, inv, _) = run_after(ok(&json!({
            "message": "lead",
            "data": {"pk": "LEAD::1", "sk": "v0", "id": 1}
        })))
        .await;
        result.unwrap();
        assert_eq!(
            inv.response.unwrap().body,
            r#"{"message":"lead","data":{"id":1}}"#
        );
    }

    #[tokio::test]
    async fn test_strips_each_array_element() {
        let (result, inv, _) = run_after(ok(&json!({
            "message": "leads",
            "data": [{"pk": "a", "id": 1}, {"sk": "b", "id": 2}, 3, "x"]
        })))
        .await;
        result.unwrap();
        assert_eq!(
            inv.response.unwrap().json().unwrap(),
            json!({"message": "leads", "data": [{"id": 1}, {"id": 2}, 3, "x"]})
        );
    }

    #[tokio::test]
    async fn test_top_level_keys_are_kept() {
        let body = json!({"pk": "top", "message": "kept", "data": 5});
        let (result, inv, _) = run_after(ok(&body)).await;
        result.unwrap();
        assert_eq!(inv.response.unwrap().json().unwrap(), body);
    }

    #[tokio::test]
    async fn test_empty_body_untouched() {
        let (result, inv, _) = run_after(no_content()).await;
        result.unwrap();
        assert_eq!(inv.response.unwrap(), no_content());
    }

    #[tokio::test]
    async fn test_non_json_body_fails_with_internal_error() {
        let (result, _, logs) = run_after(ok("plain text")).await;
        let err = result.unwrap_err();
        let http = err.downcast_ref::<HttpError>().unwrap();

        assert_eq!(http.status_code(), 500);
        assert!(http.message().starts_with("Internal Server Error: "));
        assert!(logs.contains("[error]: Error in after middleware:"));
    }
}
