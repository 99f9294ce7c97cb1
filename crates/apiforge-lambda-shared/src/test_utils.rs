//! Test utilities for Lambda handler testing.
//!
//! Shared across crates through the `test-utils` feature: gateway event
//! builders, mock Lambda contexts, stub token verifiers and a log writer that
//! captures output in memory.
//!
//! # Usage
//!
//! ```ignore
//! use apiforge_lambda_shared::test_utils::{api_event, capture_logger, mock_context};
//!
//! #[tokio::test]
//! async fn test_handler() {
//!     let (logger, logs) = capture_logger(Default::default());
//!     let event = api_event(serde_json::json!({"rawPath": "/"}));
//!     let context = mock_context("home");
//!     // ... invoke the pipeline and assert on `logs.contents()`
//! }
//! ```

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use lambda_runtime::Context;
use serde_json::{json, Map, Value};
use tracing_subscriber::fmt::MakeWriter;

use crate::event::Claims;
use crate::logger::{Logger, LoggerConfig};
use crate::middleware::{TokenVerifier, VerificationError};

/// In-memory sink for log output.
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    /// Everything written so far.
    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Output split into lines.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(String::from).collect()
    }
}

/// Writer handed out by [`CapturedLogs`].
pub struct CapturedWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CapturedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter {
            buffer: Arc::clone(&self.buffer),
        }
    }
}

/// A logger writing into a fresh [`CapturedLogs`].
pub fn capture_logger(config: LoggerConfig) -> (Logger, CapturedLogs) {
    let logs = CapturedLogs::default();
    (Logger::with_writer(config, logs.clone()), logs)
}

/// A REST API proxy event with the given fields over sensible defaults.
///
/// `overrides` must be a JSON object; its members replace the defaults.
pub fn api_event(overrides: Value) -> Value {
    let mut event = json!({
        "httpMethod": "GET",
        "path": "/",
        "headers": {},
        "pathParameters": null,
        "queryStringParameters": null,
        "body": null,
        "isBase64Encoded": false,
        "requestContext": {"requestId": "test-request"}
    });

    if let (Some(base), Value::Object(fields)) = (event.as_object_mut(), overrides) {
        base.extend(fields);
    }
    event
}

/// A `POST` event carrying `body` as JSON.
pub fn json_event(body: &Value) -> Value {
    api_event(json!({
        "httpMethod": "POST",
        "headers": {"Content-Type": "application/json"},
        "body": body.to_string()
    }))
}

/// Create a mock request ID for testing.
///
/// Returns a request ID in the format "test-request-{suffix}".
pub fn mock_request_id(suffix: &str) -> String {
    format!("test-request-{}", suffix)
}

/// A default Lambda context carrying [`mock_request_id`]`(suffix)`.
pub fn mock_context(suffix: &str) -> Context {
    let mut context = Context::default();
    context.request_id = mock_request_id(suffix);
    context
}

/// Verifier rejecting every token with a fixed message.
#[derive(Debug, Clone)]
pub struct RejectingVerifier {
    message: String,
}

impl RejectingVerifier {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl TokenVerifier for RejectingVerifier {
    async fn verify(&self, _token: &str) -> Result<Claims, VerificationError> {
        Err(VerificationError::rejected(self.message.clone()))
    }
}

/// Verifier accepting one token and returning fixed claims.
#[derive(Debug, Clone)]
pub struct FixedClaimsVerifier {
    token: String,
    claims: Claims,
}

impl FixedClaimsVerifier {
    /// `claims` must be a JSON object; anything else yields empty claims.
    pub fn new(token: impl Into<String>, claims: Value) -> Self {
        let claims = match claims {
            Value::Object(map) => Claims(map),
            _ => Claims(Map::new()),
        };
        Self {
            token: token.into(),
            claims,
        }
    }
}

#[async_trait]
impl TokenVerifier for FixedClaimsVerifier {
    async fn verify(&self, token: &str) -> Result<Claims, VerificationError> {
        if token == self.token {
            Ok(self.claims.clone())
        } else {
            Err(VerificationError::rejected("Unauthorized: Invalid token"))
        }
    }
}
