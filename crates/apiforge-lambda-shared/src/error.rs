//! HTTP error taxonomy.
//!
//! Every failure a handler or middleware wants to surface to the caller is an
//! [`HttpError`]. The status code is a constant function of the
//! [`HttpErrorKind`]; callers choose the kind, the message and optional
//! structured details, never the status.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Boxed error type accepted at the handler seam.
///
/// Identical to `lambda_runtime::Error`, so handlers can use `?` on any error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The fixed set of HTTP error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    Conflict,
    UnsupportedMediaType,
    UnprocessableEntity,
    TooManyRequests,
    InternalServerError,
    NotImplemented,
    BadGateway,
    ServiceUnavailable,
    GatewayTimeout,
}

impl HttpErrorKind {
    /// Every kind, in ascending status code order.
    pub const ALL: [HttpErrorKind; 14] = [
        HttpErrorKind::BadRequest,
        HttpErrorKind::Unauthorized,
        HttpErrorKind::Forbidden,
        HttpErrorKind::NotFound,
        HttpErrorKind::MethodNotAllowed,
        HttpErrorKind::Conflict,
        HttpErrorKind::UnsupportedMediaType,
        HttpErrorKind::UnprocessableEntity,
        HttpErrorKind::TooManyRequests,
        HttpErrorKind::InternalServerError,
        HttpErrorKind::NotImplemented,
        HttpErrorKind::BadGateway,
        HttpErrorKind::ServiceUnavailable,
        HttpErrorKind::GatewayTimeout,
    ];

    /// HTTP status code for this kind.
    pub const fn status_code(self) -> u16 {
        match self {
            HttpErrorKind::BadRequest => 400,
            HttpErrorKind::Unauthorized => 401,
            HttpErrorKind::Forbidden => 403,
            HttpErrorKind::NotFound => 404,
            HttpErrorKind::MethodNotAllowed => 405,
            HttpErrorKind::Conflict => 409,
            HttpErrorKind::UnsupportedMediaType => 415,
            HttpErrorKind::UnprocessableEntity => 422,
            HttpErrorKind::TooManyRequests => 429,
            HttpErrorKind::InternalServerError => 500,
            HttpErrorKind::NotImplemented => 501,
            HttpErrorKind::BadGateway => 502,
            HttpErrorKind::ServiceUnavailable => 503,
            HttpErrorKind::GatewayTimeout => 504,
        }
    }

    /// Message used when the caller does not supply one.
    pub const fn default_message(self) -> &'static str {
        match self {
            HttpErrorKind::BadRequest => "Bad Request",
            HttpErrorKind::Unauthorized => "Unauthorized",
            HttpErrorKind::Forbidden => "Forbidden",
            HttpErrorKind::NotFound => "Not Found",
            HttpErrorKind::MethodNotAllowed => "Method Not Allowed",
            HttpErrorKind::Conflict => "Conflict",
            HttpErrorKind::UnsupportedMediaType => "Unsupported Media Type",
            HttpErrorKind::UnprocessableEntity => "Unprocessable Entity",
            HttpErrorKind::TooManyRequests => "Too Many Requests",
            HttpErrorKind::InternalServerError => "Internal Server Error",
            HttpErrorKind::NotImplemented => "Not Implemented",
            HttpErrorKind::BadGateway => "Bad Gateway",
            HttpErrorKind::ServiceUnavailable => "Service Unavailable",
            HttpErrorKind::GatewayTimeout => "Gateway Timeout",
        }
    }

    /// Type name of the kind, used as the prefix of the rendered error.
    pub const fn name(self) -> &'static str {
        match self {
            HttpErrorKind::BadRequest => "BadRequest",
            HttpErrorKind::Unauthorized => "Unauthorized",
            HttpErrorKind::Forbidden => "Forbidden",
            HttpErrorKind::NotFound => "NotFound",
            HttpErrorKind::MethodNotAllowed => "MethodNotAllowed",
            HttpErrorKind::Conflict => "Conflict",
            HttpErrorKind::UnsupportedMediaType => "UnsupportedMediaType",
            HttpErrorKind::UnprocessableEntity => "UnprocessableEntity",
            HttpErrorKind::TooManyRequests => "TooManyRequests",
            HttpErrorKind::InternalServerError => "InternalServerError",
            HttpErrorKind::NotImplemented => "NotImplemented",
            HttpErrorKind::BadGateway => "BadGateway",
            HttpErrorKind::ServiceUnavailable => "ServiceUnavailable",
            HttpErrorKind::GatewayTimeout => "GatewayTimeout",
        }
    }
}

impl fmt::Display for HttpErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An HTTP-shaped failure.
///
/// # Example
///
/// ```
/// use apiforge_lambda_shared::{HttpError, HttpErrorKind};
/// use serde_json::json;
///
/// let err = HttpError::not_found("Lead 42 does not exist")
///     .with_details(json!({ "id": 42 }));
///
/// assert_eq!(err.kind(), HttpErrorKind::NotFound);
/// assert_eq!(err.status_code(), 404);
/// assert_eq!(err.to_string(), "NotFound: Lead 42 does not exist");
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}")]
pub struct HttpError {
    kind: HttpErrorKind,
    message: String,
    details: Option<Value>,
}

impl HttpError {
    /// Create an error of the given kind with its default message.
    pub fn new(kind: HttpErrorKind) -> Self {
        Self::with_message(kind, kind.default_message())
    }

    /// Create an error of the given kind with a custom message.
    pub fn with_message(kind: HttpErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Attach structured diagnostic details.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn kind(&self) -> HttpErrorKind {
        self.kind
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_message(HttpErrorKind::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::with_message(HttpErrorKind::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::with_message(HttpErrorKind::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_message(HttpErrorKind::NotFound, message)
    }

    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::with_message(HttpErrorKind::MethodNotAllowed, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::with_message(HttpErrorKind::Conflict, message)
    }

    pub fn unsupported_media_type(message: impl Into<String>) -> Self {
        Self::with_message(HttpErrorKind::UnsupportedMediaType, message)
    }

    pub fn unprocessable_entity(message: impl Into<String>) -> Self {
        Self::with_message(HttpErrorKind::UnprocessableEntity, message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::with_message(HttpErrorKind::TooManyRequests, message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::with_message(HttpErrorKind::InternalServerError, message)
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::with_message(HttpErrorKind::NotImplemented, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::with_message(HttpErrorKind::BadGateway, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::with_message(HttpErrorKind::ServiceUnavailable, message)
    }

    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::with_message(HttpErrorKind::GatewayTimeout, message)
    }
}

impl From<HttpErrorKind> for HttpError {
    fn from(kind: HttpErrorKind) -> Self {
        Self::new(kind)
    }
}
