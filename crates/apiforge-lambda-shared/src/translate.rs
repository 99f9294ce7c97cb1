//! Translation of arbitrary errors into gateway responses.
//!
//! This is the general-purpose path for handlers that catch and convert
//! failures themselves. Pipeline-wrapped handlers with authentication enabled
//! answer through the authentication error hook instead; see
//! [`crate::Authenticate`].

use std::error::Error as StdError;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{HttpError, HttpErrorKind};
use crate::response::{
    bad_gateway, bad_request, conflict, forbidden, gateway_timeout, internal_server_error,
    method_not_allowed, not_found, not_implemented, service_unavailable, too_many_requests,
    unauthorized, unprocessable_entity, unsupported_media_type, ApiResponse,
};

/// Body sent for every translated error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    /// Rendered error, e.g. `"NotFound: Not Found"`.
    pub error: String,
    /// Structured details, or an empty object.
    pub details: Value,
    pub status_code: u16,
}

impl ErrorPayload {
    fn from_http_error(error: &HttpError) -> Self {
        Self {
            error: error.to_string(),
            details: error
                .details()
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new())),
            status_code: error.status_code(),
        }
    }

    fn unknown(error: &(dyn StdError + 'static)) -> Self {
        Self {
            error: error.to_string(),
            details: Value::Object(Map::new()),
            status_code: HttpErrorKind::InternalServerError.status_code(),
        }
    }
}

type Responder = fn(&ErrorPayload) -> ApiResponse;

/// Response builder for each error kind.
fn responder(kind: HttpErrorKind) -> Responder {
    match kind {
        HttpErrorKind::BadRequest => bad_request::<ErrorPayload>,
        HttpErrorKind::Unauthorized => unauthorized::<ErrorPayload>,
        HttpErrorKind::Forbidden => forbidden::<ErrorPayload>,
        HttpErrorKind::NotFound => not_found::<ErrorPayload>,
        HttpErrorKind::MethodNotAllowed => method_not_allowed::<ErrorPayload>,
        HttpErrorKind::Conflict => conflict::<ErrorPayload>,
        HttpErrorKind::UnsupportedMediaType => unsupported_media_type::<ErrorPayload>,
        HttpErrorKind::UnprocessableEntity => unprocessable_entity::<ErrorPayload>,
        HttpErrorKind::TooManyRequests => too_many_requests::<ErrorPayload>,
        HttpErrorKind::InternalServerError => internal_server_error::<ErrorPayload>,
        HttpErrorKind::NotImplemented => not_implemented::<ErrorPayload>,
        HttpErrorKind::BadGateway => bad_gateway::<ErrorPayload>,
        HttpErrorKind::ServiceUnavailable => service_unavailable::<ErrorPayload>,
        HttpErrorKind::GatewayTimeout => gateway_timeout::<ErrorPayload>,
    }
}

/// Find the first [`HttpError`] in an error's source chain.
pub fn find_http_error<'a>(error: &'a (dyn StdError + 'static)) -> Option<&'a HttpError> {
    let mut current: Option<&(dyn StdError + 'static)> = Some(error);
    while let Some(err) = current {
        if let Some(http) = err.downcast_ref::<HttpError>() {
            return Some(http);
        }
        current = err.source();
    }
    None
}

/// Convert any error into an [`ApiResponse`].
///
/// An [`HttpError`] anywhere in the source chain decides the status; any
/// other error becomes a 500. The body is always an [`ErrorPayload`].
///
/// # Example
///
/// ```
/// use apiforge_lambda_shared::{transform_error_to_response, HttpError};
///
/// let response = transform_error_to_response(&HttpError::forbidden("read-only key"));
/// assert_eq!(response.status_code, 403);
///
/// let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
/// assert_eq!(transform_error_to_response(&io).status_code, 500);
/// ```
pub fn transform_error_to_response(error: &(dyn StdError + 'static)) -> ApiResponse {
    match find_http_error(error) {
        Some(http) => responder(http.kind())(&ErrorPayload::from_http_error(http)),
        None => internal_server_error(&ErrorPayload::unknown(error)),
    }
}

impl From<HttpError> for ApiResponse {
    fn from(error: HttpError) -> Self {
        transform_error_to_response(&error)
    }
}
