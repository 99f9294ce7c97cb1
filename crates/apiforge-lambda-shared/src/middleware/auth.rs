//! Bearer token authentication.

use std::sync::Arc;

use async_trait::async_trait;
use http::header::AUTHORIZATION;
use serde_json::json;
use thiserror::Error;

use super::{Invocation, Middleware};
use crate::error::{BoxError, HttpError};
use crate::event::Claims;
use crate::logger::{Logger, Meta};
use crate::response::unauthorized;
use crate::translate::find_http_error;

const NO_TOKEN: &str = "Unauthorized: No token provided";
const INVALID_TOKEN: &str = "Unauthorized: Invalid token";

/// Errors returned by a [`TokenVerifier`].
#[derive(Debug, Error)]
pub enum VerificationError {
    /// The provider rejected the token. The message is sent to the caller.
    #[error("{0}")]
    Rejected(String),

    /// The provider could not be reached or answered unexpectedly.
    #[error("{0}")]
    Provider(#[source] BoxError),
}

impl VerificationError {
    pub fn rejected(message: impl Into<String>) -> Self {
        VerificationError::Rejected(message.into())
    }
}

/// Identity provider seam: turns a bearer token into claims.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Claims, VerificationError>;
}

#[async_trait]
impl<V: TokenVerifier + ?Sized> TokenVerifier for Arc<V> {
    async fn verify(&self, token: &str) -> Result<Claims, VerificationError> {
        (**self).verify(token).await
    }
}

/// Accepts any non-empty token and yields empty claims.
///
/// Only checks that a credential was sent. Deployments that rely on the
/// claims must install a verifier backed by their identity provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct PresenceOnlyVerifier;

#[async_trait]
impl TokenVerifier for PresenceOnlyVerifier {
    async fn verify(&self, _token: &str) -> Result<Claims, VerificationError> {
        Ok(Claims::default())
    }
}

/// Token carried by an `Authorization` header value.
///
/// The first `Bearer ` marker is removed and surrounding whitespace trimmed.
/// Values without the marker are used as-is.
///
/// ```
/// use apiforge_lambda_shared::bearer_token;
///
/// assert_eq!(bearer_token("Bearer abc.def"), "abc.def");
/// assert_eq!(bearer_token("abc.def"), "abc.def");
/// assert_eq!(bearer_token("Bearer "), "");
/// ```
pub fn bearer_token(header: &str) -> String {
    header.replacen("Bearer ", "", 1).trim().to_string()
}

/// Requires a verified bearer token; answers 401 for every failure.
///
/// `before` reads the `Authorization` header, verifies the token with the
/// configured [`TokenVerifier`] and stores the claims on the invocation.
/// `on_error` logs the failure and replaces the response with
/// `401 {"message": <error message or "Unauthorized">}`, whatever phase the
/// failure came from.
pub struct Authenticate {
    verifier: Arc<dyn TokenVerifier>,
    logger: Logger,
}

impl Authenticate {
    pub fn new(verifier: Arc<dyn TokenVerifier>, logger: Logger) -> Self {
        Self { verifier, logger }
    }
}

#[async_trait]
impl Middleware for Authenticate {
    fn name(&self) -> &'static str {
        "authenticate"
    }

    async fn before(&self, invocation: &mut Invocation) -> Result<(), BoxError> {
        let token = invocation
            .event
            .header(AUTHORIZATION.as_str())
            .map(bearer_token)
            .unwrap_or_default();

        if token.is_empty() {
            self.logger.error("No authorization token provided");
            return Err(HttpError::unauthorized(NO_TOKEN).into());
        }

        match self.verifier.verify(&token).await {
            Ok(claims) => {
                invocation.claims = Some(claims);
                Ok(())
            }
            Err(e) => {
                self.logger.error_with("Error verifying token:", Meta::error(&e));
                let message = e.to_string();
                let message = if message.is_empty() {
                    INVALID_TOKEN.to_string()
                } else {
                    message
                };
                Err(HttpError::unauthorized(message).into())
            }
        }
    }

    async fn on_error(&self, invocation: &mut Invocation) {
        let message = match invocation.error() {
            Some(error) => {
                self.logger.error_with("Error in middleware:", Meta::error(error));
                match find_http_error(error) {
                    Some(http) => http.message().to_string(),
                    None => error.to_string(),
                }
            }
            None => String::new(),
        };

        let message = if message.is_empty() {
            "Unauthorized".to_string()
        } else {
            message
        };
        invocation.response = Some(unauthorized(&json!({ "message": message })));
    }
}
