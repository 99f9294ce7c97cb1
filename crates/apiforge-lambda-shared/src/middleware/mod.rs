//! Request pipeline wrapped around every Lambda handler.
//!
//! A [`Pipeline`] owns a business handler and an ordered list of
//! [`Middleware`]s. Each invocation runs:
//!
//! 1. every `before` hook in list order; the first failure skips the rest,
//!    the handler and every `after` hook;
//! 2. the handler, with the body deserialized into its request type;
//! 3. every `after` hook in reverse list order;
//! 4. on any failure, every `on_error` hook in reverse list order. The last
//!    hook to set a response wins; when none does, the error is translated
//!    with [`transform_error_to_response`].
//!
//! The default list is `[StripInternalFields, Authenticate?, JsonBodyParser?]`
//! followed by any middlewares added through [`PipelineBuilder::middleware`].
//! Authentication runs before body parsing on purpose: a caller without a
//! valid token gets 401, never 415 or 422.
//!
//! # Example
//!
//! ```no_run
//! use apiforge_lambda_shared::{ok, wrap_middleware, BoxError, Options, Request, ApiResponse};
//! use serde::Deserialize;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[derive(Deserialize)]
//! struct CreateLead {
//!     email: String,
//! }
//!
//! async fn create_lead(request: Request<CreateLead>) -> Result<ApiResponse, BoxError> {
//!     Ok(ok(&json!({"message": "created", "data": {"email": request.body.email}})))
//! }
//!
//! # async fn run() -> Result<(), lambda_runtime::Error> {
//! let pipeline = Arc::new(wrap_middleware(
//!     create_lead,
//!     Options { is_authenticated: true, body_parser: true },
//! ));
//! lambda_runtime::run(lambda_runtime::service_fn(move |event| {
//!     let pipeline = Arc::clone(&pipeline);
//!     async move { pipeline.handle(event).await }
//! }))
//! .await
//! # }
//! ```

mod auth;
mod body_parser;
mod strip_fields;

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use lambda_runtime::{Context, LambdaEvent};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{BoxError, HttpError, HttpErrorKind};
use crate::event::{ApiGatewayEvent, Claims, Request};
use crate::logger::{log, Logger, Meta};
use crate::response::ApiResponse;
use crate::translate::transform_error_to_response;

pub use auth::{bearer_token, Authenticate, PresenceOnlyVerifier, TokenVerifier, VerificationError};
pub use body_parser::JsonBodyParser;
pub use strip_fields::StripInternalFields;

/// Which optional middlewares a pipeline installs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    /// Require and verify a bearer token.
    pub is_authenticated: bool,
    /// Parse the body as JSON before the handler runs.
    pub body_parser: bool,
}

/// Mutable state of one invocation, shared by every hook.
#[derive(Debug)]
pub struct Invocation {
    pub event: ApiGatewayEvent,
    pub context: Context,
    /// Set by [`Authenticate`] once the token is verified.
    pub claims: Option<Claims>,
    /// Body handed to the handler. Starts as the raw body text (or `null`);
    /// [`JsonBodyParser`] replaces it with the parsed document.
    pub body: Value,
    /// Handler response during `after`; error response during `on_error`.
    pub response: Option<ApiResponse>,
    /// The failure being handled during `on_error`.
    pub error: Option<BoxError>,
}

impl Invocation {
    pub fn new(event: ApiGatewayEvent, context: Context) -> Self {
        let body = event.body.clone().map(Value::String).unwrap_or(Value::Null);
        Self {
            event,
            context,
            claims: None,
            body,
            response: None,
            error: None,
        }
    }

    /// The error being handled, if any.
    pub fn error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.error.as_deref()
    }
}

/// A pipeline stage. Every hook defaults to a no-op.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    async fn before(&self, _invocation: &mut Invocation) -> Result<(), BoxError> {
        Ok(())
    }

    async fn after(&self, _invocation: &mut Invocation) -> Result<(), BoxError> {
        Ok(())
    }

    /// Runs with `invocation.error` set. May set `invocation.response`.
    async fn on_error(&self, _invocation: &mut Invocation) {}
}

/// A business handler: any `async fn(Request<T>) -> Result<ApiResponse, BoxError>`.
pub trait Handler<T>: Send + Sync {
    type Future: Future<Output = Result<ApiResponse, BoxError>> + Send;

    fn call(&self, request: Request<T>) -> Self::Future;
}

impl<T, F, Fut> Handler<T> for F
where
    F: Fn(Request<T>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ApiResponse, BoxError>> + Send,
{
    type Future = Fut;

    fn call(&self, request: Request<T>) -> Self::Future {
        self(request)
    }
}

/// Wrap `handler` with the standard middlewares selected by `options`.
///
/// Uses the process logger and [`PresenceOnlyVerifier`]; use
/// [`Pipeline::builder`] to inject a real [`TokenVerifier`].
pub fn wrap_middleware<T, H>(handler: H, options: Options) -> Pipeline<T, H>
where
    T: DeserializeOwned + Send,
    H: Handler<T>,
{
    Pipeline::builder(handler).options(options).build()
}

/// A handler wrapped in middlewares. Invoking it never fails.
pub struct Pipeline<T, H> {
    handler: H,
    middlewares: Vec<Arc<dyn Middleware>>,
    logger: Logger,
    _body: PhantomData<fn() -> T>,
}

impl<T, H> Pipeline<T, H>
where
    T: DeserializeOwned + Send,
    H: Handler<T>,
{
    pub fn builder(handler: H) -> PipelineBuilder<T, H> {
        PipelineBuilder {
            handler,
            options: Options::default(),
            verifier: None,
            logger: None,
            extra: Vec::new(),
            _body: PhantomData,
        }
    }

    /// Middleware names in list order.
    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.middlewares.iter().map(|m| m.name()).collect()
    }

    /// Adapter for `lambda_runtime::service_fn`.
    pub async fn handle(&self, event: LambdaEvent<Value>) -> Result<ApiResponse, lambda_runtime::Error> {
        Ok(self.invoke(event.payload, event.context).await)
    }

    /// Run one invocation through every phase.
    pub async fn invoke(&self, payload: Value, context: Context) -> ApiResponse {
        let event = match serde_json::from_value::<ApiGatewayEvent>(payload) {
            Ok(event) => event,
            Err(e) => {
                let mut invocation = Invocation::new(ApiGatewayEvent::default(), context);
                invocation.error = Some(
                    HttpError::bad_request("Malformed API Gateway event")
                        .with_details(json!({ "reason": e.to_string() }))
                        .into(),
                );
                return self.resolve_error(invocation).await;
            }
        };

        let mut invocation = Invocation::new(event, context);
        match self.run(&mut invocation).await {
            Ok(response) => response,
            Err(error) => {
                invocation.response = None;
                invocation.error = Some(error);
                self.resolve_error(invocation).await
            }
        }
    }

    async fn run(&self, invocation: &mut Invocation) -> Result<ApiResponse, BoxError> {
        for middleware in &self.middlewares {
            middleware.before(invocation).await?;
        }

        let body: T = serde_json::from_value(invocation.body.clone()).map_err(|e| {
            HttpError::unprocessable_entity("Request body does not match the expected shape")
                .with_details(json!({ "reason": e.to_string() }))
        })?;

        let request = Request::from_event(
            invocation.event.clone(),
            body,
            invocation.claims.clone(),
            invocation.context.clone(),
        );
        invocation.response = Some(self.handler.call(request).await?);

        for middleware in self.middlewares.iter().rev() {
            middleware.after(invocation).await?;
        }

        invocation
            .response
            .take()
            .ok_or_else(|| HttpError::internal_server_error("Handler response was discarded").into())
    }

    async fn resolve_error(&self, mut invocation: Invocation) -> ApiResponse {
        for middleware in self.middlewares.iter().rev() {
            middleware.on_error(&mut invocation).await;
        }

        if let Some(response) = invocation.response.take() {
            return response;
        }

        match invocation.error.as_deref() {
            Some(error) => {
                if find_status(error) >= 500 {
                    self.logger.error_with("Unhandled error:", Meta::error(error));
                } else {
                    self.logger.http_with("Request rejected:", Meta::error(error));
                }
                transform_error_to_response(error)
            }
            None => HttpError::new(HttpErrorKind::InternalServerError).into(),
        }
    }
}

fn find_status(error: &(dyn std::error::Error + 'static)) -> u16 {
    crate::translate::find_http_error(error)
        .map(HttpError::status_code)
        .unwrap_or(500)
}

/// Builder for [`Pipeline`].
pub struct PipelineBuilder<T, H> {
    handler: H,
    options: Options,
    verifier: Option<Arc<dyn TokenVerifier>>,
    logger: Option<Logger>,
    extra: Vec<Arc<dyn Middleware>>,
    _body: PhantomData<fn() -> T>,
}

impl<T, H> PipelineBuilder<T, H>
where
    T: DeserializeOwned + Send,
    H: Handler<T>,
{
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Verifier used when authentication is enabled.
    pub fn verifier(mut self, verifier: impl TokenVerifier + 'static) -> Self {
        let verifier: Arc<dyn TokenVerifier> = Arc::new(verifier);
        self.verifier = Some(verifier);
        self
    }

    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Append a middleware after the standard ones.
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.extra.push(Arc::new(middleware));
        self
    }

    pub fn build(self) -> Pipeline<T, H> {
        let logger = self.logger.unwrap_or_else(|| log().clone());

        let mut middlewares: Vec<Arc<dyn Middleware>> =
            vec![Arc::new(StripInternalFields::new(logger.clone())) as Arc<dyn Middleware>];

        if self.options.is_authenticated {
            let verifier: Arc<dyn TokenVerifier> = match self.verifier {
                Some(verifier) => verifier,
                None => {
                    logger.warn("Authentication enabled without a token verifier; any bearer token is accepted");
                    Arc::new(PresenceOnlyVerifier)
                }
            };
            middlewares.push(Arc::new(Authenticate::new(verifier, logger.clone())));
        }

        if self.options.body_parser {
            middlewares.push(Arc::new(JsonBodyParser::new()));
        }

        middlewares.extend(self.extra);

        Pipeline {
            handler: self.handler,
            middlewares,
            logger,
            _body: PhantomData,
        }
    }
}
