//! Shared infrastructure for apiforge AWS Lambda functions.
//!
//! This crate provides common functionality used across all Lambda handlers:
//!
//! - [`HttpError`]: the fixed taxonomy of HTTP errors with their status codes
//! - Response builders ([`ok`], [`created`], [`not_found`], ...) producing
//!   API Gateway [`ApiResponse`] records
//! - [`transform_error_to_response`]: total translation of any error into a response
//! - [`wrap_middleware`] / [`Pipeline`]: authentication, JSON body parsing and
//!   storage-key stripping around a business handler
//! - [`log()`]: the process-wide leveled [`Logger`], and [`init_tracing`]
//! - Helpers for storage keys ([`omit_keys`], [`to_partition_key`]),
//!   memoization ([`memoize`], [`memoize_async`]) and route registration
//!   ([`RouteTable`])
//!
//! # Testing Support
//!
//! The [`test_utils`] module provides event builders, mock contexts, stub
//! verifiers and log capture. Enable the `test-utils` feature to access it
//! from dependent crates.

#![deny(warnings)]

mod error;
mod event;
mod keys;
mod logger;
mod memoize;
mod middleware;
mod response;
mod route_table;
mod tracing_init;
mod translate;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{BoxError, HttpError, HttpErrorKind};
pub use event::{ApiGatewayEvent, Claims, Request};
pub use keys::{omit_keys, to_partition_key, INTERNAL_KEYS, KEY_SEPARATOR};
pub use logger::{log, LogLevel, Logger, LoggerConfig, Meta};
pub use memoize::{memoize, memoize_async, Memoized, MemoizedAsync};
pub use middleware::{
    bearer_token, wrap_middleware, Authenticate, Handler, Invocation, JsonBodyParser, Middleware,
    Options, Pipeline, PipelineBuilder, PresenceOnlyVerifier, StripInternalFields, TokenVerifier,
    VerificationError,
};
pub use response::{
    accepted, bad_gateway, bad_request, conflict, created, forbidden, gateway_timeout,
    internal_server_error, method_not_allowed, no_content, not_found, not_implemented, ok,
    service_unavailable, too_many_requests, unauthorized, unprocessable_entity,
    unsupported_media_type, ApiResponse, DefaultResponse,
};
pub use route_table::{
    create_route, RouteDefinition, RouteTable, RouteTableError, DEFAULT_FOLDER, HANDLER_ROOT,
};
pub use tracing_init::{init_tracing, LineFormat};
pub use translate::{find_http_error, transform_error_to_response, ErrorPayload};
