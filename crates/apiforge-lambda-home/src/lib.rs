//! AWS Lambda function for the API home route.
//!
//! Serves `GET /` with a welcome message and the deployed version. It is the
//! reference for new endpoints: a plain async handler, wrapped with
//! [`wrap_middleware`], registered in [`routes`].

use std::future::Future;
use std::pin::Pin;
use std::sync::OnceLock;

use http::Method;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use apiforge_lambda_shared::{
    init_tracing, log, ok, wrap_middleware, ApiResponse, BoxError, DefaultResponse, Options,
    Pipeline, Request, RouteDefinition, RouteTable, RouteTableError,
};

/// Greeting returned by the home route.
pub const WELCOME_MESSAGE: &str = "Welcome to apiforge api 🤖";

/// Author reported by the home route.
pub const AUTHOR: &str = "apiforge";

/// `data` member of the home response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeData {
    pub version: String,
    pub author: String,
}

impl Default for HomeData {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            author: AUTHOR.to_string(),
        }
    }
}

/// The home handler. Public, no body.
pub async fn home(_request: Request<Option<String>>) -> Result<ApiResponse, BoxError> {
    log().info("Home route hit");
    Ok(ok(
        &DefaultResponse::new(WELCOME_MESSAGE).with_data(HomeData::default())
    ))
}

/// Options the home route is wrapped with.
pub const OPTIONS: Options = Options {
    is_authenticated: false,
    body_parser: false,
};

/// Gateway registration of this function.
pub fn route() -> RouteDefinition {
    RouteDefinition::new(Method::GET, "/", "home.handler")
}

/// Every route served by the API.
pub fn routes() -> Result<RouteTable, RouteTableError> {
    let mut table = RouteTable::new();
    table.register(route())?;
    Ok(table)
}

/// Entry point used by the Lambda runtime.
pub async fn run() -> Result<(), Error> {
    init_tracing();
    lambda_runtime::run(service_fn(handler)).await
}

type HomeFuture = Pin<Box<dyn Future<Output = Result<ApiResponse, BoxError>> + Send>>;
type HomeFn = fn(Request<Option<String>>) -> HomeFuture;

fn boxed_home(request: Request<Option<String>>) -> HomeFuture {
    Box::pin(home(request))
}

/// Wrapped home handler, built on first use and reused by warm invocations.
fn pipeline() -> &'static Pipeline<Option<String>, HomeFn> {
    static PIPELINE: OnceLock<Pipeline<Option<String>, HomeFn>> = OnceLock::new();
    PIPELINE.get_or_init(|| wrap_middleware(boxed_home as HomeFn, OPTIONS))
}

/// Lambda handler invoked per request.
pub async fn handler(event: LambdaEvent<Value>) -> Result<ApiResponse, Error> {
    pipeline().handle(event).await
}
