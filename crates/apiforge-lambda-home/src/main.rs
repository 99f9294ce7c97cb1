//! AWS Lambda function for the API home route.

use lambda_runtime::Error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    apiforge_lambda_home::run().await
}
