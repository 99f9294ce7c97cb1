use apiforge_lambda_home::{handler, HomeData, WELCOME_MESSAGE};
use apiforge_lambda_shared::test_utils::{api_event, mock_request_id};
use apiforge_lambda_shared::ApiResponse;
use lambda_runtime::{Context, LambdaEvent};
use serde_json::{json, Value};

async fn invoke(payload: Value) -> ApiResponse {
    let mut context = Context::default();
    context.request_id = mock_request_id("home");
    let event = LambdaEvent::new(payload, context);
    handler(event).await.expect("handler should succeed")
}

#[tokio::test]
async fn serves_welcome_message_on_rest_payload() {
    let response = invoke(api_event(json!({}))).await;

    assert_eq!(response.status_code, 200);
    let body = response.json().expect("JSON body");
    assert_eq!(body["message"], WELCOME_MESSAGE);
    assert_eq!(
        body["data"],
        serde_json::to_value(HomeData::default()).expect("serializable")
    );
}

#[tokio::test]
async fn serves_welcome_message_on_http_api_payload() {
    let payload = json!({
        "rawPath": "/",
        "headers": {"accept": "*/*"},
        "requestContext": {"http": {"method": "GET", "path": "/"}},
        "isBase64Encoded": false
    });
    let response = invoke(payload).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.json().expect("JSON body")["data"]["author"], "apiforge");
}

#[tokio::test]
async fn does_not_require_authorization() {
    let response = invoke(api_event(json!({"headers": {}}))).await;
    assert_eq!(response.status_code, 200);
}

#[tokio::test]
async fn rejects_payloads_that_are_not_gateway_events() {
    let response = invoke(json!([1, 2, 3])).await;

    assert_eq!(response.status_code, 400);
    let body = response.json().expect("JSON body");
    assert_eq!(body["statusCode"], 400);
    assert_eq!(body["error"], "BadRequest: Malformed API Gateway event");
}

#[tokio::test]
async fn response_has_gateway_wire_shape() {
    let response = invoke(api_event(json!({}))).await;
    let wire = serde_json::to_value(&response).expect("serializable");

    assert!(wire["statusCode"].is_u64());
    assert!(wire["body"].is_string());
}
