use super::*;

use forge::NodeApiError;

fn node_error() -> NodeApiError {
    NodeApiError::Status {
        endpoint: "/api/v1/node".into(),
        status: 500,
        body: "internal detail".into(),
    }
}

async fn error_body(error: ApiError) -> (StatusCode, ErrorBody) {
    let response = error.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[test]
fn test_error_status_codes() {
    assert_eq!(
        ApiError::from(ForgeError::Hook(HookError::MissingSignature)).status_code(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        ApiError::from(ForgeError::Hook(HookError::InvalidSignature)).status_code(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        ApiError::from(ForgeError::Hook(HookError::Parse {
            event: "push".into(),
            message: "eof".into(),
        }))
        .status_code(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        ApiError::from(ForgeError::Node(node_error())).status_code(),
        StatusCode::BAD_GATEWAY
    );
    assert_eq!(
        ApiError::Sink(SinkError::new("queue full")).status_code(),
        StatusCode::BAD_GATEWAY
    );
    assert_eq!(
        ApiError::from(LoginError::new("https://seed/login", ForgeError::Unauthorized))
            .status_code(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        ApiError::from(LoginError::new("https://seed/login", node_error())).status_code(),
        StatusCode::BAD_GATEWAY
    );
}

#[tokio::test]
async fn test_login_failure_body_carries_login_url() {
    let (status, body) = error_body(ApiError::from(LoginError::new(
        "https://seed.example.com/login?callback_url=x",
        ForgeError::Unauthorized,
    )))
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body.error, "provided secret token is unauthorized");
    assert_eq!(
        body.login_url.as_deref(),
        Some("https://seed.example.com/login?callback_url=x")
    );
}

#[tokio::test]
async fn test_node_failures_do_not_leak_response_bodies() {
    let (status, body) = error_body(ApiError::from(ForgeError::Node(node_error()))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(!body.error.contains("internal detail"));
    assert!(body.login_url.is_none());
}

#[tokio::test]
async fn test_signature_failure_body_names_the_problem() {
    let (status, body) =
        error_body(ApiError::from(ForgeError::Hook(HookError::InvalidSignature))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body.error, "invalid hook message signature");
}

#[test]
fn test_header_lookup_is_case_insensitive() {
    let mut headers = HeaderMap::new();
    headers.insert("x-radicle-event-type", "push".parse().unwrap());
    assert_eq!(
        header_value(&headers, EVENT_TYPE_HEADER).as_deref(),
        Some("push")
    );
    assert_eq!(header_value(&headers, SIGNATURE_HEADER), None);
}
