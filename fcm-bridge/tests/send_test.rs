mod common;

use common::{TestApp, ACCESS_TOKEN, API_KEY, SEND_PATH};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn expected_payload(token: &str, title: &str, body: &str) -> serde_json::Value {
    json!({
        "message": {
            "token": token,
            "notification": { "title": title, "body": body },
            "data": {}
        }
    })
}

async fn mock_fcm_accepts(app: &TestApp, payload: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .and(header("authorization", format!("Bearer {}", ACCESS_TOKEN).as_str()))
        .and(body_json(payload))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "name": "projects/test-project/messages/0:1234" })),
        )
        .expect(1)
        .mount(&app.upstream)
        .await;
}

// =============================================================================
// Happy path, one test per body encoding
// =============================================================================

#[tokio::test]
async fn json_body_is_forwarded() {
    let app = TestApp::spawn().await;
    app.mock_token_exchange(1).await;
    mock_fcm_accepts(&app, expected_payload("abc", "Hi", "There")).await;

    let response = app
        .post_send(
            "application/json",
            r#"{"token":"abc","title":"Hi","body":"There"}"#,
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["name"], "projects/test-project/messages/0:1234");
}

#[tokio::test]
async fn form_body_is_forwarded() {
    let app = TestApp::spawn().await;
    app.mock_token_exchange(1).await;
    mock_fcm_accepts(&app, expected_payload("abc", "Hi", "There")).await;

    let response = app
        .post_send(
            "application/x-www-form-urlencoded",
            "token=abc&title=Hi&body=There",
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn plain_text_body_is_forwarded_with_multiline_body() {
    let app = TestApp::spawn().await;
    app.mock_token_exchange(1).await;
    mock_fcm_accepts(&app, expected_payload("tok1", "Hello", "Line1\nLine2")).await;

    let response = app
        .post_send("text/plain", "tok1\nHello\nLine1\nLine2")
        .await;

    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn missing_content_type_falls_back_to_plain_text() {
    let app = TestApp::spawn().await;
    app.mock_token_exchange(1).await;
    mock_fcm_accepts(&app, expected_payload("abc", "Hi", "There")).await;

    let response = app
        .client
        .post(format!("{}/send", app.address))
        .header("x-api-key", API_KEY)
        .body("abc\nHi\nThere")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn each_request_reauthorizes() {
    let app = TestApp::spawn().await;
    app.mock_token_exchange(2).await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(2)
        .mount(&app.upstream)
        .await;

    for _ in 0..2 {
        let response = app.post_send("text/plain", "abc\nHi\nThere").await;
        assert_eq!(response.status().as_u16(), 200);
    }
}

// =============================================================================
// Rejections before any upstream call
// =============================================================================

#[tokio::test]
async fn wrong_api_key_returns_401() {
    let app = TestApp::spawn().await;
    app.expect_no_upstream_calls().await;

    let response = app
        .client
        .post(format!("{}/send", app.address))
        .header("x-api-key", "not-the-key")
        .header("content-type", "application/json")
        .body(r#"{"token":"abc","title":"Hi","body":"There"}"#)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "unauthorized" }));
}

#[tokio::test]
async fn missing_api_key_returns_401() {
    let app = TestApp::spawn().await;
    app.expect_no_upstream_calls().await;

    let response = app
        .client
        .post(format!("{}/send", app.address))
        .header("content-type", "text/plain")
        .body("abc\nHi\nThere")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn empty_fields_return_400_for_every_encoding() {
    let app = TestApp::spawn().await;
    app.expect_no_upstream_calls().await;

    let cases = [
        ("application/json", r#"{"token":"abc","title":"Hi"}"#),
        ("application/json", r#"{"token":"abc","title":"Hi","body":"   "}"#),
        ("application/x-www-form-urlencoded", "token=&title=Hi&body=There"),
        ("text/plain", "abc\n\t\nThere"),
        ("text/plain", "abc\nHi"),
        ("application/json", ""),
    ];

    for (content_type, raw) in cases {
        let response = app.post_send(content_type, raw).await;
        assert_eq!(
            response.status().as_u16(),
            400,
            "{} body {:?} should be rejected",
            content_type,
            raw
        );

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["error"], "faltan_campos");
        assert!(body["detail"].is_string());
    }
}

// =============================================================================
// Upstream relay
// =============================================================================

#[tokio::test]
async fn upstream_status_and_body_are_relayed_verbatim() {
    for status in [404u16, 500, 503] {
        let app = TestApp::spawn().await;
        app.mock_token_exchange(1).await;

        let upstream_body = format!(
            r#"{{"error":{{"code":{},"message":"Requested entity was not found.","status":"NOT_FOUND"}}}}"#,
            status
        );
        Mock::given(method("POST"))
            .and(path(SEND_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string(upstream_body.clone()))
            .expect(1)
            .mount(&app.upstream)
            .await;

        let response = app.post_send("text/plain", "abc\nHi\nThere").await;

        assert_eq!(response.status().as_u16(), status);
        assert_eq!(response.text().await.unwrap(), upstream_body);
    }
}

#[tokio::test]
async fn non_json_upstream_body_is_still_relayed_as_json() {
    let app = TestApp::spawn().await;
    app.mock_token_exchange(1).await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&app.upstream)
        .await;

    let response = app.post_send("text/plain", "abc\nHi\nThere").await;

    assert_eq!(response.status().as_u16(), 502);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    assert_eq!(response.text().await.unwrap(), "<html>Bad Gateway</html>");
}

// =============================================================================
// Internal failures
// =============================================================================

#[tokio::test]
async fn rejected_token_exchange_returns_500_without_sending() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "error": "invalid_grant", "error_description": "Invalid JWT Signature." })),
        )
        .expect(1)
        .mount(&app.upstream)
        .await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.upstream)
        .await;

    let response = app.post_send("text/plain", "abc\nHi\nThere").await;

    assert_eq!(response.status().as_u16(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("invalid_grant"));
}

#[tokio::test]
async fn token_response_without_access_token_returns_500() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token_type": "Bearer" })))
        .mount(&app.upstream)
        .await;

    let response = app.post_send("text/plain", "abc\nHi\nThere").await;

    assert_eq!(response.status().as_u16(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("access_token"));
}

#[tokio::test]
async fn slow_upstream_times_out_with_500() {
    let app = TestApp::spawn_with(|config| config.http_timeout = Duration::from_secs(1)).await;
    app.mock_token_exchange(1).await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{}")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&app.upstream)
        .await;

    let response = app.post_send("text/plain", "abc\nHi\nThere").await;

    assert_eq!(response.status().as_u16(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
    assert!(body.get("detail").is_none());
}

#[tokio::test]
async fn unreachable_upstream_returns_500_with_transport_error() {
    // Port 9 (discard) has no listener, so the connection is refused.
    let app = TestApp::spawn_with(|config| {
        config.fcm_base_url = "http://127.0.0.1:9".to_string();
    })
    .await;
    app.mock_token_exchange(1).await;

    let response = app.post_send("text/plain", "abc\nHi\nThere").await;

    assert_eq!(response.status().as_u16(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("error sending request"), "{}", error);
    assert!(error.contains("/v1/projects/test-project/messages:send"), "{}", error);
}
