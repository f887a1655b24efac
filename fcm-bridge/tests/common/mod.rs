#![allow(dead_code)]

use fcm_bridge::config::{BridgeConfig, ServiceAccountKey};
use fcm_bridge::startup::Application;
use secrecy::Secret;
use service_core::config::Config as CoreConfig;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API_KEY: &str = "test-key";
pub const PROJECT_ID: &str = "test-project";
pub const ACCESS_TOKEN: &str = "ya29.test-access-token";
pub const SEND_PATH: &str = "/v1/projects/test-project/messages:send";
pub const TOKEN_PATH: &str = "/token";

const PRIVATE_KEY: &str = include_str!("../fixtures/service_account_key.pem");

pub struct TestApp {
    pub address: String,
    pub port: u16,
    /// Stands in for both the OAuth2 token endpoint and the FCM API.
    pub upstream: MockServer,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Like [`TestApp::spawn`], with a hook to adjust the configuration before startup.
    pub async fn spawn_with(configure: impl FnOnce(&mut BridgeConfig)) -> Self {
        let upstream = MockServer::start().await;

        let mut config = BridgeConfig {
            common: CoreConfig {
                port: 0,
                ..CoreConfig::default()
            },
            service_account: ServiceAccountKey {
                client_email: "bridge@test-project.iam.gserviceaccount.com".to_string(),
                private_key: Secret::new(PRIVATE_KEY.to_string()),
                private_key_id: Some("test-key-id".to_string()),
                project_id: Some(PROJECT_ID.to_string()),
                token_uri: format!("{}{}", upstream.uri(), TOKEN_PATH),
            },
            project_id: PROJECT_ID.to_string(),
            api_key: Secret::new(API_KEY.to_string()),
            fcm_base_url: upstream.uri(),
            http_timeout: Duration::from_secs(5),
        };
        configure(&mut config);

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            upstream,
            client,
        }
    }

    /// Token endpoint answers with [`ACCESS_TOKEN`], expected `times` times.
    pub async fn mock_token_exchange(&self, times: u64) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_string_contains(
                "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
            ))
            .and(body_string_contains("assertion="))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": ACCESS_TOKEN,
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(times)
            .mount(&self.upstream)
            .await;
    }

    /// Neither upstream endpoint may be called.
    pub async fn expect_no_upstream_calls(&self) {
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&self.upstream)
            .await;
    }

    pub async fn post_send(&self, content_type: &str, body: impl Into<reqwest::Body>) -> reqwest::Response {
        self.client
            .post(format!("{}/send", self.address))
            .header("x-api-key", API_KEY)
            .header("content-type", content_type)
            .body(body)
            .send()
            .await
            .expect("Failed to execute request")
    }
}
