use crate::models::NotificationRequest;
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use serde::Serialize;
use std::collections::BTreeMap;

/// Body of an FCM HTTP v1 `messages:send` call.
#[derive(Debug, Serialize)]
pub struct FcmRequest {
    pub message: FcmMessage,
}

#[derive(Debug, Serialize)]
pub struct FcmMessage {
    pub token: String,
    pub notification: FcmNotification,
    /// Always sent, always empty.
    pub data: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct FcmNotification {
    pub title: String,
    pub body: String,
}

impl From<NotificationRequest> for FcmRequest {
    fn from(request: NotificationRequest) -> Self {
        Self {
            message: FcmMessage {
                token: request.token,
                notification: FcmNotification {
                    title: request.title,
                    body: request.body,
                },
                data: BTreeMap::new(),
            },
        }
    }
}

/// Raw upstream reply, relayed to the caller untouched.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: String,
}

#[derive(Clone)]
pub struct FcmClient {
    client: Client,
    send_url: String,
}

impl FcmClient {
    pub fn new(client: Client, base_url: &str, project_id: &str) -> Self {
        Self {
            client,
            send_url: format!(
                "{}/v1/projects/{}/messages:send",
                base_url.trim_end_matches('/'),
                project_id
            ),
        }
    }

    pub fn send_url(&self) -> &str {
        &self.send_url
    }

    /// POST the message. Any HTTP response, success or not, is returned as-is;
    /// only transport and serialization failures are errors.
    #[tracing::instrument(skip(self, access_token, request))]
    pub async fn send(
        &self,
        access_token: &str,
        request: &FcmRequest,
    ) -> Result<UpstreamResponse, anyhow::Error> {
        let payload = serde_json::to_vec(request)?;

        let response = self
            .client
            .post(&self.send_url)
            .bearer_auth(access_token)
            .header(CONTENT_TYPE, "application/json; charset=UTF-8")
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            tracing::info!(status = status.as_u16(), "FCM accepted message");
        } else {
            tracing::debug!(status = status.as_u16(), "FCM rejected message");
        }

        Ok(UpstreamResponse { status, body })
    }
}
