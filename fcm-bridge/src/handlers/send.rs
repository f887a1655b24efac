use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap},
    response::{IntoResponse, Response},
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::utils::secrets_match;

use crate::models::{BodyEncoding, NotificationRequest};
use crate::services::{record_send, record_upstream_status, FcmRequest, SendOutcome};
use crate::startup::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// `POST /send`: authenticate, normalize, exchange credentials, forward, relay.
#[tracing::instrument(skip_all)]
pub async fn send_notification(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let result = forward(&state, &headers, &body).await;

    record_send(match &result {
        Ok(_) => SendOutcome::Relayed,
        Err(AppError::Unauthorized) => SendOutcome::Unauthorized,
        Err(AppError::MissingFields(_)) => SendOutcome::MissingFields,
        Err(AppError::InvalidBody(_)) => SendOutcome::InvalidBody,
        Err(_) => SendOutcome::Failed,
    });

    result
}

async fn forward(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<Response, AppError> {
    authorize(headers, state.config.api_key.expose_secret())?;

    let encoding = BodyEncoding::from_headers(headers);
    let request = NotificationRequest::decode(encoding, body)?;
    request.ensure_complete()?;

    tracing::debug!(?encoding, "Notification request accepted");

    let access_token = state
        .token_provider
        .access_token()
        .await
        .map_err(anyhow::Error::new)?;

    let upstream = state
        .fcm
        .send(&access_token.value, &FcmRequest::from(request))
        .await?;

    record_upstream_status(upstream.status.as_u16());

    Ok((
        upstream.status,
        [(CONTENT_TYPE, "application/json; charset=utf-8")],
        upstream.body,
    )
        .into_response())
}

/// A missing or non-ASCII header is treated as an empty key.
fn authorize(headers: &HeaderMap, expected: &str) -> Result<(), AppError> {
    let provided = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if secrets_match(provided, expected) {
        Ok(())
    } else {
        tracing::debug!("Rejected request with invalid API key");
        Err(AppError::Unauthorized)
    }
}
