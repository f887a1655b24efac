//! Service-account credential exchange.
//!
//! Implements the OAuth2 JWT bearer grant: a short-lived RS256 assertion signed
//! with the service account's private key is traded at the token endpoint for an
//! access token scoped to FCM.

use crate::config::ServiceAccountKey;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

pub const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Invalid service account private key: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),

    #[error("Failed to sign token assertion: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("Token request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Token endpoint returned {status}: {body}")]
    Rejected { status: StatusCode, body: String },

    #[error("Invalid token response: {0}")]
    InvalidResponse(String),
}

/// Bearer token for one outbound call.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub value: String,
    pub expires_in: Option<i64>,
}

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<AccessToken, CredentialError>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

/// Service-account keys often arrive with escaped newlines from env files.
pub fn normalize_private_key(key: &str) -> String {
    key.replace("\\n", "\n")
}

/// Exchanges the configured service account for a fresh token on every call.
pub struct ServiceAccountTokenProvider {
    client_email: String,
    private_key_id: Option<String>,
    token_uri: String,
    encoding_key: EncodingKey,
    client: Client,
}

impl ServiceAccountTokenProvider {
    /// Fails when the private key is not an RSA PEM (PKCS#1 or PKCS#8).
    pub fn new(key: &ServiceAccountKey, client: Client) -> Result<Self, CredentialError> {
        let pem = normalize_private_key(key.private_key.expose_secret());
        let encoding_key =
            EncodingKey::from_rsa_pem(pem.as_bytes()).map_err(CredentialError::InvalidKey)?;

        Ok(Self {
            client_email: key.client_email.clone(),
            private_key_id: key.private_key_id.clone(),
            token_uri: key.token_uri.clone(),
            encoding_key,
            client,
        })
    }

    pub fn claims(&self) -> AssertionClaims {
        let now = Utc::now();

        AssertionClaims {
            iss: self.client_email.clone(),
            scope: FCM_SCOPE.to_string(),
            aud: self.token_uri.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ASSERTION_LIFETIME_SECS)).timestamp(),
        }
    }

    pub fn sign_assertion(&self) -> Result<String, CredentialError> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();

        encode(&header, &self.claims(), &self.encoding_key).map_err(CredentialError::Signing)
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountTokenProvider {
    #[tracing::instrument(skip(self))]
    async fn access_token(&self) -> Result<AccessToken, CredentialError> {
        let assertion = self.sign_assertion()?;

        let response = self
            .client
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CredentialError::Rejected { status, body });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CredentialError::InvalidResponse(e.to_string()))?;

        let value = token
            .access_token
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                CredentialError::InvalidResponse("missing access_token".to_string())
            })?;

        tracing::debug!(expires_in = ?token.expires_in, "Obtained FCM access token");

        Ok(AccessToken {
            value,
            expires_in: token.expires_in,
        })
    }
}

/// Token provider for tests: hands out a fixed token and counts calls.
pub struct MockTokenProvider {
    token: Option<String>,
    call_count: AtomicU64,
}

impl MockTokenProvider {
    pub fn new(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
            call_count: AtomicU64::new(0),
        }
    }

    /// A provider whose every exchange is rejected.
    pub fn failing() -> Self {
        Self {
            token: None,
            call_count: AtomicU64::new(0),
        }
    }

    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenProvider for MockTokenProvider {
    async fn access_token(&self) -> Result<AccessToken, CredentialError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        match &self.token {
            Some(value) => Ok(AccessToken {
                value: value.clone(),
                expires_in: Some(3600),
            }),
            None => Err(CredentialError::Rejected {
                status: StatusCode::BAD_REQUEST,
                body: r#"{"error":"invalid_grant"}"#.to_string(),
            }),
        }
    }
}
