use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

/// Used when `API_KEY_SIMPLE` is unset or empty.
pub const DEFAULT_API_KEY: &str = "cris123";
pub const DEFAULT_FCM_BASE_URL: &str = "https://fcm.googleapis.com";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Immutable bridge configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub common: core_config::Config,
    pub service_account: ServiceAccountKey,
    pub project_id: String,
    pub api_key: Secret<String>,
    /// Origin of the FCM HTTP v1 API, without trailing path.
    pub fcm_base_url: String,
    /// Applied to both the token exchange and the upstream send.
    pub http_timeout: Duration,
}

/// The subset of a Google service-account key file the bridge needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(default)]
    pub client_email: String,
    #[serde(default = "empty_secret")]
    pub private_key: Secret<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn empty_secret() -> Secret<String> {
    Secret::new(String::new())
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl BridgeConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_lookup(common, |key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_service_account = get_env(&lookup, "GOOGLE_SERVICE_ACCOUNT_JSON", "{}");
        let service_account: ServiceAccountKey = serde_json::from_str(&raw_service_account)
            .map_err(|e| {
                config_error(format!(
                    "GOOGLE_SERVICE_ACCOUNT_JSON is not valid JSON: {}",
                    e
                ))
            })?;

        let project_id = get_env(&lookup, "PROJECT_ID", "").trim().to_string();

        if service_account.client_email.trim().is_empty()
            || service_account.private_key.expose_secret().trim().is_empty()
            || project_id.is_empty()
        {
            return Err(config_error(
                "Missing configuration: GOOGLE_SERVICE_ACCOUNT_JSON (client_email, private_key) or PROJECT_ID"
                    .to_string(),
            ));
        }

        let http_timeout_secs = get_env(
            &lookup,
            "HTTP_TIMEOUT_SECS",
            &DEFAULT_HTTP_TIMEOUT_SECS.to_string(),
        )
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .ok_or_else(|| config_error("HTTP_TIMEOUT_SECS must be a positive integer".to_string()))?;

        Ok(BridgeConfig {
            common,
            service_account,
            project_id,
            api_key: Secret::new(get_env(&lookup, "API_KEY_SIMPLE", DEFAULT_API_KEY)),
            fcm_base_url: get_env(&lookup, "FCM_BASE_URL", DEFAULT_FCM_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }
}

/// Empty values count as unset.
fn get_env<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn config_error(message: String) -> AppError {
    AppError::ConfigError(anyhow::anyhow!(message))
}
