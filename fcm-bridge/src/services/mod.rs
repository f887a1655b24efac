pub mod credentials;
pub mod fcm;
pub mod metrics;

pub use credentials::{
    AccessToken, CredentialError, MockTokenProvider, ServiceAccountTokenProvider, TokenProvider,
};
pub use fcm::{FcmClient, FcmRequest, UpstreamResponse};
pub use metrics::{get_metrics, init_metrics, record_send, record_upstream_status, SendOutcome};
