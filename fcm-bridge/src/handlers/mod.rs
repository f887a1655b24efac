//! HTTP handlers for fcm-bridge.

pub mod health;
pub mod send;

pub use health::{health_check, metrics, root};
pub use send::{send_notification, API_KEY_HEADER};
