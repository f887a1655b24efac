//! fcm-bridge: forwards simple notification requests to Firebase Cloud Messaging.
pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

/// Name reported by the health endpoints and used for telemetry.
pub const SERVICE_NAME: &str = "fcm-bridge-v1";
