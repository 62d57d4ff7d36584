//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::request::CertType;

/// Default open API endpoint.
pub const DEFAULT_SERVER_ROOT: &str = "https://openapi.yeepay.com/yop-center";

/// Default file (YOS) endpoint used by upload calls.
pub const DEFAULT_YOS_SERVER_ROOT: &str = "https://yos.yeepay.com/yop-center";

/// Root configuration for the client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Application key issued by the platform. Used as request identity.
    pub app_key: String,

    /// Merchant private key source.
    pub credential: CredentialConfig,

    /// Platform endpoints.
    pub endpoints: EndpointConfig,

    /// Platform trust anchor override.
    pub platform: PlatformConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Where the merchant private key is read from.
///
/// At most one of the two may be set. When neither is set the key is read
/// from the `YOP_PRIVATE_KEY` environment variable.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CredentialConfig {
    /// Inline key (PEM, or base64 PKCS#8 DER).
    pub private_key: Option<String>,

    /// Path to a key file.
    pub private_key_path: Option<String>,
}

/// Endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Base URL for standard calls.
    pub server_root: String,

    /// Base URL for file upload calls.
    pub yos_server_root: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            server_root: DEFAULT_SERVER_ROOT.to_string(),
            yos_server_root: DEFAULT_YOS_SERVER_ROOT.to_string(),
        }
    }
}

/// Platform public key used to verify response signatures.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Public key (PEM or base64 SPKI DER). `None` uses the built-in key.
    pub public_key: Option<String>,

    /// Key type tag.
    pub cert_type: CertType,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            public_key: None,
            cert_type: CertType::Rsa2048,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// End-to-end deadline for one call (download + upload + response read) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 10 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, for development.
    #[default]
    Pretty,
    /// One JSON object per event, for production.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Record call metrics through the `metrics` facade.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
        }
    }
}
