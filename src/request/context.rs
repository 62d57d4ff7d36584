//! Request context assembly.
//!
//! # Responsibilities
//! - Generate a fresh request id for every call
//! - Resolve the default endpoint, identity and trust anchor when unset
//! - Add the standard headers before signing
//!
//! # Design Decisions
//! - Pre-set fields win over defaults, except the request id which is always fresh
//! - The request id header always mirrors the signed request id
//! - User agent is observability data only and never affects trust

use uuid::Uuid;

use crate::config::schema::{ClientConfig, DEFAULT_SERVER_ROOT, DEFAULT_YOS_SERVER_ROOT};
use crate::request::types::{CertType, TrustAnchor, YopRequest};
use crate::request::{USER_AGENT_HEADER, YOP_APPKEY_HEADER, YOP_REQUEST_ID_HEADER};

/// Built-in platform public key (RSA 2048, base64 SPKI DER).
pub const YOP_PLATFORM_PUBLIC_KEY: &str = "MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEAx/cfZQtpDACVJFzmswCe04zGpMFoEaTlsqliIFDN9RQ01XxSm6vFWE+rPbzfkmG4tjPmA9gNSdu5yiwx+A6e45vuqJ8xLR7M55vHjI1vWfziaLqQ8ccOSY1GKuK/8bhICgnVdlvuC5Nc3U5j/NKuS/ivzbjYzAZTaNuNZ6yWMCmQ/IhFprDEz4FZcoNpYPEkMcKzs3s1zwHEqisNW3/FqNYdb28DVl+vTgS9En/9fOnTBpx+JmH/wRmpLm0gn5G3byJDig5siTDoglU6VXaWb5hM8Ku6nxTlXZGu4VaL2I4ZCsxLGC12uigMhKJbEqXnU29vv+Aw0SR+8/zeBXiycwIDAQAB";

/// Client name reported in the user agent.
pub const CLIENT_NAME: &str = "rust";

/// Crate version reported in the user agent.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// `rust-version` declared by the crate, reported in place of the
/// compiler version.
pub const MIN_RUST_VERSION: &str = match option_env!("CARGO_PKG_RUST_VERSION") {
    Some(version) => version,
    None => "unknown",
};

/// Which endpoint family a call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Regular open API call.
    Standard,
    /// File upload, served by the YOS endpoint.
    Upload,
}

/// Defaults applied to unset request fields.
#[derive(Debug, Clone)]
pub struct AssemblyDefaults {
    pub server_root: String,
    pub yos_server_root: String,
    pub app_key: String,
    pub platform_key: TrustAnchor,
}

impl Default for AssemblyDefaults {
    fn default() -> Self {
        Self {
            server_root: DEFAULT_SERVER_ROOT.to_string(),
            yos_server_root: DEFAULT_YOS_SERVER_ROOT.to_string(),
            app_key: String::new(),
            platform_key: default_trust_anchor(),
        }
    }
}

impl AssemblyDefaults {
    /// Defaults taken from a client configuration.
    pub fn from_config(config: &ClientConfig) -> Self {
        let platform_key = match &config.platform.public_key {
            Some(key) => TrustAnchor::new(key.clone(), config.platform.cert_type),
            None => default_trust_anchor(),
        };
        Self {
            server_root: config.endpoints.server_root.clone(),
            yos_server_root: config.endpoints.yos_server_root.clone(),
            app_key: config.app_key.clone(),
            platform_key,
        }
    }
}

/// The compiled-in platform trust anchor.
pub fn default_trust_anchor() -> TrustAnchor {
    TrustAnchor::new(YOP_PLATFORM_PUBLIC_KEY, CertType::Rsa2048)
}

/// `rust/<sdk version>/<os>/<minimum rust version>`.
pub fn user_agent() -> String {
    format!(
        "{}/{}/{}/{}",
        CLIENT_NAME,
        SDK_VERSION,
        std::env::consts::OS,
        MIN_RUST_VERSION
    )
}

/// Fill unset fields of `request` and add the standard headers.
pub fn assemble(request: &mut YopRequest, defaults: &AssemblyDefaults, kind: RequestKind) {
    request.request_id = Uuid::new_v4().to_string();
    tracing::debug!(request_id = %request.request_id, api_uri = %request.api_uri, "Assembling request");

    if request.server_root.is_empty() {
        request.server_root = match kind {
            RequestKind::Standard => defaults.server_root.clone(),
            RequestKind::Upload => defaults.yos_server_root.clone(),
        };
    }

    if request.app_id.is_empty() {
        request.app_id = defaults.app_key.clone();
    }

    let anchor_unset = request
        .platform_key
        .as_ref()
        .map_or(true, |anchor| anchor.value.is_empty());
    if anchor_unset {
        request.platform_key = Some(defaults.platform_key.clone());
    }

    add_standard_headers(request);
}

fn add_standard_headers(request: &mut YopRequest) {
    let request_id = request.request_id.clone();
    let app_id = request.app_id.clone();
    request.set_header(YOP_REQUEST_ID_HEADER, request_id);
    request.set_header(YOP_APPKEY_HEADER, app_id);
    if request.header_value(USER_AGENT_HEADER).is_none() {
        request.set_header(USER_AGENT_HEADER, user_agent());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn defaults() -> AssemblyDefaults {
        AssemblyDefaults {
            app_key: "app_100800".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_fills_defaults() {
        let mut req = YopRequest::get("/rest/v1.0/query");
        assemble(&mut req, &defaults(), RequestKind::Standard);

        assert_eq!(req.server_root, DEFAULT_SERVER_ROOT);
        assert_eq!(req.app_id, "app_100800");
        assert_eq!(req.platform_key, Some(default_trust_anchor()));
        assert_eq!(req.header_value(YOP_REQUEST_ID_HEADER), Some(req.request_id.as_str()));
        assert_eq!(req.header_value(YOP_APPKEY_HEADER), Some("app_100800"));
        assert!(req.header_value(USER_AGENT_HEADER).unwrap().starts_with("rust/0.1.0/"));
    }

    #[test]
    fn test_upload_uses_yos_endpoint() {
        let mut req = YopRequest::post("/rest/v1.0/file/upload");
        assemble(&mut req, &defaults(), RequestKind::Upload);
        assert_eq!(req.server_root, DEFAULT_YOS_SERVER_ROOT);
    }

    #[test]
    fn test_assembly_twice_keeps_overrides_and_renews_id() {
        let anchor = TrustAnchor::new("MIIBpinned", CertType::Rsa2048);
        let mut req = YopRequest::get("/rest/v1.0/query")
            .server_root("http://127.0.0.1:9000/yop-center")
            .platform_key(anchor.clone());

        assemble(&mut req, &defaults(), RequestKind::Standard);
        let first_id = req.request_id.clone();
        assemble(&mut req, &defaults(), RequestKind::Standard);

        assert_eq!(req.server_root, "http://127.0.0.1:9000/yop-center");
        assert_eq!(req.platform_key, Some(anchor));
        assert_ne!(req.request_id, first_id);
        assert_eq!(req.header_value(YOP_REQUEST_ID_HEADER), Some(req.request_id.as_str()));
    }

    #[test]
    fn test_request_ids_unique() {
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let mut req = YopRequest::get("/x");
            assemble(&mut req, &defaults(), RequestKind::Standard);
            assert!(seen.insert(req.request_id));
        }
    }

    #[test]
    fn test_user_agent_ends_with_msrv() {
        let agent = user_agent();
        assert_eq!(MIN_RUST_VERSION, "1.75");
        assert_eq!(
            agent,
            format!("rust/{}/{}/1.75", SDK_VERSION, std::env::consts::OS)
        );
    }

    #[test]
    fn test_caller_user_agent_kept() {
        let mut req = YopRequest::get("/x").header("User-Agent", "merchant-batch/2.1");
        assemble(&mut req, &defaults(), RequestKind::Standard);
        assert_eq!(req.header_value(USER_AGENT_HEADER), Some("merchant-batch/2.1"));
    }

    #[test]
    fn test_defaults_from_config() {
        let mut config = ClientConfig::default();
        config.app_key = "app_1".into();
        config.platform.public_key = Some("MIIBcustom".into());

        let defaults = AssemblyDefaults::from_config(&config);
        assert_eq!(defaults.app_key, "app_1");
        assert_eq!(defaults.platform_key.value, "MIIBcustom");
    }
}
