//! Canonical signable representation of a request.
//!
//! ```text
//! yop-auth-v3/{app_id}/{timestamp}/1800
//! METHOD
//! /api/uri
//! canonical query (sorted params, empty when params travel in the body)
//! x-yop-appkey:..\nx-yop-content-sha256:..\nx-yop-request-id:..
//! ```

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::auth::SigningError;
use crate::request::encoding::{canonical_params, percent_encode};
use crate::request::{
    YopRequest, YOP_APPKEY_HEADER, YOP_CONTENT_SHA256_HEADER, YOP_REQUEST_ID_HEADER,
};

/// Signature scheme version.
pub const AUTH_VERSION: &str = "yop-auth-v3";

/// Validity window of a signature, in seconds.
pub const EXPIRED_SECONDS: u64 = 1800;

/// Headers covered by the signature, in canonical (sorted) order.
pub const SIGNED_HEADERS: [&str; 3] = [
    YOP_APPKEY_HEADER,
    YOP_CONTENT_SHA256_HEADER,
    YOP_REQUEST_ID_HEADER,
];

/// `yop-auth-v3/{app_id}/{timestamp}/{expiry}`.
pub fn auth_string(app_id: &str, timestamp: DateTime<Utc>) -> String {
    format!(
        "{}/{}/{}/{}",
        AUTH_VERSION,
        app_id,
        timestamp.format("%Y-%m-%dT%H:%M:%SZ"),
        EXPIRED_SECONDS
    )
}

/// Hex SHA-256 of the raw payload, or of the canonical params when there is none.
pub fn content_sha256(request: &YopRequest) -> String {
    let mut hasher = Sha256::new();
    match request.content.as_deref() {
        Some(content) if !content.is_empty() => hasher.update(content.as_bytes()),
        _ => hasher.update(canonical_params(&request.params).as_bytes()),
    }
    hex::encode(hasher.finalize())
}

/// Canonical query for shapes that route params to the URL, else empty.
pub fn canonical_query(request: &YopRequest) -> String {
    if request.params_in_query() {
        canonical_params(&request.params)
    } else {
        String::new()
    }
}

/// Signed header list and canonical header block.
pub fn canonical_headers(request: &YopRequest) -> Result<(String, String), SigningError> {
    let mut lines = Vec::with_capacity(SIGNED_HEADERS.len());
    for name in SIGNED_HEADERS {
        let value = request
            .header_value(name)
            .ok_or(SigningError::MissingHeader(name))?;
        lines.push(format!("{}:{}", percent_encode(name), percent_encode(value.trim())));
    }
    Ok((SIGNED_HEADERS.join(";"), lines.join("\n")))
}

/// The full string to sign.
pub fn canonical_request(
    request: &YopRequest,
    auth_string: &str,
) -> Result<(String, String), SigningError> {
    let (signed_headers, headers) = canonical_headers(request)?;
    let canonical = format!(
        "{}\n{}\n{}\n{}\n{}",
        auth_string,
        request.method.as_str(),
        request.api_uri,
        canonical_query(request),
        headers
    );
    Ok((signed_headers, canonical))
}

/// Response body as covered by the platform signature: ASCII whitespace removed.
pub fn canonical_response_content(content: &[u8]) -> Vec<u8> {
    content
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect()
}
