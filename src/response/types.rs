//! Response types and verification errors.

use std::fmt;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::response::{YOP_RESPONSE_REQUEST_ID_HEADER, YOP_SIGN_HEADER};

/// What came off the wire. Never modified after receipt.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    /// Header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Signature and correlation data captured from response headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// `X-Yop-Sign`.
    pub yop_sign: Option<String>,
    /// `X-Yop-Request-Id`.
    pub yop_request_id: Option<String>,
}

/// A response that has passed the analyzer chain.
#[derive(Debug, Clone)]
pub struct YopResponse {
    /// HTTP status.
    pub status: u16,
    /// Body bytes as received.
    pub content: Bytes,
    /// Header metadata.
    pub metadata: ResponseMetadata,
    /// Parsed business result, filled by the JSON analyzer.
    pub result: Option<serde_json::Value>,
}

impl YopResponse {
    /// Draft handed to the chain; only returned once every analyzer accepted it.
    pub(crate) fn draft(raw: &RawResponse) -> Self {
        Self {
            status: raw.status.as_u16(),
            content: raw.body.clone(),
            metadata: ResponseMetadata {
                yop_sign: raw.header(YOP_SIGN_HEADER).map(str::to_string),
                yop_request_id: raw.header(YOP_RESPONSE_REQUEST_ID_HEADER).map(str::to_string),
            },
            result: None,
        }
    }

    /// Body as UTF-8 text (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }

    /// Deserialize the business result.
    pub fn result_as<T: serde::de::DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
        self.result
            .as_ref()
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
    }
}

/// Error body returned by the platform on non-success statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformError {
    /// HTTP status the error arrived with.
    #[serde(skip)]
    pub status: u16,
    pub request_id: Option<String>,
    pub code: String,
    pub message: String,
    pub sub_code: Option<String>,
    pub sub_message: Option<String>,
    pub doc_url: Option<String>,
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.status, self.code, self.message)?;
        if let Some(sub_code) = &self.sub_code {
            write!(f, " ({}", sub_code)?;
            if let Some(sub_message) = &self.sub_message {
                write!(f, ": {}", sub_message)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// Reasons an analyzer rejects a response.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// The platform answered with an error.
    #[error("Platform error {0}")]
    Platform(PlatformError),

    /// The echoed request id is not the one that was sent.
    #[error("Request id mismatch: sent {expected}, received {actual}")]
    RequestIdMismatch { expected: String, actual: String },

    /// No `X-Yop-Sign` header.
    #[error("Response carries no signature")]
    MissingSignature,

    /// The signature is malformed or does not match the content.
    #[error("Invalid response signature: {0}")]
    InvalidSignature(String),

    /// The signer was asked to verify a response to a request it did not sign.
    #[error("Request was not signed by this signer")]
    UnsignedRequest,

    /// The platform key could not be parsed.
    #[error("Invalid platform key: {0}")]
    InvalidTrustAnchor(String),

    /// The body is not the JSON document the platform promises.
    #[error("Malformed response body: {0}")]
    MalformedBody(String),
}
