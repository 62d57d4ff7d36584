//! Built-in analyzers, in the order the default chain runs them.

use crate::response::analyzer::{AnalyzeContext, ResponseAnalyzer};
use crate::response::types::{PlatformError, RawResponse, VerificationError};

/// Longest body excerpt carried in an unparsable error.
const MAX_ERROR_EXCERPT: usize = 512;

/// Turns non-success statuses into [`VerificationError::Platform`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorResponseAnalyzer;

impl ResponseAnalyzer for ErrorResponseAnalyzer {
    fn name(&self) -> &'static str {
        "error"
    }

    fn analyze(
        &self,
        ctx: &mut AnalyzeContext<'_>,
        raw: &RawResponse,
    ) -> Result<(), VerificationError> {
        if raw.status.is_success() {
            return Ok(());
        }

        let status = raw.status.as_u16();
        let error = match serde_json::from_slice::<PlatformError>(&raw.body) {
            Ok(mut parsed) => {
                parsed.status = status;
                parsed
            }
            Err(_) => {
                let text = String::from_utf8_lossy(&raw.body);
                let excerpt: String = text.chars().take(MAX_ERROR_EXCERPT).collect();
                PlatformError {
                    status,
                    request_id: ctx.response.metadata.yop_request_id.clone(),
                    code: status.to_string(),
                    message: if excerpt.is_empty() {
                        raw.status.canonical_reason().unwrap_or("Unknown").to_string()
                    } else {
                        excerpt
                    },
                    sub_code: None,
                    sub_message: None,
                    doc_url: None,
                }
            }
        };
        Err(VerificationError::Platform(error))
    }
}

/// Checks the echoed `X-Yop-Request-Id`, when present, against the sent id.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdAnalyzer;

impl ResponseAnalyzer for RequestIdAnalyzer {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn analyze(
        &self,
        ctx: &mut AnalyzeContext<'_>,
        _raw: &RawResponse,
    ) -> Result<(), VerificationError> {
        match ctx.response.metadata.yop_request_id.as_deref() {
            Some(actual) if !actual.is_empty() && actual != ctx.request.request_id => {
                Err(VerificationError::RequestIdMismatch {
                    expected: ctx.request.request_id.clone(),
                    actual: actual.to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Verifies the platform signature through the call's signer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureAnalyzer;

impl ResponseAnalyzer for SignatureAnalyzer {
    fn name(&self) -> &'static str {
        "signature"
    }

    fn analyze(
        &self,
        ctx: &mut AnalyzeContext<'_>,
        _raw: &RawResponse,
    ) -> Result<(), VerificationError> {
        ctx.signer.verify_response(ctx.request, ctx.response)
    }
}

/// Parses the verified JSON body into [`YopResponse::result`](crate::YopResponse).
///
/// Uses the `result` member when the document has one, else the whole document.
/// Bodies declared as non-JSON are left unparsed.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonResultAnalyzer;

impl ResponseAnalyzer for JsonResultAnalyzer {
    fn name(&self) -> &'static str {
        "json_result"
    }

    fn analyze(
        &self,
        ctx: &mut AnalyzeContext<'_>,
        raw: &RawResponse,
    ) -> Result<(), VerificationError> {
        if ctx.response.content.is_empty() {
            return Ok(());
        }
        if let Some(content_type) = raw.header(reqwest::header::CONTENT_TYPE.as_str()) {
            if !content_type.contains("json") {
                return Ok(());
            }
        }

        let mut document: serde_json::Value = serde_json::from_slice(&ctx.response.content)
            .map_err(|e| VerificationError::MalformedBody(e.to_string()))?;
        let result = match document.get_mut("result") {
            Some(result) => result.take(),
            None => document,
        };
        ctx.response.result = Some(result);
        Ok(())
    }
}
