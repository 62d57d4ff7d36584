//! Response verification subsystem.
//!
//! # Data Flow
//! ```text
//! RawResponse (status, headers, body)
//!     → YopResponse draft (content + X-Yop-Sign + X-Yop-Request-Id)
//!     → analyzer chain, in registered order:
//!         error  → request id → signature → json result
//!     → first rejection ends the call; the draft is dropped
//!     → verified YopResponse to the caller
//! ```
//!
//! # Design Decisions
//! - Chain order is fixed at client construction and never changes per call
//! - Protocol errors are classified before signatures are checked
//! - Fail closed: unsigned or mis-signed responses are rejected

pub mod analyzer;
pub mod analyzers;
pub mod types;

pub use analyzer::{AnalyzeContext, AnalyzerChain, ResponseAnalyzer};
pub use analyzers::{
    ErrorResponseAnalyzer, JsonResultAnalyzer, RequestIdAnalyzer, SignatureAnalyzer,
};
pub use types::{PlatformError, RawResponse, ResponseMetadata, VerificationError, YopResponse};

/// Response header carrying the platform signature.
pub const YOP_SIGN_HEADER: &str = "x-yop-sign";

/// Response header echoing the request id.
pub const YOP_RESPONSE_REQUEST_ID_HEADER: &str = "x-yop-request-id";
