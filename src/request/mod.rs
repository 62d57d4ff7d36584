//! Logical request model and pre-signing assembly.
//!
//! # Data Flow
//! ```text
//! caller builds YopRequest
//!     → context.rs (request id, endpoint, trust anchor, standard headers)
//!     → auth (signature headers added)
//!     → transport::builder (wire shape chosen, params encoded via encoding.rs)
//! ```
//!
//! # Design Decisions
//! - The request is owned by exactly one call and mutated in place
//! - Parameters keep every value of a multi-valued key, in caller order
//! - Keys are held sorted so every encoding is deterministic

pub mod context;
pub mod encoding;
pub mod types;

pub use context::{assemble, AssemblyDefaults, RequestKind};
pub use types::{CertType, FileContent, FilePart, Params, TrustAnchor, YopRequest};

/// Header carrying the per-call request id.
pub const YOP_REQUEST_ID_HEADER: &str = "x-yop-request-id";

/// Header carrying the application identity.
pub const YOP_APPKEY_HEADER: &str = "x-yop-appkey";

/// Header carrying the content digest covered by the signature.
pub const YOP_CONTENT_SHA256_HEADER: &str = "x-yop-content-sha256";

/// Standard user agent header.
pub const USER_AGENT_HEADER: &str = "user-agent";

/// Content type for raw structured payloads.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Content type for form encoded bodies and the default.
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";
