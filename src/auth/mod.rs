//! Request signing and response signature verification.
//!
//! # Data Flow
//! ```text
//! assembled YopRequest
//!     → canonical.rs (content digest, auth string, canonical request)
//!     → credential.rs (RSA private key signs the canonical request)
//!     → authorization header added, SignatureMaterial kept on the signer
//!
//! received YopResponse
//!     → signer.verify_response (X-Yop-Sign checked against the trust anchor)
//! ```
//!
//! # Design Decisions
//! - One signer value per call; it carries the material into the response chain
//! - Signing failures abort the call before any network I/O
//! - Verification fails closed: no signature means rejection

pub mod canonical;
pub mod credential;
pub mod rsa_signer;

use thiserror::Error;

use crate::request::YopRequest;
use crate::response::{VerificationError, YopResponse};

pub use credential::AppCredential;
pub use rsa_signer::RsaSigner;

/// Header carrying the request signature.
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Errors raised while signing a request.
#[derive(Debug, Error)]
pub enum SigningError {
    /// The private credential could not be parsed.
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    /// The request carries no application identity.
    #[error("Missing app id, request cannot be signed")]
    MissingAppId,

    /// A header required by the signature is absent.
    #[error("Missing signed header '{0}'")]
    MissingHeader(&'static str),

    /// The signing operation itself failed.
    #[error("Signing failed: {0}")]
    Failure(String),
}

/// What a signer computed for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureMaterial {
    /// `yop-auth-v3/{app}/{timestamp}/{expiry}`.
    pub auth_string: String,
    /// `;`-joined signed header names.
    pub signed_headers: String,
    /// The exact string that was signed.
    pub canonical_request: String,
    /// Encoded signature (`base64url$SHA256`).
    pub signature: String,
}

/// The sign/verify capability.
pub trait YopSigner: Send + Sync {
    /// Sign `request` in place, adding the signature headers.
    fn sign_request(&mut self, request: &mut YopRequest) -> Result<(), SigningError>;

    /// Material produced by the last successful [`sign_request`](Self::sign_request).
    fn material(&self) -> Option<&SignatureMaterial>;

    /// Check the platform signature on `response` to the signed `request`.
    fn verify_response(
        &self,
        request: &YopRequest,
        response: &YopResponse,
    ) -> Result<(), VerificationError>;
}
