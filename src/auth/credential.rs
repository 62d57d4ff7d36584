//! Merchant credential and platform key parsing.
//!
//! # Security
//! - Private keys are loaded from config or the environment only
//! - Keys are never logged or serialized
//!
//! Accepted encodings: PKCS#8 PEM, PKCS#1 PEM, or bare base64 DER (the form
//! the platform console hands out).

use std::fmt;
use std::path::Path;

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use crate::auth::SigningError;
use crate::config::schema::ClientConfig;
use crate::response::VerificationError;

/// Environment variable holding the merchant private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "YOP_PRIVATE_KEY";

/// Digest suffix appended to encoded signatures.
pub const SIGNATURE_DIGEST_SUFFIX: &str = "SHA256";

/// Application key plus the RSA key it signs with.
#[derive(Clone)]
pub struct AppCredential {
    app_key: String,
    signing_key: SigningKey<Sha256>,
}

impl AppCredential {
    /// Build from an app key and an encoded private key.
    pub fn from_private_key(app_key: impl Into<String>, key: &str) -> Result<Self, SigningError> {
        let private_key = parse_private_key(key)?;
        let app_key = app_key.into();
        tracing::info!(app_key = %app_key, "Merchant credential loaded");
        Ok(Self {
            app_key,
            signing_key: SigningKey::<Sha256>::new(private_key),
        })
    }

    /// Read the private key from `YOP_PRIVATE_KEY`.
    pub fn from_env(app_key: impl Into<String>) -> Result<Self, SigningError> {
        let key = std::env::var(PRIVATE_KEY_ENV_VAR).map_err(|_| {
            SigningError::InvalidKey(format!(
                "Environment variable {} not set",
                PRIVATE_KEY_ENV_VAR
            ))
        })?;
        Self::from_private_key(app_key, &key)
    }

    /// Read the private key from a file.
    pub fn from_file(app_key: impl Into<String>, path: &Path) -> Result<Self, SigningError> {
        let key = std::fs::read_to_string(path).map_err(|e| {
            SigningError::InvalidKey(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_private_key(app_key, &key)
    }

    /// Resolve the key source named by the configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self, SigningError> {
        match (&config.credential.private_key, &config.credential.private_key_path) {
            (Some(key), _) => Self::from_private_key(config.app_key.clone(), key),
            (None, Some(path)) => Self::from_file(config.app_key.clone(), Path::new(path)),
            (None, None) => Self::from_env(config.app_key.clone()),
        }
    }

    /// The application key.
    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    /// Sign `message`, returning `base64url$SHA256`.
    pub fn sign(&self, message: &[u8]) -> Result<String, SigningError> {
        let signature = self
            .signing_key
            .try_sign(message)
            .map_err(|e| SigningError::Failure(e.to_string()))?;
        Ok(encode_signature(&signature.to_bytes()))
    }
}

impl fmt::Debug for AppCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppCredential")
            .field("app_key", &self.app_key)
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

fn decode_base64_der(key: &str) -> Result<Vec<u8>, String> {
    let compact: String = key.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| format!("not PEM and not base64 DER: {}", e))
}

/// Parse a private key in any accepted encoding.
pub fn parse_private_key(key: &str) -> Result<RsaPrivateKey, SigningError> {
    let key = key.trim();
    let parsed = if key.contains("BEGIN RSA PRIVATE KEY") {
        RsaPrivateKey::from_pkcs1_pem(key).map_err(|e| e.to_string())
    } else if key.contains("BEGIN PRIVATE KEY") {
        RsaPrivateKey::from_pkcs8_pem(key).map_err(|e| e.to_string())
    } else {
        decode_base64_der(key).and_then(|der| {
            RsaPrivateKey::from_pkcs8_der(&der)
                .or_else(|_| RsaPrivateKey::from_pkcs1_der(&der))
                .map_err(|e| e.to_string())
        })
    };
    parsed.map_err(SigningError::InvalidKey)
}

/// Parse a platform public key in any accepted encoding.
pub fn parse_public_key(key: &str) -> Result<RsaPublicKey, VerificationError> {
    let key = key.trim();
    let parsed = if key.contains("BEGIN RSA PUBLIC KEY") {
        RsaPublicKey::from_pkcs1_pem(key).map_err(|e| e.to_string())
    } else if key.contains("BEGIN PUBLIC KEY") {
        RsaPublicKey::from_public_key_pem(key).map_err(|e| e.to_string())
    } else {
        decode_base64_der(key).and_then(|der| {
            RsaPublicKey::from_public_key_der(&der)
                .or_else(|_| RsaPublicKey::from_pkcs1_der(&der))
                .map_err(|e| e.to_string())
        })
    };
    parsed.map_err(VerificationError::InvalidTrustAnchor)
}

/// `base64url(signature)$SHA256`.
pub fn encode_signature(signature: &[u8]) -> String {
    format!("{}${}", URL_SAFE_NO_PAD.encode(signature), SIGNATURE_DIGEST_SUFFIX)
}

/// Inverse of [`encode_signature`]; a missing suffix is accepted.
pub fn decode_signature(encoded: &str) -> Result<Vec<u8>, VerificationError> {
    let (body, digest) = match encoded.trim().split_once('$') {
        Some((body, digest)) => (body, Some(digest)),
        None => (encoded.trim(), None),
    };
    if let Some(digest) = digest {
        if digest != SIGNATURE_DIGEST_SUFFIX {
            return Err(VerificationError::InvalidSignature(format!(
                "unsupported digest '{}'",
                digest
            )));
        }
    }
    URL_SAFE_NO_PAD
        .decode(body)
        .map_err(|e| VerificationError::InvalidSignature(format!("malformed signature: {}", e)))
}

/// Verify an encoded signature over `message`.
pub fn verify_signature(
    key: &RsaPublicKey,
    message: &[u8],
    encoded: &str,
) -> Result<(), VerificationError> {
    let raw = decode_signature(encoded)?;
    let signature = Signature::try_from(raw.as_slice())
        .map_err(|e| VerificationError::InvalidSignature(e.to_string()))?;
    VerifyingKey::<Sha256>::new(key.clone())
        .verify(message, &signature)
        .map_err(|_| VerificationError::InvalidSignature("signature does not match".to_string()))
}
