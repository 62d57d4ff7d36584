//! RSA implementation of the `yop-auth-v3` scheme.

use std::sync::Arc;

use chrono::Utc;

use crate::auth::canonical::{self, canonical_response_content};
use crate::auth::credential::{parse_public_key, verify_signature, AppCredential};
use crate::auth::{SignatureMaterial, SigningError, YopSigner, AUTHORIZATION_HEADER};
use crate::request::{CertType, YopRequest, YOP_CONTENT_SHA256_HEADER};
use crate::response::{VerificationError, YopResponse};

/// Per-call RSA signer.
///
/// Cheap to create: the parsed credential is shared.
#[derive(Debug, Clone)]
pub struct RsaSigner {
    credential: Arc<AppCredential>,
    material: Option<SignatureMaterial>,
}

impl RsaSigner {
    /// New signer over a shared credential.
    pub fn new(credential: Arc<AppCredential>) -> Self {
        Self {
            credential,
            material: None,
        }
    }

    fn protocol_prefix(cert_type: CertType) -> String {
        format!("YOP-{}-SHA256", cert_type.as_str())
    }
}

impl YopSigner for RsaSigner {
    fn sign_request(&mut self, request: &mut YopRequest) -> Result<(), SigningError> {
        if request.app_id.is_empty() {
            return Err(SigningError::MissingAppId);
        }

        let digest = canonical::content_sha256(request);
        request.set_header(YOP_CONTENT_SHA256_HEADER, digest);

        let auth_string = canonical::auth_string(&request.app_id, Utc::now());
        let (signed_headers, canonical_request) =
            canonical::canonical_request(request, &auth_string)?;
        let signature = self.credential.sign(canonical_request.as_bytes())?;

        let cert_type = request
            .platform_key
            .as_ref()
            .map(|anchor| anchor.cert_type)
            .unwrap_or_default();
        request.set_header(
            AUTHORIZATION_HEADER,
            format!(
                "{} {}/{}/{}",
                Self::protocol_prefix(cert_type),
                auth_string,
                signed_headers,
                signature
            ),
        );

        tracing::debug!(
            request_id = %request.request_id,
            auth_string = %auth_string,
            "Request signed"
        );

        self.material = Some(SignatureMaterial {
            auth_string,
            signed_headers,
            canonical_request,
            signature,
        });
        Ok(())
    }

    fn material(&self) -> Option<&SignatureMaterial> {
        self.material.as_ref()
    }

    fn verify_response(
        &self,
        request: &YopRequest,
        response: &YopResponse,
    ) -> Result<(), VerificationError> {
        let material = self
            .material
            .as_ref()
            .ok_or(VerificationError::UnsignedRequest)?;

        let sign = response
            .metadata
            .yop_sign
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(VerificationError::MissingSignature)?;

        let anchor = request.platform_key.as_ref().ok_or_else(|| {
            VerificationError::InvalidTrustAnchor("no platform key on request".to_string())
        })?;
        let public_key = parse_public_key(&anchor.value)?;

        verify_signature(
            &public_key,
            &canonical_response_content(&response.content),
            sign,
        )?;

        tracing::debug!(
            request_id = %request.request_id,
            auth_string = %material.auth_string,
            "Response signature verified"
        );
        Ok(())
    }
}
