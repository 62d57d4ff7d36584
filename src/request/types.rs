//! Request data model.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// Parameter name → ordered list of values.
pub type Params = BTreeMap<String, Vec<String>>;

/// Key type tag of a trust anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CertType {
    /// RSA 2048 with SHA-256 signatures.
    #[default]
    #[serde(rename = "RSA2048")]
    Rsa2048,
}

impl CertType {
    /// Protocol name used in the authorization header.
    pub fn as_str(&self) -> &'static str {
        match self {
            CertType::Rsa2048 => "RSA2048",
        }
    }
}

/// Platform public key that response signatures are checked against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustAnchor {
    /// Public key, PEM or base64 SPKI DER.
    pub value: String,
    /// Key type tag.
    pub cert_type: CertType,
}

impl TrustAnchor {
    /// Create a trust anchor.
    pub fn new(value: impl Into<String>, cert_type: CertType) -> Self {
        Self {
            value: value.into(),
            cert_type,
        }
    }
}

/// Where a file attachment's bytes come from.
#[derive(Debug, Clone)]
pub enum FileContent {
    /// Memory-resident bytes.
    Bytes(Bytes),
    /// A local file, read when the call is built.
    Path(PathBuf),
}

/// A named file attachment.
#[derive(Debug, Clone)]
pub struct FilePart {
    /// File name declared in the multipart part.
    pub file_name: String,
    /// Part contents.
    pub content: FileContent,
}

impl FilePart {
    /// Attachment from memory.
    pub fn from_bytes(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content: FileContent::Bytes(bytes.into()),
        }
    }

    /// Attachment from a local file, named after its last path component.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        Self {
            file_name,
            content: FileContent::Path(path),
        }
    }
}

/// One logical call to the platform.
///
/// Built by the caller, completed by [`assemble`](crate::request::assemble),
/// signed, then consumed by the transport.
#[derive(Debug, Clone)]
pub struct YopRequest {
    /// HTTP method.
    pub method: Method,
    /// Base URL; empty means "use the default endpoint".
    pub server_root: String,
    /// API path, e.g. `/rest/v1.0/trade/order`.
    pub api_uri: String,
    /// Header name (lower case) → value.
    pub headers: BTreeMap<String, String>,
    /// Parameters, multi-valued.
    pub params: Params,
    /// Raw structured payload sent as the body.
    pub content: Option<String>,
    /// Field name → file attachment.
    pub files: BTreeMap<String, FilePart>,
    /// Call deadline; `None` uses the client default.
    pub timeout: Option<Duration>,
    /// Application identity.
    pub app_id: String,
    /// Per-call unique id, filled by assembly.
    pub request_id: String,
    /// Trust anchor override.
    pub platform_key: Option<TrustAnchor>,
}

impl YopRequest {
    /// New request for `api_uri`.
    pub fn new(method: Method, api_uri: impl Into<String>) -> Self {
        Self {
            method,
            server_root: String::new(),
            api_uri: api_uri.into(),
            headers: BTreeMap::new(),
            params: Params::new(),
            content: None,
            files: BTreeMap::new(),
            timeout: None,
            app_id: String::new(),
            request_id: String::new(),
            platform_key: None,
        }
    }

    /// New GET request.
    pub fn get(api_uri: impl Into<String>) -> Self {
        Self::new(Method::GET, api_uri)
    }

    /// New POST request.
    pub fn post(api_uri: impl Into<String>) -> Self {
        Self::new(Method::POST, api_uri)
    }

    /// Append a parameter value; existing values for `name` are kept.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_param(name, value);
        self
    }

    /// Append a parameter value in place.
    pub fn add_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.entry(name.into()).or_default().push(value.into());
    }

    /// Set a header. Names are stored lower-cased.
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Set a header in place.
    pub fn set_header(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Header value by case-insensitive name.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Raw structured payload.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Serialize `value` as the JSON payload.
    pub fn json<T: Serialize>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        self.content = Some(serde_json::to_string(value)?);
        Ok(self)
    }

    /// Attach a file under form field `field`.
    pub fn file(mut self, field: impl Into<String>, part: FilePart) -> Self {
        self.files.insert(field.into(), part);
        self
    }

    /// Override the call deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the application identity.
    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self
    }

    /// Override the base URL.
    pub fn server_root(mut self, server_root: impl Into<String>) -> Self {
        self.server_root = server_root.into();
        self
    }

    /// Pin a trust anchor for this call.
    pub fn platform_key(mut self, anchor: TrustAnchor) -> Self {
        self.platform_key = Some(anchor);
        self
    }

    /// True when the request carries a non-empty raw payload.
    pub fn has_content(&self) -> bool {
        self.content.as_deref().is_some_and(|c| !c.is_empty())
    }

    /// True when the request carries file attachments.
    pub fn is_multipart(&self) -> bool {
        !self.files.is_empty()
    }

    /// True when parameters travel in the URL query rather than the body.
    pub fn params_in_query(&self) -> bool {
        !self.is_multipart() && (self.method != Method::POST || self.has_content())
    }

    /// Multipart bodies are only legal on POST.
    pub fn check_multipart(&self) -> Result<bool, String> {
        if self.is_multipart() {
            self.require_multipart_method()?;
        }
        Ok(self.is_multipart())
    }

    /// Fails unless the method can carry a multipart body.
    pub fn require_multipart_method(&self) -> Result<(), String> {
        if self.method != Method::POST {
            return Err(format!(
                "multipart/form-data only supports POST, got {}",
                self.method
            ));
        }
        Ok(())
    }
}
