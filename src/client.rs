//! Caller-facing client.
//!
//! # Responsibilities
//! - Own the shared HTTP pool, credential and analyzer chain
//! - Drive one call through assembly, signing, transport and verification
//! - Record call metrics and boundary log events
//!
//! # Design Decisions
//! - Cheap to clone; clones share the pool and the chain
//! - A fresh signer per call carries its signature material to the chain
//! - The deadline starts when the call starts and covers every stage

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;

use crate::auth::{AppCredential, RsaSigner, YopSigner};
use crate::config::schema::ClientConfig;
use crate::config::validation::validate_config;
use crate::config::ConfigError;
use crate::error::{TransportError, YopError, YopResult};
use crate::observability::metrics::{
    outcome_label, record_call, record_chain_rejection, record_upload_bytes,
};
use crate::request::{assemble, AssemblyDefaults, FilePart, RequestKind, YopRequest};
use crate::response::{AnalyzerChain, RawResponse, YopResponse};
use crate::transport::builder::{build_call, preflight};
use crate::transport::{execute, stream_upload, Deadline};

/// Default form field carrying uploaded files.
pub const DEFAULT_FILE_FIELD: &str = "file";

/// Client for the YOP open platform.
#[derive(Debug, Clone)]
pub struct YopClient {
    http: reqwest::Client,
    credential: Arc<AppCredential>,
    chain: Arc<AnalyzerChain>,
    defaults: Arc<AssemblyDefaults>,
    timeout: Duration,
    metrics_enabled: bool,
}

impl YopClient {
    /// Client for `credential`, with endpoints and timeouts from `config`.
    ///
    /// An empty `app_key` is taken from the credential before `config` is
    /// validated.
    pub fn new(credential: AppCredential, config: &ClientConfig) -> YopResult<Self> {
        let mut config = config.clone();
        if config.app_key.trim().is_empty() {
            config.app_key = credential.app_key().to_string();
        }
        validate_config(&config).map_err(ConfigError::Validation)?;

        let http = reqwest::Client::builder()
            .build()
            .map_err(TransportError::from)?;
        let defaults = AssemblyDefaults::from_config(&config);

        Ok(Self {
            http,
            credential: Arc::new(credential),
            chain: Arc::new(AnalyzerChain::default()),
            defaults: Arc::new(defaults),
            timeout: Duration::from_secs(config.timeouts.request_secs),
            metrics_enabled: config.observability.metrics_enabled,
        })
    }

    /// Client whose credential is resolved from `config`.
    pub fn from_config(config: &ClientConfig) -> YopResult<Self> {
        let credential = AppCredential::from_config(config)?;
        Self::new(credential, config)
    }

    /// Replace the response analyzer chain.
    pub fn with_chain(mut self, chain: AnalyzerChain) -> Self {
        self.chain = Arc::new(chain);
        self
    }

    pub fn chain(&self) -> &AnalyzerChain {
        &self.chain
    }

    /// Default deadline for calls that set none.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send `request` and return the verified response.
    pub async fn request(&self, request: YopRequest) -> YopResult<YopResponse> {
        let kind = if request.is_multipart() {
            RequestKind::Upload
        } else {
            RequestKind::Standard
        };
        self.observe(request.method.clone(), self.send(request, kind)).await
    }

    /// Upload `bytes` as file `file_name` in form field `field`.
    pub async fn upload_bytes(
        &self,
        request: YopRequest,
        field: &str,
        file_name: &str,
        bytes: impl Into<Bytes>,
    ) -> YopResult<YopResponse> {
        let request = request.file(field, FilePart::from_bytes(file_name, bytes));
        self.observe(
            request.method.clone(),
            self.send(request, RequestKind::Upload),
        )
        .await
    }

    /// Download `source_url` and stream it into form field `field` without
    /// buffering. The file name is derived from the source when not given.
    pub async fn upload_from_url(
        &self,
        request: YopRequest,
        field: &str,
        file_name: Option<&str>,
        source_url: &str,
    ) -> YopResult<YopResponse> {
        self.observe(
            request.method.clone(),
            self.stream(request, field, file_name, source_url),
        )
        .await
    }

    async fn send(&self, mut request: YopRequest, kind: RequestKind) -> YopResult<YopResponse> {
        let deadline = self.deadline(&request);
        preflight(&request)?;

        let signer = self.prepare(&mut request, kind)?;
        let call = build_call(&request).await?;
        let raw = execute(&self.http, call, deadline).await?;
        self.verify(&signer, &request, raw)
    }

    async fn stream(
        &self,
        mut request: YopRequest,
        field: &str,
        file_name: Option<&str>,
        source_url: &str,
    ) -> YopResult<YopResponse> {
        let deadline = self.deadline(&request);
        request
            .require_multipart_method()
            .map_err(YopError::Precondition)?;

        let signer = self.prepare(&mut request, RequestKind::Upload)?;
        let (raw, copied) =
            stream_upload(&self.http, &request, field, file_name, source_url, deadline).await?;
        if self.metrics_enabled {
            record_upload_bytes(copied);
        }
        self.verify(&signer, &request, raw)
    }

    fn deadline(&self, request: &YopRequest) -> Deadline {
        Deadline::after(request.timeout.unwrap_or(self.timeout))
    }

    fn prepare(&self, request: &mut YopRequest, kind: RequestKind) -> YopResult<RsaSigner> {
        assemble(request, &self.defaults, kind);
        let mut signer = RsaSigner::new(self.credential.clone());
        signer.sign_request(request)?;
        Ok(signer)
    }

    fn verify(
        &self,
        signer: &dyn YopSigner,
        request: &YopRequest,
        raw: RawResponse,
    ) -> YopResult<YopResponse> {
        let status = raw.status.as_u16();
        let result = self.chain.verify(signer, request, raw);
        match &result {
            Ok(_) => tracing::info!(
                request_id = %request.request_id,
                method = %request.method,
                api_uri = %request.api_uri,
                status,
                "Call completed"
            ),
            Err(YopError::Chain { analyzer, .. }) if self.metrics_enabled => {
                record_chain_rejection(*analyzer)
            }
            Err(_) => {}
        }
        result
    }

    async fn observe<F>(&self, method: reqwest::Method, call: F) -> YopResult<YopResponse>
    where
        F: std::future::Future<Output = YopResult<YopResponse>>,
    {
        let start = Instant::now();
        let result = call.await;
        if let Err(e) = &result {
            tracing::warn!(method = %method, error = %e, "Call failed");
        }
        if self.metrics_enabled {
            record_call(method.as_str(), outcome_label(&result), start);
        }
        result
    }
}
