//! Analyzer capability and the ordered chain that runs it.

use std::fmt;
use std::sync::Arc;

use crate::auth::YopSigner;
use crate::error::{YopError, YopResult};
use crate::request::YopRequest;
use crate::response::analyzers::{
    ErrorResponseAnalyzer, JsonResultAnalyzer, RequestIdAnalyzer, SignatureAnalyzer,
};
use crate::response::types::{RawResponse, VerificationError, YopResponse};

/// Shared state every analyzer sees.
pub struct AnalyzeContext<'a> {
    /// The signer that signed `request`.
    pub signer: &'a dyn YopSigner,
    /// The response as built so far.
    pub response: &'a mut YopResponse,
    /// The signed request.
    pub request: &'a YopRequest,
}

/// One verification or transformation step.
pub trait ResponseAnalyzer: Send + Sync {
    /// Stable name used in errors, logs and metrics.
    fn name(&self) -> &'static str;

    /// Inspect or transform the response; an error rejects it.
    fn analyze(
        &self,
        ctx: &mut AnalyzeContext<'_>,
        raw: &RawResponse,
    ) -> Result<(), VerificationError>;
}

/// Ordered, immutable list of analyzers.
#[derive(Clone)]
pub struct AnalyzerChain {
    analyzers: Vec<Arc<dyn ResponseAnalyzer>>,
}

impl AnalyzerChain {
    /// Chain running `analyzers` in the given order.
    pub fn new(analyzers: Vec<Arc<dyn ResponseAnalyzer>>) -> Self {
        Self { analyzers }
    }

    /// Append an analyzer to the end of the chain.
    pub fn with(mut self, analyzer: impl ResponseAnalyzer + 'static) -> Self {
        self.analyzers.push(Arc::new(analyzer));
        self
    }

    /// Analyzer names in run order.
    pub fn names(&self) -> Vec<&'static str> {
        self.analyzers.iter().map(|a| a.name()).collect()
    }

    /// Run every analyzer in order; the first rejection ends the call.
    pub fn verify(
        &self,
        signer: &dyn YopSigner,
        request: &YopRequest,
        raw: RawResponse,
    ) -> YopResult<YopResponse> {
        let mut response = YopResponse::draft(&raw);
        let mut ctx = AnalyzeContext {
            signer,
            response: &mut response,
            request,
        };

        for analyzer in &self.analyzers {
            if let Err(source) = analyzer.analyze(&mut ctx, &raw) {
                tracing::warn!(
                    request_id = %request.request_id,
                    analyzer = analyzer.name(),
                    status = raw.status.as_u16(),
                    error = %source,
                    "Response rejected"
                );
                return Err(YopError::Chain {
                    analyzer: analyzer.name(),
                    source,
                });
            }
        }

        Ok(response)
    }
}

impl Default for AnalyzerChain {
    /// error → request id → signature → json result.
    fn default() -> Self {
        Self::new(vec![
            Arc::new(ErrorResponseAnalyzer),
            Arc::new(RequestIdAnalyzer),
            Arc::new(SignatureAnalyzer),
            Arc::new(JsonResultAnalyzer),
        ])
    }
}

impl fmt::Debug for AnalyzerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerChain")
            .field("analyzers", &self.names())
            .finish()
    }
}
