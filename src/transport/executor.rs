//! HTTP execution under an end-to-end deadline.

use std::future::Future;
use std::time::Duration;

use tokio::time::{timeout_at, Instant};

use crate::error::TransportError;
use crate::response::RawResponse;
use crate::transport::builder::{CallBody, HttpCall};

/// Stand-in expiry for budgets past what `Instant` can represent.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Point in time by which the whole call must finish.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    /// Deadline `budget` from now, clamped to thirty years when `budget` overflows.
    pub fn after(budget: Duration) -> Self {
        let now = Instant::now();
        let at = now.checked_add(budget).unwrap_or_else(|| now + FAR_FUTURE);
        Self { at, budget }
    }

    pub fn at(&self) -> Instant {
        self.at
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Run `fut`, failing with [`TransportError::Timeout`] once the deadline passes.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, TransportError> {
        timeout_at(self.at, fut)
            .await
            .map_err(|_| TransportError::Timeout(self.budget))
    }
}

/// Send `call` and read the full response body before `deadline`.
pub async fn execute(
    http: &reqwest::Client,
    call: HttpCall,
    deadline: Deadline,
) -> Result<RawResponse, TransportError> {
    tracing::debug!(
        method = %call.method,
        url = %call.url,
        shape = call.shape.as_str(),
        "Sending request"
    );

    let builder = http
        .request(call.method, call.url)
        .headers(call.headers);
    let builder = match call.body {
        CallBody::Empty => builder,
        CallBody::Bytes(bytes) => builder.body(bytes),
        CallBody::Pipe(reader) => builder.body(reader.into_body()),
    };

    deadline
        .run(async move {
            let response = builder.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?;
            Ok::<_, TransportError>(RawResponse {
                status,
                headers,
                body,
            })
        })
        .await?
}
