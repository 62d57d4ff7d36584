//! Mock YOP platform shared by the integration tests.
//!
//! Serves the open API under `/yop-center`, signing responses with the
//! fixture platform key, plus download sources under `/files`.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use axum::Router;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use bytes::Bytes;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use sha2::Sha256;
use tokio::net::TcpListener;
use yop_client::config::ClientConfig;

pub const APP_KEY: &str = "app_10086";
pub const APP_PRIVATE_KEY_PEM: &str = include_str!("../fixtures/app_private_key.pem");
pub const PLATFORM_PRIVATE_KEY_PEM: &str = include_str!("../fixtures/platform_private_key.pem");
pub const PLATFORM_PUBLIC_KEY_B64: &str = include_str!("../fixtures/platform_public_key.b64");

/// Bytes served by the `/files/report` source.
pub const REPORT_BYTES: &[u8] = b"%PDF-1.4 quarterly report";

/// Bytes served by the `/files/` source.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake";

/// Delay of the `/slow` endpoint.
pub const SLOW_DELAY: Duration = Duration::from_secs(3);

/// Delay before the `/files/broken` source fails.
pub const BROKEN_SOURCE_DELAY: Duration = Duration::from_millis(50);

/// Endpoint that answers without reading the request body.
const EARLY_API: &str = "/rest/v1.0/early";

/// One request as seen by the mock.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

struct MockState {
    signer: SigningKey<Sha256>,
    recorded: Mutex<Vec<RecordedRequest>>,
    downloads: Mutex<Vec<String>>,
}

/// Running mock platform.
pub struct MockPlatform {
    pub addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockPlatform {
    pub async fn start() -> Self {
        let key = RsaPrivateKey::from_pkcs8_pem(PLATFORM_PRIVATE_KEY_PEM).unwrap();
        let state = Arc::new(MockState {
            signer: SigningKey::<Sha256>::new(key),
            recorded: Mutex::new(Vec::new()),
            downloads: Mutex::new(Vec::new()),
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(handle).with_state(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    /// Server root for API calls.
    pub fn server_root(&self) -> String {
        format!("http://{}/yop-center", self.addr)
    }

    /// URL of a download source.
    pub fn source(&self, path: &str) -> String {
        format!("http://{}/files{}", self.addr, path)
    }

    /// Client configuration pointing at this mock.
    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::default();
        config.app_key = APP_KEY.to_string();
        config.credential.private_key = Some(APP_PRIVATE_KEY_PEM.to_string());
        config.endpoints.server_root = self.server_root();
        config.endpoints.yos_server_root = self.server_root();
        config.platform.public_key = Some(PLATFORM_PUBLIC_KEY_B64.to_string());
        config.observability.metrics_enabled = false;
        config
    }

    /// API requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.recorded.lock().unwrap().clone()
    }

    /// Download paths served so far.
    pub fn downloads(&self) -> Vec<String> {
        self.state.downloads.lock().unwrap().clone()
    }
}

async fn handle(State(state): State<Arc<MockState>>, request: Request) -> Response {
    let path = request.uri().path().to_string();
    if let Some(source) = path.strip_prefix("/files") {
        state.downloads.lock().unwrap().push(source.to_string());
        return serve_download(source);
    }

    let api = path.strip_prefix("/yop-center").unwrap_or(&path).to_string();
    let (parts, incoming) = request.into_parts();
    let body = if api == EARLY_API {
        Bytes::new()
    } else {
        match to_bytes(incoming, usize::MAX).await {
            Ok(body) => body,
            // The client gave up mid-body.
            Err(_) => return status_only(StatusCode::BAD_REQUEST),
        }
    };
    let recorded = RecordedRequest {
        method: parts.method.to_string(),
        path: path.clone(),
        query: parts.uri.query().map(str::to_string),
        headers: header_map(&parts.headers),
        body,
    };
    let request_id = recorded.header("x-yop-request-id").unwrap_or_default().to_string();
    let echo = serde_json::json!({
        "result": {
            "method": recorded.method,
            "query": recorded.query,
            "contentType": recorded.header("content-type"),
            "bodyLength": recorded.body.len(),
        }
    });
    state.recorded.lock().unwrap().push(recorded);

    match api.as_str() {
        "/rest/v1.0/unsigned" => json_response(StatusCode::OK, &request_id, echo.to_string(), None),
        "/rest/v1.0/tampered" => {
            let sign = state.sign("{\"result\":{\"status\":\"FAILED\"}}");
            json_response(StatusCode::OK, &request_id, echo.to_string(), Some(sign))
        }
        "/rest/v1.0/wrong-id" => {
            let body = echo.to_string();
            let sign = state.sign(&body);
            json_response(StatusCode::OK, "some-other-request", body, Some(sign))
        }
        "/rest/v1.0/error" => {
            let body = serde_json::json!({
                "requestId": request_id,
                "code": "40044",
                "message": "业务处理失败",
                "subCode": "isv.scene.filing.not-exists",
                "subMessage": "场景不存在",
            })
            .to_string();
            json_response(StatusCode::BAD_REQUEST, &request_id, body, None)
        }
        "/rest/v1.0/gateway" => Response::builder()
            .status(StatusCode::BAD_GATEWAY)
            .body(Body::from("upstream unavailable"))
            .unwrap(),
        EARLY_API => state.signed_json(&request_id, &echo),
        "/rest/v1.0/slow" => {
            tokio::time::sleep(SLOW_DELAY).await;
            state.signed_json(&request_id, &echo)
        }
        _ => state.signed_json(&request_id, &echo),
    }
}

impl MockState {
    fn sign(&self, body: &str) -> String {
        let canonical: Vec<u8> = body.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
        let signature = self.signer.sign(&canonical).to_bytes();
        format!("{}$SHA256", URL_SAFE_NO_PAD.encode(signature))
    }

    /// Pretty-printed body; the signature covers it with whitespace removed.
    fn signed_json(&self, request_id: &str, value: &serde_json::Value) -> Response {
        let body = serde_json::to_string_pretty(value).unwrap();
        let sign = self.sign(&body);
        json_response(StatusCode::OK, request_id, body, Some(sign))
    }
}

fn json_response(status: StatusCode, request_id: &str, body: String, sign: Option<String>) -> Response {
    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json;charset=UTF-8")
        .header("x-yop-request-id", request_id);
    if let Some(sign) = sign {
        builder = builder.header("x-yop-sign", sign);
    }
    builder.body(Body::from(body)).unwrap()
}

fn serve_download(source: &str) -> Response {
    match source {
        "/report" => Response::builder()
            .header(header::CONTENT_TYPE, "application/pdf")
            .header(header::CONTENT_DISPOSITION, "attachment; filename=\"report.pdf\"")
            .body(Body::from(REPORT_BYTES))
            .unwrap(),
        "/" => Response::builder()
            .header(header::CONTENT_TYPE, "image/png")
            .body(Body::from(PNG_BYTES))
            .unwrap(),
        "/stalled" => {
            // One chunk, then nothing until the client gives up.
            let first = futures_util::stream::once(async {
                Ok::<_, io::Error>(Bytes::from_static(b"first chunk"))
            });
            let stream = futures_util::StreamExt::chain(first, futures_util::stream::pending());
            Response::builder()
                .header(header::CONTENT_TYPE, "application/octet-stream")
                .body(Body::from_stream(stream))
                .unwrap()
        }
        "/broken" => {
            // One chunk, then the connection fails.
            let first = futures_util::stream::once(async {
                Ok::<_, io::Error>(Bytes::from_static(b"first chunk"))
            });
            let reset = futures_util::stream::once(async {
                tokio::time::sleep(BROKEN_SOURCE_DELAY).await;
                Err::<Bytes, _>(io::Error::new(io::ErrorKind::ConnectionReset, "source reset"))
            });
            Response::builder()
                .header(header::CONTENT_TYPE, "application/octet-stream")
                .body(Body::from_stream(futures_util::StreamExt::chain(first, reset)))
                .unwrap()
        }
        _ => status_only(StatusCode::NOT_FOUND),
    }
}

fn status_only(status: StatusCode) -> Response {
    Response::builder().status(status).body(Body::empty()).unwrap()
}

fn header_map(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
        .collect()
}
