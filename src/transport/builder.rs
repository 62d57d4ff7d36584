//! Canonical request builder.
//!
//! Chooses one wire shape per request, by precedence:
//!
//! | shape | when | params | body | content type |
//! |---|---|---|---|---|
//! | multipart | files present (POST only) | form fields | fields, then files | `multipart/form-data` |
//! | json payload | POST with content | query | content | `application/json` |
//! | form | other POST | body | encoded params | `application/x-www-form-urlencoded` |
//! | query | any other method | query | none | `application/x-www-form-urlencoded` |

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use url::Url;

use crate::error::{TransportError, YopError, YopResult};
use crate::request::encoding::encode_params;
use crate::request::{FileContent, YopRequest, CONTENT_TYPE_FORM, CONTENT_TYPE_JSON};
use crate::transport::multipart::MultipartEncoder;
use crate::transport::pipe::PipeReader;

/// Wire shape of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyShape {
    Multipart,
    JsonPayload,
    Form,
    Query,
}

impl BodyShape {
    pub fn of(request: &YopRequest) -> Self {
        if request.is_multipart() {
            BodyShape::Multipart
        } else if request.method == Method::POST && request.has_content() {
            BodyShape::JsonPayload
        } else if request.method == Method::POST {
            BodyShape::Form
        } else {
            BodyShape::Query
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BodyShape::Multipart => "multipart",
            BodyShape::JsonPayload => "json",
            BodyShape::Form => "form",
            BodyShape::Query => "query",
        }
    }
}

/// Request body as handed to the executor.
#[derive(Debug)]
pub enum CallBody {
    Empty,
    Bytes(Bytes),
    /// Streamed from a producer task.
    Pipe(PipeReader),
}

/// A fully serialized HTTP call.
#[derive(Debug)]
pub struct HttpCall {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: CallBody,
    pub shape: BodyShape,
}

/// Reject request shapes the platform cannot accept, before any I/O.
pub fn preflight(request: &YopRequest) -> YopResult<BodyShape> {
    request.check_multipart().map_err(YopError::Precondition)?;
    Ok(BodyShape::of(request))
}

/// Serialize a signed request. Local files are read here.
pub async fn build_call(request: &YopRequest) -> YopResult<HttpCall> {
    let shape = preflight(request)?;

    let (query, content_type, body) = match shape {
        BodyShape::Multipart => {
            let encoder = MultipartEncoder::new();
            let mut files = Vec::with_capacity(request.files.len());
            for (field, part) in &request.files {
                let content = match &part.content {
                    FileContent::Bytes(bytes) => bytes.clone(),
                    FileContent::Path(path) => tokio::fs::read(path)
                        .await
                        .map(Bytes::from)
                        .map_err(|e| {
                            YopError::Build(format!("cannot read {}: {}", path.display(), e))
                        })?,
                };
                files.push((field.as_str(), part.file_name.as_str(), content));
            }
            let body = encoder.encode(
                &request.params,
                files.iter().map(|(f, n, c)| (*f, *n, c.as_ref())),
            );
            (None, encoder.content_type(), CallBody::Bytes(body))
        }
        BodyShape::JsonPayload => (
            Some(encode_params(&request.params)),
            CONTENT_TYPE_JSON.to_string(),
            CallBody::Bytes(Bytes::from(request.content.clone().unwrap_or_default())),
        ),
        BodyShape::Form => (
            None,
            CONTENT_TYPE_FORM.to_string(),
            CallBody::Bytes(Bytes::from(encode_params(&request.params))),
        ),
        BodyShape::Query => (
            Some(encode_params(&request.params)),
            CONTENT_TYPE_FORM.to_string(),
            CallBody::Empty,
        ),
    };

    Ok(HttpCall {
        method: request.method.clone(),
        url: build_url(request, query.as_deref())?,
        headers: build_headers(request, &content_type)?,
        body,
        shape,
    })
}

/// `server_root + api_uri`, with `query` when non-empty.
pub fn build_url(request: &YopRequest, query: Option<&str>) -> YopResult<Url> {
    let raw = format!(
        "{}{}",
        request.server_root.trim_end_matches('/'),
        request.api_uri
    );
    let mut url = Url::parse(&raw).map_err(|e| TransportError::InvalidUrl {
        url: raw.clone(),
        reason: e.to_string(),
    })?;
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.set_query(Some(query));
    }
    Ok(url)
}

/// Content type first, then every request header.
pub fn build_headers(request: &YopRequest, content_type: &str) -> YopResult<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(request.headers.len() + 1);
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .map_err(|e| YopError::Build(format!("invalid content type: {}", e)))?,
    );
    for (name, value) in &request.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| YopError::Build(format!("invalid header name '{}': {}", name, e)))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| YopError::Build(format!("invalid value for header '{}': {}", name, e)))?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::FilePart;
    use std::io::Write;

    fn rooted(req: YopRequest) -> YopRequest {
        req.server_root("http://127.0.0.1:9/yop-center/")
    }

    fn body_text(call: &HttpCall) -> String {
        match &call.body {
            CallBody::Bytes(b) => String::from_utf8(b.to_vec()).unwrap(),
            CallBody::Empty => String::new(),
            CallBody::Pipe(_) => panic!("unexpected pipe"),
        }
    }

    fn content_type(call: &HttpCall) -> &str {
        call.headers.get(CONTENT_TYPE).unwrap().to_str().unwrap()
    }

    #[tokio::test]
    async fn test_query_shape() {
        let req = rooted(YopRequest::get("/rest/v1.0/query").param("id", "2").param("id", "1"));
        let call = build_call(&req).await.unwrap();

        assert_eq!(call.shape, BodyShape::Query);
        assert_eq!(
            call.url.as_str(),
            "http://127.0.0.1:9/yop-center/rest/v1.0/query?id=2&id=1"
        );
        assert!(matches!(call.body, CallBody::Empty));
        assert_eq!(content_type(&call), CONTENT_TYPE_FORM);
    }

    #[tokio::test]
    async fn test_form_shape() {
        let req = rooted(YopRequest::post("/rest/v1.0/pay").param("memo", "a b&c"));
        let call = build_call(&req).await.unwrap();

        assert_eq!(call.shape, BodyShape::Form);
        assert!(call.url.query().is_none());
        assert_eq!(body_text(&call), "memo=a%20b%26c");
    }

    #[tokio::test]
    async fn test_json_payload_moves_params_to_query() {
        let req = rooted(
            YopRequest::post("/rest/v1.0/pay")
                .param("version", "1")
                .content(r#"{"amount":"10.00"}"#),
        );
        let call = build_call(&req).await.unwrap();

        assert_eq!(call.shape, BodyShape::JsonPayload);
        assert_eq!(call.url.query(), Some("version=1"));
        assert_eq!(body_text(&call), r#"{"amount":"10.00"}"#);
        assert_eq!(content_type(&call), CONTENT_TYPE_JSON);
    }

    #[tokio::test]
    async fn test_multipart_wins_over_content() {
        let req = rooted(
            YopRequest::post("/rest/v1.0/file/upload")
                .param("merchantNo", "100")
                .content("{}")
                .file("file", FilePart::from_bytes("a.txt", "hello")),
        );
        let call = build_call(&req).await.unwrap();

        assert_eq!(call.shape, BodyShape::Multipart);
        assert!(content_type(&call).starts_with("multipart/form-data; boundary="));
        let body = body_text(&call);
        let field = body.find("name=\"merchantNo\"").unwrap();
        let file = body.find("filename=\"a.txt\"").unwrap();
        assert!(field < file);
        assert!(body.contains("\r\n\r\nhello\r\n"));
    }

    #[tokio::test]
    async fn test_multipart_reads_local_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"from disk").unwrap();
        let req = rooted(
            YopRequest::post("/rest/v1.0/file/upload").file("file", FilePart::from_path(tmp.path())),
        );
        let call = build_call(&req).await.unwrap();
        assert!(body_text(&call).contains("from disk"));
    }

    #[tokio::test]
    async fn test_unreadable_file_is_build_error() {
        let req = rooted(
            YopRequest::post("/rest/v1.0/file/upload")
                .file("file", FilePart::from_path("/nonexistent/yop/file.bin")),
        );
        assert!(matches!(build_call(&req).await, Err(YopError::Build(_))));
    }

    #[tokio::test]
    async fn test_multipart_on_get_is_precondition() {
        let req = rooted(YopRequest::get("/x").file("file", FilePart::from_bytes("a", "b")));
        assert!(matches!(build_call(&req).await, Err(YopError::Precondition(_))));
    }

    #[tokio::test]
    async fn test_caller_headers_after_content_type() {
        let req = rooted(
            YopRequest::post("/x")
                .header("Content-Type", "application/x-www-form-urlencoded;charset=UTF-8")
                .header("x-custom", "1"),
        );
        let call = build_call(&req).await.unwrap();
        assert_eq!(content_type(&call), "application/x-www-form-urlencoded;charset=UTF-8");
        assert_eq!(call.headers.get("x-custom").unwrap(), "1");
    }

    #[tokio::test]
    async fn test_invalid_header_value_is_build_error() {
        let req = rooted(YopRequest::get("/x").header("x-bad", "line\nbreak"));
        assert!(matches!(build_call(&req).await, Err(YopError::Build(_))));
    }

    #[test]
    fn test_invalid_url() {
        let req = YopRequest::get("/x").server_root("not a url");
        assert!(matches!(
            build_url(&req, None),
            Err(YopError::Transport(TransportError::InvalidUrl { .. }))
        ));
    }
}
