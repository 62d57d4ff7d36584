//! Streaming upload of a remote resource.
//!
//! The source is downloaded and re-sent as a multipart file part without
//! buffering it. A producer task writes the form fields and copies the
//! download into a bounded pipe; the upload body reads the other end.
//! Both halves run under the caller's deadline.

use std::io;

use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::header::{HeaderName, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::Method;
use tokio::task::JoinHandle;
use tokio::time::timeout_at;
use url::Url;

use crate::error::{TransportError, YopError, YopResult};
use crate::request::YopRequest;
use crate::response::RawResponse;
use crate::transport::builder::{build_headers, build_url, BodyShape, CallBody, HttpCall};
use crate::transport::executor::{execute, Deadline};
use crate::transport::multipart::MultipartEncoder;
use crate::transport::pipe::{body_pipe, PipeWriter, DEFAULT_PIPE_CAPACITY};

/// Pick the uploaded file name.
///
/// Order: explicit name, `Content-Disposition` `filename=`, last URL path
/// segment, then a generic name from the content type.
pub fn derive_file_name(
    explicit: Option<&str>,
    disposition: Option<&str>,
    url: &Url,
    content_type: Option<&str>,
) -> String {
    explicit
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .or_else(|| disposition.and_then(disposition_file_name))
        .or_else(|| url_file_name(url))
        .unwrap_or_else(|| content_type_file_name(content_type).to_string())
}

fn disposition_file_name(header: &str) -> Option<String> {
    let start = header.find("filename=")? + "filename=".len();
    let value = header[start..]
        .split(';')
        .next()?
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'')
        .trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn url_file_name(url: &Url) -> Option<String> {
    if url.path().ends_with('/') {
        return None;
    }
    let segment = url.path_segments()?.next_back()?;
    let decoded = percent_encoding::percent_decode_str(segment)
        .decode_utf8_lossy()
        .into_owned();
    match decoded.as_str() {
        "" | "." | ".." | "/" => None,
        _ => Some(decoded),
    }
}

fn content_type_file_name(content_type: Option<&str>) -> &'static str {
    let essence = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .unwrap_or_default();
    match essence.as_str() {
        "text/plain" => "file.txt",
        "application/pdf" => "file.pdf",
        "application/zip" => "file.zip",
        "image/jpeg" => "image.jpg",
        "image/gif" => "image.gif",
        "image/png" => "image.png",
        "audio/ogg" => "audio.ogg",
        "audio/mpeg" => "audio.mp3",
        "video/mp4" => "video.mp4",
        "video/webm" => "video.webm",
        _ => "file",
    }
}

/// Download `source_url` and upload it as `field` of the signed `request`.
///
/// Returns the platform response and the number of source bytes copied,
/// which is zero when the platform answered before the body was complete.
pub async fn stream_upload(
    http: &reqwest::Client,
    request: &YopRequest,
    field: &str,
    file_name: Option<&str>,
    source_url: &str,
    deadline: Deadline,
) -> YopResult<(RawResponse, u64)> {
    request
        .require_multipart_method()
        .map_err(YopError::Precondition)?;

    let source = Url::parse(source_url).map_err(|e| TransportError::InvalidUrl {
        url: source_url.to_string(),
        reason: e.to_string(),
    })?;
    let download = deadline
        .run(http.get(source.clone()).send())
        .await?
        .map_err(TransportError::from)?;
    if !download.status().is_success() {
        return Err(YopError::Download {
            url: source_url.to_string(),
            status: download.status().as_u16(),
        });
    }

    let header = |name: HeaderName| download.headers().get(name).and_then(|v| v.to_str().ok());
    let file_name = derive_file_name(
        file_name,
        header(CONTENT_DISPOSITION),
        &source,
        header(CONTENT_TYPE),
    );
    tracing::debug!(
        request_id = %request.request_id,
        source = %source,
        file_name = %file_name,
        "Streaming upload source opened"
    );

    let encoder = MultipartEncoder::new();
    let mut head = encoder.fields(&request.params).to_vec();
    head.extend_from_slice(&encoder.file_header(field, &file_name));

    let (writer, reader) = body_pipe(DEFAULT_PIPE_CAPACITY);
    let call = HttpCall {
        method: Method::POST,
        url: build_url(request, None)?,
        headers: build_headers(request, &encoder.content_type())?,
        body: CallBody::Pipe(reader),
        shape: BodyShape::Multipart,
    };
    let producer = spawn_producer(download, Bytes::from(head), encoder.tail(), writer, deadline);

    let sent = execute(http, call, deadline).await;
    if sent.is_ok() {
        // The response is complete; a producer still copying has no reader left.
        producer.abort();
    }
    let produced = producer.await.unwrap_or_else(|e| {
        let kind = if e.is_cancelled() {
            io::ErrorKind::BrokenPipe
        } else {
            io::ErrorKind::Other
        };
        Err(io::Error::new(kind, e.to_string()))
    });

    match (sent, produced) {
        (Ok(raw), Ok(copied)) => Ok((raw, copied)),
        (_, Err(e)) if e.kind() == io::ErrorKind::TimedOut => {
            Err(TransportError::Timeout(deadline.budget()).into())
        }
        // The platform answered without reading the whole body.
        (Ok(raw), Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => Ok((raw, 0)),
        (Err(e), Err(p)) if p.kind() == io::ErrorKind::BrokenPipe => Err(e.into()),
        (_, Err(e)) => Err(YopError::Build(format!("streaming upload failed: {}", e))),
        (Err(e), Ok(_)) => Err(e.into()),
    }
}

/// Copy `download` into `writer` between `head` and `tail`.
///
/// Returns the number of source bytes copied. On failure the pipe is closed
/// with the error so the upload body fails instead of hanging.
fn spawn_producer(
    download: reqwest::Response,
    head: Bytes,
    tail: Bytes,
    writer: PipeWriter,
    deadline: Deadline,
) -> JoinHandle<io::Result<u64>> {
    tokio::spawn(async move {
        let result = produce(download, head, tail, &writer, deadline).await;
        match &result {
            Ok(_) => writer.close(),
            Err(e) => {
                tracing::warn!(error = %e, "Upload producer failed");
                writer
                    .close_with_error(io::Error::new(e.kind(), e.to_string()))
                    .await
            }
        }
        result
    })
}

async fn produce(
    download: reqwest::Response,
    head: Bytes,
    tail: Bytes,
    writer: &PipeWriter,
    deadline: Deadline,
) -> io::Result<u64> {
    writer.write(head).await?;

    let mut stream = download.bytes_stream();
    let mut copied = 0u64;
    loop {
        let next = tokio::select! {
            _ = writer.closed() => {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "upload body reader closed"));
            }
            next = timeout_at(deadline.at(), stream.next()) => next
                .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "upload deadline expired"))?,
        };
        match next {
            Some(Ok(chunk)) => {
                copied += chunk.len() as u64;
                writer.write(chunk).await?;
            }
            Some(Err(e)) => return Err(io::Error::new(io::ErrorKind::Other, e)),
            None => break,
        }
    }

    writer.write(tail).await?;
    Ok(copied)
}
