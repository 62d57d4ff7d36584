//! `multipart/form-data` encoding.
//!
//! Bodies are produced in pieces so the streaming upload can send the
//! head, the copied download and the tail separately.

use bytes::{BufMut, Bytes, BytesMut};

use crate::request::encoding::percent_encode;
use crate::request::Params;

const BOUNDARY_LEN: usize = 30;

/// Content type of every file part.
pub const FILE_PART_CONTENT_TYPE: &str = "application/octet-stream";

/// Encoder bound to one boundary.
#[derive(Debug, Clone)]
pub struct MultipartEncoder {
    boundary: String,
}

impl Default for MultipartEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartEncoder {
    /// Encoder with a random boundary.
    pub fn new() -> Self {
        let token: String = (0..BOUNDARY_LEN).map(|_| fastrand::alphanumeric()).collect();
        Self::with_boundary(format!("YopFormBoundary{}", token))
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// `multipart/form-data; boundary=...`.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// One text part per parameter value, values percent-encoded.
    pub fn fields(&self, params: &Params) -> Bytes {
        let mut buf = BytesMut::new();
        for (name, values) in params {
            for value in values {
                self.put_part_header(&mut buf, name, None);
                buf.put_slice(percent_encode(value).as_bytes());
                buf.put_slice(b"\r\n");
            }
        }
        buf.freeze()
    }

    /// Headers opening a file part; the file bytes follow directly.
    pub fn file_header(&self, field: &str, file_name: &str) -> Bytes {
        let mut buf = BytesMut::new();
        self.put_part_header(&mut buf, field, Some(file_name));
        buf.freeze()
    }

    /// Closes the last file part and the body.
    pub fn tail(&self) -> Bytes {
        Bytes::from(format!("\r\n{}", self.closing()))
    }

    /// Whole body in memory: fields, then each file as its own part.
    pub fn encode<'a, I>(&self, params: &Params, files: I) -> Bytes
    where
        I: IntoIterator<Item = (&'a str, &'a str, &'a [u8])>,
    {
        let mut buf = BytesMut::new();
        buf.put(self.fields(params));
        for (field, file_name, content) in files {
            buf.put(self.file_header(field, file_name));
            buf.put_slice(content);
            buf.put_slice(b"\r\n");
        }
        buf.put_slice(self.closing().as_bytes());
        buf.freeze()
    }

    fn closing(&self) -> String {
        format!("--{}--\r\n", self.boundary)
    }

    fn put_part_header(&self, buf: &mut BytesMut, name: &str, file_name: Option<&str>) {
        buf.put_slice(format!("--{}\r\n", self.boundary).as_bytes());
        buf.put_slice(b"Content-Disposition: form-data; name=\"");
        buf.put_slice(escape_quoted(name).as_bytes());
        buf.put_slice(b"\"");
        if let Some(file_name) = file_name {
            buf.put_slice(b"; filename=\"");
            buf.put_slice(escape_quoted(file_name).as_bytes());
            buf.put_slice(b"\"\r\n");
            buf.put_slice(format!("Content-Type: {}", FILE_PART_CONTENT_TYPE).as_bytes());
        }
        buf.put_slice(b"\r\n\r\n");
    }
}

/// Quoted-string escaping for disposition parameters.
fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        let mut out = Params::new();
        for (k, v) in pairs {
            out.entry(k.to_string()).or_default().push(v.to_string());
        }
        out
    }

    #[test]
    fn test_fields_before_files() {
        let encoder = MultipartEncoder::with_boundary("B");
        let body = encoder.encode(
            &params(&[("merchantNo", "100"), ("tag", "a b"), ("tag", "c")]),
            [("file", "report.pdf", b"%PDF".as_slice())],
        );
        let body = String::from_utf8(body.to_vec()).unwrap();

        let expected = "--B\r\nContent-Disposition: form-data; name=\"merchantNo\"\r\n\r\n100\r\n\
--B\r\nContent-Disposition: form-data; name=\"tag\"\r\n\r\na%20b\r\n\
--B\r\nContent-Disposition: form-data; name=\"tag\"\r\n\r\nc\r\n\
--B\r\nContent-Disposition: form-data; name=\"file\"; filename=\"report.pdf\"\r\n\
Content-Type: application/octet-stream\r\n\r\n%PDF\r\n\
--B--\r\n";
        assert_eq!(body, expected);
    }

    #[test]
    fn test_pieces_match_whole_body() {
        let encoder = MultipartEncoder::with_boundary("B");
        let p = params(&[("k", "v")]);
        let whole = encoder.encode(&p, [("file", "a.bin", b"xyz".as_slice())]);

        let mut pieces = Vec::new();
        pieces.extend_from_slice(&encoder.fields(&p));
        pieces.extend_from_slice(&encoder.file_header("file", "a.bin"));
        pieces.extend_from_slice(b"xyz");
        pieces.extend_from_slice(&encoder.tail());
        assert_eq!(whole.to_vec(), pieces);
    }

    #[test]
    fn test_names_escaped() {
        let encoder = MultipartEncoder::with_boundary("B");
        let header = encoder.file_header("file", "evil\"\r\nname.txt");
        let header = String::from_utf8(header.to_vec()).unwrap();
        assert!(header.contains("filename=\"evil%22%0D%0Aname.txt\""));
    }

    #[test]
    fn test_random_boundary() {
        let a = MultipartEncoder::new();
        let b = MultipartEncoder::new();
        assert_ne!(a.boundary(), b.boundary());
        assert!(a.content_type().starts_with("multipart/form-data; boundary=YopFormBoundary"));
    }
}
