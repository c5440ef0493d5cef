//! HTTP response building module
//!
//! The `ResponseSink` trait is what the dispatcher writes into. It also
//! provides the JSON body builders shared by the output helpers and the host.

use std::io;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde::Serialize;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Destination of a response: head first, then body chunks
///
/// Status and headers must be set before the first chunk is written; sinks
/// ignore head changes made afterwards.
pub trait ResponseSink {
    fn set_status(&mut self, status: StatusCode);
    fn insert_header(&mut self, name: HeaderName, value: HeaderValue);
    fn write_chunk(&mut self, chunk: Bytes) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
}

/// In-memory sink
///
/// Collects the whole response so it can be inspected after dispatch.
#[derive(Debug)]
pub struct BufferedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    flushes: usize,
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
            flushes: 0,
        }
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as text, if present and visible ASCII
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Number of `flush` calls seen
    pub const fn flushes(&self) -> usize {
        self.flushes
    }
}

impl Default for BufferedResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSink for BufferedResponse {
    fn set_status(&mut self, status: StatusCode) {
        if self.body.is_empty() {
            self.status = status;
        }
    }

    fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        if self.body.is_empty() {
            self.headers.insert(name, value);
        }
    }

    fn write_chunk(&mut self, chunk: Bytes) -> io::Result<()> {
        self.body.extend_from_slice(&chunk);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

/// Serialize a payload as compact JSON; non-ASCII text is left unescaped
pub fn json_body<T: Serialize + ?Sized>(payload: &T) -> serde_json::Result<Bytes> {
    serde_json::to_vec(payload).map(Bytes::from)
}

/// `{"error": message}` body
pub fn error_body(message: &str) -> Bytes {
    let body = serde_json::json!({ "error": message });
    Bytes::from(body.to_string())
}

/// Build a complete JSON response outside the dispatcher
pub fn build_json_response(status: StatusCode, body: Bytes) -> Response<Full<Bytes>> {
    let length = body.len();
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
        .header(CONTENT_LENGTH, length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            crate::logger::log_error(&format!("Failed to build {status} response: {e}"));
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build a JSON error response outside the dispatcher
pub fn build_error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    build_json_response(status, error_body(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_body_keeps_unicode() {
        let body = json_body(&serde_json::json!({"a": "é"})).unwrap();
        assert_eq!(std::str::from_utf8(&body).unwrap(), r#"{"a":"é"}"#);
    }

    #[test]
    fn test_error_body() {
        let body = error_body("quote \" inside");
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "quote \" inside");
    }

    #[test]
    fn test_buffered_head_frozen_after_body() {
        let mut sink = BufferedResponse::new();
        sink.set_status(StatusCode::CREATED);
        sink.write_chunk(Bytes::from_static(b"x")).unwrap();
        sink.set_status(StatusCode::INTERNAL_SERVER_ERROR);
        sink.insert_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert_eq!(sink.status(), StatusCode::CREATED);
        assert!(sink.header("content-type").is_none());
    }

    #[test]
    fn test_build_error_response() {
        let response = build_error_response(StatusCode::PAYLOAD_TOO_LARGE, "too big");
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(response.headers()[CONTENT_TYPE], JSON_CONTENT_TYPE);
        assert_eq!(response.headers()[CONTENT_LENGTH], "19");
    }
}
