//! Per-request handle given to verb handlers
//!
//! Gives read access to the parsed request and owns the output helpers.
//! Exactly one output helper may succeed per exchange.

use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;

use hyper::body::Bytes;
use hyper::header::{
    HeaderValue, ALLOW, CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, EXPIRES,
    PRAGMA,
};
use hyper::StatusCode;
use serde::Serialize;

use super::{HandlerResult, Sent};
use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::http::mime::OCTET_STREAM;
use crate::http::{error_body, json_body, ResponseSink, JSON_CONTENT_TYPE};
use crate::request::RestRequest;

/// Size of the blocks a download is streamed in
pub const DOWNLOAD_CHUNK_SIZE: usize = 8 * 1024;

const FILE_MISSING: &str = "file does not exist";
const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

/// A file to stream as an attachment
#[derive(Debug, Clone)]
pub struct FileDownload {
    path: PathBuf,
    name: String,
    size: Option<u64>,
    mime_type: String,
}

impl FileDownload {
    /// Serve `path` under the attachment name `name`
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            size: None,
            mime_type: OCTET_STREAM.to_string(),
        }
    }

    /// Declared `Content-Length`; defaults to the file's length on disk
    #[must_use]
    pub const fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }
}

pub struct Exchange<'a> {
    config: &'a ServiceConfig,
    request: &'a RestRequest,
    sink: &'a mut dyn ResponseSink,
    status: Option<StatusCode>,
}

impl<'a> Exchange<'a> {
    pub(crate) fn new(
        config: &'a ServiceConfig,
        request: &'a RestRequest,
        sink: &'a mut dyn ResponseSink,
    ) -> Self {
        Self {
            config,
            request,
            sink,
            status: None,
        }
    }

    pub const fn config(&self) -> &'a ServiceConfig {
        self.config
    }

    pub const fn request(&self) -> &'a RestRequest {
        self.request
    }

    pub fn resources(&self) -> &'a [String] {
        self.request.resources()
    }

    pub fn param(&self, name: &str) -> Option<&'a str> {
        self.request.param(name)
    }

    /// Absolute URL of a resource of this service
    pub fn resource_url<S: AsRef<str>>(&self, segments: &[S]) -> String {
        self.config.resource_url(segments)
    }

    /// Status of the response, once one was committed
    pub const fn committed_status(&self) -> Option<StatusCode> {
        self.status
    }

    pub const fn is_committed(&self) -> bool {
        self.status.is_some()
    }

    /// Send `payload` as JSON with status 200
    pub fn send_json<T: Serialize + ?Sized>(&mut self, payload: &T) -> HandlerResult {
        self.send_json_status(payload, StatusCode::OK)
    }

    /// Send `payload` as JSON; non-ASCII characters are not escaped
    pub fn send_json_status<T: Serialize + ?Sized>(
        &mut self,
        payload: &T,
        status: StatusCode,
    ) -> HandlerResult {
        let body = json_body(payload)?;
        self.send_body(status, body)
    }

    /// Send `{"error": message}` with status 400
    pub fn send_error(&mut self, message: impl AsRef<str>) -> HandlerResult {
        self.send_error_status(message, StatusCode::BAD_REQUEST)
    }

    pub fn send_error_status(
        &mut self,
        message: impl AsRef<str>,
        status: StatusCode,
    ) -> HandlerResult {
        self.send_body(status, error_body(message.as_ref()))
    }

    /// `204 No Content` listing the dispatched methods
    pub fn send_allow(&mut self) -> HandlerResult {
        self.begin(StatusCode::NO_CONTENT)?;
        self.sink
            .insert_header(ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
        self.sink.flush()?;
        Ok(Sent::new())
    }

    /// Stream a file as an attachment
    ///
    /// A missing path (or one that is not a regular file) answers 400
    /// `file does not exist` and nothing else is sent. The body is read and
    /// written in `DOWNLOAD_CHUNK_SIZE` blocks with a flush after each block.
    pub fn send_file(&mut self, download: FileDownload) -> HandlerResult {
        if !download.path.is_file() {
            return self.send_error(FILE_MISSING);
        }
        let mut file = File::open(&download.path)?;
        let size = match download.size {
            Some(size) => size,
            None => file.metadata()?.len(),
        };
        let content_type = HeaderValue::from_str(&download.mime_type)?;
        let disposition = HeaderValue::from_str(&format!(
            "attachment; filename=\"{}\"",
            quote_filename(&download.name)
        ))?;

        self.begin(StatusCode::OK)?;
        self.sink.insert_header(CONTENT_TYPE, content_type);
        self.sink.insert_header(CONTENT_DISPOSITION, disposition);
        self.sink.insert_header(EXPIRES, HeaderValue::from_static("0"));
        self.sink
            .insert_header(CACHE_CONTROL, HeaderValue::from_static("must-revalidate"));
        self.sink.insert_header(PRAGMA, HeaderValue::from_static("public"));
        self.sink.insert_header(CONTENT_LENGTH, HeaderValue::from(size));

        let mut buf = vec![0_u8; DOWNLOAD_CHUNK_SIZE];
        let mut chunks = 0_usize;
        loop {
            let read = read_block(&mut file, &mut buf)?;
            if read == 0 {
                break;
            }
            self.sink.write_chunk(Bytes::copy_from_slice(&buf[..read]))?;
            self.sink.flush()?;
            chunks += 1;
        }
        if chunks == 0 {
            // empty file: the head still has to go out
            self.sink.flush()?;
        }
        Ok(Sent::new())
    }

    fn send_body(&mut self, status: StatusCode, body: Bytes) -> HandlerResult {
        self.begin(status)?;
        self.sink
            .insert_header(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        self.sink
            .insert_header(CONTENT_LENGTH, HeaderValue::from(body.len()));
        self.sink.write_chunk(body)?;
        self.sink.flush()?;
        Ok(Sent::new())
    }

    fn begin(&mut self, status: StatusCode) -> Result<(), ServiceError> {
        if self.status.is_some() {
            return Err(ServiceError::AlreadySent);
        }
        self.status = Some(status);
        self.sink.set_status(status);
        Ok(())
    }
}

/// Fill `buf` from `reader`; a short count only happens at end of file
fn read_block(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn quote_filename(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}
