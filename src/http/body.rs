//! Streaming response body
//!
//! `StreamingResponse` is a `ResponseSink` living on a blocking thread. The
//! head travels through a oneshot channel when it is committed, body chunks
//! through a bounded channel drained by `ChannelBody` on the hyper side.

use std::convert::Infallible;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use hyper::body::{Body, Bytes, Frame};
use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use hyper::StatusCode;
use tokio::sync::{mpsc, oneshot};

use super::response::ResponseSink;

/// Chunks buffered between the writer and the connection
const CHANNEL_CAPACITY: usize = 4;

/// Status line and headers of a streamed response
#[derive(Debug)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

/// Sink half of a streamed response
pub struct StreamingResponse {
    status: StatusCode,
    headers: HeaderMap,
    head_tx: Option<oneshot::Sender<ResponseHead>>,
    chunk_tx: mpsc::Sender<Bytes>,
}

/// Receiving half: the head and the body
pub struct PendingResponse {
    pub head: oneshot::Receiver<ResponseHead>,
    pub body: ChannelBody,
}

impl StreamingResponse {
    pub fn channel() -> (Self, PendingResponse) {
        let (head_tx, head_rx) = oneshot::channel();
        let (chunk_tx, chunk_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let sink = Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            head_tx: Some(head_tx),
            chunk_tx,
        };
        let pending = PendingResponse {
            head: head_rx,
            body: ChannelBody { rx: chunk_rx },
        };
        (sink, pending)
    }

    /// Send the head if it has not been sent yet
    fn commit(&mut self) -> io::Result<()> {
        let Some(head_tx) = self.head_tx.take() else {
            return Ok(());
        };
        let head = ResponseHead {
            status: self.status,
            headers: std::mem::take(&mut self.headers),
        };
        head_tx
            .send(head)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "response receiver dropped"))
    }

    /// Commit the head and close the body
    pub fn finish(mut self) -> io::Result<()> {
        self.commit()
    }
}

impl ResponseSink for StreamingResponse {
    fn set_status(&mut self, status: StatusCode) {
        if self.head_tx.is_some() {
            self.status = status;
        }
    }

    fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        if self.head_tx.is_some() {
            self.headers.insert(name, value);
        }
    }

    fn write_chunk(&mut self, chunk: Bytes) -> io::Result<()> {
        self.commit()?;
        self.chunk_tx
            .blocking_send(chunk)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "client went away"))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.commit()
    }
}

/// Hyper body fed by a `StreamingResponse`
pub struct ChannelBody {
    rx: mpsc::Receiver<Bytes>,
}

impl Body for ChannelBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        self.rx
            .poll_recv(cx)
            .map(|chunk| chunk.map(|data| Ok(Frame::data(data))))
    }
}
