//! REST service layer
//!
//! Implement `RestService` for a type, then hand an instance to a
//! `RequestDispatcher` together with the request it should answer:
//!
//! ```
//! use std::sync::Arc;
//! use restbase::config::ServiceConfig;
//! use restbase::http::BufferedResponse;
//! use restbase::request::RawRequest;
//! use restbase::service::{Exchange, HandlerResult, RequestDispatcher, RestService};
//!
//! struct Hello;
//!
//! impl RestService for Hello {
//!     fn get(&mut self, ex: &mut Exchange<'_>) -> HandlerResult {
//!         let name = ex.request().resource(0).unwrap_or("world").to_string();
//!         ex.send_json(&serde_json::json!({ "hello": name }))
//!     }
//!     fn post(&mut self, ex: &mut Exchange<'_>) -> HandlerResult {
//!         ex.send_error("read-only")
//!     }
//!     fn put(&mut self, ex: &mut Exchange<'_>) -> HandlerResult {
//!         ex.send_error("read-only")
//!     }
//!     fn delete(&mut self, ex: &mut Exchange<'_>) -> HandlerResult {
//!         ex.send_error("read-only")
//!     }
//! }
//!
//! let config = Arc::new(ServiceConfig::new("http://localhost", "/api"));
//! let mut dispatcher = RequestDispatcher::new(config, RawRequest::new("GET", "/api/rust"), Hello);
//! let mut sink = BufferedResponse::new();
//! dispatcher.run(&mut sink);
//! assert_eq!(sink.body(), br#"{"hello":"rust"}"#);
//! ```

mod dispatcher;
mod exchange;

pub use dispatcher::RequestDispatcher;
pub use exchange::{Exchange, FileDownload, DOWNLOAD_CHUNK_SIZE};

use crate::error::ServiceError;
use crate::request::RestRequest;

/// Proof that a response was written
///
/// Only the output helpers of `Exchange` create it, so a handler returning
/// `Ok` has always produced its response.
#[derive(Debug)]
#[must_use]
pub struct Sent(());

impl Sent {
    pub(crate) const fn new() -> Self {
        Self(())
    }
}

/// Result of a verb handler
pub type HandlerResult = Result<Sent, ServiceError>;

/// Verb hooks of a REST endpoint
///
/// Handlers end with one output call: `return ex.send_json(&payload);`.
/// Returning an error before anything was sent produces a 500 response
/// carrying the error message.
pub trait RestService {
    /// Called once per request after parsing, before dispatch
    fn init(&mut self, _request: &RestRequest) {}

    fn get(&mut self, ex: &mut Exchange<'_>) -> HandlerResult;

    fn post(&mut self, ex: &mut Exchange<'_>) -> HandlerResult;

    fn put(&mut self, ex: &mut Exchange<'_>) -> HandlerResult;

    fn delete(&mut self, ex: &mut Exchange<'_>) -> HandlerResult;

    /// Answers `204 No Content` with an `Allow` header
    ///
    /// Cross-origin (CORS) preflight support requires overriding this hook.
    fn options(&mut self, ex: &mut Exchange<'_>) -> HandlerResult {
        ex.send_allow()
    }
}
