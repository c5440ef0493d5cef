//! Verb dispatch
//!
//! Entry point of request processing: parses the request, lets the service
//! initialize, then runs the hook matching the verb.

use std::sync::Arc;

use hyper::StatusCode;

use super::{Exchange, RestService};
use crate::config::ServiceConfig;
use crate::http::ResponseSink;
use crate::logger;
use crate::request::{RawRequest, RestRequest, Verb};

/// Owns one request and the service answering it
pub struct RequestDispatcher<S> {
    config: Arc<ServiceConfig>,
    request: RestRequest,
    service: S,
}

impl<S: RestService> RequestDispatcher<S> {
    /// Parse `raw` and run the service's `init` hook
    pub fn new(config: Arc<ServiceConfig>, raw: RawRequest, mut service: S) -> Self {
        let request = RestRequest::parse(&config, raw);
        service.init(&request);
        Self {
            config,
            request,
            service,
        }
    }

    pub const fn request(&self) -> &RestRequest {
        &self.request
    }

    pub const fn service(&self) -> &S {
        &self.service
    }

    /// Dispatch on the verb and write the response into `sink`
    ///
    /// Unsupported verbs answer 400. A handler error becomes a 500 JSON
    /// error unless output was already committed, in which case it is only
    /// logged. Returns the committed status.
    pub fn run(&mut self, sink: &mut dyn ResponseSink) -> StatusCode {
        let verb = self.request.verb();
        logger::log_dispatch(verb.as_str(), self.request.uri(), self.request.resources());

        let mut ex = Exchange::new(&self.config, &self.request, sink);
        let result = match verb {
            Verb::Get => self.service.get(&mut ex),
            Verb::Post => self.service.post(&mut ex),
            Verb::Put => self.service.put(&mut ex),
            Verb::Delete => self.service.delete(&mut ex),
            Verb::Options => self.service.options(&mut ex),
            Verb::Other(method) => ex.send_error(format!("unsupported method: {method}")),
        };

        if let Err(err) = result {
            logger::log_handler_failure(verb.as_str(), self.request.uri(), &err);
            if ex.is_committed() {
                logger::log_warning("response already committed, failure not reported to client");
            } else if let Err(e) =
                ex.send_error_status(err.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
            {
                logger::log_error(&format!("Failed to send error response: {e}"));
            }
        }

        ex.committed_status()
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}
