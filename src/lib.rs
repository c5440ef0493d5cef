//! Base dispatcher for REST web services
//!
//! A service implements [`service::RestService`]; the dispatcher parses the
//! request URI into resource segments, merges query and form parameters and
//! calls the hook matching the HTTP verb. [`server`] hosts services on hyper.

pub mod config;
pub mod error;
pub mod http;
pub mod logger;
pub mod request;
pub mod server;
pub mod service;

pub use error::ServiceError;
pub use service::{Exchange, HandlerResult, RequestDispatcher, RestService};
