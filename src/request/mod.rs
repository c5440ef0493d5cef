//! Request context and parsing
//!
//! A `RawRequest` carries what the transport received; `RestRequest` is the
//! parsed, read-only view handlers work with.

pub mod params;
pub mod resources;

use std::fmt;

use hyper::body::Bytes;
use serde::de::DeserializeOwned;

use crate::config::ServiceConfig;
use crate::error::ServiceError;

pub use params::{parse_params, Params};
pub use resources::parse_resources;

/// HTTP verb a request is dispatched on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
    Options,
    /// Any other method, kept verbatim for error reporting
    Other(String),
}

impl Verb {
    /// Parse a method string; matching is case-sensitive
    pub fn parse(method: &str) -> Self {
        match method {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            "OPTIONS" => Self::Options,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Other(method) => method,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the transport received, passed explicitly to the dispatcher
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    pub method: String,
    /// Path and optional query string, as sent on the request line
    pub uri: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl RawRequest {
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            content_type: None,
            body: Bytes::new(),
        }
    }

    #[must_use]
    pub fn with_body(mut self, content_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        self.content_type = Some(content_type.into());
        self.body = body.into();
        self
    }
}

/// Parsed request: verb, resources and parameters
///
/// Built once per request; there are no mutating accessors.
#[derive(Debug, Clone)]
pub struct RestRequest {
    verb: Verb,
    uri: String,
    resources: Vec<String>,
    params: Params,
    body: Bytes,
}

impl RestRequest {
    pub fn parse(config: &ServiceConfig, raw: RawRequest) -> Self {
        let resources = parse_resources(&raw.uri, &config.base_uri, config.separator());
        let params = parse_params(&raw.uri, raw.content_type.as_deref(), &raw.body);
        Self {
            verb: Verb::parse(&raw.method),
            uri: raw.uri,
            resources,
            params,
            body: raw.body,
        }
    }

    pub const fn verb(&self) -> &Verb {
        &self.verb
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    /// Resource at `index`, if the path has that many segments
    pub fn resource(&self, index: usize) -> Option<&str> {
        self.resources.get(index).map(String::as_str)
    }

    pub const fn params(&self) -> &Params {
        &self.params
    }

    /// Look up a parameter
    ///
    /// When `collection` is a non-empty map it is searched instead of the
    /// request's own parameters. A parameter that is present, even with an
    /// empty value, is returned as is; `default` is only used when it is absent.
    pub fn get_param<'a>(
        &'a self,
        name: &str,
        default: Option<&'a str>,
        collection: Option<&'a Params>,
    ) -> Option<&'a str> {
        let params = collection
            .filter(|c| !c.is_empty())
            .unwrap_or(&self.params);
        params.get(name).map(String::as_str).or(default)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.get_param(name, None, None)
    }

    pub fn param_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get_param(name, Some(default), None).unwrap_or(default)
    }

    /// Raw request body
    pub fn read_request_body(&self) -> &[u8] {
        &self.body
    }

    /// Decode the request body as JSON
    pub fn read_json<T: DeserializeOwned>(&self) -> Result<T, ServiceError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: RawRequest) -> RestRequest {
        RestRequest::parse(&ServiceConfig::new("http://localhost", "/api"), raw)
    }

    #[test]
    fn test_verb_parse() {
        assert_eq!(Verb::parse("GET"), Verb::Get);
        assert_eq!(Verb::parse("OPTIONS"), Verb::Options);
        assert_eq!(Verb::parse("PATCH"), Verb::Other("PATCH".to_string()));
        // case-sensitive like the request line
        assert_eq!(Verb::parse("get"), Verb::Other("get".to_string()));
        assert_eq!(Verb::parse("PATCH").to_string(), "PATCH");
    }

    #[test]
    fn test_parse_request() {
        let req = parse(RawRequest::new("GET", "/api/taxa/42?lang=fr"));
        assert_eq!(req.verb(), &Verb::Get);
        assert_eq!(req.resources(), ["taxa", "42"]);
        assert_eq!(req.resource(1), Some("42"));
        assert_eq!(req.resource(2), None);
        assert_eq!(req.param("lang"), Some("fr"));
        assert_eq!(req.uri(), "/api/taxa/42?lang=fr");
    }

    #[test]
    fn test_get_param_default_and_empty() {
        let req = parse(RawRequest::new("GET", "/api/a?x="));
        assert_eq!(req.get_param("x", Some("default"), None), Some(""));
        assert_eq!(req.get_param("y", Some("default"), None), Some("default"));
        assert_eq!(req.get_param("y", None, None), None);
        assert_eq!(req.param_or("y", "default"), "default");
        assert_eq!(req.param_or("x", "default"), "");
    }

    #[test]
    fn test_get_param_override_collection() {
        let req = parse(RawRequest::new("GET", "/api/a?x=own&z=own"));
        let mut collection = Params::new();
        collection.insert("x".to_string(), "y".to_string());
        assert_eq!(req.get_param("x", Some("default"), Some(&collection)), Some("y"));
        // only the collection is searched
        assert_eq!(req.get_param("z", Some("default"), Some(&collection)), Some("default"));
        // an empty collection falls back to the request's parameters
        let empty = Params::new();
        assert_eq!(req.get_param("x", None, Some(&empty)), Some("own"));
    }

    #[test]
    fn test_read_body() {
        let req = parse(
            RawRequest::new("POST", "/api/notes").with_body("application/json", r#"{"n":3}"#),
        );
        assert_eq!(req.read_request_body(), br#"{"n":3}"#);
        let value: serde_json::Value = req.read_json().unwrap();
        assert_eq!(value["n"], 3);
        assert!(req.params().is_empty());
    }

    #[test]
    fn test_read_json_invalid() {
        let req = parse(RawRequest::new("POST", "/api/notes").with_body("application/json", "{"));
        let result: Result<serde_json::Value, _> = req.read_json();
        assert!(matches!(result, Err(ServiceError::Json(_))));
    }
}
