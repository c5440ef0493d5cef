//! Hyper adapter for REST services
//!
//! Turns a hyper request into a `RawRequest`, runs the dispatcher on a
//! blocking thread and streams whatever it writes back to the client.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, SERVER, USER_AGENT};
use hyper::{Request, Response, StatusCode, Version};

use crate::config::{Config, ServiceConfig};
use crate::http::{build_error_response, StreamingResponse};
use crate::logger::{self, AccessLogEntry};
use crate::request::RawRequest;
use crate::service::{RequestDispatcher, RestService};

/// Response body type produced by the host
pub type HostBody = BoxBody<Bytes, Infallible>;

/// Serves one `RestService` type; a fresh service is built for every request
pub struct RestHost<S> {
    config: Arc<Config>,
    service_config: Arc<ServiceConfig>,
    factory: Arc<dyn Fn() -> S + Send + Sync>,
    server_header: Option<HeaderValue>,
}

impl<S> RestHost<S>
where
    S: RestService + Send + 'static,
{
    pub fn new(config: Arc<Config>, factory: impl Fn() -> S + Send + Sync + 'static) -> Self {
        let server_header = HeaderValue::from_str(&config.http.server_name)
            .map_err(|e| logger::log_warning(&format!("Ignoring invalid server_name: {e}")))
            .ok();
        Self {
            service_config: Arc::new(config.service.clone()),
            config,
            factory: Arc::new(factory),
            server_header,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Answer one HTTP request
    pub async fn handle<B>(
        &self,
        req: Request<B>,
        remote_addr: Option<SocketAddr>,
    ) -> Result<Response<HostBody>, Infallible>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let started = Instant::now();
        let (parts, body) = req.into_parts();
        let uri = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_string(), |pq| pq.as_str().to_string());
        let content_type = header_text(&parts.headers, CONTENT_TYPE.as_str());

        let mut entry = AccessLogEntry::new(
            remote_addr.map_or_else(|| "-".to_string(), |a| a.ip().to_string()),
            parts.method.to_string(),
            uri.clone(),
        );
        entry.http_version = version_label(parts.version).to_string();
        entry.user_agent = header_text(&parts.headers, USER_AGENT.as_str());

        let max_body = usize::try_from(self.config.http.max_body_size).unwrap_or(usize::MAX);
        let mut response = match Limited::new(body, max_body).collect().await {
            Ok(collected) => {
                let raw = RawRequest {
                    method: parts.method.to_string(),
                    uri,
                    content_type,
                    body: collected.to_bytes(),
                };
                self.dispatch(raw).await
            }
            Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                logger::log_warning(&format!(
                    "Request body too large (max: {} bytes)",
                    self.config.http.max_body_size
                ));
                build_error_response(StatusCode::PAYLOAD_TOO_LARGE, "request body too large")
                    .map(BodyExt::boxed)
            }
            Err(e) => {
                logger::log_warning(&format!("Failed to read request body: {e}"));
                build_error_response(StatusCode::BAD_REQUEST, "failed to read request body")
                    .map(BodyExt::boxed)
            }
        };

        if let Some(server) = &self.server_header {
            response.headers_mut().insert(SERVER, server.clone());
        }

        if self.config.logging.access_log {
            entry.status = response.status().as_u16();
            entry.body_bytes = header_text(response.headers(), CONTENT_LENGTH.as_str())
                .and_then(|v| v.parse().ok());
            entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
            logger::log_access(&entry, &self.config.logging.access_log_format);
        }

        Ok(response)
    }

    /// Run the dispatcher off the async workers and wait for the head
    async fn dispatch(&self, raw: RawRequest) -> Response<HostBody> {
        let (mut sink, pending) = StreamingResponse::channel();
        let config = Arc::clone(&self.service_config);
        let factory = Arc::clone(&self.factory);

        tokio::task::spawn_blocking(move || {
            let mut dispatcher = RequestDispatcher::new(config, raw, factory());
            dispatcher.run(&mut sink);
            if let Err(e) = sink.finish() {
                logger::log_debug(&format!("Client gone before response head: {e}"));
            }
        });

        match pending.head.await {
            Ok(head) => {
                let mut response = Response::new(pending.body.boxed());
                *response.status_mut() = head.status;
                *response.headers_mut() = head.headers;
                response
            }
            Err(_) => {
                logger::log_error("Handler panicked before sending a response");
                build_error_response(StatusCode::INTERNAL_SERVER_ERROR, "handler panicked")
                    .map(BodyExt::boxed)
            }
        }
    }
}

fn header_text(headers: &hyper::HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{Exchange, FileDownload, HandlerResult};
    use http_body_util::Full;

    struct Notes;

    impl RestService for Notes {
        fn get(&mut self, ex: &mut Exchange<'_>) -> HandlerResult {
            match ex.resources() {
                [first] if first == "panic" => panic!("boom"),
                [first] if first == "missing" => {
                    ex.send_file(FileDownload::new("/nonexistent/restbase.bin", "x.bin"))
                }
                [first, name] if first == "download" => {
                    let path = std::env::temp_dir().join(name);
                    ex.send_file(FileDownload::new(path, name.as_str()))
                }
                resources => ex.send_json(&serde_json::json!({ "resources": resources })),
            }
        }

        fn post(&mut self, ex: &mut Exchange<'_>) -> HandlerResult {
            let params = ex.request().params().clone();
            ex.send_json(&params)
        }

        fn put(&mut self, ex: &mut Exchange<'_>) -> HandlerResult {
            ex.send_error("read-only")
        }

        fn delete(&mut self, ex: &mut Exchange<'_>) -> HandlerResult {
            ex.send_error("read-only")
        }
    }

    fn host(max_body_size: u64) -> RestHost<Notes> {
        let mut config = Config::from_toml_str("").unwrap();
        config.http.max_body_size = max_body_size;
        config.http.server_name = "restbase-test".to_string();
        config.logging.access_log = false;
        RestHost::new(Arc::new(config), || Notes)
    }

    fn request(method: &str, uri: &str, body: &'static str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap()
    }

    async fn body_json(response: Response<HostBody>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_get_streams_json() {
        let response = host(1024)
            .handle(request("GET", "/api/a/b?x=1", ""), None)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[SERVER], "restbase-test");
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(body_json(response).await["resources"], serde_json::json!(["a", "b"]));
    }

    #[tokio::test]
    async fn test_form_body_params() {
        let response = host(1024)
            .handle(request("POST", "/api/notes?title=query", "title=body&tag=x"), None)
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["title"], "body");
        assert_eq!(json["tag"], "x");
    }

    #[tokio::test]
    async fn test_body_too_large() {
        let response = host(4)
            .handle(request("POST", "/api/notes", "title=too-long"), None)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(response.headers()[SERVER], "restbase-test");
        assert_eq!(body_json(response).await["error"], "request body too large");
    }

    #[tokio::test]
    async fn test_unsupported_method() {
        let response = host(1024)
            .handle(request("PATCH", "/api/notes", ""), None)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "unsupported method: PATCH");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let response = host(1024)
            .handle(request("GET", "/api/missing", ""), None)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get("content-disposition").is_none());
        assert_eq!(body_json(response).await["error"], "file does not exist");
    }

    #[tokio::test]
    async fn test_download_streams_whole_file() {
        let name = format!("restbase-host-{}.bin", std::process::id());
        let path = std::env::temp_dir().join(&name);
        let contents: Vec<u8> = (0..300_000_u32).map(|i| (i % 253) as u8).collect();
        std::fs::write(&path, &contents).unwrap();

        let uri = format!("/api/download/{name}");
        let response = host(1024)
            .handle(request("GET", &uri, ""), None)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let declared = response.headers()[CONTENT_LENGTH].to_str().unwrap().to_string();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let _ = std::fs::remove_file(&path);

        assert_eq!(declared, body.len().to_string());
        assert_eq!(&body[..], &contents[..]);
    }

    #[tokio::test]
    async fn test_panicking_handler() {
        let response = host(1024)
            .handle(request("GET", "/api/panic", ""), None)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "handler panicked");
    }

    #[test]
    fn test_version_label() {
        assert_eq!(version_label(Version::HTTP_11), "1.1");
        assert_eq!(version_label(Version::HTTP_2), "2");
    }
}
