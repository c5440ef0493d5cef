//! HTTP protocol layer module
//!
//! Response sinks, JSON body builders and MIME detection, independent of
//! any particular service.

pub mod body;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use body::{ChannelBody, PendingResponse, ResponseHead, StreamingResponse};
pub use response::{
    build_error_response, build_json_response, error_body, json_body, BufferedResponse,
    ResponseSink, JSON_CONTENT_TYPE,
};
