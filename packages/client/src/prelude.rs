//! strand client prelude
//!
//! The types most callers need to describe, send and read requests.

// Request descriptions
pub use crate::builder::{
    Complete, NoCapabilities, Partial, Request, RequestOptions, ResponseAs, Streaming, WebSockets,
};
pub use crate::builder::response_as::{
    as_bytes, as_bytes_or_error, as_file, as_stream, as_stream_with, as_string, as_string_always,
    as_string_with, as_websocket, as_websocket_stream, ignore,
};

// Bodies and responses
pub use crate::http::{Encoding, Header, Part, Response, ResponseMetadata};

// Backends
pub use crate::backend::{
    Backend, BlockingBackend, BodyStream, Frame, HttpBackend, Transport, TransportResponse,
    WebSocket, WireRequest,
};
pub use crate::config::BackendConfig;

// Error types
pub use crate::error::{Error, HttpError, Result};

// HTTP standard types from http crate
pub use ::http::{HeaderMap, Method, StatusCode, Uri, Version};
