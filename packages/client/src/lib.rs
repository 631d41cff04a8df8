//! # strand client core
//!
//! Immutable HTTP request descriptions and the machinery that turns them into
//! responses.
//!
//! ## Features
//!
//! - **Immutable request values** built by chaining; every step returns a new description
//! - **Compile-time capability checks** so a streaming request never reaches a backend without streaming support
//! - **Declared response strategies**: ignore, bytes, text, file, stream, websocket
//! - **Streaming exchange coordinator** that releases connections deterministically
//! - **Transparent decompression** (gzip, deflate, brotli) and response length limits
//! - **Pluggable transports** behind a narrow [`Transport`] trait
//!
//! ## Usage
//!
//! ```rust,ignore
//! use strand_client::prelude::*;
//!
//! let backend = HttpBackend::new(my_transport);
//! let response = Request::new()
//!     .header("Accept", "text/plain")
//!     .get("http://example.test/")
//!     .response(as_bytes())
//!     .send(&backend)
//!     .await?;
//! assert!(response.is_success());
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod backend;
pub mod builder;
pub mod config;
pub mod error;
pub mod http;

pub mod prelude;

pub use crate::backend::{Backend, BlockingBackend, HttpBackend, Transport};
pub use crate::builder::response_as::{
    as_bytes, as_bytes_or_error, as_file, as_stream, as_stream_with, as_string, as_string_always,
    as_string_with, as_websocket, as_websocket_stream, ignore,
};
pub use crate::builder::{
    Capabilities, CapabilitySet, Complete, NoCapabilities, Partial, Request, RequestOptions,
    ResponseAs, Streaming, StreamingAndWebSockets, Supports, Union, WebSockets,
};
pub use crate::config::BackendConfig;
pub use crate::error::{Error, HttpError, Kind, Result};
pub use crate::http::{Encoding, Header, IntoUri, Part, RequestBody, RequestMetadata, Response, ResponseMetadata};
