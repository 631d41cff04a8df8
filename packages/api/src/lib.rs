//! strand public API
//!
//! Immutable HTTP request descriptions with pluggable backends. Describe a
//! request by chaining, then hand it to any [`Backend`]:
//!
//! ```no_run
//! use strand::{AuthExt, JsonExt, as_json};
//!
//! # async fn run(backend: &impl strand::Backend<Capabilities = strand::NoCapabilities>) -> strand::Result<()> {
//! #[derive(serde::Deserialize)]
//! struct Created {
//!     id: u64,
//! }
//!
//! let response = strand::post("https://api.example.com/items")
//!     .bearer_auth("token")
//!     .json_body(&serde_json::json!({ "name": "widget" }))
//!     .response(as_json::<Created>())
//!     .send(backend)
//!     .await?;
//! if let Ok(created) = response.body {
//!     println!("created {}", created.id);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod builder;
pub mod response;

// Re-export all public API components
pub use builder::{
    AUTH_SCHEME_TAG, AcceptValue, AuthExt, AuthScheme, ContentType, DEFAULT_ACCEPT_ENCODING,
    FormExt, HeaderExt, JsonExt, auth_scheme, basic_request, delete, empty_request, get, head,
    header, options, patch, post, put,
};
pub use response::{ResponseError, as_json, as_json_always};

// Re-export important types from client package
pub use strand_client::{
    Backend, BackendConfig, BlockingBackend, Capabilities, Complete, Encoding, Error, Header,
    HttpBackend, HttpError, IntoUri, NoCapabilities, Part, Partial, Request, RequestOptions,
    Response, ResponseAs, ResponseMetadata, Result, Streaming, StreamingAndWebSockets, Transport,
    WebSockets, as_bytes, as_bytes_or_error, as_file, as_stream, as_stream_with, as_string,
    as_string_always, as_string_with, as_websocket, as_websocket_stream, ignore,
};

/// Main entry point providing static builder methods
pub struct Strand;

impl Strand {
    /// Shorthand for [`empty_request`]
    #[must_use]
    pub fn empty_request() -> Request {
        builder::empty_request()
    }

    /// Shorthand for [`basic_request`]
    #[must_use]
    pub fn basic_request() -> Request {
        builder::basic_request()
    }
}
