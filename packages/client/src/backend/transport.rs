//! Transport collaborator contract
//!
//! A transport performs one network exchange for a [`WireRequest`] and hands
//! back the response head, a lazy body and a [`Release`] hook that returns
//! the connection. Everything above the socket (decompression, length
//! limits, materialization, cleanup ordering) is done by the coordinator.

use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures::Sink;
use futures::stream::BoxStream;
use http::{HeaderMap, Method, StatusCode, Uri, Version};

use crate::backend::websocket::Frame;
use crate::builder::{Capabilities, CapabilitySet};
use crate::error::{self, BoxError, Kind};
use crate::http::body::ByteStream;

/// A request as handed to the transport.
pub struct WireRequest {
    pub method: Method,
    pub uri: Uri,
    /// Protocol version requested by the caller; transports must honor it verbatim.
    pub version: Option<Version>,
    pub headers: HeaderMap,
    pub body: WireBody,
}

impl fmt::Debug for WireRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WireRequest")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("version", &self.version)
            .field("headers", &self.headers.len())
            .field("body", &self.body)
            .finish()
    }
}

/// A request payload as a byte producer.
pub enum WireBody {
    Empty,
    Bytes(Bytes),
    Stream(ByteStream),
}

impl WireBody {
    /// Payload length when it is known up front.
    #[must_use]
    pub fn known_length(&self) -> Option<u64> {
        match self {
            WireBody::Empty | WireBody::Stream(_) => None,
            WireBody::Bytes(bytes) => Some(bytes.len() as u64),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, WireBody::Empty)
    }
}

impl fmt::Debug for WireBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireBody::Empty => f.write_str("Empty"),
            WireBody::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            WireBody::Stream(_) => f.write_str("Stream"),
        }
    }
}

/// Hook that returns or closes the connection behind a response.
///
/// Runs at most once: either through [`Release::release`] or when dropped.
#[must_use = "dropping a Release returns the connection immediately"]
pub struct Release(Option<Box<dyn FnOnce() + Send>>);

impl Release {
    pub fn new(hook: impl FnOnce() + Send + 'static) -> Self {
        Release(Some(Box::new(hook)))
    }

    /// A hook with nothing to release.
    pub fn noop() -> Self {
        Release(None)
    }

    pub fn release(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(hook) = self.0.take() {
            hook();
        }
    }
}

impl Drop for Release {
    fn drop(&mut self) {
        self.run();
    }
}

impl fmt::Debug for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Release")
            .field(&if self.0.is_some() { "pending" } else { "done" })
            .finish()
    }
}

/// Response head and lazy body produced by a transport.
pub struct TransportResponse {
    pub status: StatusCode,
    /// Reason phrase from the status line, when the protocol carries one.
    pub reason: Option<String>,
    pub headers: HeaderMap,
    pub body: ByteStream,
    pub release: Release,
}

impl TransportResponse {
    /// A response with an in-memory body and no connection to release.
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        TransportResponse {
            status,
            reason: None,
            headers,
            body: Box::pin(futures::stream::once(async move { Ok(body) })),
            release: Release::noop(),
        }
    }

    /// The reason phrase, falling back to the canonical one for the status.
    #[must_use]
    pub fn status_text(&self) -> String {
        match &self.reason {
            Some(reason) => reason.clone(),
            None => self
                .status
                .canonical_reason()
                .unwrap_or_default()
                .to_owned(),
        }
    }
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("reason", &self.reason)
            .field("headers", &self.headers)
            .field("release", &self.release)
            .finish_non_exhaustive()
    }
}

/// Outgoing half of an upgraded websocket connection.
pub type FrameSink = Pin<Box<dyn Sink<Frame, Error = BoxError> + Send>>;

/// Incoming half of an upgraded websocket connection.
pub type FrameStream = BoxStream<'static, Result<Frame, BoxError>>;

/// Result of a successful websocket handshake.
pub struct WebSocketUpgrade {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub incoming: FrameStream,
    pub outgoing: FrameSink,
    pub release: Release,
}

/// A network engine the coordinator can drive.
///
/// Only [`Transport::execute`] is required. Transports that speak websockets
/// override [`Transport::websocket`] and declare [`crate::WebSockets`] in
/// their capabilities.
pub trait Transport: Send + Sync + 'static {
    /// Capabilities this transport provides.
    type Capabilities: Capabilities;

    /// Performs one exchange and returns the response head with a lazy body.
    fn execute(
        &self,
        request: WireRequest,
    ) -> impl Future<Output = Result<TransportResponse, BoxError>> + Send;

    /// Opens a websocket connection.
    fn websocket(
        &self,
        _request: WireRequest,
    ) -> impl Future<Output = Result<WebSocketUpgrade, BoxError>> + Send {
        let supported = self.capabilities();
        async move {
            let mismatch = error::capability_mismatch(CapabilitySet::WEBSOCKETS, supported);
            Err(Box::new(mismatch) as BoxError)
        }
    }

    /// Transport-specific part of failure translation.
    ///
    /// Returning `None` defers to [`crate::error::default_kind`].
    fn classify(&self, err: &(dyn StdError + 'static)) -> Option<Kind> {
        let _ = err;
        None
    }

    /// Runtime view of [`Transport::Capabilities`].
    fn capabilities(&self) -> CapabilitySet {
        Self::Capabilities::SET
    }
}
