//! Backends: turning a complete request description into a response
//!
//! [`HttpBackend`] drives any [`Transport`] through the streaming exchange
//! coordinator; [`BlockingBackend`] wraps it for synchronous callers.

use std::future::Future;

use crate::builder::{Capabilities, CapabilitySet, Complete, Request, Supports};
use crate::error::Result;
use crate::http::response::Response;

pub mod blocking;
pub mod coordinator;
pub(crate) mod materialize;
pub mod stream;
pub mod transport;
pub mod websocket;

pub use blocking::BlockingBackend;
pub use coordinator::HttpBackend;
pub use stream::{BodyComplete, BodyStream, OnBodyReceived};
pub use transport::{
    FrameSink, FrameStream, Release, Transport, TransportResponse, WebSocketUpgrade, WireBody,
    WireRequest,
};
pub use websocket::{CloseReason, Frame, WebSocket};

/// Something that can perform exchanges for request descriptions.
///
/// A backend states the capabilities it provides through
/// [`Backend::Capabilities`]; requests needing more do not type-check
/// against it.
pub trait Backend: Send + Sync {
    type Capabilities: Capabilities;

    /// Performs the exchange described by `request`.
    ///
    /// The returned future resolves once the response is available in the
    /// form the request's response strategy asks for. For buffered
    /// strategies the body has been consumed and the connection released by
    /// then; streamed bodies release the connection once the caller finishes
    /// or drops the stream.
    fn send<T, R>(
        &self,
        request: Request<Complete, T, R>,
    ) -> impl Future<Output = Result<Response<T>>> + Send
    where
        T: Send + 'static,
        R: Capabilities,
        Self::Capabilities: Supports<R>;

    /// Runtime view of [`Backend::Capabilities`].
    fn capabilities(&self) -> CapabilitySet {
        Self::Capabilities::SET
    }
}
