//! Response handling strategies
//!
//! A [`ResponseAs`] pairs one way of consuming the raw body (a closed
//! [`BodyStrategy`]) with a conversion from the consumed body to the target
//! type `T`. Mapping composes on the conversion only; the consumption
//! mechanism chosen by the constructor never changes.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use futures::FutureExt;
use futures::future::{self, BoxFuture};

use super::capabilities::{Capabilities, NoCapabilities, Streaming, WebSockets};
use crate::backend::stream::BodyStream;
use crate::backend::websocket::WebSocket;
use crate::error::{self, Result};
use crate::http::body::Encoding;
use crate::http::response::ResponseMetadata;

/// How the backend consumes a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyStrategy {
    /// Drain and discard.
    Ignore,
    /// Drain into one contiguous buffer.
    ByteArray,
    /// Stream to a file, creating parent directories as needed.
    File(PathBuf),
    /// Hand the body over without draining it.
    Stream,
    /// Upgrade to a websocket connection.
    WebSocket,
}

impl BodyStrategy {
    /// The capabilities a backend needs to execute this strategy.
    #[must_use]
    pub fn required(&self) -> super::CapabilitySet {
        match self {
            BodyStrategy::Stream => super::CapabilitySet::STREAMING,
            BodyStrategy::WebSocket => super::CapabilitySet::WEBSOCKETS,
            _ => super::CapabilitySet::NONE,
        }
    }
}

/// A consumed response body before conversion.
pub enum RawBody {
    Unit,
    Bytes(Bytes),
    File(PathBuf),
    Stream(BodyStream),
    WebSocket(WebSocket),
}

impl RawBody {
    fn kind(&self) -> &'static str {
        match self {
            RawBody::Unit => "unit",
            RawBody::Bytes(_) => "bytes",
            RawBody::File(_) => "file",
            RawBody::Stream(_) => "stream",
            RawBody::WebSocket(_) => "websocket",
        }
    }

    fn mismatch(self, expected: &str) -> crate::Error {
        error::builder(format!(
            "response strategy expected a {expected} body, got {}",
            self.kind()
        ))
    }

    fn into_bytes(self) -> Result<Bytes> {
        match self {
            RawBody::Bytes(bytes) => Ok(bytes),
            other => Err(other.mismatch("bytes")),
        }
    }

    fn into_file(self) -> Result<PathBuf> {
        match self {
            RawBody::File(path) => Ok(path),
            other => Err(other.mismatch("file")),
        }
    }

    fn into_stream(self) -> Result<BodyStream> {
        match self {
            RawBody::Stream(stream) => Ok(stream),
            other => Err(other.mismatch("stream")),
        }
    }

    fn into_websocket(self) -> Result<WebSocket> {
        match self {
            RawBody::WebSocket(socket) => Ok(socket),
            other => Err(other.mismatch("websocket")),
        }
    }
}

type Convert<T> =
    Arc<dyn Fn(RawBody, ResponseMetadata) -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// A response handling strategy producing `T` and requiring capabilities `R`.
pub struct ResponseAs<T, R = NoCapabilities> {
    strategy: BodyStrategy,
    convert: Convert<T>,
    _capabilities: PhantomData<fn() -> R>,
}

impl<T, R> Clone for ResponseAs<T, R> {
    fn clone(&self) -> Self {
        Self {
            strategy: self.strategy.clone(),
            convert: Arc::clone(&self.convert),
            _capabilities: PhantomData,
        }
    }
}

impl<T, R> ResponseAs<T, R> {
    /// Re-labels the capability requirement with a superset.
    pub(crate) fn widen<W: Capabilities>(self) -> ResponseAs<T, W> {
        ResponseAs {
            strategy: self.strategy,
            convert: self.convert,
            _capabilities: PhantomData,
        }
    }
}

impl<T, R: Capabilities> fmt::Debug for ResponseAs<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseAs")
            .field("strategy", &self.strategy)
            .field("capabilities", &R::SET)
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static, R: Capabilities> ResponseAs<T, R> {
    fn from_parts<F, Fut>(strategy: BodyStrategy, convert: F) -> Self
    where
        F: Fn(RawBody, ResponseMetadata) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            strategy,
            convert: Arc::new(move |raw, meta| convert(raw, meta).boxed()),
            _capabilities: PhantomData,
        }
    }

    /// The consumption mechanism behind this strategy.
    #[must_use]
    pub fn strategy(&self) -> &BodyStrategy {
        &self.strategy
    }

    pub(crate) fn convert(&self, raw: RawBody, metadata: ResponseMetadata) -> BoxFuture<'static, Result<T>> {
        (self.convert)(raw, metadata)
    }

    /// Post-processes the materialized value.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> ResponseAs<U, R>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.map_with_metadata(move |value, _| f(value))
    }

    /// Post-processes the materialized value with access to status and headers.
    #[must_use]
    pub fn map_with_metadata<U, F>(self, f: F) -> ResponseAs<U, R>
    where
        U: Send + 'static,
        F: Fn(T, &ResponseMetadata) -> U + Send + Sync + 'static,
    {
        self.try_map_with_metadata(move |value, meta| Ok(f(value, meta)))
    }

    /// Post-processes the materialized value with a conversion that can fail.
    ///
    /// A failure becomes the outcome of the whole exchange.
    #[must_use]
    pub fn try_map_with_metadata<U, F>(self, f: F) -> ResponseAs<U, R>
    where
        U: Send + 'static,
        F: Fn(T, &ResponseMetadata) -> Result<U> + Send + Sync + 'static,
    {
        let inner = self.convert;
        let f = Arc::new(f);
        ResponseAs::from_parts(self.strategy, move |raw, meta| {
            let converted = inner(raw, meta.clone());
            let f = Arc::clone(&f);
            async move { converted.await.and_then(|value| f(value, &meta)) }
        })
    }
}

impl<A: Send + 'static, E: Send + 'static, R: Capabilities> ResponseAs<std::result::Result<A, E>, R> {
    /// Maps only the success arm, leaving error values untouched.
    #[must_use]
    pub fn map_ok<B, F>(self, f: F) -> ResponseAs<std::result::Result<B, E>, R>
    where
        B: Send + 'static,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        self.map(move |value| value.map(&f))
    }
}

fn decode_text(bytes: &[u8], meta: &ResponseMetadata) -> Result<String> {
    meta.charset()
        .unwrap_or_default()
        .decode(bytes)
        .map_err(error::read)
}

/// Drain the body and discard it.
#[must_use]
pub fn ignore() -> ResponseAs<(), NoCapabilities> {
    ResponseAs::from_parts(BodyStrategy::Ignore, |_, _| future::ready(Ok(())))
}

/// Read the whole body into a byte vector, whatever the status.
#[must_use]
pub fn as_bytes() -> ResponseAs<Vec<u8>, NoCapabilities> {
    ResponseAs::from_parts(BodyStrategy::ByteArray, |raw, _| {
        future::ready(raw.into_bytes().map(|bytes| bytes.to_vec()))
    })
}

/// Read the whole body; non-2xx bodies are decoded as text into `Err`.
#[must_use]
pub fn as_bytes_or_error() -> ResponseAs<std::result::Result<Vec<u8>, String>, NoCapabilities> {
    ResponseAs::from_parts(BodyStrategy::ByteArray, |raw, meta| {
        future::ready(raw.into_bytes().and_then(|bytes| {
            if meta.is_success() {
                Ok(Ok(bytes.to_vec()))
            } else {
                decode_text(&bytes, &meta).map(Err)
            }
        }))
    })
}

/// Decode the body as text using the `Content-Type` charset (UTF-8 if absent).
///
/// Successful responses land in `Ok`, all others in `Err`.
#[must_use]
pub fn as_string() -> ResponseAs<std::result::Result<String, String>, NoCapabilities> {
    ResponseAs::from_parts(BodyStrategy::ByteArray, |raw, meta| {
        let text = raw.into_bytes().and_then(|bytes| decode_text(&bytes, &meta));
        future::ready(text.map(|text| if meta.is_success() { Ok(text) } else { Err(text) }))
    })
}

/// Decode the body as text whatever the status.
#[must_use]
pub fn as_string_always() -> ResponseAs<String, NoCapabilities> {
    ResponseAs::from_parts(BodyStrategy::ByteArray, |raw, meta| {
        future::ready(raw.into_bytes().and_then(|bytes| decode_text(&bytes, &meta)))
    })
}

/// Decode the body as text with a fixed encoding, ignoring `Content-Type`.
#[must_use]
pub fn as_string_with(encoding: Encoding) -> ResponseAs<String, NoCapabilities> {
    ResponseAs::from_parts(BodyStrategy::ByteArray, move |raw, _| {
        future::ready(
            raw.into_bytes()
                .and_then(|bytes| encoding.decode(&bytes).map_err(error::read)),
        )
    })
}

/// Write the body to `path` and return the path.
#[must_use]
pub fn as_file(path: impl Into<PathBuf>) -> ResponseAs<PathBuf, NoCapabilities> {
    ResponseAs::from_parts(BodyStrategy::File(path.into()), |raw, _| {
        future::ready(raw.into_file())
    })
}

/// Hand the body to the caller as a lazy stream.
///
/// The connection stays checked out until the stream is read to the end,
/// closed or dropped.
#[must_use]
pub fn as_stream() -> ResponseAs<BodyStream, Streaming> {
    ResponseAs::from_parts(BodyStrategy::Stream, |raw, _| future::ready(raw.into_stream()))
}

/// Consume the body stream with `f` before the response is returned.
#[must_use]
pub fn as_stream_with<T, F, Fut>(f: F) -> ResponseAs<T, Streaming>
where
    T: Send + 'static,
    F: Fn(BodyStream) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    ResponseAs::from_parts(BodyStrategy::Stream, move |raw, _| match raw.into_stream() {
        Ok(stream) => f(stream).left_future(),
        Err(e) => future::ready(Err(e)).right_future(),
    })
}

/// Run `handler` on the upgraded websocket connection.
#[must_use]
pub fn as_websocket<T, F, Fut>(handler: F) -> ResponseAs<T, WebSockets>
where
    T: Send + 'static,
    F: Fn(WebSocket) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    ResponseAs::from_parts(BodyStrategy::WebSocket, move |raw, _| {
        match raw.into_websocket() {
            Ok(socket) => handler(socket).left_future(),
            Err(e) => future::ready(Err(e)).right_future(),
        }
    })
}

/// Hand the upgraded websocket connection to the caller.
#[must_use]
pub fn as_websocket_stream() -> ResponseAs<WebSocket, WebSockets> {
    ResponseAs::from_parts(BodyStrategy::WebSocket, |raw, _| {
        future::ready(raw.into_websocket())
    })
}
