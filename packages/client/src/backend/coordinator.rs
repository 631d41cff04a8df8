//! Streaming exchange coordinator
//!
//! Each call to [`HttpBackend::execute`] spawns one exchange task and waits on
//! a single-assignment response cell. The exchange task owns the transport
//! response: it wraps the body (error translation, read timeout,
//! decompression, length limit), materializes it, writes exactly one outcome
//! into the response cell and releases the connection once the body-complete
//! signal has fired.
//!
//! When the body is already done by the time the outcome is ready (every
//! buffered strategy, and every failure) the connection is released before
//! the outcome is written, so the caller observes a finished exchange. A
//! streamed body keeps the connection until the caller ends, closes or drops
//! the stream.

use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use http::header::{CONTENT_ENCODING, CONTENT_LENGTH, HeaderValue};
use http::{HeaderMap, Method};
use tokio::io::AsyncReadExt;
use tokio::sync::oneshot;
use tracing::Instrument;

use super::Backend;
use super::materialize::materialize;
use super::stream::{self, BodyComplete, BodyCompleteCell, BodyStream};
use super::transport::{Transport, TransportResponse, WebSocketUpgrade, WireBody, WireRequest};
use super::websocket::WebSocket;
use crate::builder::{
    BodyStrategy, Capabilities, Complete, RawBody, Request, RequestOptions, ResponseAs, Supports,
    Target,
};
use crate::config::{BackendConfig, ConfigurationError, Validator};
use crate::error::{self, BoxError, ExchangeAbandoned, Result};
use crate::http::body::{ByteReader, ByteStream, RequestBody};
use crate::http::compression::{Codec, compress_if_needed, decompress_if_possible};
use crate::http::header::{self, Header};
use crate::http::multipart;
use crate::http::response::{RequestMetadata, Response, ResponseMetadata};

const READ_CHUNK: usize = 8 * 1024;

/// A backend driving a [`Transport`] through the streaming coordinator.
///
/// Cloning is cheap; clones share the transport and configuration.
/// Exchanges are spawned onto the ambient Tokio runtime.
pub struct HttpBackend<Tr> {
    transport: Arc<Tr>,
    config: Arc<BackendConfig>,
}

impl<Tr> Clone for HttpBackend<Tr> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            config: Arc::clone(&self.config),
        }
    }
}

impl<Tr: Transport> HttpBackend<Tr> {
    /// A backend with the default configuration.
    pub fn new(transport: Tr) -> Self {
        Self {
            transport: Arc::new(transport),
            config: Arc::new(BackendConfig::default()),
        }
    }

    /// A backend with a custom configuration
    ///
    /// # Errors
    ///
    /// Returns the first problem found by [`BackendConfig::validate`].
    pub fn with_config(
        transport: Tr,
        config: BackendConfig,
    ) -> std::result::Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self {
            transport: Arc::new(transport),
            config: Arc::new(config),
        })
    }

    pub fn transport(&self) -> &Tr {
        &self.transport
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Performs an exchange, checking capabilities at run time
    ///
    /// [`Backend::send`] rejects unsupported requests at compile time; this
    /// entry point accepts any request and fails with a capability mismatch
    /// before any I/O when the transport cannot serve it.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Any failure of the exchange, translated into the crate's error kinds.
    pub async fn execute<T, R>(&self, request: Request<Complete, T, R>) -> Result<Response<T>>
    where
        T: Send + 'static,
        R: Capabilities,
    {
        let supported = self.transport.capabilities();
        let required = R::SET.union(request.response_as().strategy().required());
        if !supported.contains(required) {
            tracing::warn!(
                target: "strand::backend",
                required = %required,
                supported = %supported,
                "Rejecting request the transport cannot serve"
            );
            return Err(error::capability_mismatch(required, supported).with_uri(request.uri().clone()));
        }

        let (response_tx, response_rx) = oneshot::channel();
        let span = tracing::debug_span!(
            target: "strand::backend",
            "exchange",
            method = %request.method_ref(),
            uri = %request.uri()
        );
        tokio::spawn(
            exchange(
                Arc::clone(&self.transport),
                Arc::clone(&self.config),
                request,
                response_tx,
            )
            .instrument(span),
        );

        response_rx
            .await
            .unwrap_or_else(|_| Err(error::unknown(ExchangeAbandoned)))
    }
}

impl<Tr: Transport> Backend for HttpBackend<Tr> {
    type Capabilities = Tr::Capabilities;

    fn send<T, R>(
        &self,
        request: Request<Complete, T, R>,
    ) -> impl std::future::Future<Output = Result<Response<T>>> + Send
    where
        T: Send + 'static,
        R: Capabilities,
        Self::Capabilities: Supports<R>,
    {
        self.execute(request)
    }

    fn capabilities(&self) -> crate::builder::CapabilitySet {
        self.transport.capabilities()
    }
}

impl<Tr> std::fmt::Debug for HttpBackend<Tr> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("transport", &std::any::type_name::<Tr>())
            .field("config", &self.config)
            .finish()
    }
}

/// The exchange task: produces one outcome and releases the connection.
async fn exchange<Tr, T, R>(
    transport: Arc<Tr>,
    config: Arc<BackendConfig>,
    request: Request<Complete, T, R>,
    response_cell: oneshot::Sender<Result<Response<T>>>,
) where
    Tr: Transport,
    T: Send + 'static,
    R: Capabilities,
{
    let uri = request.uri().clone();
    let (complete, mut body_complete) = BodyComplete::channel();

    let (outcome, release) = run(&transport, &config, request, complete).await;
    let outcome = outcome.map_err(|e| match e.uri() {
        Some(_) => e,
        None => e.with_uri(uri),
    });
    if let Err(e) = &outcome {
        tracing::warn!(target: "strand::backend", error = %e, "Exchange failed");
    }

    let release = move || {
        if let Some(release) = release {
            release.release();
            tracing::debug!(target: "strand::backend", "Connection released");
        }
    };
    let deliver = move |outcome| {
        if response_cell.send(outcome).is_err() {
            tracing::debug!(target: "strand::backend", "Caller stopped waiting for the response");
        }
    };

    match body_complete.try_recv() {
        // The body is still out with the caller.
        Err(oneshot::error::TryRecvError::Empty) => {
            deliver(outcome);
            wait_for_body(body_complete).await;
            release();
        }
        _ => {
            release();
            deliver(outcome);
        }
    }
}

async fn wait_for_body(body_complete: BodyCompleteCell) {
    // A dropped signal counts as completion.
    let _ = body_complete.await;
    tracing::trace!(target: "strand::backend", "Response body complete");
}

async fn run<Tr, T, R>(
    transport: &Arc<Tr>,
    config: &BackendConfig,
    request: Request<Complete, T, R>,
    complete: BodyComplete,
) -> (Result<Response<T>>, Option<super::Release>)
where
    Tr: Transport,
    T: Send + 'static,
    R: Capabilities,
{
    let Request {
        target,
        body,
        headers,
        response,
        options,
        on_body_received,
        deferred_error,
        ..
    } = request;

    if let Some(err) = deferred_error {
        return (Err(err), None);
    }
    if let Err(e) = options.validate() {
        return (Err(error::builder(e)), None);
    }

    let request_meta = RequestMetadata {
        method: target.method.clone(),
        uri: target.uri.clone(),
        headers: headers.clone(),
    };
    let wire = match wire_request(config, target, &headers, body, &options).await {
        Ok(wire) => wire,
        Err(e) => return (Err(e), None),
    };

    if let BodyStrategy::WebSocket = response.strategy() {
        return websocket(transport, wire, &response, request_meta, complete, options.read_timeout)
            .await;
    }

    let is_head = wire.method == Method::HEAD;
    tracing::debug!(
        target: "strand::backend",
        method = %wire.method,
        uri = %wire.uri,
        body = ?wire.body,
        "Starting exchange"
    );
    let head = match tokio::time::timeout(options.read_timeout, transport.execute(wire)).await {
        Ok(Ok(head)) => head,
        Ok(Err(e)) => return (Err(translate(&**transport, e)), None),
        Err(elapsed) => return (Err(error::timeout(elapsed)), None),
    };

    let status_text = head.status_text();
    let TransportResponse {
        status,
        headers: response_headers,
        body: raw_body,
        release,
        ..
    } = head;
    let metadata = ResponseMetadata::new(status, status_text, header::from_header_map(&response_headers));
    tracing::debug!(target: "strand::backend", status = %status, "Response head received");

    let translating = Arc::clone(transport);
    let mut body = stream::translate_errors(raw_body, move |e| translate(&*translating, e));
    body = stream::with_read_timeout(body, options.read_timeout);
    if !is_head && options.decompress_response && config.decompression_enabled {
        if let Some(encoding) = metadata.header(CONTENT_ENCODING.as_str()) {
            // Codings are listed in the order they were applied.
            for token in encoding.split(',').rev() {
                body = decompress_if_possible(body, token, &config.decoders);
            }
        }
    }
    if let Some(limit) = options
        .max_response_body_length
        .or(config.max_response_body_length)
    {
        body = stream::limit_length(body, limit);
    }

    let on_received = on_body_received.map(|callback| (callback, metadata.clone()));
    let body = BodyStream::new(body, complete, on_received);

    let raw = match materialize(response.strategy(), body, transport.capabilities()).await {
        Ok(raw) => raw,
        Err(e) => return (Err(e), Some(release)),
    };
    match response.convert(raw, metadata.clone()).await {
        Ok(value) => (Ok(Response::new(value, metadata, request_meta)), Some(release)),
        Err(e) => (Err(e), Some(release)),
    }
}

async fn websocket<Tr, T, R>(
    transport: &Arc<Tr>,
    wire: WireRequest,
    response: &ResponseAs<T, R>,
    request_meta: RequestMetadata,
    complete: BodyComplete,
    read_timeout: Duration,
) -> (Result<Response<T>>, Option<super::Release>)
where
    Tr: Transport,
    T: Send + 'static,
    R: Capabilities,
{
    tracing::debug!(target: "strand::backend", uri = %wire.uri, "Opening websocket");
    let upgrade = match tokio::time::timeout(read_timeout, transport.websocket(wire)).await {
        Ok(Ok(upgrade)) => upgrade,
        Ok(Err(e)) => return (Err(translate(&**transport, e)), None),
        Err(elapsed) => return (Err(error::timeout(elapsed)), None),
    };

    let WebSocketUpgrade {
        status,
        headers,
        incoming,
        outgoing,
        release,
    } = upgrade;
    let metadata = ResponseMetadata::new(
        status,
        status.canonical_reason().unwrap_or_default(),
        header::from_header_map(&headers),
    );
    let socket = WebSocket::new(incoming, outgoing, complete);
    match response.convert(RawBody::WebSocket(socket), metadata.clone()).await {
        Ok(value) => (Ok(Response::new(value, metadata, request_meta)), Some(release)),
        Err(e) => (Err(e), Some(release)),
    }
}

fn translate<Tr: Transport>(transport: &Tr, err: BoxError) -> crate::Error {
    error::translate(err, |source| transport.classify(source))
}

/// Builds the transport's view of the request.
async fn wire_request(
    config: &BackendConfig,
    target: Target,
    headers: &[Header],
    body: RequestBody,
    options: &RequestOptions,
) -> Result<WireRequest> {
    let mut header_map = header::to_header_map(headers)?;
    let body = wire_body(body, &mut header_map).await?;

    let (body, length) = if config.request_compression {
        let compressing = header_map
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .and_then(Codec::from_encoding)
            .is_some();
        let compressed = compress_if_needed(body, &header_map).map_err(error::builder)?;
        if compressing {
            // The payload changed; a caller-supplied length no longer holds.
            header_map.remove(CONTENT_LENGTH);
        }
        compressed
    } else {
        let length = body.known_length();
        (body, length)
    };

    if let Some(length) = length {
        if !header_map.contains_key(CONTENT_LENGTH) {
            header_map.insert(CONTENT_LENGTH, HeaderValue::from(length));
        }
    }

    Ok(WireRequest {
        method: target.method,
        uri: target.uri,
        version: options.http_version,
        headers: header_map,
        body,
    })
}

async fn wire_body(body: RequestBody, headers: &mut HeaderMap) -> Result<WireBody> {
    Ok(match body {
        RequestBody::NoBody => WireBody::Empty,
        RequestBody::String {
            content, encoding, ..
        } => WireBody::Bytes(Bytes::from(
            encoding.encode(&content).map_err(error::builder)?,
        )),
        RequestBody::ByteArray(bytes) => WireBody::Bytes(Bytes::from(bytes)),
        RequestBody::ByteBuffer(bytes) => WireBody::Bytes(bytes),
        RequestBody::Reader(reader) => WireBody::Stream(reader_stream(reader)),
        RequestBody::File(path) => {
            let file = tokio::fs::File::open(&path).await.map_err(error::builder)?;
            let length = file.metadata().await.map_err(error::builder)?.len();
            if !headers.contains_key(CONTENT_LENGTH) {
                headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
            }
            WireBody::Stream(reader_stream(Box::new(file)))
        }
        RequestBody::Stream(stream) => WireBody::Stream(stream.into_inner()),
        RequestBody::Multipart(multipart) => WireBody::Bytes(multipart::encode(&multipart).await?),
    })
}

fn reader_stream(reader: ByteReader) -> ByteStream {
    Box::pin(futures::stream::try_unfold(reader, |mut reader| async move {
        let mut buf = BytesMut::with_capacity(READ_CHUNK);
        let read = reader.read_buf(&mut buf).await?;
        Ok::<_, BoxError>(if read == 0 {
            None
        } else {
            Some((buf.freeze(), reader))
        })
    }))
}
