//! Scripted transport shared by the integration tests

#![allow(dead_code)]

use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, Version};
use strand_client::backend::{Release, Transport, TransportResponse, WireBody, WireRequest};
use strand_client::error::BoxError;
use strand_client::{Capabilities, Streaming};

/// What the transport saw for one exchange.
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: Method,
    pub uri: Uri,
    pub version: Option<Version>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

type Responder = dyn Fn(&Seen) -> Result<TransportResponse, BoxError> + Send + Sync;

/// A transport answering every request through a closure.
pub struct StubTransport<C = Streaming> {
    respond: Box<Responder>,
    releases: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<Seen>>>,
    _capabilities: PhantomData<fn() -> C>,
}

impl StubTransport<Streaming> {
    pub fn new(
        respond: impl Fn(&Seen) -> Result<TransportResponse, BoxError> + Send + Sync + 'static,
    ) -> Self {
        StubTransport {
            respond: Box::new(respond),
            releases: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
            _capabilities: PhantomData,
        }
    }

    /// Always answers `status` with `body` in a single chunk.
    pub fn fixed(status: StatusCode, headers: &[(&'static str, &'static str)], body: &'static [u8]) -> Self {
        let headers = header_map(headers);
        Self::new(move |_| Ok(TransportResponse::new(status, headers.clone(), body)))
    }

    /// Always fails with `kind` before any response arrives.
    pub fn failing(kind: std::io::ErrorKind) -> Self {
        Self::new(move |_| Err(Box::new(std::io::Error::from(kind)) as BoxError))
    }
}

impl<C> StubTransport<C> {
    pub fn with_capabilities<C2: Capabilities>(self) -> StubTransport<C2> {
        StubTransport {
            respond: self.respond,
            releases: self.releases,
            seen: self.seen,
            _capabilities: PhantomData,
        }
    }

    pub fn releases(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.releases)
    }

    pub fn seen(&self) -> Arc<Mutex<Vec<Seen>>> {
        Arc::clone(&self.seen)
    }
}

impl<C: Capabilities> Transport for StubTransport<C> {
    type Capabilities = C;

    async fn execute(&self, request: WireRequest) -> Result<TransportResponse, BoxError> {
        let body = match request.body {
            WireBody::Empty => Bytes::new(),
            WireBody::Bytes(bytes) => bytes,
            WireBody::Stream(mut stream) => {
                let mut collected = Vec::new();
                while let Some(chunk) = stream.next().await {
                    collected.extend_from_slice(&chunk?);
                }
                Bytes::from(collected)
            }
        };
        let seen = Seen {
            method: request.method,
            uri: request.uri,
            version: request.version,
            headers: request.headers,
            body,
        };
        self.seen.lock().expect("seen lock").push(seen.clone());

        let mut response = (self.respond)(&seen)?;
        let releases = Arc::clone(&self.releases);
        response.release = Release::new(move || {
            releases.fetch_add(1, Ordering::SeqCst);
        });
        Ok(response)
    }
}

pub fn header_map(headers: &[(&'static str, &'static str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.append(*name, HeaderValue::from_static(*value));
    }
    map
}

/// A response whose body is produced chunk by chunk from `chunks`.
pub fn streamed(
    status: StatusCode,
    chunks: impl futures::Stream<Item = Result<Bytes, BoxError>> + Send + 'static,
) -> TransportResponse {
    let mut response = TransportResponse::new(status, HeaderMap::new(), Bytes::new());
    response.body = Box::pin(chunks);
    response
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    use std::io::Write;

    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).expect("gzip write");
    encoder.finish().expect("gzip finish")
}

/// Waits for the exchange task to catch up with `counter`.
pub async fn wait_for(counter: &AtomicUsize, expected: usize) {
    for _ in 0..200 {
        if counter.load(Ordering::SeqCst) >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

pub fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir()
        .join(format!("strand-test-{}-{}", std::process::id(), fastrand::u64(..)))
        .join(name)
}

/// Routes `tracing` output through the test harness; repeated calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}
