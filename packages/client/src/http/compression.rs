//! Streaming HTTP compression and decompression
//!
//! Request bodies are compressed when the caller declared a
//! `Content-Encoding`; response bodies are decompressed by matching the
//! response's `Content-Encoding` token against a registry of decoders.
//! Both directions work chunk by chunk, so a streamed body is never
//! buffered whole.
//!
//! # Supported Algorithms
//!
//! - **Gzip**: RFC 1952 (`gzip`, `x-gzip`)
//! - **Deflate**: zlib-wrapped RFC 1951 (`deflate`, RFC 9110 §8.4.1.2); raw
//!   deflate bodies from non-conforming servers are decoded too
//! - **Brotli**: RFC 7932 (`br`)

use std::fmt;
use std::io::{self, Write};
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use flate2::Compression as FlateCompression;
use futures::Stream;
use http::HeaderMap;
use pin_project_lite::pin_project;

use crate::backend::transport::WireBody;
use crate::error::{self, BoxError, HttpError};

/// Default compression level for flate-based codecs and brotli quality.
const DEFAULT_LEVEL: u32 = 6;

/// Internal buffer size handed to brotli.
const BROTLI_BUFFER_SIZE: usize = 4096;

/// Brotli window size (log2).
const BROTLI_LGWIN: u32 = 22;

/// Input fed to a codec per step; bounds the output a single step can produce.
const TRANSCODE_SLICE: usize = 1024;

/// A chunk-at-a-time compressor or decompressor.
pub trait Transcoder: Send {
    /// Feeds one input chunk and returns whatever output is ready.
    fn transcode(&mut self, chunk: &[u8]) -> io::Result<Bytes>;

    /// Signals end of input and returns the remaining output.
    fn finish(self: Box<Self>) -> io::Result<Bytes>;
}

/// A registered response decoder.
pub trait Decompressor: Send + Sync + fmt::Debug {
    /// The `Content-Encoding` token this decoder handles.
    fn encoding(&self) -> &str;

    /// A fresh decoding state machine for one body.
    fn decoder(&self) -> Box<dyn Transcoder>;
}

/// Compression algorithms shipped with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    Gzip,
    Deflate,
    Brotli,
}

impl Codec {
    /// Get the HTTP encoding name for this algorithm
    #[must_use]
    pub fn encoding_name(self) -> &'static str {
        match self {
            Codec::Gzip => "gzip",
            Codec::Deflate => "deflate",
            Codec::Brotli => "br",
        }
    }

    /// Parse compression algorithm from encoding string
    #[must_use]
    pub fn from_encoding(encoding: &str) -> Option<Self> {
        match encoding.trim().to_ascii_lowercase().as_str() {
            "gzip" | "x-gzip" => Some(Codec::Gzip),
            "deflate" => Some(Codec::Deflate),
            "br" => Some(Codec::Brotli),
            _ => None,
        }
    }

    /// A streaming compressor for this algorithm.
    #[must_use]
    pub fn encoder(self) -> Box<dyn Transcoder> {
        let sink = SharedSink::default();
        let writer = match self {
            Codec::Gzip => Writer::GzEncoder(flate2::write::GzEncoder::new(
                sink.clone(),
                FlateCompression::new(DEFAULT_LEVEL),
            )),
            Codec::Deflate => Writer::ZlibEncoder(flate2::write::ZlibEncoder::new(
                sink.clone(),
                FlateCompression::new(DEFAULT_LEVEL),
            )),
            Codec::Brotli => Writer::BrotliEncoder(Box::new(brotli::CompressorWriter::new(
                sink.clone(),
                BROTLI_BUFFER_SIZE,
                DEFAULT_LEVEL,
                BROTLI_LGWIN,
            ))),
        };
        Box::new(WriteTranscoder { writer, sink })
    }

    /// A streaming decompressor for this algorithm.
    #[must_use]
    pub fn decoder(self) -> Box<dyn Transcoder> {
        let sink = SharedSink::default();
        let writer = match self {
            Codec::Gzip => Writer::GzDecoder(flate2::write::GzDecoder::new(sink.clone())),
            Codec::Deflate => Writer::SniffDeflate(Vec::with_capacity(2)),
            Codec::Brotli => Writer::BrotliDecoder(Box::new(brotli::DecompressorWriter::new(
                sink.clone(),
                BROTLI_BUFFER_SIZE,
            ))),
        };
        Box::new(WriteTranscoder { writer, sink })
    }

    /// Compresses a whole buffer at once.
    ///
    /// # Errors
    ///
    /// Propagates codec I/O failures.
    pub fn compress(self, data: &[u8]) -> io::Result<Bytes> {
        transcode_all(self.encoder(), data)
    }

    /// Decompresses a whole buffer at once.
    ///
    /// # Errors
    ///
    /// Fails on corrupt or truncated input.
    pub fn decompress(self, data: &[u8]) -> io::Result<Bytes> {
        transcode_all(self.decoder(), data)
    }
}

impl Decompressor for Codec {
    fn encoding(&self) -> &str {
        self.encoding_name()
    }

    fn decoder(&self) -> Box<dyn Transcoder> {
        Codec::decoder(*self)
    }
}

/// The decoders registered by default: gzip, deflate and brotli.
#[must_use]
pub fn default_decoders() -> Vec<Arc<dyn Decompressor>> {
    vec![
        Arc::new(Codec::Gzip),
        Arc::new(Codec::Deflate),
        Arc::new(Codec::Brotli),
    ]
}

fn transcode_all(mut codec: Box<dyn Transcoder>, data: &[u8]) -> io::Result<Bytes> {
    let head = codec.transcode(data)?;
    let tail = codec.finish()?;
    let mut out = Vec::with_capacity(head.len() + tail.len());
    out.extend_from_slice(&head);
    out.extend_from_slice(&tail);
    Ok(Bytes::from(out))
}

/// Output buffer shared between a codec writer and its owner.
#[derive(Clone, Default)]
struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl SharedSink {
    fn take(&self) -> Bytes {
        let mut buffer = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        Bytes::from(std::mem::take(&mut *buffer))
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

enum Writer {
    GzEncoder(flate2::write::GzEncoder<SharedSink>),
    ZlibEncoder(flate2::write::ZlibEncoder<SharedSink>),
    BrotliEncoder(Box<brotli::CompressorWriter<SharedSink>>),
    GzDecoder(flate2::write::GzDecoder<SharedSink>),
    /// `deflate` input seen before the zlib header can be checked.
    SniffDeflate(Vec<u8>),
    ZlibDecoder(flate2::write::ZlibDecoder<SharedSink>),
    DeflateDecoder(flate2::write::DeflateDecoder<SharedSink>),
    BrotliDecoder(Box<brotli::DecompressorWriter<SharedSink>>),
}

/// Whether `head` starts with a zlib header (RFC 1950 §2.2).
fn is_zlib_header(head: &[u8]) -> bool {
    match head {
        [cmf, flg, ..] => cmf & 0x0f == 8 && ((u16::from(*cmf) << 8) | u16::from(*flg)) % 31 == 0,
        _ => false,
    }
}

/// Picks the zlib or raw deflate decoder for a body starting with `head`.
fn deflate_decoder(head: &[u8], sink: SharedSink) -> Writer {
    if is_zlib_header(head) {
        Writer::ZlibDecoder(flate2::write::ZlibDecoder::new(sink))
    } else {
        tracing::debug!(target: "strand::compression", "Deflate body has no zlib header, decoding raw");
        Writer::DeflateDecoder(flate2::write::DeflateDecoder::new(sink))
    }
}

struct WriteTranscoder {
    writer: Writer,
    sink: SharedSink,
}

impl Transcoder for WriteTranscoder {
    fn transcode(&mut self, chunk: &[u8]) -> io::Result<Bytes> {
        if let Writer::SniffDeflate(head) = &mut self.writer {
            head.extend_from_slice(chunk);
            if head.len() < 2 {
                return Ok(Bytes::new());
            }
            let head = std::mem::take(head);
            self.writer = deflate_decoder(&head, self.sink.clone());
            return self.transcode(&head);
        }
        match &mut self.writer {
            Writer::SniffDeflate(_) => {}
            Writer::GzEncoder(w) => w.write_all(chunk)?,
            Writer::ZlibEncoder(w) => w.write_all(chunk)?,
            Writer::ZlibDecoder(w) => w.write_all(chunk)?,
            Writer::BrotliEncoder(w) => w.write_all(chunk)?,
            Writer::GzDecoder(w) => w.write_all(chunk)?,
            Writer::DeflateDecoder(w) => w.write_all(chunk)?,
            Writer::BrotliDecoder(w) => w.write_all(chunk)?,
        }
        Ok(self.sink.take())
    }

    fn finish(self: Box<Self>) -> io::Result<Bytes> {
        let WriteTranscoder { writer, sink } = *self;
        match writer {
            Writer::SniffDeflate(head) if head.is_empty() => {}
            Writer::SniffDeflate(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "truncated deflate stream",
                ));
            }
            Writer::GzEncoder(w) => drop(w.finish()?),
            Writer::ZlibEncoder(w) => drop(w.finish()?),
            Writer::ZlibDecoder(w) => drop(w.finish()?),
            // Dropping the brotli compressor writes the final block.
            Writer::BrotliEncoder(w) => drop(w),
            Writer::GzDecoder(w) => drop(w.finish()?),
            Writer::DeflateDecoder(w) => drop(w.finish()?),
            Writer::BrotliDecoder(w) => {
                if w.into_inner().is_err() {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "truncated brotli stream",
                    ));
                }
            }
        }
        Ok(sink.take())
    }
}

pin_project! {
    /// A byte stream passed through a [`Transcoder`].
    ///
    /// Input chunks are fed to the codec in slices, so one highly compressed
    /// chunk is emitted as several bounded output chunks.
    pub struct Transcoded<S, E> {
        #[pin]
        inner: S,
        codec: Option<Box<dyn Transcoder>>,
        pending: Bytes,
        on_error: fn(io::Error) -> E,
    }
}

impl<S, E> Transcoded<S, E> {
    pub fn new(inner: S, codec: Box<dyn Transcoder>, on_error: fn(io::Error) -> E) -> Self {
        Self {
            inner,
            codec: Some(codec),
            pending: Bytes::new(),
            on_error,
        }
    }
}

impl<S, E> Stream for Transcoded<S, E>
where
    S: Stream<Item = Result<Bytes, E>>,
{
    type Item = Result<Bytes, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        loop {
            let Some(codec) = this.codec.as_mut() else {
                return Poll::Ready(None);
            };
            if !this.pending.is_empty() {
                let take = this.pending.len().min(TRANSCODE_SLICE);
                let slice = this.pending.split_to(take);
                match codec.transcode(&slice) {
                    Ok(out) if out.is_empty() => continue,
                    Ok(out) => return Poll::Ready(Some(Ok(out))),
                    Err(e) => {
                        *this.codec = None;
                        this.pending.clear();
                        return Poll::Ready(Some(Err((this.on_error)(e))));
                    }
                }
            }
            match ready!(this.inner.as_mut().poll_next(cx)) {
                Some(Ok(chunk)) => *this.pending = chunk,
                Some(Err(e)) => {
                    *this.codec = None;
                    return Poll::Ready(Some(Err(e)));
                }
                None => {
                    let Some(codec) = this.codec.take() else {
                        return Poll::Ready(None);
                    };
                    return Poll::Ready(match codec.finish() {
                        Ok(out) if out.is_empty() => None,
                        Ok(out) => Some(Ok(out)),
                        Err(e) => Some(Err((this.on_error)(e))),
                    });
                }
            }
        }
    }
}

/// Response body as produced by the transport layer.
pub type ResponseBytes = futures::stream::BoxStream<'static, Result<Bytes, HttpError>>;

/// Wraps a response body in the decoder registered for `encoding`.
///
/// Unmatched tokens (including `identity`) pass the body through unchanged.
#[must_use]
pub fn decompress_if_possible(
    body: ResponseBytes,
    encoding: &str,
    decoders: &[Arc<dyn Decompressor>],
) -> ResponseBytes {
    let token = encoding.trim();
    match decoders
        .iter()
        .find(|d| d.encoding().eq_ignore_ascii_case(token))
    {
        Some(decompressor) => {
            tracing::debug!(
                target: "strand::compression",
                encoding = %token,
                "Decoding response body"
            );
            Box::pin(Transcoded::new(body, decompressor.decoder(), error::read))
        }
        None => body,
    }
}

fn boxed_io(e: io::Error) -> BoxError {
    Box::new(e)
}

/// Compresses a request body if the request declares a known `Content-Encoding`.
///
/// Returns the (possibly wrapped) body and its length when known.
///
/// # Errors
///
/// Propagates compression failures of in-memory bodies.
pub fn compress_if_needed(
    body: WireBody,
    headers: &HeaderMap,
) -> io::Result<(WireBody, Option<u64>)> {
    let codec = headers
        .get(http::header::CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .and_then(Codec::from_encoding);

    let Some(codec) = codec else {
        let length = body.known_length();
        return Ok((body, length));
    };

    tracing::debug!(
        target: "strand::compression",
        algorithm = %codec.encoding_name(),
        "Compressing request body"
    );

    Ok(match body {
        WireBody::Empty => (WireBody::Empty, None),
        WireBody::Bytes(bytes) => {
            let compressed = codec.compress(&bytes)?;
            let length = compressed.len() as u64;
            (WireBody::Bytes(compressed), Some(length))
        }
        WireBody::Stream(stream) => (
            WireBody::Stream(Box::pin(Transcoded::new(stream, codec.encoder(), boxed_io))),
            None,
        ),
    })
}
