//! Request body payloads
//!
//! `RequestBody` is a closed set of payload kinds. Every kind knows the
//! content type it implies, which the builder applies only when the caller
//! has not set one already.

use std::fmt;
use std::path::PathBuf;

use bytes::Bytes;
use futures::stream::BoxStream;
use tokio::io::AsyncRead;

use crate::error::BoxError;
use crate::http::header::{Header, media};

/// Character encodings supported for string payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    Utf16Be,
    Utf16Le,
    /// ISO-8859-1; only code points up to U+00FF are representable.
    Iso8859_1,
}

/// A character could not be represented in the target encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("character {character:?} cannot be encoded as {encoding}")]
pub struct UnencodableCharacter {
    pub character: char,
    pub encoding: &'static str,
}

/// Bytes were not valid in the source encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {encoding} data")]
pub struct MalformedText {
    pub encoding: &'static str,
}

impl Encoding {
    /// The charset label as used in `Content-Type` parameters.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Utf16Be => "utf-16be",
            Encoding::Utf16Le => "utf-16le",
            Encoding::Iso8859_1 => "iso-8859-1",
        }
    }

    /// Parses a charset label, ignoring case and surrounding quotes.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().trim_matches('"').to_ascii_lowercase();
        match label.as_str() {
            "utf-8" | "utf8" => Some(Encoding::Utf8),
            "utf-16be" => Some(Encoding::Utf16Be),
            "utf-16le" => Some(Encoding::Utf16Le),
            "iso-8859-1" | "latin1" | "latin-1" | "us-ascii" => Some(Encoding::Iso8859_1),
            _ => None,
        }
    }

    /// Encodes `text` into bytes.
    ///
    /// # Errors
    ///
    /// Fails when a character has no representation in this encoding.
    pub fn encode(self, text: &str) -> Result<Vec<u8>, UnencodableCharacter> {
        match self {
            Encoding::Utf8 => Ok(text.as_bytes().to_vec()),
            Encoding::Utf16Be => Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect()),
            Encoding::Utf16Le => Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect()),
            Encoding::Iso8859_1 => text
                .chars()
                .map(|c| {
                    u8::try_from(u32::from(c)).map_err(|_| UnencodableCharacter {
                        character: c,
                        encoding: self.label(),
                    })
                })
                .collect(),
        }
    }

    /// Decodes `bytes` into a string.
    ///
    /// # Errors
    ///
    /// Fails on invalid UTF-8 or UTF-16 input.
    pub fn decode(self, bytes: &[u8]) -> Result<String, MalformedText> {
        let malformed = || MalformedText {
            encoding: self.label(),
        };
        match self {
            Encoding::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|_| malformed()),
            Encoding::Utf16Be | Encoding::Utf16Le => {
                if bytes.len() % 2 != 0 {
                    return Err(malformed());
                }
                let units = bytes.chunks_exact(2).map(|pair| {
                    let pair = [pair[0], pair[1]];
                    if self == Encoding::Utf16Be {
                        u16::from_be_bytes(pair)
                    } else {
                        u16::from_le_bytes(pair)
                    }
                });
                char::decode_utf16(units)
                    .collect::<Result<String, _>>()
                    .map_err(|_| malformed())
            }
            Encoding::Iso8859_1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }
}

/// Lazy byte producer used for streaming request bodies.
pub type ByteStream = BoxStream<'static, Result<Bytes, BoxError>>;

/// Async reader used for input-stream request bodies.
pub type ByteReader = Box<dyn AsyncRead + Send + Unpin>;

/// A streaming request body.
///
/// Only constructed through `Request::stream_body`, which also records the
/// streaming capability on the request.
pub struct StreamBody(pub(crate) ByteStream);

impl StreamBody {
    pub(crate) fn into_inner(self) -> ByteStream {
        self.0
    }
}

/// The payload of a request.
pub enum RequestBody {
    NoBody,
    String {
        content: String,
        encoding: Encoding,
        default_content_type: String,
    },
    ByteArray(Vec<u8>),
    ByteBuffer(Bytes),
    Reader(ByteReader),
    File(PathBuf),
    Stream(StreamBody),
    Multipart(Multipart),
}

impl RequestBody {
    /// A text body with `text/plain; charset=<encoding>` as its default type.
    pub fn text(content: impl Into<String>, encoding: Encoding) -> Self {
        RequestBody::String {
            content: content.into(),
            encoding,
            default_content_type: format!("{}; charset={}", media::TEXT_PLAIN, encoding.label()),
        }
    }

    /// The content type implied by this payload.
    #[must_use]
    pub fn default_content_type(&self) -> Option<String> {
        match self {
            RequestBody::NoBody => None,
            RequestBody::String {
                default_content_type,
                ..
            } => Some(default_content_type.clone()),
            RequestBody::ByteArray(_)
            | RequestBody::ByteBuffer(_)
            | RequestBody::Reader(_)
            | RequestBody::File(_)
            | RequestBody::Stream(_) => Some(media::APPLICATION_OCTET_STREAM.to_owned()),
            RequestBody::Multipart(multipart) => Some(multipart.content_type()),
        }
    }

    /// The payload length when it can be known without I/O.
    ///
    /// String bodies that cannot be encoded report no length; the encoding
    /// failure surfaces when the request is sent.
    #[must_use]
    pub fn known_length(&self) -> Option<u64> {
        match self {
            RequestBody::NoBody => None,
            RequestBody::String {
                content, encoding, ..
            } => encoding.encode(content).ok().map(|b| b.len() as u64),
            RequestBody::ByteArray(bytes) => Some(bytes.len() as u64),
            RequestBody::ByteBuffer(bytes) => Some(bytes.len() as u64),
            RequestBody::Reader(_)
            | RequestBody::File(_)
            | RequestBody::Stream(_)
            | RequestBody::Multipart(_) => None,
        }
    }

    /// Whether the payload can be produced more than once.
    #[must_use]
    pub fn is_replayable(&self) -> bool {
        !matches!(self, RequestBody::Reader(_) | RequestBody::Stream(_))
    }

    /// Copies a replayable payload; `None` for readers and streams.
    #[must_use]
    pub fn try_clone(&self) -> Option<Self> {
        Some(match self {
            RequestBody::NoBody => RequestBody::NoBody,
            RequestBody::String {
                content,
                encoding,
                default_content_type,
            } => RequestBody::String {
                content: content.clone(),
                encoding: *encoding,
                default_content_type: default_content_type.clone(),
            },
            RequestBody::ByteArray(bytes) => RequestBody::ByteArray(bytes.clone()),
            RequestBody::ByteBuffer(bytes) => RequestBody::ByteBuffer(bytes.clone()),
            RequestBody::File(path) => RequestBody::File(path.clone()),
            RequestBody::Multipart(multipart) => RequestBody::Multipart(multipart.clone()),
            RequestBody::Reader(_) | RequestBody::Stream(_) => return None,
        })
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::NoBody => f.write_str("NoBody"),
            RequestBody::String {
                content, encoding, ..
            } => f
                .debug_tuple("String")
                .field(&format!("{} chars", content.chars().count()))
                .field(encoding)
                .finish(),
            RequestBody::ByteArray(bytes) => f
                .debug_tuple("ByteArray")
                .field(&format!("{} bytes", bytes.len()))
                .finish(),
            RequestBody::ByteBuffer(bytes) => f
                .debug_tuple("ByteBuffer")
                .field(&format!("{} bytes", bytes.len()))
                .finish(),
            RequestBody::Reader(_) => f.debug_tuple("Reader").field(&"<AsyncRead>").finish(),
            RequestBody::File(path) => f.debug_tuple("File").field(path).finish(),
            RequestBody::Stream(_) => f.debug_tuple("Stream").field(&"<Stream>").finish(),
            RequestBody::Multipart(multipart) => f
                .debug_tuple("Multipart")
                .field(&format!("{} parts", multipart.parts.len()))
                .finish(),
        }
    }
}

/// Content of a single multipart part.
#[derive(Debug, Clone)]
pub enum PartBody {
    Text(String, Encoding),
    Bytes(Bytes),
    File(PathBuf),
}

/// One part of a `multipart/form-data` body.
#[derive(Debug, Clone)]
pub struct Part {
    pub(crate) name: String,
    pub(crate) body: PartBody,
    pub(crate) file_name: Option<String>,
    pub(crate) content_type: Option<String>,
    pub(crate) headers: Vec<Header>,
}

impl Part {
    /// A text field.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, PartBody::Text(value.into(), Encoding::Utf8))
    }

    /// A binary field.
    pub fn bytes(name: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Self::new(name, PartBody::Bytes(value.into()))
    }

    /// A file field; the file name defaults to the path's last component.
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        let mut part = Self::new(name, PartBody::File(path));
        part.file_name = file_name;
        part
    }

    fn new(name: impl Into<String>, body: PartBody) -> Self {
        Self {
            name: name.into(),
            body,
            file_name: None,
            content_type: None,
            headers: Vec::new(),
        }
    }

    #[must_use]
    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(Header::new(name, value));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn body(&self) -> &PartBody {
        &self.body
    }
}

/// Ordered parts plus the boundary that separates them on the wire.
#[derive(Debug, Clone)]
pub struct Multipart {
    pub(crate) boundary: String,
    pub(crate) parts: Vec<Part>,
}

impl Multipart {
    pub(crate) fn new(parts: Vec<Part>) -> Self {
        let boundary: String = std::iter::repeat_with(fastrand::alphanumeric)
            .take(32)
            .collect();
        Self { boundary, parts }
    }

    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    #[must_use]
    pub fn content_type(&self) -> String {
        format!("{}; boundary={}", media::MULTIPART_FORM_DATA, self.boundary)
    }
}
