//! Body builder methods
//!
//! The last body set wins. Attaching a body adds `Content-Type` and
//! `Content-Length` only when the request does not carry them yet, so
//! headers set by the caller are never overwritten. Headers added for a
//! previous body are dropped along with it.

use std::path::PathBuf;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::io::AsyncRead;

use super::builder_core::Request;
use super::capabilities::{Capabilities, Streaming, Union};
use super::state_types::Specification;
use crate::error::{self, BoxError};
use crate::http::body::{Encoding, Multipart, Part, RequestBody, StreamBody};
use crate::http::header::{Header, media, names};

impl<U: Specification, T, R: Capabilities> Request<U, T, R> {
    /// Attach `body`, adding its default content type and known length when absent
    ///
    /// Type and length headers added for an earlier body are replaced; ones
    /// the caller set are kept.
    pub fn set_body(mut self, body: RequestBody) -> Self {
        log::debug!("Request body: {body:?}");
        if std::mem::take(&mut self.body_headers.content_type) {
            self.headers.retain(|h| !h.is(names::CONTENT_TYPE));
        }
        if std::mem::take(&mut self.body_headers.content_length) {
            self.headers.retain(|h| !h.is(names::CONTENT_LENGTH));
        }

        if self.header_value(names::CONTENT_TYPE).is_none() {
            if let Some(content_type) = body.default_content_type() {
                self.headers.push(Header::new(names::CONTENT_TYPE, content_type));
                self.body_headers.content_type = true;
            }
        }
        if self.header_value(names::CONTENT_LENGTH).is_none() {
            if let Some(length) = body.known_length() {
                self.headers
                    .push(Header::new(names::CONTENT_LENGTH, length.to_string()));
                self.body_headers.content_length = true;
            }
        }
        self.body = body;
        self
    }

    /// Set a UTF-8 text body
    ///
    /// # Arguments
    /// * `text` - The body text
    ///
    /// # Returns
    /// `Self` for method chaining; defaults to `text/plain; charset=utf-8`
    pub fn body(self, text: impl Into<String>) -> Self {
        self.body_with_encoding(text, Encoding::Utf8)
    }

    /// Set a text body encoded with `encoding`.
    pub fn body_with_encoding(self, text: impl Into<String>, encoding: Encoding) -> Self {
        self.set_body(RequestBody::text(text, encoding))
    }

    pub fn bytes_body(self, bytes: impl Into<Vec<u8>>) -> Self {
        self.set_body(RequestBody::ByteArray(bytes.into()))
    }

    pub fn buffer_body(self, bytes: impl Into<Bytes>) -> Self {
        self.set_body(RequestBody::ByteBuffer(bytes.into()))
    }

    /// Read the body from `reader` when the request is sent.
    ///
    /// A reader can be consumed only once, so the request can no longer be
    /// cloned.
    pub fn reader_body(self, reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        self.set_body(RequestBody::Reader(Box::new(reader)))
    }

    /// Send the contents of the file at `path`; the file is opened at send time.
    pub fn file_body(self, path: impl Into<PathBuf>) -> Self {
        self.set_body(RequestBody::File(path.into()))
    }

    /// Send a `multipart/form-data` body.
    pub fn multipart_body(self, parts: impl IntoIterator<Item = Part>) -> Self {
        self.set_body(RequestBody::Multipart(Multipart::new(
            parts.into_iter().collect(),
        )))
    }

    /// Send `fields` as an `application/x-www-form-urlencoded` body.
    pub fn form_body<K, V>(self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let fields: Vec<(String, String)> = fields
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_owned(), v.as_ref().to_owned()))
            .collect();
        match serde_urlencoded::to_string(&fields) {
            Ok(encoded) => self.set_body(RequestBody::String {
                content: encoded,
                encoding: Encoding::Utf8,
                default_content_type: media::FORM_URLENCODED.to_owned(),
            }),
            Err(e) => self.defer_error(error::builder(e)),
        }
    }

    /// Send a lazily produced body
    ///
    /// Adds the streaming capability to the request's requirements.
    ///
    /// # Arguments
    /// * `stream` - Chunks of the body; an error aborts the request
    ///
    /// # Returns
    /// A request that only backends with streaming support accept
    pub fn stream_body<S, E>(self, stream: S) -> Request<U, T, R::Output>
    where
        R: Union<Streaming>,
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        let stream = stream.map(|chunk| chunk.map_err(Into::<BoxError>::into));
        let stream = StreamBody(Box::pin(stream));
        let response = self.response.clone().widen::<R::Output>();
        self.set_body(RequestBody::Stream(stream))
            .with_response_as(response)
    }
}
