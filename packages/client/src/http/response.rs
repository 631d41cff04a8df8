//! Realized responses and the metadata shared with response strategies
//!
//! [`ResponseMetadata`] is produced once per exchange, before the body is
//! materialized, and handed to every conversion step. [`Response`] carries the
//! materialized body next to the same status line and headers.

use std::fmt;

use http::{Method, StatusCode, Uri};

use crate::http::body::Encoding;
use crate::http::header::{self, Header, names};

/// Status line and headers of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMetadata {
    pub code: StatusCode,
    pub status_text: String,
    pub headers: Vec<Header>,
}

impl ResponseMetadata {
    pub fn new(code: StatusCode, status_text: impl Into<String>, headers: Vec<Header>) -> Self {
        Self {
            code,
            status_text: status_text.into(),
            headers,
        }
    }

    /// First value of the named header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        header::find(&self.headers, name).map(Header::value)
    }

    /// All values of the named header, in order.
    pub fn headers_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        header::find_all(&self.headers, name).map(Header::value)
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(names::CONTENT_TYPE)
    }

    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.header(names::CONTENT_LENGTH)
            .and_then(|v| v.trim().parse().ok())
    }

    /// The `charset` parameter of `Content-Type`, when present and known.
    #[must_use]
    pub fn charset(&self) -> Option<Encoding> {
        self.content_type()?
            .split(';')
            .skip(1)
            .filter_map(|param| param.split_once('='))
            .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
            .and_then(|(_, value)| Encoding::from_label(value))
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code.is_success()
    }

    #[must_use]
    pub fn is_redirect(&self) -> bool {
        self.code.is_redirection()
    }

    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.code.is_client_error()
    }

    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.code.is_server_error()
    }

    /// Parses every `Set-Cookie` header, skipping malformed ones.
    #[must_use]
    pub fn set_cookies(&self) -> Vec<cookie::Cookie<'static>> {
        self.headers_named(names::SET_COOKIE)
            .filter_map(|value| match cookie::Cookie::parse(value.to_owned()) {
                Ok(cookie) => Some(cookie),
                Err(e) => {
                    tracing::debug!(
                        target: "strand::response",
                        error = %e,
                        "Skipping malformed Set-Cookie header"
                    );
                    None
                }
            })
            .collect()
    }
}

/// The request side of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMetadata {
    pub method: Method,
    pub uri: Uri,
    pub headers: Vec<Header>,
}

impl fmt::Display for RequestMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.uri)
    }
}

/// A response whose body has been materialized as `T`.
#[derive(Debug)]
pub struct Response<T> {
    pub body: T,
    pub code: StatusCode,
    pub status_text: String,
    pub headers: Vec<Header>,
    /// Responses of redirects followed before this one, oldest first.
    pub history: Vec<Response<()>>,
    pub request: RequestMetadata,
}

impl<T> Response<T> {
    pub fn new(body: T, metadata: ResponseMetadata, request: RequestMetadata) -> Self {
        Response {
            body,
            code: metadata.code,
            status_text: metadata.status_text,
            headers: metadata.headers,
            history: Vec::new(),
            request,
        }
    }

    #[must_use]
    pub fn with_history(mut self, history: Vec<Response<()>>) -> Self {
        self.history = history;
        self
    }

    /// Status line and headers as a standalone value.
    #[must_use]
    pub fn metadata(&self) -> ResponseMetadata {
        ResponseMetadata::new(self.code, self.status_text.clone(), self.headers.clone())
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        header::find(&self.headers, name).map(Header::value)
    }

    pub fn headers_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        header::find_all(&self.headers, name).map(Header::value)
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(names::CONTENT_TYPE)
    }

    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.header(names::CONTENT_LENGTH)
            .and_then(|v| v.trim().parse().ok())
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code.is_success()
    }

    #[must_use]
    pub fn is_redirect(&self) -> bool {
        self.code.is_redirection()
    }

    #[must_use]
    pub fn set_cookies(&self) -> Vec<cookie::Cookie<'static>> {
        self.metadata().set_cookies()
    }

    /// Replaces the body, keeping status, headers and history.
    pub fn map_body<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            body: f(self.body),
            code: self.code,
            status_text: self.status_text,
            headers: self.headers,
            history: self.history,
            request: self.request,
        }
    }

    pub fn into_body(self) -> T {
        self.body
    }
}
