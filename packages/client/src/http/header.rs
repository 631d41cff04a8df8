//! Header value type and ordered header sequences
//!
//! Headers are kept as an ordered `Vec<Header>` rather than a map: the same
//! name may appear more than once, order is preserved, and lookups return the
//! first case-insensitive match.

use std::fmt;

use http::{HeaderMap, HeaderName, HeaderValue};

use crate::error::{self, HttpError};

/// Commonly used header names.
pub mod names {
    pub const ACCEPT: &str = "Accept";
    pub const ACCEPT_ENCODING: &str = "Accept-Encoding";
    pub const AUTHORIZATION: &str = "Authorization";
    pub const CONTENT_ENCODING: &str = "Content-Encoding";
    pub const CONTENT_LENGTH: &str = "Content-Length";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const COOKIE: &str = "Cookie";
    pub const LOCATION: &str = "Location";
    pub const PROXY_AUTHORIZATION: &str = "Proxy-Authorization";
    pub const SET_COOKIE: &str = "Set-Cookie";
    pub const USER_AGENT: &str = "User-Agent";
}

/// Commonly used media types.
pub mod media {
    pub const APPLICATION_JSON: &str = "application/json";
    pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";
    pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
    pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";
    pub const TEXT_PLAIN: &str = "text/plain";
}

const SENSITIVE: [&str; 4] = [
    names::AUTHORIZATION,
    names::COOKIE,
    names::SET_COOKIE,
    names::PROXY_AUTHORIZATION,
];

/// A single header line.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Header {
    name: String,
    value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Case-insensitive name comparison.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Whether the value must be hidden from logs and debug output.
    #[must_use]
    pub fn is_sensitive(&self) -> bool {
        SENSITIVE.iter().any(|name| self.is(name))
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_sensitive() {
            write!(f, "{}: ***", self.name)
        } else {
            write!(f, "{}: {}", self.name, self.value)
        }
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Header({self})")
    }
}

impl<N: Into<String>, V: Into<String>> From<(N, V)> for Header {
    fn from((name, value): (N, V)) -> Self {
        Header::new(name, value)
    }
}

/// First header with the given name.
#[must_use]
pub fn find<'a>(headers: &'a [Header], name: &str) -> Option<&'a Header> {
    headers.iter().find(|h| h.is(name))
}

/// Every header with the given name, in order.
pub fn find_all<'a>(headers: &'a [Header], name: &'a str) -> impl Iterator<Item = &'a Header> + 'a {
    headers.iter().filter(move |h| h.is(name))
}

/// Removes every header named like `header` and inserts `header` in place of
/// the last one removed. With no prior match the header is appended.
pub fn replace(headers: &mut Vec<Header>, header: Header) {
    let mut position = None;
    let mut removed = 0;
    let mut index = 0;
    headers.retain(|h| {
        let keep = !h.is(header.name());
        if !keep {
            position = Some(index - removed);
            removed += 1;
        }
        index += 1;
        keep
    });

    match position {
        Some(at) => headers.insert(at, header),
        None => headers.push(header),
    }
}

/// Converts an ordered header sequence into an `http::HeaderMap`.
///
/// # Errors
///
/// Returns a builder error when a name or value is not valid on the wire.
pub fn to_header_map(headers: &[Header]) -> Result<HeaderMap, HttpError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for header in headers {
        let name = HeaderName::from_bytes(header.name().as_bytes()).map_err(error::builder)?;
        let value = HeaderValue::from_str(header.value()).map_err(error::builder)?;
        map.append(name, value);
    }
    Ok(map)
}

/// Converts an `http::HeaderMap` into an ordered header sequence.
///
/// Values that are not visible ASCII are decoded lossily.
#[must_use]
pub fn from_header_map(map: &HeaderMap) -> Vec<Header> {
    map.iter()
        .map(|(name, value)| {
            Header::new(
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}
