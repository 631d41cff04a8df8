//! Entry points and shared value types
//!
//! Every request starts from [`empty_request`] or [`basic_request`]. Both are
//! partial descriptions; supplying a method and URI completes them.

use strand_client::Request;
use strand_client::http::header::{media, names};

/// Accept-Encoding advertised by [`basic_request`].
pub const DEFAULT_ACCEPT_ENCODING: &str = "gzip, deflate";

/// Content type enumeration for elegant API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// application/json content type
    ApplicationJson,
    /// application/x-www-form-urlencoded content type
    ApplicationFormUrlEncoded,
    /// application/octet-stream content type
    ApplicationOctetStream,
    /// text/plain content type
    TextPlain,
    /// text/html content type
    TextHtml,
    /// multipart/form-data content type
    MultipartFormData,
}

impl ContentType {
    /// Convert content type to string representation
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::ApplicationJson => media::APPLICATION_JSON,
            ContentType::ApplicationFormUrlEncoded => media::FORM_URLENCODED,
            ContentType::ApplicationOctetStream => media::APPLICATION_OCTET_STREAM,
            ContentType::TextPlain => media::TEXT_PLAIN,
            ContentType::TextHtml => "text/html",
            ContentType::MultipartFormData => media::MULTIPART_FORM_DATA,
        }
    }

    /// Recognizes a media type, ignoring parameters and case.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let essence = value.split(';').next().unwrap_or_default().trim();
        [
            ContentType::ApplicationJson,
            ContentType::ApplicationFormUrlEncoded,
            ContentType::ApplicationOctetStream,
            ContentType::TextPlain,
            ContentType::TextHtml,
            ContentType::MultipartFormData,
        ]
        .into_iter()
        .find(|ct| ct.as_str().eq_ignore_ascii_case(essence))
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A partial request with no headers, reading the response as text.
#[must_use]
pub fn empty_request() -> Request {
    Request::new()
}

/// [`empty_request`] advertising the encodings the backends decode.
#[must_use]
pub fn basic_request() -> Request {
    empty_request().set_header(names::ACCEPT_ENCODING, DEFAULT_ACCEPT_ENCODING)
}
