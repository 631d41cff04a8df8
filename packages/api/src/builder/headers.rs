//! Header management and manipulation functionality
//!
//! Provides methods for setting common headers like Accept, User-Agent and
//! Cache-Control on any request description.

use strand_client::builder::{Capabilities, Specification};
use strand_client::http::header::names;
use strand_client::Request;

use crate::builder::core::ContentType;

/// Helper type for accept method that can handle both strings and ContentType enums
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptValue {
    /// String representation of content type
    String(String),
    /// ContentType enum variant
    ContentType(ContentType),
}

impl AcceptValue {
    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            AcceptValue::String(s) => s,
            AcceptValue::ContentType(ct) => ct.as_str(),
        }
    }
}

impl From<&str> for AcceptValue {
    fn from(s: &str) -> Self {
        AcceptValue::String(s.to_string())
    }
}

impl From<String> for AcceptValue {
    fn from(s: String) -> Self {
        AcceptValue::String(s)
    }
}

impl From<ContentType> for AcceptValue {
    fn from(ct: ContentType) -> Self {
        AcceptValue::ContentType(ct)
    }
}

/// Header constants for common HTTP headers
pub mod header {
    pub use strand_client::http::header::names::*;

    /// Custom X-API-Key header for API authentication
    pub const X_API_KEY: &str = "X-API-Key";
    pub const CACHE_CONTROL: &str = "Cache-Control";
}

/// Convenience setters for frequently used headers.
///
/// Every method replaces earlier headers of the same name.
pub trait HeaderExt: Sized {
    /// Set the Accept header
    ///
    /// # Arguments
    /// * `accept` - A media type string or a [`ContentType`]
    ///
    /// # Returns
    /// `Self` for method chaining
    #[must_use]
    fn accept(self, accept: impl Into<AcceptValue>) -> Self;

    #[must_use]
    fn user_agent(self, user_agent: &str) -> Self;

    /// Set Content-Type from a [`ContentType`].
    #[must_use]
    fn content_type_of(self, content_type: ContentType) -> Self;

    #[must_use]
    fn cache_control(self, value: &str) -> Self;

    /// Set `Cache-Control: max-age=<seconds>`.
    #[must_use]
    fn max_age(self, seconds: u64) -> Self {
        self.cache_control(&format!("max-age={seconds}"))
    }
}

impl<U: Specification, T, R: Capabilities> HeaderExt for Request<U, T, R> {
    fn accept(self, accept: impl Into<AcceptValue>) -> Self {
        let accept = accept.into();
        self.set_header(names::ACCEPT, accept.as_str())
    }

    fn user_agent(self, user_agent: &str) -> Self {
        self.set_header(names::USER_AGENT, user_agent)
    }

    fn content_type_of(self, content_type: ContentType) -> Self {
        self.content_type(content_type.as_str())
    }

    fn cache_control(self, value: &str) -> Self {
        self.set_header(header::CACHE_CONTROL, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::core::empty_request;

    #[test]
    fn accept_takes_strings_and_content_types() {
        let request = empty_request().accept("text/csv");
        assert_eq!(request.header_value("accept"), Some("text/csv"));

        let request = request.accept(ContentType::ApplicationJson);
        assert_eq!(request.header_value("accept"), Some("application/json"));
        assert_eq!(request.header_list().len(), 1);
    }

    #[test]
    fn max_age_sets_cache_control() {
        let request = empty_request().max_age(300).user_agent("strand-test/1.0");
        assert_eq!(request.header_value("cache-control"), Some("max-age=300"));
        assert_eq!(request.header_value("user-agent"), Some("strand-test/1.0"));
    }
}
