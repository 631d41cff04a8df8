//! Header and cookie builder methods
//!
//! Headers keep insertion order and may repeat. Methods that "set" a
//! header replace every earlier header of the same name (case-insensitive)
//! in place; methods that "add" one append unconditionally.

use super::builder_core::Request;
use super::capabilities::Capabilities;
use super::state_types::Specification;
use crate::http::header::{self, Header, names};
use crate::http::response::{Response, ResponseMetadata};

impl<U: Specification, T, R: Capabilities> Request<U, T, R> {
    /// Add a header
    ///
    /// # Arguments
    /// * `name` - Header name
    /// * `value` - Header value
    ///
    /// # Returns
    /// `Self` for method chaining; earlier headers of the same name are kept
    pub fn header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_header(Header::new(name, value), false)
    }

    /// Set a header, replacing any earlier header of the same name.
    pub fn set_header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_header(Header::new(name, value), true)
    }

    /// Add `header`, first removing same-named headers when `replace_existing`
    ///
    /// A `Content-Type` or `Content-Length` from the caller always displaces
    /// the one derived from the body.
    pub fn with_header(mut self, header: Header, replace_existing: bool) -> Self {
        log::debug!("Request header: {header} (replace: {replace_existing})");
        if header.is(names::CONTENT_TYPE) && std::mem::take(&mut self.body_headers.content_type) {
            self.headers.retain(|h| !h.is(names::CONTENT_TYPE));
        }
        if header.is(names::CONTENT_LENGTH)
            && std::mem::take(&mut self.body_headers.content_length)
        {
            self.headers.retain(|h| !h.is(names::CONTENT_LENGTH));
        }
        if replace_existing {
            header::replace(&mut self.headers, header);
        } else {
            self.headers.push(header);
        }
        self
    }

    /// Add several headers, in order.
    pub fn headers<H: Into<Header>>(self, headers: impl IntoIterator<Item = H>) -> Self {
        headers
            .into_iter()
            .fold(self, |request, h| request.with_header(h.into(), false))
    }

    /// Set several headers, each replacing earlier headers of its name.
    pub fn set_headers<H: Into<Header>>(self, headers: impl IntoIterator<Item = H>) -> Self {
        headers
            .into_iter()
            .fold(self, |request, h| request.with_header(h.into(), true))
    }

    pub fn content_type(self, content_type: impl Into<String>) -> Self {
        self.set_header(names::CONTENT_TYPE, content_type)
    }

    pub fn content_length(self, length: u64) -> Self {
        self.set_header(names::CONTENT_LENGTH, length.to_string())
    }

    /// Add one cookie to the `Cookie` header.
    pub fn cookie(self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.cookies([(name, value)])
    }

    /// Add cookies to the `Cookie` header
    ///
    /// All cookies live in a single `Cookie` header; new pairs are appended
    /// to whatever that header already holds, separated by `"; "`.
    pub fn cookies<N, V>(self, cookies: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: AsRef<str>,
        V: AsRef<str>,
    {
        let pairs: Vec<String> = cookies
            .into_iter()
            .map(|(name, value)| {
                cookie::Cookie::new(name.as_ref().to_owned(), value.as_ref().to_owned())
                    .stripped()
                    .to_string()
            })
            .collect();
        if pairs.is_empty() {
            return self;
        }

        let added = pairs.join("; ");
        let value = match self.header_value(names::COOKIE) {
            Some(existing) if !existing.is_empty() => format!("{existing}; {added}"),
            _ => added,
        };
        self.set_header(names::COOKIE, value)
    }

    /// Send back every cookie a previous response set.
    pub fn cookies_from_response<B>(self, response: &Response<B>) -> Self {
        self.cookies_from_metadata(&response.metadata())
    }

    pub fn cookies_from_metadata(self, metadata: &ResponseMetadata) -> Self {
        let cookies = metadata.set_cookies();
        self.cookies(cookies.iter().map(|c| (c.name(), c.value())))
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use crate::builder::Request;
    use crate::http::header::Header;
    use crate::http::response::ResponseMetadata;

    #[test]
    fn cookies_merge_into_one_header() {
        let request = Request::new()
            .cookies([("a", "1"), ("b", "2")])
            .cookie("c", "3");
        let cookies: Vec<_> = request
            .header_list()
            .iter()
            .filter(|h| h.is("cookie"))
            .collect();
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].value(), "a=1; b=2; c=3");
    }

    #[test]
    fn set_header_replaces_case_insensitively() {
        let request = Request::new()
            .header("X-Trace", "1")
            .header("Accept", "*/*")
            .header("x-trace", "2")
            .set_header("X-TRACE", "3");
        let names: Vec<_> = request
            .header_list()
            .iter()
            .map(|h| (h.name(), h.value()))
            .collect();
        assert_eq!(names, vec![("Accept", "*/*"), ("X-TRACE", "3")]);
    }

    #[test]
    fn header_appends_duplicates() {
        let request = Request::new().header("Accept", "a").header("accept", "b");
        assert_eq!(request.header_list().len(), 2);
        assert_eq!(request.header_value("ACCEPT"), Some("a"));
    }

    #[test]
    fn response_cookies_are_echoed() {
        let metadata = ResponseMetadata::new(
            StatusCode::OK,
            "OK",
            vec![Header::new("Set-Cookie", "id=42; Path=/; Secure")],
        );
        let request = Request::new().cookie("a", "1").cookies_from_metadata(&metadata);
        assert_eq!(request.header_value("Cookie"), Some("a=1; id=42"));
    }
}
