use http::Uri;
use url::Url;

use crate::error::{self, HttpError};

/// A trait to try to convert some type into an absolute `Uri`.
///
/// This trait is "sealed", such that only types within strand can
/// implement it.
pub trait IntoUri: sealed::Sealed {
    /// Besides parsing, the URI must carry a scheme and a host, so that it
    /// makes sense to use in a network request.
    ///
    /// # Errors
    ///
    /// Returns a builder `HttpError` if:
    /// - the string is not a valid URI
    /// - the URI is relative or lacks a host
    fn into_uri(self) -> Result<Uri, HttpError>;
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for http::Uri {}
    impl Sealed for url::Url {}
    impl Sealed for String {}
    impl Sealed for &str {}
    impl Sealed for &String {}
}

impl IntoUri for Uri {
    fn into_uri(self) -> Result<Uri, HttpError> {
        if self.scheme().is_some() && self.host().is_some() {
            Ok(self)
        } else {
            Err(error::builder(format!("URI is not absolute: {self}")))
        }
    }
}

impl IntoUri for &str {
    fn into_uri(self) -> Result<Uri, HttpError> {
        self.parse::<Uri>().map_err(error::builder)?.into_uri()
    }
}

impl IntoUri for &String {
    fn into_uri(self) -> Result<Uri, HttpError> {
        self.as_str().into_uri()
    }
}

impl IntoUri for String {
    fn into_uri(self) -> Result<Uri, HttpError> {
        Uri::try_from(self).map_err(error::builder)?.into_uri()
    }
}

impl IntoUri for Url {
    fn into_uri(self) -> Result<Uri, HttpError> {
        if !self.has_host() {
            return Err(error::builder(format!("URL has no host: {self}")));
        }
        self.as_str().into_uri()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_strings_parse() {
        let uri = "http://example.test/a?b=c".into_uri().expect("valid");
        assert_eq!(uri.host(), Some("example.test"));
        assert_eq!(uri.path_and_query().map(|p| p.as_str()), Some("/a?b=c"));
    }

    #[test]
    fn relative_references_are_rejected() {
        assert!("/just/a/path".into_uri().expect_err("relative").is_builder());
        assert!("not a uri".into_uri().expect_err("garbage").is_builder());
    }

    #[test]
    fn urls_convert() {
        let url = Url::parse("https://example.test:8443/x").expect("url");
        let uri = url.into_uri().expect("valid");
        assert_eq!(uri.port_u16(), Some(8443));
    }
}
