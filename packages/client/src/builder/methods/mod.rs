//! HTTP method transitions
//!
//! Supplying a method together with a URI is the only way to turn a partial
//! request into a complete one. Calling these on a complete request simply
//! retargets it.

use http::{Method, Uri};

use super::builder_core::Request;
use super::capabilities::Capabilities;
use super::state_types::{Complete, Specification, Target};
use crate::http::into_uri::IntoUri;

impl<U: Specification, T, R: Capabilities> Request<U, T, R> {
    /// Set method and URI
    ///
    /// Custom verbs are expressed through [`Method::from_bytes`].
    ///
    /// # Arguments
    /// * `method` - The HTTP method
    /// * `uri` - An absolute URI; parse failures are reported at send time
    ///
    /// # Returns
    /// A complete, sendable request
    pub fn method(self, method: Method, uri: impl IntoUri) -> Request<Complete, T, R> {
        let (uri, err) = match uri.into_uri() {
            Ok(uri) => (uri, None),
            Err(e) => (Uri::default(), Some(e)),
        };
        log::debug!("Request target: {method} {uri}");
        let request = self.retarget::<Complete>(Target { method, uri });
        match err {
            Some(e) => request.defer_error(e),
            None => request,
        }
    }

    pub fn get(self, uri: impl IntoUri) -> Request<Complete, T, R> {
        self.method(Method::GET, uri)
    }

    pub fn head(self, uri: impl IntoUri) -> Request<Complete, T, R> {
        self.method(Method::HEAD, uri)
    }

    pub fn post(self, uri: impl IntoUri) -> Request<Complete, T, R> {
        self.method(Method::POST, uri)
    }

    pub fn put(self, uri: impl IntoUri) -> Request<Complete, T, R> {
        self.method(Method::PUT, uri)
    }

    pub fn delete(self, uri: impl IntoUri) -> Request<Complete, T, R> {
        self.method(Method::DELETE, uri)
    }

    pub fn options_request(self, uri: impl IntoUri) -> Request<Complete, T, R> {
        self.method(Method::OPTIONS, uri)
    }

    pub fn patch(self, uri: impl IntoUri) -> Request<Complete, T, R> {
        self.method(Method::PATCH, uri)
    }
}
