//! Core `Request` description type
//!
//! A `Request` is an immutable value: every builder method consumes it and
//! returns a new one. No method performs I/O. Problems found while building
//! (an unparsable URI, a body that cannot be serialized) are kept as a
//! deferred error and reported when the request is sent.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::{Method, Uri};

use super::capabilities::{Capabilities, NoCapabilities, Union};
use super::configuration::RequestOptions;
use super::response_as::{self, ResponseAs};
use super::state_types::{Complete, Partial, Specification, Target};
use crate::backend::stream::OnBodyReceived;
use crate::backend::Backend;
use crate::builder::capabilities::Supports;
use crate::error::{HttpError, Result};
use crate::http::body::RequestBody;
use crate::http::header::{self, Header};
use crate::http::response::{RequestMetadata, Response, ResponseMetadata};

/// Opaque per-request values keyed by name.
pub type Tags = HashMap<String, Arc<dyn Any + Send + Sync>>;

/// Body headers the builder added itself rather than the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct BodyHeaders {
    pub(crate) content_type: bool,
    pub(crate) content_length: bool,
}

/// Immutable HTTP request description
///
/// Type parameters:
/// - `U`: [`Partial`] until method and URI are supplied, then [`Complete`]
/// - `T`: what the response body is turned into
/// - `R`: backend capabilities the request needs
#[must_use = "requests do nothing unless sent to a backend"]
pub struct Request<U: Specification = Partial, T = std::result::Result<String, String>, R: Capabilities = NoCapabilities> {
    pub(crate) target: U::Target,
    pub(crate) body: RequestBody,
    pub(crate) headers: Vec<Header>,
    pub(crate) body_headers: BodyHeaders,
    pub(crate) response: ResponseAs<T, R>,
    pub(crate) options: RequestOptions,
    pub(crate) tags: Tags,
    pub(crate) on_body_received: Option<OnBodyReceived>,
    pub(crate) deferred_error: Option<HttpError>,
}

impl Request<Partial, std::result::Result<String, String>, NoCapabilities> {
    /// A request with no method, URI, headers or body.
    ///
    /// Responses are decoded as text; see [`response_as::as_string`].
    pub fn new() -> Self {
        Request {
            target: (),
            body: RequestBody::NoBody,
            headers: Vec::new(),
            body_headers: BodyHeaders::default(),
            response: response_as::as_string(),
            options: RequestOptions::default(),
            tags: Tags::new(),
            on_body_received: None,
            deferred_error: None,
        }
    }
}

impl Default for Request<Partial, std::result::Result<String, String>, NoCapabilities> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: Specification, T, R: Capabilities> Request<U, T, R> {
    /// Moves every field except the target into a request of another level.
    pub(crate) fn retarget<V: Specification>(self, target: V::Target) -> Request<V, T, R> {
        Request {
            target,
            body: self.body,
            headers: self.headers,
            body_headers: self.body_headers,
            response: self.response,
            options: self.options,
            tags: self.tags,
            on_body_received: self.on_body_received,
            deferred_error: self.deferred_error,
        }
    }

    /// Moves every field except the response strategy into a new request.
    pub(crate) fn with_response_as<T2, R2: Capabilities>(
        self,
        response: ResponseAs<T2, R2>,
    ) -> Request<U, T2, R2> {
        Request {
            target: self.target,
            body: self.body,
            headers: self.headers,
            body_headers: self.body_headers,
            response,
            options: self.options,
            tags: self.tags,
            on_body_received: self.on_body_received,
            deferred_error: self.deferred_error,
        }
    }

    /// Records a problem to report at send time; the first one wins.
    ///
    /// Extension layers use this to keep mutators infallible.
    #[must_use]
    pub fn defer_error(mut self, err: HttpError) -> Self {
        if self.deferred_error.is_none() {
            log::debug!("Deferring request description error: {err}");
            self.deferred_error = Some(err);
        } else {
            log::debug!("Ignoring further request description error: {err}");
        }
        self
    }

    /// Replace the response handling strategy
    ///
    /// The capability requirement becomes the union of the current one and
    /// the strategy's.
    ///
    /// # Arguments
    /// * `response` - The new strategy
    ///
    /// # Returns
    /// A request producing the strategy's target type
    pub fn response<T2, R2>(self, response: ResponseAs<T2, R2>) -> Request<U, T2, R::Output>
    where
        R: Union<R2>,
        R2: Capabilities,
    {
        // The strategy keeps its own conversion; only the marker widens.
        let widened = response.widen::<R::Output>();
        self.with_response_as(widened)
    }

    /// Post-process the materialized response body.
    pub fn map_response<T2, F>(self, f: F) -> Request<U, T2, R>
    where
        T: Send + 'static,
        T2: Send + 'static,
        F: Fn(T) -> T2 + Send + Sync + 'static,
    {
        let mapped = self.response.clone().map(f);
        self.with_response_as(mapped)
    }

    /// Attach an opaque value for backends and helpers that know its key.
    pub fn tag(mut self, key: impl Into<String>, value: impl Any + Send + Sync) -> Self {
        self.tags.insert(key.into(), Arc::new(value));
        self
    }

    #[must_use]
    pub fn tag_value(&self, key: &str) -> Option<&(dyn Any + Send + Sync)> {
        self.tags.get(key).map(|value| &**value)
    }

    /// Typed view of a tag; `None` when absent or of another type.
    #[must_use]
    pub fn tag_as<V: Any>(&self, key: &str) -> Option<&V> {
        self.tag_value(key)?.downcast_ref::<V>()
    }

    #[must_use]
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Run `callback` once the response body has been fully consumed.
    ///
    /// Never runs for bodies that fail or are abandoned halfway.
    pub fn on_body_received(
        mut self,
        callback: impl Fn(&ResponseMetadata) + Send + Sync + 'static,
    ) -> Self {
        self.on_body_received = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn header_list(&self) -> &[Header] {
        &self.headers
    }

    /// First value of the named header, compared case-insensitively.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        header::find(&self.headers, name).map(Header::value)
    }

    #[must_use]
    pub fn body_ref(&self) -> &RequestBody {
        &self.body
    }

    #[must_use]
    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    #[must_use]
    pub fn response_as(&self) -> &ResponseAs<T, R> {
        &self.response
    }

    /// The problem recorded while building, if any.
    #[must_use]
    pub fn deferred_error(&self) -> Option<&HttpError> {
        self.deferred_error.as_ref()
    }

    /// Copies the request unless its body can only be produced once.
    #[must_use]
    pub fn try_clone(&self) -> Option<Self> {
        Some(Request {
            target: self.target.clone(),
            body: self.body.try_clone()?,
            headers: self.headers.clone(),
            body_headers: self.body_headers,
            response: self.response.clone(),
            options: self.options.clone(),
            tags: self.tags.clone(),
            on_body_received: self.on_body_received.clone(),
            deferred_error: self.deferred_error.as_ref().map(HttpError::detached),
        })
    }
}

impl<T, R: Capabilities> Request<Complete, T, R> {
    #[must_use]
    pub fn target(&self) -> &Target {
        &self.target
    }

    #[must_use]
    pub fn method_ref(&self) -> &Method {
        &self.target.method
    }

    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.target.uri
    }

    /// Method, URI and headers as recorded on the response.
    #[must_use]
    pub fn metadata(&self) -> RequestMetadata {
        RequestMetadata {
            method: self.target.method.clone(),
            uri: self.target.uri.clone(),
            headers: self.headers.clone(),
        }
    }

    /// Send the request through `backend`
    ///
    /// Does not type-check when the backend lacks a capability the request
    /// needs.
    ///
    /// # Errors
    ///
    /// Returns the backend's translated failure, or a builder error recorded
    /// while the request was described.
    pub async fn send<B>(self, backend: &B) -> Result<Response<T>>
    where
        B: Backend,
        B::Capabilities: Supports<R>,
        T: Send + 'static,
    {
        backend.send(self).await
    }
}

impl<T, R: Capabilities> fmt::Display for Request<Complete, T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.target.method, self.target.uri)?;
        for header in &self.headers {
            write!(f, "\n{header}")?;
        }
        Ok(())
    }
}

impl<T, R: Capabilities> fmt::Display for Request<Partial, T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<method and URI not set>")?;
        for header in &self.headers {
            write!(f, "\n{header}")?;
        }
        Ok(())
    }
}

impl<U: Specification, T, R: Capabilities> fmt::Debug for Request<U, T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&str> = self.tags.keys().map(String::as_str).collect();
        tags.sort_unstable();
        f.debug_struct("Request")
            .field("target", &self.target)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("response", &self.response)
            .field("options", &self.options)
            .field("tags", &tags)
            .field("deferred_error", &self.deferred_error)
            .finish()
    }
}
