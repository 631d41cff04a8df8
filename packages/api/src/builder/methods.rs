//! Verb shortcuts
//!
//! Each function starts from [`basic_request`] and completes it with the
//! verb and URI, so the result can be sent straight away or refined further.

use strand_client::http::IntoUri;
use strand_client::{Complete, Request};

use crate::builder::core::basic_request;

/// A complete `GET` request
///
/// # Arguments
/// * `uri` - Absolute URI; parse failures are reported when the request is sent
///
/// # Returns
/// `Request<Complete>` ready for [`Request::send`]
///
/// # Examples
/// ```no_run
/// # async fn run(backend: &impl strand::Backend<Capabilities = strand::NoCapabilities>) -> strand::Result<()> {
/// let response = strand::get("https://api.example.com/items").send(backend).await?;
/// println!("{}", response.code);
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn get(uri: impl IntoUri) -> Request<Complete> {
    basic_request().get(uri)
}

#[must_use]
pub fn head(uri: impl IntoUri) -> Request<Complete> {
    basic_request().head(uri)
}

#[must_use]
pub fn post(uri: impl IntoUri) -> Request<Complete> {
    basic_request().post(uri)
}

#[must_use]
pub fn put(uri: impl IntoUri) -> Request<Complete> {
    basic_request().put(uri)
}

#[must_use]
pub fn patch(uri: impl IntoUri) -> Request<Complete> {
    basic_request().patch(uri)
}

#[must_use]
pub fn delete(uri: impl IntoUri) -> Request<Complete> {
    basic_request().delete(uri)
}

#[must_use]
pub fn options(uri: impl IntoUri) -> Request<Complete> {
    basic_request().options_request(uri)
}
