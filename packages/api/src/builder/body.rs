//! Request body handling functionality
//!
//! Serializes values into JSON or form-urlencoded bodies. Serialization
//! failures do not abort the chain; they are reported when the request is
//! sent.

use serde::Serialize;
use strand_client::builder::{Capabilities, Specification};
use strand_client::http::body::{Encoding, RequestBody};
use strand_client::http::header::media;
use strand_client::{Request, error};

/// JSON request bodies.
pub trait JsonExt: Sized {
    /// Set the request body to `value` serialized as JSON
    ///
    /// Adds `Content-Type: application/json` unless a content type is
    /// already present.
    ///
    /// # Arguments
    /// * `value` - The data to serialize and set as request body
    ///
    /// # Returns
    /// `Self` for method chaining
    ///
    /// # Examples
    /// ```
    /// use serde::Serialize;
    /// use strand::JsonExt;
    ///
    /// #[derive(Serialize)]
    /// struct User {
    ///     name: String,
    /// }
    ///
    /// let request = strand::post("https://api.example.com/users")
    ///     .json_body(&User { name: "John Doe".to_string() });
    /// assert_eq!(request.header_value("Content-Type"), Some("application/json"));
    /// ```
    #[must_use]
    fn json_body<B: Serialize + ?Sized>(self, value: &B) -> Self;
}

/// Form-urlencoded request bodies from serializable values.
pub trait FormExt: Sized {
    /// Set the request body to `value` encoded as `application/x-www-form-urlencoded`.
    #[must_use]
    fn form<B: Serialize + ?Sized>(self, value: &B) -> Self;
}

fn text_body(content: String, content_type: &str) -> RequestBody {
    RequestBody::String {
        content,
        encoding: Encoding::Utf8,
        default_content_type: content_type.to_owned(),
    }
}

impl<U: Specification, T, R: Capabilities> JsonExt for Request<U, T, R> {
    fn json_body<B: Serialize + ?Sized>(self, value: &B) -> Self {
        match serde_json::to_string(value) {
            Ok(json) => {
                log::debug!("Request JSON body ({} bytes)", json.len());
                self.set_body(text_body(json, media::APPLICATION_JSON))
            }
            Err(e) => self.defer_error(error::builder(e)),
        }
    }
}

impl<U: Specification, T, R: Capabilities> FormExt for Request<U, T, R> {
    fn form<B: Serialize + ?Sized>(self, value: &B) -> Self {
        match serde_urlencoded::to_string(value) {
            Ok(form) => self.set_body(text_body(form, media::FORM_URLENCODED)),
            Err(e) => self.defer_error(error::builder(e)),
        }
    }
}
