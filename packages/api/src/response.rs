//! JSON response strategies

use http::StatusCode;
use serde::de::DeserializeOwned;
use strand_client::builder::ResponseAs;
use strand_client::http::Encoding;
use strand_client::{as_bytes, error};

/// Why a response could not be read as the expected JSON value.
#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    /// The server answered with a non-success status.
    #[error("HTTP {code}: {body}")]
    Http { code: StatusCode, body: String },

    /// The body was not valid JSON for the target type.
    #[error("could not deserialize response body: {source}")]
    Deserialization {
        body: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ResponseError {
    /// The raw response body, when it was text.
    #[must_use]
    pub fn body(&self) -> &str {
        match self {
            ResponseError::Http { body, .. } | ResponseError::Deserialization { body, .. } => body,
        }
    }
}

fn lossy(bytes: &[u8]) -> String {
    Encoding::Utf8
        .decode(bytes)
        .unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned())
}

/// Read a successful response as JSON
///
/// Non-success statuses yield [`ResponseError::Http`] with the body as text;
/// malformed JSON yields [`ResponseError::Deserialization`]. Neither fails the
/// exchange itself.
#[must_use]
pub fn as_json<T>() -> ResponseAs<Result<T, ResponseError>>
where
    T: DeserializeOwned + Send + 'static,
{
    as_bytes().map_with_metadata(|bytes, meta| {
        if !meta.is_success() {
            return Err(ResponseError::Http {
                code: meta.code,
                body: lossy(&bytes),
            });
        }
        serde_json::from_slice(&bytes).map_err(|source| ResponseError::Deserialization {
            body: lossy(&bytes),
            source,
        })
    })
}

/// Read the response as JSON regardless of status
///
/// Deserialization failures fail the exchange with a read error.
#[must_use]
pub fn as_json_always<T>() -> ResponseAs<T>
where
    T: DeserializeOwned + Send + 'static,
{
    as_bytes().try_map_with_metadata(|bytes, meta| {
        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::debug!(
                target: "strand::response",
                status = %meta.code,
                error = %e,
                "Response body is not the expected JSON"
            );
            error::read(e)
        })
    })
}
