use std::error::Error as StdError;
use std::fmt;

use crate::builder::CapabilitySet;

/// A Result alias where the Err case is `strand_client::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed, thread-safe failure as raised by transports and collaborators.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Represents errors that can occur while describing or executing a request.
pub struct Error {
    pub(crate) inner: Box<Inner>,
}

pub(crate) struct Inner {
    pub(crate) kind: Kind,
    pub(crate) source: Option<BoxError>,
    pub(crate) uri: Option<http::Uri>,
}

/// Failure taxonomy shared by every backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    /// The request description could not be turned into a wire request.
    Builder,
    /// Transport failed to establish a connection.
    Connect,
    /// Transport connected but failed while reading or parsing the response.
    Read,
    /// Configured read timeout elapsed.
    Timeout,
    /// Response body exceeded the declared maximum before it was fully read.
    BodyLengthExceeded { limit: u64 },
    /// Request needs capabilities the backend does not provide.
    CapabilityMismatch {
        required: CapabilitySet,
        supported: CapabilitySet,
    },
    /// Transport failure nobody recognized; the source is the original error.
    Unknown,
}

impl Error {
    pub fn new(kind: Kind) -> Error {
        Error {
            inner: Box::new(Inner {
                kind,
                source: None,
                uri: None,
            }),
        }
    }

    #[must_use = "Error builder methods return a new Error and should be used"]
    pub fn with<E: Into<BoxError>>(mut self, source: E) -> Error {
        self.inner.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_uri(mut self, uri: http::Uri) -> Self {
        self.inner.uri = Some(uri);
        self
    }

    /// The taxonomy member of this failure.
    #[must_use]
    pub fn kind(&self) -> &Kind {
        &self.inner.kind
    }

    /// Get the URI of the request that failed, if known.
    #[must_use]
    pub fn uri(&self) -> Option<&http::Uri> {
        self.inner.uri.as_ref()
    }

    /// Give back the underlying failure exactly as it was raised.
    ///
    /// For [`Kind::Unknown`] this is the transport's own error value, so
    /// callers can still downcast to transport-native types.
    #[must_use]
    pub fn into_source(self) -> Option<BoxError> {
        self.inner.source
    }

    /// A copy with the same kind and URI whose source is rendered to text.
    pub(crate) fn detached(&self) -> Error {
        let mut copy = Error::new(self.inner.kind.clone());
        copy.inner.uri.clone_from(&self.inner.uri);
        if let Some(source) = &self.inner.source {
            copy.inner.source = Some(source.to_string().into());
        }
        copy
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("strand::Error");

        f.field("kind", &self.inner.kind);

        if let Some(ref source) = self.inner.source {
            f.field("source", source);
        }

        if let Some(ref uri) = self.inner.uri {
            f.field("uri", uri);
        }

        f.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.kind {
            Kind::Builder => f.write_str("invalid request description")?,
            Kind::Connect => f.write_str("error connecting")?,
            Kind::Read => f.write_str("error reading response")?,
            Kind::Timeout => f.write_str("read timeout")?,
            Kind::BodyLengthExceeded { limit } => {
                write!(f, "response body exceeds the maximum of {limit} bytes")?;
            }
            Kind::CapabilityMismatch {
                required,
                supported,
            } => write!(
                f,
                "request requires capabilities {required} but the backend supports {supported}"
            )?,
            Kind::Unknown => match &self.inner.source {
                // Unknown failures are reported as the transport reported them.
                Some(source) => return write!(f, "{source}"),
                None => f.write_str("unknown transport error")?,
            },
        }

        if let Some(ref uri) = self.inner.uri {
            write!(f, " for {uri}")?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}
