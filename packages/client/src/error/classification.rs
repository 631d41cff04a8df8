use std::error::Error as StdError;
use std::io;

use super::helpers::TimedOut;
use super::types::{BoxError, Error, Kind};

impl Error {
    /// Returns true if the request description could not be sent as built.
    #[must_use]
    pub fn is_builder(&self) -> bool {
        matches!(self.inner.kind, Kind::Builder)
    }

    /// Returns true if the transport failed to establish a connection.
    #[must_use]
    pub fn is_connect(&self) -> bool {
        matches!(self.inner.kind, Kind::Connect)
    }

    /// Returns true if reading or parsing the response failed.
    #[must_use]
    pub fn is_read(&self) -> bool {
        matches!(self.inner.kind, Kind::Read)
    }

    /// Returns true if the error is related to a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self.inner.kind, Kind::Timeout)
    }

    #[must_use]
    pub fn is_body_length_exceeded(&self) -> bool {
        matches!(self.inner.kind, Kind::BodyLengthExceeded { .. })
    }

    #[must_use]
    pub fn is_capability_mismatch(&self) -> bool {
        matches!(self.inner.kind, Kind::CapabilityMismatch { .. })
    }

    /// Returns true if the failure was passed through untranslated.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self.inner.kind, Kind::Unknown)
    }
}

/// Shared fallback mapping from a raised failure to the taxonomy.
///
/// Walks the source chain and stops at the first link it recognizes.
/// Returns `None` when nothing in the chain is known.
#[must_use]
pub fn default_kind(err: &(dyn StdError + 'static)) -> Option<Kind> {
    let mut source = Some(err);

    while let Some(err) = source {
        if let Some(ours) = err.downcast_ref::<Error>() {
            return Some(ours.kind().clone());
        }
        if err.is::<TimedOut>() || err.is::<tokio::time::error::Elapsed>() {
            return Some(Kind::Timeout);
        }
        if let Some(io) = err.downcast_ref::<io::Error>() {
            if let Some(kind) = io_kind(io.kind()) {
                return Some(kind);
            }
            // io::Error::source skips the wrapped error itself
            if let Some(wrapped) = io.get_ref() {
                let wrapped: &(dyn StdError + 'static) = wrapped;
                source = Some(wrapped);
                continue;
            }
        }
        source = err.source();
    }

    None
}

fn io_kind(kind: io::ErrorKind) -> Option<Kind> {
    match kind {
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::NotConnected
        | io::ErrorKind::AddrNotAvailable => Some(Kind::Connect),
        io::ErrorKind::TimedOut => Some(Kind::Timeout),
        io::ErrorKind::UnexpectedEof
        | io::ErrorKind::InvalidData
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::BrokenPipe => Some(Kind::Read),
        _ => None,
    }
}

/// Translates a transport failure exactly once.
///
/// `specific` is the transport's own partial mapping and wins over the
/// shared default. Failures already of type [`Error`] are returned as they
/// are; unrecognized failures become [`Kind::Unknown`] with the original
/// value kept as the source.
pub(crate) fn translate(
    err: BoxError,
    specific: impl FnOnce(&(dyn StdError + 'static)) -> Option<Kind>,
) -> Error {
    let err = match err.downcast::<Error>() {
        Ok(ours) => return *ours,
        Err(err) => err,
    };

    let root: &(dyn StdError + 'static) = &*err;
    match specific(root).or_else(|| default_kind(root)) {
        Some(kind) => Error::new(kind).with(err),
        None => super::constructors::unknown(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(e: impl StdError + Send + Sync + 'static) -> BoxError {
        Box::new(e)
    }

    #[test]
    fn refused_connections_are_connect_errors() {
        let err = translate(
            boxed(io::Error::from(io::ErrorKind::ConnectionRefused)),
            |_| None,
        );
        assert!(err.is_connect());
    }

    #[test]
    fn reset_and_eof_are_read_errors() {
        for kind in [io::ErrorKind::ConnectionReset, io::ErrorKind::UnexpectedEof] {
            assert!(translate(boxed(io::Error::from(kind)), |_| None).is_read());
        }
    }

    #[test]
    fn transport_mapping_takes_precedence() {
        let err = translate(
            boxed(io::Error::from(io::ErrorKind::ConnectionRefused)),
            |_| Some(Kind::Timeout),
        );
        assert!(err.is_timeout());
    }

    #[test]
    fn unrecognized_failures_keep_their_identity() {
        #[derive(Debug)]
        struct Native;
        impl std::fmt::Display for Native {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("native failure")
            }
        }
        impl StdError for Native {}

        let err = translate(boxed(Native), |_| None);
        assert!(err.is_unknown());
        assert_eq!(err.to_string(), "native failure");
        let source = err.into_source().expect("source kept");
        assert!(source.downcast_ref::<Native>().is_some());
    }

    #[test]
    fn already_translated_errors_pass_through() {
        let original = super::super::constructors::body_length_exceeded(10);
        let err = translate(Box::new(original), |_| Some(Kind::Connect));
        assert_eq!(err.kind(), &Kind::BodyLengthExceeded { limit: 10 });
    }

    #[test]
    fn nested_timeouts_are_found() {
        let wrapped = io::Error::new(io::ErrorKind::Other, TimedOut);
        assert_eq!(default_kind(&wrapped), Some(Kind::Timeout));
    }
}
