use super::types::{BoxError, Error, Kind};
use crate::builder::CapabilitySet;

/// Creates an `Error` for a request description that cannot be sent.
pub fn builder<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Builder).with(e.into())
}

/// Creates an `Error` for a failed connection attempt.
pub fn connect<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Connect).with(e.into())
}

/// Creates an `Error` for a failure while reading the response.
pub fn read<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Read).with(e.into())
}

/// Creates an `Error` for an elapsed read timeout.
pub fn timeout<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Timeout).with(e.into())
}

/// Creates an `Error` for a response body longer than `limit` bytes.
pub fn body_length_exceeded(limit: u64) -> Error {
    Error::new(Kind::BodyLengthExceeded { limit })
}

pub fn capability_mismatch(required: CapabilitySet, supported: CapabilitySet) -> Error {
    Error::new(Kind::CapabilityMismatch {
        required,
        supported,
    })
}

/// Wraps an unrecognized transport failure without altering it.
pub fn unknown<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Unknown).with(e.into())
}
