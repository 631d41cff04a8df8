//! Specification levels for the `Request` typestate pattern
//!
//! A request is either partial (method and URI unknown, cannot be sent) or
//! complete. The method and URI are stored together in the level's
//! `Target`, so a request with only one of them cannot be expressed.

use std::fmt;

use http::{Method, Uri};

mod sealed {
    pub trait Sealed {}
}

/// Marker trait for the two specification levels.
pub trait Specification: sealed::Sealed + Send + Sync + 'static {
    /// What this level knows about where the request goes.
    type Target: Clone + fmt::Debug + Send + Sync + 'static;
}

/// State marker for a request without method and URI
#[derive(Debug, Clone, Copy)]
pub struct Partial;

/// State marker for a request that can be sent
#[derive(Debug, Clone, Copy)]
pub struct Complete;

/// Method and URI of a complete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub method: Method,
    pub uri: Uri,
}

impl sealed::Sealed for Partial {}
impl sealed::Sealed for Complete {}

impl Specification for Partial {
    type Target = ();
}

impl Specification for Complete {
    type Target = Target;
}
