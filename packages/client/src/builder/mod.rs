//! Request description builder
//!
//! Provides the immutable [`Request`] value, its builder methods, the
//! specification levels that make only complete requests sendable, and the
//! capability markers tracked in its type.

pub mod body;
pub mod builder_core;
pub mod capabilities;
pub mod configuration;
pub mod headers;
pub mod methods;
pub mod response_as;
pub mod state_types;

pub use builder_core::{Request, Tags};
pub use capabilities::{
    Capabilities, CapabilitySet, NoCapabilities, Streaming, StreamingAndWebSockets, Supports,
    Union, WebSockets,
};
pub use configuration::{DEFAULT_MAX_REDIRECTS, DEFAULT_READ_TIMEOUT, RequestOptions};
pub use response_as::{BodyStrategy, RawBody, ResponseAs};
pub use state_types::{Complete, Partial, Specification, Target};
