pub mod classification;
pub mod constructors;
pub mod helpers;
pub mod types;

pub use classification::default_kind;
pub(crate) use classification::translate;
pub use constructors::*;
pub use helpers::{ExchangeAbandoned, TimedOut};
pub use types::{BoxError, Error, Kind, Result};

// Type alias for symmetry with the rest of the API surface
pub type HttpError = Error;
