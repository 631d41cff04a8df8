//! Backend configuration and validation

pub mod backend;
pub mod validation;

pub use backend::BackendConfig;
pub use validation::{ConfigResult, ConfigValidator, ConfigurationError, Validator};
