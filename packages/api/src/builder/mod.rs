//! Request builder extensions
//!
//! Entry points, verb shortcuts and extension traits that add
//! authentication, serialized bodies and header conveniences to
//! [`strand_client::Request`].

pub mod auth;
pub mod body;
pub mod core;
pub mod headers;
pub mod methods;

pub use auth::{AUTH_SCHEME_TAG, AuthExt, AuthScheme, auth_scheme};
pub use body::{FormExt, JsonExt};
pub use self::core::{ContentType, DEFAULT_ACCEPT_ENCODING, basic_request, empty_request};
pub use headers::{AcceptValue, HeaderExt, header};
pub use methods::{delete, get, head, options, patch, post, put};
