//! Authentication methods for HTTP requests
//!
//! Provides convenient methods for setting authentication headers including
//! API keys, basic authentication, and bearer token authentication. Each one
//! replaces any earlier credentials and records the scheme in a request tag,
//! so backends can tell how the request authenticates without parsing
//! headers.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use strand_client::builder::{Capabilities, Specification};
use strand_client::http::header::names;
use strand_client::Request;

use crate::builder::headers::header;

/// Tag key under which the authentication scheme is recorded.
pub const AUTH_SCHEME_TAG: &str = "strand.auth.scheme";

/// How a request authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthScheme {
    Basic,
    Bearer,
    ApiKey,
}

/// The scheme recorded by one of the [`AuthExt`] methods, if any.
#[must_use]
pub fn auth_scheme<U: Specification, T, R: Capabilities>(
    request: &Request<U, T, R>,
) -> Option<AuthScheme> {
    request.tag_as::<AuthScheme>(AUTH_SCHEME_TAG).copied()
}

/// Credential helpers for request descriptions.
pub trait AuthExt: Sized {
    /// Set basic authentication header
    ///
    /// The credentials are base64 encoded as `user:password`.
    ///
    /// # Arguments
    /// * `user` - User name
    /// * `password` - Password
    ///
    /// # Returns
    /// `Self` for method chaining
    ///
    /// # Examples
    /// ```
    /// use strand::AuthExt;
    ///
    /// let request = strand::empty_request().basic_auth("Aladdin", "open sesame");
    /// assert_eq!(
    ///     request.header_value("Authorization"),
    ///     Some("Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==")
    /// );
    /// ```
    #[must_use]
    fn basic_auth(self, user: &str, password: &str) -> Self;

    /// Set bearer token authentication header
    ///
    /// # Arguments
    /// * `token` - The bearer token to use for authentication
    ///
    /// # Returns
    /// `Self` for method chaining
    #[must_use]
    fn bearer_auth(self, token: &str) -> Self;

    /// Set an `X-API-Key` header.
    #[must_use]
    fn api_key(self, key: &str) -> Self;
}

impl<U: Specification, T, R: Capabilities> AuthExt for Request<U, T, R> {
    fn basic_auth(self, user: &str, password: &str) -> Self {
        let encoded = STANDARD.encode(format!("{user}:{password}"));
        log::debug!("Request authenticates with basic credentials for {user}");
        self.set_header(names::AUTHORIZATION, format!("Basic {encoded}"))
            .tag(AUTH_SCHEME_TAG, AuthScheme::Basic)
    }

    fn bearer_auth(self, token: &str) -> Self {
        self.set_header(names::AUTHORIZATION, format!("Bearer {token}"))
            .tag(AUTH_SCHEME_TAG, AuthScheme::Bearer)
    }

    fn api_key(self, key: &str) -> Self {
        self.set_header(header::X_API_KEY, key)
            .tag(AUTH_SCHEME_TAG, AuthScheme::ApiKey)
    }
}
