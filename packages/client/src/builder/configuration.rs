//! Per-request options
//!
//! Provides the option set carried by every request description and the
//! builder methods that adjust it: redirects, read timeout, response body
//! limit, decompression and protocol version.

use std::time::Duration;

use http::Version;

use super::builder_core::Request;
use super::capabilities::Capabilities;
use super::state_types::Specification;

/// Redirects followed when the caller does not say otherwise.
pub const DEFAULT_MAX_REDIRECTS: u32 = 32;

/// Time allowed for the response head and for each body chunk.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Options that steer how a backend executes one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    pub follow_redirects: bool,
    pub read_timeout: Duration,
    /// Inclusive ceiling; only meaningful while `follow_redirects` is set.
    pub max_redirects: u32,
    /// Rewrite the method of a redirected non-GET request to GET.
    pub redirect_to_get: bool,
    /// Fail the response once its decoded body grows past this many bytes.
    pub max_response_body_length: Option<u64>,
    pub decompress_response: bool,
    pub http_version: Option<Version>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            follow_redirects: true,
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            redirect_to_get: false,
            max_response_body_length: None,
            decompress_response: true,
            http_version: None,
        }
    }
}

impl RequestOptions {
    /// Applies a redirect ceiling.
    ///
    /// Zero or a negative count turns redirect following off and leaves the
    /// stored ceiling untouched.
    #[must_use]
    pub fn with_max_redirects(mut self, n: i32) -> Self {
        match u32::try_from(n) {
            Ok(n) if n > 0 => {
                self.follow_redirects = true;
                self.max_redirects = n;
            }
            _ => self.follow_redirects = false,
        }
        self
    }

    /// The same options with a zero ceiling read as "do not follow".
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.max_redirects == 0 {
            self.follow_redirects = false;
            self.max_redirects = DEFAULT_MAX_REDIRECTS;
        }
        self
    }
}

impl<U: Specification, T, R: Capabilities> Request<U, T, R> {
    /// Follow redirects up to the configured ceiling.
    #[must_use]
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.options.follow_redirects = follow;
        self
    }

    /// Set the redirect ceiling
    ///
    /// # Arguments
    /// * `n` - Maximum number of redirects to follow; `n <= 0` disables
    ///   redirect following instead of failing
    ///
    /// # Returns
    /// `Self` for method chaining
    #[must_use]
    pub fn max_redirects(mut self, n: i32) -> Self {
        self.options = self.options.with_max_redirects(n);
        self
    }

    /// Set the read timeout
    ///
    /// Applies to waiting for the response head and to every body chunk
    /// after it.
    ///
    /// # Arguments
    /// * `timeout` - How long a single read may take
    ///
    /// # Returns
    /// `Self` for method chaining
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.options.read_timeout = timeout;
        self
    }

    #[must_use]
    pub fn redirect_to_get(mut self, redirect_to_get: bool) -> Self {
        self.options.redirect_to_get = redirect_to_get;
        self
    }

    /// Limit the decoded response body to `limit` bytes.
    #[must_use]
    pub fn max_response_body_length(mut self, limit: u64) -> Self {
        self.options.max_response_body_length = Some(limit);
        self
    }

    /// Turn automatic response decompression on or off.
    #[must_use]
    pub fn decompress_response(mut self, decompress: bool) -> Self {
        self.options.decompress_response = decompress;
        self
    }

    /// Ask the transport for a specific protocol version.
    #[must_use]
    pub fn http_version(mut self, version: Version) -> Self {
        self.options.http_version = Some(version);
        self
    }

    /// Replace all options at once
    ///
    /// A zero redirect ceiling turns redirect following off, as
    /// [`Request::max_redirects`] does.
    #[must_use]
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options.normalized();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_ceilings_disable_following() {
        for n in [0, -5, i32::MIN] {
            let options = RequestOptions::default().with_max_redirects(n);
            assert!(!options.follow_redirects);
            assert_eq!(options.max_redirects, DEFAULT_MAX_REDIRECTS);
        }
    }

    #[test]
    fn positive_ceilings_enable_following() {
        let options = RequestOptions {
            follow_redirects: false,
            ..RequestOptions::default()
        }
        .with_max_redirects(3);
        assert!(options.follow_redirects);
        assert_eq!(options.max_redirects, 3);
    }

    #[test]
    fn replacing_options_normalizes_a_zero_ceiling() {
        let request = Request::new().with_options(RequestOptions {
            max_redirects: 0,
            ..RequestOptions::default()
        });
        assert!(!request.options().follow_redirects);
        assert_eq!(request.options().max_redirects, DEFAULT_MAX_REDIRECTS);
    }
}
