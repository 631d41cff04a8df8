//! Backend-wide settings
//!
//! Values here apply to every request a backend executes unless the request
//! overrides them through its own options.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::validation::{ConfigResult, ConfigurationError, Validator};
use crate::http::compression::{Decompressor, default_decoders};

/// Settings shared by all exchanges of one backend.
#[derive(Clone)]
pub struct BackendConfig {
    /// Decode responses that declare a `Content-Encoding`.
    pub decompression_enabled: bool,
    /// Decoders matched against the response `Content-Encoding` token.
    pub decoders: Vec<Arc<dyn Decompressor>>,
    /// Body limit for requests that do not set their own.
    pub max_response_body_length: Option<u64>,
    /// Compress request bodies that declare a `Content-Encoding`.
    pub request_compression: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            decompression_enabled: true,
            decoders: default_decoders(),
            max_response_body_length: None,
            request_compression: true,
        }
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let decoders: Vec<&str> = self.decoders.iter().map(|d| d.encoding()).collect();
        f.debug_struct("BackendConfig")
            .field("decompression_enabled", &self.decompression_enabled)
            .field("decoders", &decoders)
            .field("max_response_body_length", &self.max_response_body_length)
            .field("request_compression", &self.request_compression)
            .finish()
    }
}

impl BackendConfig {
    #[must_use]
    pub fn with_decompression(mut self, enabled: bool) -> Self {
        self.decompression_enabled = enabled;
        self
    }

    /// Register an additional decoder; it takes precedence over built-in ones.
    #[must_use]
    pub fn with_decoder(mut self, decoder: Arc<dyn Decompressor>) -> Self {
        self.decoders.insert(0, decoder);
        self
    }

    #[must_use]
    pub fn with_decoders(mut self, decoders: Vec<Arc<dyn Decompressor>>) -> Self {
        self.decoders = decoders;
        self
    }

    #[must_use]
    pub fn with_max_response_body_length(mut self, limit: u64) -> Self {
        self.max_response_body_length = Some(limit);
        self
    }

    #[must_use]
    pub fn with_request_compression(mut self, enabled: bool) -> Self {
        self.request_compression = enabled;
        self
    }
}

impl Validator for BackendConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.decompression_enabled && self.decoders.is_empty() {
            return Err(ConfigurationError::Conflict(
                "decompression is enabled but no decoders are registered".to_owned(),
            ));
        }

        let mut seen = HashSet::new();
        for decoder in &self.decoders {
            let token = decoder.encoding().trim().to_ascii_lowercase();
            if token.is_empty() {
                return Err(ConfigurationError::InvalidParameter(
                    "decoder encoding token cannot be empty".to_owned(),
                ));
            }
            if !seen.insert(token.clone()) {
                tracing::debug!(
                    target: "strand::config",
                    encoding = %token,
                    "Decoder registered twice; the first registration wins"
                );
            }
        }

        Ok(())
    }
}
