//! Synchronous backend
//!
//! Runs the same coordinator on a private current-thread runtime. Without an
//! async caller there is nobody to drive a streamed body or a websocket, so
//! only capability-less requests are accepted.

use tokio::runtime::{Builder, Runtime};

use super::coordinator::HttpBackend;
use super::transport::Transport;
use crate::builder::{Capabilities, CapabilitySet, Complete, NoCapabilities, Request};
use crate::config::{BackendConfig, Validator};
use crate::error::{self, Result};
use crate::http::response::Response;

/// A backend whose `send` blocks the calling thread until the response is ready.
///
/// Must not be used from within an async context.
pub struct BlockingBackend<Tr> {
    inner: HttpBackend<Tr>,
    runtime: Runtime,
}

impl<Tr: Transport> BlockingBackend<Tr> {
    /// A blocking backend with the default configuration
    ///
    /// # Errors
    ///
    /// Fails when the private runtime cannot be started.
    pub fn new(transport: Tr) -> Result<Self> {
        Self::with_config(transport, BackendConfig::default())
    }

    /// A blocking backend with a custom configuration
    ///
    /// # Errors
    ///
    /// Returns a builder error for an invalid configuration or when the
    /// private runtime cannot be started.
    pub fn with_config(transport: Tr, config: BackendConfig) -> Result<Self> {
        config.validate().map_err(error::builder)?;
        let runtime = Builder::new_current_thread()
            .enable_time()
            .thread_name("strand-blocking")
            .build()
            .map_err(error::builder)?;
        let inner = HttpBackend::with_config(transport, config).map_err(error::builder)?;
        Ok(Self { inner, runtime })
    }

    /// Performs the exchange, returning once the body has been materialized
    /// and the connection released.
    ///
    /// # Errors
    ///
    /// Any failure of the exchange.
    pub fn send<T: Send + 'static>(
        &self,
        request: Request<Complete, T, NoCapabilities>,
    ) -> Result<Response<T>> {
        self.runtime.block_on(self.inner.execute(request))
    }

    /// Like [`BlockingBackend::send`] for requests whose capabilities are
    /// only known generically.
    ///
    /// # Errors
    ///
    /// Returns a capability mismatch, before any I/O, for requests that need
    /// streaming or websockets.
    pub fn send_checked<T, R>(&self, request: Request<Complete, T, R>) -> Result<Response<T>>
    where
        T: Send + 'static,
        R: Capabilities,
    {
        let required = R::SET.union(request.response_as().strategy().required());
        if required != CapabilitySet::NONE {
            return Err(
                error::capability_mismatch(required, CapabilitySet::NONE)
                    .with_uri(request.uri().clone()),
            );
        }
        self.runtime.block_on(self.inner.execute(request))
    }

    pub fn transport(&self) -> &Tr {
        self.inner.transport()
    }
}

impl<Tr> std::fmt::Debug for BlockingBackend<Tr> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingBackend")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}
