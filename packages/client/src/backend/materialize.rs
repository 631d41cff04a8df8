//! Response body materialization
//!
//! Turns a [`BodyStream`] into the [`RawBody`] a strategy asks for. Buffered
//! strategies drain the stream here, which signals body-complete as soon as
//! the last chunk is read; the stream strategy hands the stream on untouched.

use std::path::Path;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use super::stream::BodyStream;
use crate::builder::{BodyStrategy, CapabilitySet, RawBody};
use crate::error::{self, Result};

/// Consumes `body` according to `strategy`.
///
/// # Errors
///
/// Body errors propagate as produced (read, timeout, length exceeded); file
/// system failures become read errors.
pub(crate) async fn materialize(
    strategy: &BodyStrategy,
    body: BodyStream,
    supported: CapabilitySet,
) -> Result<RawBody> {
    match strategy {
        BodyStrategy::Ignore => drain(body).await.map(|()| RawBody::Unit),
        BodyStrategy::ByteArray => body.bytes().await.map(RawBody::Bytes),
        BodyStrategy::File(path) => write_file(path, body)
            .await
            .map(|()| RawBody::File(path.clone())),
        BodyStrategy::Stream => Ok(RawBody::Stream(body)),
        BodyStrategy::WebSocket => {
            body.close();
            Err(reject_websocket(supported))
        }
    }
}

/// The error for a websocket strategy sent to a backend without websockets.
fn reject_websocket(supported: CapabilitySet) -> crate::Error {
    error::capability_mismatch(CapabilitySet::WEBSOCKETS, supported)
}

async fn drain(mut body: BodyStream) -> Result<()> {
    let mut discarded = 0u64;
    while let Some(chunk) = body.next().await {
        discarded += chunk?.len() as u64;
    }
    tracing::trace!(target: "strand::materialize", bytes = discarded, "Response body discarded");
    Ok(())
}

async fn write_file(path: &Path, mut body: BodyStream) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(error::read)?;
    }

    let mut file = tokio::fs::File::create(path).await.map_err(error::read)?;
    let mut written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await.map_err(error::read)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(error::read)?;

    tracing::debug!(
        target: "strand::materialize",
        path = %path.display(),
        bytes = written,
        "Response body written to file"
    );
    Ok(())
}
