//! Response body streams and the body-complete signal
//!
//! Every exchange owns one [`BodyComplete`] signal. Whoever ends up holding
//! the response body holds the signal too: the materialization step for
//! buffered strategies, the caller for streamed ones. The signal fires
//! exactly once, when the body reaches its end, fails, is closed or is
//! dropped, and the exchange task releases the connection after it.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use tokio::sync::oneshot;

use crate::error::{self, BoxError, HttpError, Result};
use crate::http::body::ByteStream;
use crate::http::compression::ResponseBytes;
use crate::http::response::ResponseMetadata;

/// Callback fired once a response body has been consumed completely.
pub type OnBodyReceived = Arc<dyn Fn(&ResponseMetadata) + Send + Sync>;

/// Single-assignment signal that a response body is done with.
///
/// Dropping the signal counts as signalling it.
pub struct BodyComplete {
    tx: Option<oneshot::Sender<()>>,
}

/// Receiving side of [`BodyComplete`]; resolves once the body is done with.
pub(crate) type BodyCompleteCell = oneshot::Receiver<()>;

impl BodyComplete {
    pub(crate) fn channel() -> (BodyComplete, BodyCompleteCell) {
        let (tx, rx) = oneshot::channel();
        (BodyComplete { tx: Some(tx) }, rx)
    }

    pub fn signal(mut self) {
        self.fire();
    }

    fn fire(&mut self) {
        if let Some(tx) = self.tx.take() {
            // The exchange task may already be gone; nothing left to release then.
            let _ = tx.send(());
        }
    }
}

impl Drop for BodyComplete {
    fn drop(&mut self) {
        self.fire();
    }
}

impl fmt::Debug for BodyComplete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyComplete")
            .field("pending", &self.tx.is_some())
            .finish()
    }
}

/// A lazily consumed response body.
///
/// Yields decoded, length-checked chunks. Reaching the end, hitting an
/// error, calling [`BodyStream::close`] or dropping the stream releases the
/// underlying connection. The body-received callback, if any, runs only
/// when the end is reached without an error.
pub struct BodyStream {
    inner: ResponseBytes,
    complete: Option<BodyComplete>,
    on_received: Option<(OnBodyReceived, ResponseMetadata)>,
}

impl BodyStream {
    pub(crate) fn new(
        inner: ResponseBytes,
        complete: BodyComplete,
        on_received: Option<(OnBodyReceived, ResponseMetadata)>,
    ) -> Self {
        Self {
            inner,
            complete: Some(complete),
            on_received,
        }
    }

    /// Stops reading and releases the connection without draining.
    pub fn close(mut self) {
        self.on_received = None;
        self.finish();
    }

    /// True once the stream has ended, failed or been closed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.complete.is_none()
    }

    /// Reads the rest of the body into one buffer.
    ///
    /// # Errors
    ///
    /// Returns the first error the body produced.
    pub async fn bytes(mut self) -> Result<Bytes> {
        let mut buffer = BytesMut::new();
        while let Some(chunk) = self.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        Ok(buffer.freeze())
    }

    fn finish(&mut self) {
        if let Some(complete) = self.complete.take() {
            complete.signal();
            tracing::trace!(target: "strand::stream", "Response body complete");
        }
    }
}

impl Stream for BodyStream {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.complete.is_none() {
            return Poll::Ready(None);
        }
        match self.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(chunk))) => Poll::Ready(Some(Ok(chunk))),
            Poll::Ready(Some(Err(e))) => {
                self.on_received = None;
                self.finish();
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                if let Some((callback, metadata)) = self.on_received.take() {
                    callback(&metadata);
                }
                self.finish();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for BodyStream {
    fn drop(&mut self) {
        self.finish();
    }
}

impl fmt::Debug for BodyStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyStream")
            .field("finished", &self.is_finished())
            .finish_non_exhaustive()
    }
}

/// Runs every transport error through `translate`.
pub(crate) fn translate_errors(
    body: ByteStream,
    translate: impl Fn(BoxError) -> HttpError + Send + 'static,
) -> ResponseBytes {
    Box::pin(body.map(move |chunk| chunk.map_err(&translate)))
}

/// Fails the body with a timeout error when a chunk takes longer than `timeout`.
pub(crate) fn with_read_timeout(body: ResponseBytes, timeout: Duration) -> ResponseBytes {
    Box::pin(futures::stream::unfold(Some(body), move |state| async move {
        let mut body = state?;
        match tokio::time::timeout(timeout, body.next()).await {
            Ok(Some(chunk)) => Some((chunk, Some(body))),
            Ok(None) => None,
            Err(elapsed) => Some((Err(error::timeout(elapsed)), None)),
        }
    }))
}

/// Fails the body once more than `limit` bytes have been seen.
///
/// The chunk that crosses the limit is never yielded.
pub(crate) fn limit_length(body: ResponseBytes, limit: u64) -> ResponseBytes {
    Box::pin(LengthLimited {
        inner: Some(body),
        limit,
        seen: 0,
    })
}

struct LengthLimited {
    inner: Option<ResponseBytes>,
    limit: u64,
    seen: u64,
}

impl Stream for LengthLimited {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let Some(inner) = self.inner.as_mut() else {
            return Poll::Ready(None);
        };
        match inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                self.seen += chunk.len() as u64;
                if self.seen > self.limit {
                    tracing::warn!(
                        target: "strand::stream",
                        limit = self.limit,
                        seen = self.seen,
                        "Response body exceeds maximum length"
                    );
                    self.inner = None;
                    return Poll::Ready(Some(Err(error::body_length_exceeded(self.limit))));
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                self.inner = None;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                self.inner = None;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use http::StatusCode;

    use super::*;

    fn chunks(parts: &[&'static [u8]]) -> ResponseBytes {
        let items: Vec<Result<Bytes>> = parts.iter().map(|p| Ok(Bytes::from_static(p))).collect();
        Box::pin(futures::stream::iter(items))
    }

    fn metadata() -> ResponseMetadata {
        ResponseMetadata::new(StatusCode::OK, "OK", Vec::new())
    }

    #[tokio::test]
    async fn limit_allows_exact_length() {
        let body = limit_length(chunks(&[b"abc", b"de"]), 5);
        let collected: Vec<_> = body.collect().await;
        assert!(collected.iter().all(std::result::Result::is_ok));
    }

    #[tokio::test]
    async fn limit_fails_one_byte_over() {
        let mut body = limit_length(chunks(&[b"abc", b"def"]), 5);
        assert!(body.next().await.expect("first chunk").is_ok());
        let err = body.next().await.expect("error item").expect_err("over limit");
        assert!(err.is_body_length_exceeded());
        assert!(body.next().await.is_none());
    }

    #[tokio::test]
    async fn natural_end_signals_once_and_fires_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let callback: OnBodyReceived = Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let (complete, mut cell) = BodyComplete::channel();
        let mut stream = BodyStream::new(chunks(&[b"a", b"b"]), complete, Some((callback, metadata())));

        assert!(cell.try_recv().is_err());
        while stream.next().await.is_some() {}
        assert!(stream.is_finished());
        assert!(stream.next().await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cell.await.is_ok());
    }

    #[tokio::test]
    async fn close_signals_without_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let callback: OnBodyReceived = Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let (complete, cell) = BodyComplete::channel();
        let stream = BodyStream::new(chunks(&[b"a"]), complete, Some((callback, metadata())));
        stream.close();
        assert!(cell.await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dropping_the_signal_completes_the_cell() {
        let (complete, cell) = BodyComplete::channel();
        drop(complete);
        // A dropped sender also resolves the cell; either outcome means done.
        let _ = cell.await;
    }

    #[tokio::test(start_paused = true)]
    async fn slow_chunks_time_out() {
        let slow: ResponseBytes = Box::pin(futures::stream::once(async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Bytes::from_static(b"late"))
        }));
        let mut body = with_read_timeout(slow, Duration::from_secs(1));
        let err = body.next().await.expect("item").expect_err("timed out");
        assert!(err.is_timeout());
        assert!(body.next().await.is_none());
    }
}
