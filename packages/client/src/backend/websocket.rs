//! Websocket handle handed to websocket response strategies
//!
//! Framing and the handshake belong to the transport. This module only wraps
//! the two frame halves so that the connection is released once the handle is
//! closed or dropped.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::{SinkExt, Stream, StreamExt};

use crate::backend::stream::BodyComplete;
use crate::backend::transport::{FrameSink, FrameStream};
use crate::error::{self, Result};

/// A websocket message or control frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Bytes),
    Ping(Bytes),
    Pong(Bytes),
    Close(Option<CloseReason>),
}

/// Status code and reason carried by a close frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseReason {
    pub code: u16,
    pub reason: String,
}

/// An open websocket connection.
pub struct WebSocket {
    incoming: FrameStream,
    outgoing: FrameSink,
    complete: Option<BodyComplete>,
}

impl WebSocket {
    pub(crate) fn new(incoming: FrameStream, outgoing: FrameSink, complete: BodyComplete) -> Self {
        Self {
            incoming,
            outgoing,
            complete: Some(complete),
        }
    }

    /// Sends one frame.
    ///
    /// # Errors
    ///
    /// Returns a read error when the transport rejects the frame.
    pub async fn send(&mut self, frame: Frame) -> Result<()> {
        self.outgoing.send(frame).await.map_err(error::read)
    }

    /// Sends a text message.
    ///
    /// # Errors
    ///
    /// See [`WebSocket::send`].
    pub async fn send_text(&mut self, text: impl Into<String>) -> Result<()> {
        self.send(Frame::Text(text.into())).await
    }

    /// Receives the next frame, or `None` once the peer has gone away.
    pub async fn receive(&mut self) -> Option<Result<Frame>> {
        self.next().await
    }

    /// Sends a close frame and releases the connection.
    ///
    /// # Errors
    ///
    /// Returns a read error when the close frame cannot be delivered; the
    /// connection is released either way.
    pub async fn close(mut self, reason: Option<CloseReason>) -> Result<()> {
        let sent = self.outgoing.send(Frame::Close(reason)).await;
        let flushed = self.outgoing.close().await;
        self.finish();
        sent.and(flushed).map_err(error::read)
    }

    fn finish(&mut self) {
        if let Some(complete) = self.complete.take() {
            complete.signal();
        }
    }
}

impl Stream for WebSocket {
    type Item = Result<Frame>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.complete.is_none() {
            return Poll::Ready(None);
        }
        match self.incoming.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(frame))) => Poll::Ready(Some(Ok(frame))),
            Poll::Ready(Some(Err(e))) => {
                self.finish();
                Poll::Ready(Some(Err(error::read(e))))
            }
            Poll::Ready(None) => {
                self.finish();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for WebSocket {
    fn drop(&mut self) {
        self.finish();
    }
}

impl fmt::Debug for WebSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocket")
            .field("open", &self.complete.is_some())
            .finish_non_exhaustive()
    }
}
