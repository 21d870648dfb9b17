//! In-process frame capture for tests and unprivileged runs.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::{FrameSink, TransportError};

/// A [`FrameSink`] that forwards every frame to an unbounded channel.
///
/// Dropping the receiving half makes the next send fail with
/// [`TransportError::Closed`], which the generator treats as fatal.
#[derive(Debug, Clone)]
pub struct MockSink {
    tx: UnboundedSender<Bytes>,
}

/// Creates a capture sink and the receiver observing its frames.
pub fn channel() -> (MockSink, UnboundedReceiver<Bytes>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MockSink { tx }, rx)
}

#[async_trait]
impl FrameSink for MockSink {
    async fn send_frame(&mut self, frame: Bytes) -> Result<(), TransportError> {
        self.tx.send(frame).map_err(|_| TransportError::Closed)
    }
}
