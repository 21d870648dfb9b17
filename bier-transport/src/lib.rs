//! Link-layer frame transmission for the BIER traffic generator.
//!
//! The generator only ever hands fully serialized Ethernet frames to a
//! [`FrameSink`]. The real implementation, [`DatalinkSink`], writes them to a
//! network interface through a raw `pnet` datalink channel; [`mock::MockSink`]
//! captures them in-process for tests.

use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

mod datalink;
pub use datalink::DatalinkSink;

pub mod mock;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("IO error: {0:?}")]
    Io(#[from] io::Error),
    #[error("unknown interface: {0}")]
    UnknownInterface(String),
    #[error("interface channel is not Ethernet")]
    UnsupportedChannel,
    #[error("link closed")]
    Closed,
}

impl TransportError {
    /// Whether the sender is beyond recovery. A fatal error terminates the
    /// generator loop; anything else is logged and the next send proceeds.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::UnknownInterface(_) | Self::UnsupportedChannel | Self::Closed => true,
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::NotFound
                    | io::ErrorKind::NotConnected
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::PermissionDenied
            ),
        }
    }
}

/// A fire-and-forget sink for serialized link-layer frames.
#[async_trait]
pub trait FrameSink: Send {
    async fn send_frame(&mut self, frame: Bytes) -> Result<(), TransportError>;
}
