use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use pnet::datalink::{self, Channel, DataLinkSender};
use tracing::debug;

use crate::{FrameSink, TransportError};

/// A [`FrameSink`] writing raw Ethernet frames to a network interface.
///
/// Opening the channel usually requires `CAP_NET_RAW` (or root).
pub struct DatalinkSink {
    interface: String,
    tx: Box<dyn DataLinkSender>,
}

impl DatalinkSink {
    /// Opens a raw Ethernet channel on the interface with the given name.
    pub fn new(interface: &str) -> Result<Self, TransportError> {
        let iface = datalink::interfaces()
            .into_iter()
            .find(|i| i.name == interface)
            .ok_or_else(|| TransportError::UnknownInterface(interface.to_string()))?;

        let tx = match datalink::channel(&iface, datalink::Config::default()) {
            Ok(Channel::Ethernet(tx, _rx)) => tx,
            Ok(_) => return Err(TransportError::UnsupportedChannel),
            Err(e) => return Err(TransportError::Io(e)),
        };

        debug!(interface, "opened datalink channel");

        Ok(Self {
            interface: interface.to_string(),
            tx,
        })
    }

    /// Name of the interface this sink writes to.
    pub fn interface(&self) -> &str {
        &self.interface
    }
}

#[async_trait]
impl FrameSink for DatalinkSink {
    async fn send_frame(&mut self, frame: Bytes) -> Result<(), TransportError> {
        match self.tx.send_to(&frame, None) {
            Some(Ok(())) => Ok(()),
            Some(Err(e)) => Err(TransportError::Io(e)),
            None => Err(TransportError::Closed),
        }
    }
}

impl fmt::Debug for DatalinkSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatalinkSink").field("interface", &self.interface).finish()
    }
}
