//! Synthetic traffic generator for BIER-encapsulated multicast frames.
//!
//! A [`Generator`] repeatedly picks a destination from a read-only
//! [`DestinationPool`], assembles a full Ethernet frame (with or without the
//! BIER encapsulation header from [`bier_wire`]) and hands it to a
//! [`FrameSink`](bier_transport::FrameSink) at a fixed cadence, until
//! cancelled or until the sink fails fatally.

use std::{
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
    time::Duration,
};

use bytes::Bytes;
use pnet::util::MacAddr;
use rand::Rng;
use thiserror::Error;

use bier_transport::TransportError;
use bier_wire::BierHeader;

mod frame;
pub use frame::build_frame;

mod generator;
pub use generator::{Generator, State};

mod stats;
pub use stats::GeneratorStats;

/// The default pause between two sends.
const DEFAULT_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum GenError {
    #[error("destination pool is empty")]
    EmptyPool,
    #[error("wire error: {0}")]
    Wire(#[from] bier_wire::Error),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Static configuration of a generator run. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Source hardware address of every frame.
    pub(crate) src_mac: MacAddr,
    /// Destination hardware address of every frame.
    pub(crate) dst_mac: MacAddr,
    /// IPv4 source address, used when the picked destination is IPv4.
    pub(crate) src_ipv4: Ipv4Addr,
    /// IPv6 source address, used when the picked destination is IPv6.
    pub(crate) src_ipv6: Ipv6Addr,
    pub(crate) src_port: u16,
    pub(crate) dst_port: u16,
    /// TTL (IPv4) / hop limit (IPv6) of the inner packet.
    pub(crate) ip_ttl: u8,
    /// Pause between two sends. Zero means "as fast as possible".
    pub(crate) interval: Duration,
    /// UDP payload of every frame.
    pub(crate) payload: Bytes,
    /// BIER header template. When set, frames carry the BIER ethertype and
    /// the encoded header between Ethernet and IP.
    pub(crate) bier: Option<BierHeader>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            src_mac: MacAddr::new(0x02, 0x42, 0xac, 0x11, 0x00, 0x01),
            dst_mac: MacAddr::new(0x02, 0x42, 0xac, 0x11, 0x00, 0x02),
            src_ipv4: Ipv4Addr::new(192, 168, 0, 1),
            src_ipv6: Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 1),
            src_port: 12345,
            dst_port: 54321,
            ip_ttl: 64,
            interval: DEFAULT_INTERVAL,
            payload: Bytes::from_static(b"Hello via BIER"),
            bier: None,
        }
    }
}

impl GeneratorConfig {
    /// Sets the source hardware address.
    pub fn src_mac(mut self, mac: MacAddr) -> Self {
        self.src_mac = mac;
        self
    }

    /// Sets the destination hardware address.
    pub fn dst_mac(mut self, mac: MacAddr) -> Self {
        self.dst_mac = mac;
        self
    }

    /// Sets the IPv4 source address.
    pub fn src_ipv4(mut self, addr: Ipv4Addr) -> Self {
        self.src_ipv4 = addr;
        self
    }

    /// Sets the IPv6 source address.
    pub fn src_ipv6(mut self, addr: Ipv6Addr) -> Self {
        self.src_ipv6 = addr;
        self
    }

    /// Sets the UDP source port.
    pub fn src_port(mut self, port: u16) -> Self {
        self.src_port = port;
        self
    }

    /// Sets the UDP destination port.
    pub fn dst_port(mut self, port: u16) -> Self {
        self.dst_port = port;
        self
    }

    /// Sets the TTL / hop limit of the inner packet.
    pub fn ip_ttl(mut self, ttl: u8) -> Self {
        self.ip_ttl = ttl;
        self
    }

    /// Sets the pause between two sends. [`Duration::ZERO`] disables the
    /// pause entirely.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the UDP payload.
    pub fn payload(mut self, payload: Bytes) -> Self {
        self.payload = payload;
        self
    }

    /// Sets the BIER header template. The template's `proto` field is
    /// stamped per frame to match the inner address family; everything else
    /// goes out as given here.
    pub fn bier(mut self, header: BierHeader) -> Self {
        self.bier = Some(header);
        self
    }
}

/// An ordered, non-empty, read-only set of destination addresses.
#[derive(Debug, Clone)]
pub struct DestinationPool {
    addrs: Vec<IpAddr>,
}

impl DestinationPool {
    /// Builds a pool from the given addresses. An empty pool is a
    /// configuration error and is rejected here, never at send time.
    pub fn new(addrs: Vec<IpAddr>) -> Result<Self, GenError> {
        if addrs.is_empty() {
            return Err(GenError::EmptyPool);
        }

        Ok(Self { addrs })
    }

    /// The configured addresses, in configuration order.
    pub fn addrs(&self) -> &[IpAddr] {
        &self.addrs
    }

    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    pub fn is_empty(&self) -> bool {
        // ruled out by the constructor
        false
    }

    /// Picks one destination uniformly at random. Every call is an
    /// independent draw; the pool is never consumed or reordered.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> IpAddr {
        self.addrs[rng.gen_range(0..self.addrs.len())]
    }
}
