//! Wire format for the BIER (Bit Index Explicit Replication) encapsulation
//! header, as laid out in RFC 8296.

mod header;
pub use header::{BierHeader, Error, BITSTRING_LEN, HEADER_LEN};

/// The EtherType used when a BIER header directly follows the Ethernet header.
pub const ETHERTYPE_BIER: u16 = 0xAB37;

/// Conventional value of the first nibble of the header.
pub const NIBBLE_BIER: u8 = 0x5;

/// BSL code point declaring a 256-bit bitstring.
pub const BSL_256: u8 = 3;

/// Next-protocol code points from the IANA BIER registry.
pub mod proto {
    pub const MPLS_DOWNSTREAM: u8 = 1;
    pub const MPLS_UPSTREAM: u8 = 2;
    pub const ETHERNET: u8 = 3;
    pub const IPV4: u8 = 4;
    pub const OAM: u8 = 5;
    pub const IPV6: u8 = 6;
}
