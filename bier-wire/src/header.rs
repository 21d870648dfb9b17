use bytes::{Buf, BufMut};
use thiserror::Error;

// Layout according to: https://datatracker.ietf.org/doc/html/rfc8296
//
//      0                   1                   2                   3
//      0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//     +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//     |              BIFT-id                  | TC  |S|     TTL       |
//     +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//     |Nibble |  Ver  |  BSL  |              Entropy                  |
//     +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//     |OAM|Rsv|    DSCP   |   Proto   |            BFIR-id            |
//     +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//     |                BitString  (first 32 bits)                     ~
//     +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//     ~                                                               ~
//     +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//     ~                BitString  (last 32 bits)                      |
//     +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+

/// Encoded length of the header in bytes: three fixed 32-bit words followed
/// by the 256-bit bitstring.
pub const HEADER_LEN: usize = 44;

/// Length of the bitstring in bytes.
pub const BITSTRING_LEN: usize = 32;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("field {field} out of range: {value} > {max}")]
    FieldRange {
        field: &'static str,
        value: u32,
        max: u32,
    },
    #[error("invalid header length: expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
}

/// A decoded BIER header. Field values are host-order; the wire
/// representation is produced by [`encode`](Self::encode) and consumed by
/// [`decode`](Self::decode).
///
/// The value is plain data: building a new header for every packet is the
/// intended use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BierHeader {
    /// BIER Forwarding Table identifier, 20 bits.
    pub bift_id: u32,
    /// Traffic class, 3 bits.
    pub tc: u8,
    /// Bottom-of-stack flag, 1 bit.
    pub s: bool,
    /// Hop limit.
    pub ttl: u8,
    /// First nibble of the header, conventionally [`NIBBLE_BIER`](crate::NIBBLE_BIER).
    pub nibble: u8,
    /// Header version, 4 bits.
    pub version: u8,
    /// BitString length code, 4 bits. Declares `2^(bsl + 5)` bitstring bits
    /// by convention; not cross-checked against [`bitstring`](Self::bitstring).
    pub bsl: u8,
    /// Entropy for load balancing, 20 bits.
    pub entropy: u32,
    /// OAM bits, 2 bits.
    pub oam: u8,
    /// Reserved, 2 bits. Round-trips as written.
    pub rsv: u8,
    /// Differentiated services code point, 6 bits.
    pub dscp: u8,
    /// Next-protocol indicator, 6 bits. See [`proto`](crate::proto).
    pub proto: u8,
    /// Bit-Forwarding Ingress Router identifier.
    pub bfir_id: u16,
    /// Per-bit replication mask, 256 bits.
    pub bitstring: [u8; BITSTRING_LEN],
}

#[inline]
fn check(field: &'static str, value: u32, max: u32) -> Result<(), Error> {
    if value > max {
        return Err(Error::FieldRange { field, value, max });
    }

    Ok(())
}

impl BierHeader {
    /// Checks every field against its declared bit width. `ttl`, `bfir_id`
    /// and `s` occupy their full native width and cannot be out of range.
    pub fn validate(&self) -> Result<(), Error> {
        check("bift_id", self.bift_id, (1 << 20) - 1)?;
        check("tc", self.tc as u32, 0x07)?;
        check("nibble", self.nibble as u32, 0x0F)?;
        check("version", self.version as u32, 0x0F)?;
        check("bsl", self.bsl as u32, 0x0F)?;
        check("entropy", self.entropy, (1 << 20) - 1)?;
        check("oam", self.oam as u32, 0x03)?;
        check("rsv", self.rsv as u32, 0x03)?;
        check("dscp", self.dscp as u32, 0x3F)?;
        check("proto", self.proto as u32, 0x3F)?;

        Ok(())
    }

    /// Packs the header into its wire representation: three big-endian
    /// 32-bit words followed by the bitstring.
    pub fn encode(&self) -> Result<[u8; HEADER_LEN], Error> {
        let mut buf = [0u8; HEADER_LEN];
        self.encode_into(&mut &mut buf[..])?;

        Ok(buf)
    }

    /// Packs the header and appends it to `dst`.
    pub fn encode_into<B: BufMut>(&self, dst: &mut B) -> Result<(), Error> {
        self.validate()?;

        let word0 = (self.bift_id << 12)
            | ((self.tc as u32) << 9)
            | ((self.s as u32) << 8)
            | self.ttl as u32;
        let word1 = ((self.nibble as u32) << 28)
            | ((self.version as u32) << 24)
            | ((self.bsl as u32) << 20)
            | self.entropy;
        let word2 = ((self.oam as u32) << 30)
            | ((self.rsv as u32) << 28)
            | ((self.dscp as u32) << 22)
            | ((self.proto as u32) << 16)
            | self.bfir_id as u32;

        dst.put_u32(word0);
        dst.put_u32(word1);
        dst.put_u32(word2);
        dst.put_slice(&self.bitstring);

        Ok(())
    }

    /// Unpacks a header from exactly [`HEADER_LEN`] bytes.
    ///
    /// Only the input length can be rejected: the fields partition all 352
    /// bits, so every well-sized bit pattern decodes to some valid header.
    pub fn decode(src: &[u8]) -> Result<Self, Error> {
        if src.len() != HEADER_LEN {
            return Err(Error::Length {
                expected: HEADER_LEN,
                actual: src.len(),
            });
        }

        let mut src = src;
        let word0 = src.get_u32();
        let word1 = src.get_u32();
        let word2 = src.get_u32();

        let mut bitstring = [0u8; BITSTRING_LEN];
        src.copy_to_slice(&mut bitstring);

        Ok(Self {
            bift_id: word0 >> 12,
            tc: ((word0 >> 9) & 0x07) as u8,
            s: (word0 >> 8) & 0x01 == 1,
            ttl: word0 as u8,
            nibble: (word1 >> 28) as u8,
            version: ((word1 >> 24) & 0x0F) as u8,
            bsl: ((word1 >> 20) & 0x0F) as u8,
            entropy: word1 & 0xF_FFFF,
            oam: (word2 >> 30) as u8,
            rsv: ((word2 >> 28) & 0x03) as u8,
            dscp: ((word2 >> 22) & 0x3F) as u8,
            proto: ((word2 >> 16) & 0x3F) as u8,
            bfir_id: word2 as u16,
            bitstring,
        })
    }

    /// Reads a single bit of the bitstring, MSB-first within each byte.
    /// Indexes past 255 read as unset.
    #[inline]
    pub fn bit(&self, index: usize) -> bool {
        debug_assert!(index < BITSTRING_LEN * 8);
        if index >= BITSTRING_LEN * 8 {
            return false;
        }

        self.bitstring[index / 8] & (1 << (7 - index % 8)) != 0
    }

    /// Writes a single bit of the bitstring, MSB-first within each byte.
    /// Indexes past 255 are ignored.
    #[inline]
    pub fn set_bit(&mut self, index: usize, value: bool) {
        debug_assert!(index < BITSTRING_LEN * 8);
        if index >= BITSTRING_LEN * 8 {
            return;
        }

        let mask = 1 << (7 - index % 8);
        if value {
            self.bitstring[index / 8] |= mask;
        } else {
            self.bitstring[index / 8] &= !mask;
        }
    }

    /// Number of bitstring bits the `bsl` code declares: `2^(bsl + 5)`.
    ///
    /// BSL 1 declares 64 bits, 2 declares 128, 3 declares 256, up to 7 for
    /// 4096.
    #[inline]
    pub fn declared_bitstring_bits(&self) -> usize {
        1 << (self.bsl + 5)
    }

    /// Whether `bsl` declares exactly the 256 bits this header carries.
    ///
    /// Extension probe only: `bsl` and the bitstring are independent fields
    /// on the wire, and neither [`validate`](Self::validate) nor
    /// [`encode`](Self::encode) enforce their consistency.
    #[inline]
    pub fn bsl_consistent(&self) -> bool {
        self.bsl == crate::BSL_256
    }
}
