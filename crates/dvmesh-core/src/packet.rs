//! Network packet and its wire codec
//!
//! A packet is a destination address, a protocol kind, and an opaque payload.
//! The wire form is a fixed-width ASCII header followed by the payload bytes:
//!
//! ```text
//! [0..5)  destination address, left-zero-padded decimal
//! [5..6)  protocol tag: '1' = data, '2' = control
//! [6..)   payload
//! ```
//!
//! Packets are immutable value types; encoding is total, decoding rejects
//! non-digit destinations and unknown tags.

use std::fmt::Display;

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::addr::Addr;
use crate::error::PacketError;

/// Width of the destination field on the wire
pub const DST_LEN: usize = 5;
/// Width of the protocol tag field on the wire
pub const PROT_LEN: usize = 1;
/// Total fixed header width
pub const HEADER_LEN: usize = DST_LEN + PROT_LEN;

const TAG_DATA: u8 = b'1';
const TAG_CONTROL: u8 = b'2';

/// The upper-layer protocol a packet carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PacketKind {
    /// Application data, forwarded toward its destination
    Data,
    /// An in-band routing advertisement
    Control,
}

impl PacketKind {
    fn tag(&self) -> u8 {
        match self {
            Self::Data => TAG_DATA,
            Self::Control => TAG_CONTROL,
        }
    }

    fn from_tag(tag: u8) -> Result<Self, PacketError> {
        match tag {
            TAG_DATA => Ok(Self::Data),
            TAG_CONTROL => Ok(Self::Control),
            other => Err(PacketError::UnknownProtocol(other)),
        }
    }
}

impl Display for PacketKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Data => write!(f, "data"),
            Self::Control => write!(f, "control"),
        }
    }
}

/// A network-layer packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Destination address
    pub dst: Addr,
    /// Protocol kind
    pub kind: PacketKind,
    /// Payload bytes (for control packets: a serialized distance vector)
    pub payload: Bytes,
}

impl Packet {
    /// Create a data packet
    pub fn data(dst: Addr, payload: impl Into<Bytes>) -> Self {
        Self {
            dst,
            kind: PacketKind::Data,
            payload: payload.into(),
        }
    }

    /// Create a control packet (routing advertisement)
    ///
    /// Control packets are consumed by the next-hop router, so they carry
    /// the conventional [`Addr::CONTROL`] destination.
    pub fn control(payload: impl Into<Bytes>) -> Self {
        Self {
            dst: Addr::CONTROL,
            kind: PacketKind::Control,
            payload: payload.into(),
        }
    }

    /// Encode to the wire byte string. Never fails.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_LEN + self.payload.len());
        buf.put_slice(self.dst.canonical_name().as_bytes());
        buf.put_u8(self.kind.tag());
        buf.put_slice(&self.payload);
        buf.freeze()
    }

    /// Decode from a wire byte string
    pub fn decode(frame: &[u8]) -> Result<Self, PacketError> {
        if frame.len() < HEADER_LEN {
            return Err(PacketError::Truncated {
                needed: HEADER_LEN,
                got: frame.len(),
            });
        }
        let dst = Addr::parse_ascii(&frame[..DST_LEN])?;
        let kind = PacketKind::from_tag(frame[DST_LEN])?;
        let payload = Bytes::copy_from_slice(&frame[HEADER_LEN..]);
        Ok(Self { dst, kind, payload })
    }
}

// Display shows the wire rendering with the payload lossily decoded, which
// keeps log lines close to what actually went over the link.
impl Display for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.dst.canonical_name(),
            self.kind.tag() as char,
            String::from_utf8_lossy(&self.payload)
        )
    }
}
