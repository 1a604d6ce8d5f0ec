//! Node addresses
//!
//! Every host and router in the simulation is identified by a small numeric
//! [`Addr`], unique within the simulation and used as the key of every cost
//! and routing table. On the wire an address is rendered as a zero-padded
//! five-digit decimal field, so the canonical name of a node orders
//! lexicographically exactly as its address orders numerically.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::error::PacketError;

/// Numeric address of a node (host or router)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Addr(pub u32);

impl Addr {
    /// Largest address representable in the five-digit wire field
    pub const MAX: u32 = 99_999;

    /// Conventional destination of control packets
    pub const CONTROL: Addr = Addr(0);

    /// Create an address, rejecting values that do not fit the wire field
    pub fn new(value: u32) -> Option<Self> {
        if value <= Self::MAX { Some(Self(value)) } else { None }
    }

    /// The underlying numeric value
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Canonical zero-padded five-digit name, as rendered on the wire
    pub fn canonical_name(&self) -> String {
        format!("{:05}", self.0)
    }

    /// Parse an address out of an ASCII decimal field
    ///
    /// Leading zeros are allowed (the wire field is left-zero-padded); any
    /// non-digit byte rejects the whole field.
    pub fn parse_ascii(field: &[u8]) -> Result<Self, PacketError> {
        if field.is_empty() {
            return Err(PacketError::BadDestination(String::new()));
        }
        let mut value: u32 = 0;
        for &b in field {
            if !b.is_ascii_digit() {
                return Err(PacketError::BadDestination(
                    String::from_utf8_lossy(field).into_owned(),
                ));
            }
            value = value * 10 + u32::from(b - b'0');
            if value > Self::MAX {
                return Err(PacketError::BadDestination(
                    String::from_utf8_lossy(field).into_owned(),
                ));
            }
        }
        Ok(Self(value))
    }
}

impl Display for Addr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Addr> for u32 {
    fn from(addr: Addr) -> Self {
        addr.0
    }
}

/// What kind of node sits behind a link
///
/// Routers participate in the advertisement protocol; hosts are leaf
/// producers/consumers and never receive routing-table rows of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// A router running the distance-vector protocol
    Router,
    /// A host-only leaf endpoint
    Host,
}

impl NodeKind {
    /// Whether this node exchanges route advertisements
    pub fn is_router(&self) -> bool {
        matches!(self, Self::Router)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addr_bounds() {
        assert!(Addr::new(0).is_some());
        assert!(Addr::new(99_999).is_some());
        assert!(Addr::new(100_000).is_none());
    }

    #[test]
    fn test_canonical_name_padding() {
        assert_eq!(Addr(7).canonical_name(), "00007");
        assert_eq!(Addr(99_999).canonical_name(), "99999");
    }

    #[test]
    fn test_canonical_name_orders_like_value() {
        let addrs = [Addr(2), Addr(10), Addr(99_999), Addr(0), Addr(101)];
        let mut by_value = addrs;
        by_value.sort();
        let mut by_name = addrs;
        by_name.sort_by_key(|a| a.canonical_name());
        assert_eq!(by_value, by_name);
    }

    #[test]
    fn test_parse_ascii_strips_leading_zeros() {
        assert_eq!(Addr::parse_ascii(b"00042").unwrap(), Addr(42));
        assert_eq!(Addr::parse_ascii(b"00000").unwrap(), Addr::CONTROL);
    }

    #[test]
    fn test_parse_ascii_rejects_non_digits() {
        assert!(Addr::parse_ascii(b"00H42").is_err());
        assert!(Addr::parse_ascii(b"     ").is_err());
        assert!(Addr::parse_ascii(b"").is_err());
    }
}
