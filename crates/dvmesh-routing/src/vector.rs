//! Distance-vector advertisement codec
//!
//! A control packet's payload carries the sender's entire routing table as
//! concatenated per-destination records:
//!
//! ```text
//! <dest>{<advertiser>:<cost>,<advertiser>:<cost>}...
//! ```
//!
//! Names are the canonical zero-padded 5-digit address rendering and costs
//! are plain decimal (the unreachable sentinel [`INFINITY`] included).
//! Destinations and advertisers appear in ascending address order, so the
//! rendering of a given table is canonical and `parse(render(v)) == v`.

use std::collections::BTreeMap;

use bytes::{BufMut, Bytes, BytesMut};
use dvmesh_core::Addr;
use dvmesh_core::packet::DST_LEN;

use crate::error::RouterError;
use crate::table::RoutingTable;

/// A parsed advertisement: per-destination rows of advertised costs
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DistanceVector {
    rows: BTreeMap<Addr, BTreeMap<Addr, u32>>,
}

impl DistanceVector {
    /// Snapshot a routing table for advertisement
    pub fn from_table(table: &RoutingTable) -> Self {
        Self {
            rows: table.rows().clone(),
        }
    }

    /// The advertised rows, destination → advertiser → cost
    pub fn rows(&self) -> &BTreeMap<Addr, BTreeMap<Addr, u32>> {
        &self.rows
    }

    /// Render as a control-packet payload
    pub fn render(&self) -> Bytes {
        let mut buf = BytesMut::new();
        for (dest, row) in &self.rows {
            buf.put_slice(dest.canonical_name().as_bytes());
            buf.put_u8(b'{');
            for (i, (advertiser, cost)) in row.iter().enumerate() {
                if i > 0 {
                    buf.put_u8(b',');
                }
                buf.put_slice(advertiser.canonical_name().as_bytes());
                buf.put_u8(b':');
                buf.put_slice(cost.to_string().as_bytes());
            }
            buf.put_u8(b'}');
        }
        buf.freeze()
    }

    /// Parse a control-packet payload back into rows
    pub fn parse(payload: &[u8]) -> Result<Self, RouterError> {
        let mut rows: BTreeMap<Addr, BTreeMap<Addr, u32>> = BTreeMap::new();
        let mut pos = 0;

        while pos < payload.len() {
            let dest = take_name(payload, &mut pos)?;
            expect(payload, &mut pos, b'{')?;
            let mut row = BTreeMap::new();

            loop {
                let advertiser = take_name(payload, &mut pos)?;
                expect(payload, &mut pos, b':')?;
                let cost = take_cost(payload, &mut pos)?;
                row.insert(advertiser, cost);

                match payload.get(pos) {
                    Some(b',') => pos += 1,
                    Some(b'}') => {
                        pos += 1;
                        break;
                    }
                    other => return Err(malformed(other, pos, "',' or '}'")),
                }
            }

            rows.insert(dest, row);
        }

        Ok(Self { rows })
    }
}

fn take_name(payload: &[u8], pos: &mut usize) -> Result<Addr, RouterError> {
    let end = *pos + DST_LEN;
    let field = payload
        .get(*pos..end)
        .ok_or_else(|| malformed(None, *pos, "5-digit name"))?;
    let addr = Addr::parse_ascii(field)
        .map_err(|e| RouterError::MalformedAdvertisement(e.to_string()))?;
    *pos = end;
    Ok(addr)
}

fn take_cost(payload: &[u8], pos: &mut usize) -> Result<u32, RouterError> {
    let start = *pos;
    let mut cost: u32 = 0;
    while let Some(b @ b'0'..=b'9') = payload.get(*pos) {
        cost = cost
            .checked_mul(10)
            .and_then(|c| c.checked_add(u32::from(b - b'0')))
            .ok_or_else(|| malformed(None, start, "cost in range"))?;
        *pos += 1;
    }
    if *pos == start {
        return Err(malformed(payload.get(start), start, "decimal cost"));
    }
    Ok(cost)
}

fn expect(payload: &[u8], pos: &mut usize, byte: u8) -> Result<(), RouterError> {
    match payload.get(*pos) {
        Some(b) if *b == byte => {
            *pos += 1;
            Ok(())
        }
        other => Err(malformed(other, *pos, "separator")),
    }
}

fn malformed(got: Option<&u8>, pos: usize, wanted: &str) -> RouterError {
    let got = match got {
        Some(b) => format!("{:?}", *b as char),
        None => "end of payload".to_string(),
    };
    RouterError::MalformedAdvertisement(format!(
        "expected {wanted} at byte {pos}, got {got}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::INFINITY;

    fn sample_table() -> RoutingTable {
        let mut t = RoutingTable::new(Addr(1));
        t.record_advertised(Addr(2), Addr(2), 0);
        t.set_self_cost(Addr(2), 3);
        t.ensure_destination(Addr(3));
        t.record_advertised(Addr(3), Addr(2), 1);
        t
    }

    #[test]
    fn test_render_is_canonical_text() {
        let mut t = RoutingTable::new(Addr(1));
        t.set_self_cost(Addr(2), 3);
        let v = DistanceVector::from_table(&t);
        assert_eq!(
            v.render(),
            Bytes::from_static(b"00001{00001:0}00002{00001:3}"),
        );
    }

    #[test]
    fn test_round_trip() {
        let v = DistanceVector::from_table(&sample_table());
        let parsed = DistanceVector::parse(&v.render()).unwrap();
        assert_eq!(parsed, v);
    }

    #[test]
    fn test_round_trip_keeps_infinity() {
        let mut t = RoutingTable::new(Addr(1));
        t.ensure_destination(Addr(9));
        let v = DistanceVector::from_table(&t);
        let parsed = DistanceVector::parse(&v.render()).unwrap();
        assert_eq!(parsed.rows()[&Addr(9)][&Addr(1)], INFINITY);
    }

    #[test]
    fn test_parse_empty_payload_is_empty_vector() {
        let parsed = DistanceVector::parse(b"").unwrap();
        assert!(parsed.rows().is_empty());
    }

    #[test]
    fn test_parse_rejects_truncated_record() {
        assert!(DistanceVector::parse(b"00001{00001:0").is_err());
        assert!(DistanceVector::parse(b"00001{00001}").is_err());
        assert!(DistanceVector::parse(b"001").is_err());
    }

    #[test]
    fn test_parse_rejects_non_digit_name() {
        let err = DistanceVector::parse(b"0000a{00001:0}").unwrap_err();
        assert!(matches!(err, RouterError::MalformedAdvertisement(_)));
    }
}
