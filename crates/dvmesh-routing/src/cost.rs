//! Direct-neighbor cost table
//!
//! The [`CostTable`] describes a router's configured links: for each direct
//! neighbor, the local interface index it sits behind, the link cost, and
//! whether the neighbor is a router or a host-only leaf. The topology is
//! static for the lifetime of a simulation, so the table is built once at
//! router construction and read-only afterward.

use std::collections::BTreeMap;

use dvmesh_core::{Addr, NodeKind};

/// One configured link to a direct neighbor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    /// Local interface index (dense, `0..k`)
    pub interface: usize,
    /// Non-negative link cost
    pub cost: u32,
    /// Whether the neighbor participates in the advertisement protocol
    pub kind: NodeKind,
}

/// A router's direct links, keyed by neighbor address
#[derive(Debug, Clone, Default)]
pub struct CostTable {
    entries: BTreeMap<Addr, Neighbor>,
}

impl CostTable {
    /// Create an empty cost table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a neighbor behind the given interface
    pub fn insert(&mut self, addr: Addr, interface: usize, cost: u32, kind: NodeKind) {
        self.entries.insert(
            addr,
            Neighbor {
                interface,
                cost,
                kind,
            },
        );
    }

    /// Look up a direct neighbor
    pub fn neighbor(&self, addr: &Addr) -> Option<&Neighbor> {
        self.entries.get(addr)
    }

    /// Whether `addr` is a direct neighbor
    pub fn is_neighbor(&self, addr: &Addr) -> bool {
        self.entries.contains_key(addr)
    }

    /// The neighbor reachable over the given interface (reverse view)
    pub fn neighbor_on(&self, interface: usize) -> Option<Addr> {
        self.entries
            .iter()
            .find(|(_, n)| n.interface == interface)
            .map(|(addr, _)| *addr)
    }

    /// Link cost to a direct neighbor
    pub fn link_cost(&self, addr: &Addr) -> Option<u32> {
        self.entries.get(addr).map(|n| n.cost)
    }

    /// Iterate all neighbors in address order
    pub fn iter(&self) -> impl Iterator<Item = (&Addr, &Neighbor)> {
        self.entries.iter()
    }

    /// Iterate only the router neighbors (the ones that advertise)
    pub fn router_neighbors(&self) -> impl Iterator<Item = &Addr> {
        self.entries
            .iter()
            .filter(|(_, n)| n.kind.is_router())
            .map(|(addr, _)| addr)
    }

    /// Number of configured links (= number of interfaces)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no links
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CostTable {
        let mut t = CostTable::new();
        t.insert(Addr(101), 0, 1, NodeKind::Host);
        t.insert(Addr(2), 1, 3, NodeKind::Router);
        t.insert(Addr(3), 2, 1, NodeKind::Router);
        t
    }

    #[test]
    fn test_lookup() {
        let t = sample();
        assert!(t.is_neighbor(&Addr(2)));
        assert!(!t.is_neighbor(&Addr(4)));
        assert_eq!(t.link_cost(&Addr(2)), Some(3));
        assert_eq!(t.neighbor(&Addr(3)).unwrap().interface, 2);
    }

    #[test]
    fn test_reverse_view() {
        let t = sample();
        assert_eq!(t.neighbor_on(0), Some(Addr(101)));
        assert_eq!(t.neighbor_on(1), Some(Addr(2)));
        assert_eq!(t.neighbor_on(5), None);
    }

    #[test]
    fn test_router_neighbors_skip_hosts() {
        let t = sample();
        let routers: Vec<_> = t.router_neighbors().copied().collect();
        assert_eq!(routers, vec![Addr(2), Addr(3)]);
    }
}
