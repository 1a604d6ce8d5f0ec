//! Distributed routing table
//!
//! A [`RoutingTable`] holds, for every known destination, one row per
//! advertising router: the most recent cost that router claimed for reaching
//! the destination. The owner's own row is its current best estimate.
//!
//! Invariant (after relaxation): for every destination, the self-row cost is
//! the minimum over all cached neighbor rows plus the corresponding link
//! cost, the direct link cost when the destination is a neighbor, or
//! [`INFINITY`] when unreachable. The table grows monotonically as
//! advertisements arrive and is mutated only by the owning router's loop.

use std::collections::BTreeMap;
use std::fmt::Display;

use dvmesh_core::Addr;

use crate::cost::CostTable;

/// Sentinel cost for "no known path"; never an achievable real cost
pub const INFINITY: u32 = 99_999;

/// Per-destination rows of advertised costs, keyed destination → advertiser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTable {
    owner: Addr,
    rows: BTreeMap<Addr, BTreeMap<Addr, u32>>,
}

impl RoutingTable {
    /// Create a table knowing only that the owner reaches itself at cost 0
    pub fn new(owner: Addr) -> Self {
        let mut rows = BTreeMap::new();
        rows.insert(owner, BTreeMap::from([(owner, 0)]));
        Self { owner, rows }
    }

    /// The router this table belongs to
    pub fn owner(&self) -> Addr {
        self.owner
    }

    /// All rows, destination → advertiser → cost
    pub fn rows(&self) -> &BTreeMap<Addr, BTreeMap<Addr, u32>> {
        &self.rows
    }

    /// Known destinations, in address order
    pub fn destinations(&self) -> impl Iterator<Item = &Addr> {
        self.rows.keys()
    }

    /// The owner's current best-estimate cost to a destination
    pub fn self_cost(&self, dest: &Addr) -> Option<u32> {
        self.rows.get(dest).and_then(|row| row.get(&self.owner)).copied()
    }

    /// Set the owner's best-estimate cost to a destination
    pub fn set_self_cost(&mut self, dest: Addr, cost: u32) {
        self.rows.entry(dest).or_default().insert(self.owner, cost);
    }

    /// The cached cost an advertiser last claimed for a destination
    pub fn advertised(&self, dest: &Addr, advertiser: &Addr) -> Option<u32> {
        self.rows.get(dest).and_then(|row| row.get(advertiser)).copied()
    }

    /// Overwrite the cached row of an advertiser for a destination
    pub fn record_advertised(&mut self, dest: Addr, advertiser: Addr, cost: u32) {
        self.rows.entry(dest).or_default().insert(advertiser, cost);
    }

    /// Make sure a destination row exists, seeding the self-cost UNKNOWN
    ///
    /// Newly learned destinations start unreachable until relaxation finds a
    /// path.
    pub fn ensure_destination(&mut self, dest: Addr) {
        let owner = self.owner;
        self.rows
            .entry(dest)
            .or_default()
            .entry(owner)
            .or_insert(INFINITY);
    }

    /// Best direct-neighbor advertiser for a destination
    ///
    /// Scans the destination's row for advertisers that are also direct
    /// neighbors with a finite advertised cost and returns the cheapest one.
    /// Rows are kept in a `BTreeMap`, so the scan visits advertisers in
    /// ascending address order and a strict minimum keeps the first (=
    /// smallest-address) candidate on ties, which is the deterministic
    /// tie-break rule: zero-padded decimal names order exactly as addresses.
    pub fn best_direct_advertiser(
        &self,
        dest: &Addr,
        costs: &CostTable,
    ) -> Option<(Addr, u32)> {
        let row = self.rows.get(dest)?;
        let mut best: Option<(Addr, u32)> = None;
        for (advertiser, &cost) in row {
            if cost >= INFINITY || !costs.is_neighbor(advertiser) {
                continue;
            }
            match best {
                Some((_, best_cost)) if cost >= best_cost => {}
                _ => best = Some((*advertiser, cost)),
            }
        }
        best
    }

    /// Check the self-row invariant against a cost table (test support)
    ///
    /// For every destination, the self-row must not exceed any cached
    /// neighbor row plus that neighbor's link cost.
    pub fn invariant_holds(&self, costs: &CostTable) -> bool {
        self.rows.iter().all(|(dest, row)| {
            let self_cost = row.get(&self.owner).copied().unwrap_or(INFINITY);
            row.iter()
                .filter(|(advertiser, _)| **advertiser != self.owner)
                .all(|(advertiser, &advertised)| {
                    match costs.link_cost(advertiser) {
                        Some(link) if advertised < INFINITY => {
                            self_cost <= link.saturating_add(advertised)
                                || *dest == self.owner
                        }
                        _ => true,
                    }
                })
        })
    }
}

impl Display for RoutingTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (dest, row) in &self.rows {
            write!(f, "{dest} ->")?;
            for (advertiser, cost) in row {
                if *cost >= INFINITY {
                    write!(f, " {advertiser}:inf")?;
                } else {
                    write!(f, " {advertiser}:{cost}")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dvmesh_core::NodeKind;

    #[test]
    fn test_new_table_has_only_self_row() {
        let t = RoutingTable::new(Addr(1));
        assert_eq!(t.rows().len(), 1);
        assert_eq!(t.self_cost(&Addr(1)), Some(0));
    }

    #[test]
    fn test_ensure_destination_seeds_infinity_once() {
        let mut t = RoutingTable::new(Addr(1));
        t.ensure_destination(Addr(5));
        assert_eq!(t.self_cost(&Addr(5)), Some(INFINITY));

        t.set_self_cost(Addr(5), 4);
        t.ensure_destination(Addr(5));
        // Re-ensuring must not clobber a learned cost
        assert_eq!(t.self_cost(&Addr(5)), Some(4));
    }

    #[test]
    fn test_record_advertised_overwrites() {
        let mut t = RoutingTable::new(Addr(1));
        t.record_advertised(Addr(5), Addr(2), 7);
        t.record_advertised(Addr(5), Addr(2), 3);
        assert_eq!(t.advertised(&Addr(5), &Addr(2)), Some(3));
    }

    #[test]
    fn test_best_direct_advertiser_prefers_cheapest() {
        let mut costs = CostTable::new();
        costs.insert(Addr(2), 0, 1, NodeKind::Router);
        costs.insert(Addr(3), 1, 1, NodeKind::Router);

        let mut t = RoutingTable::new(Addr(1));
        t.record_advertised(Addr(9), Addr(2), 5);
        t.record_advertised(Addr(9), Addr(3), 2);

        assert_eq!(t.best_direct_advertiser(&Addr(9), &costs), Some((Addr(3), 2)));
    }

    #[test]
    fn test_best_direct_advertiser_ties_break_to_smallest_addr() {
        let mut costs = CostTable::new();
        costs.insert(Addr(2), 0, 1, NodeKind::Router);
        costs.insert(Addr(3), 1, 1, NodeKind::Router);

        let mut t = RoutingTable::new(Addr(1));
        t.record_advertised(Addr(9), Addr(3), 4);
        t.record_advertised(Addr(9), Addr(2), 4);

        assert_eq!(t.best_direct_advertiser(&Addr(9), &costs), Some((Addr(2), 4)));
    }

    #[test]
    fn test_best_direct_advertiser_skips_non_neighbors_and_infinity() {
        let mut costs = CostTable::new();
        costs.insert(Addr(2), 0, 1, NodeKind::Router);

        let mut t = RoutingTable::new(Addr(1));
        // Advertiser 4 is cheaper but not a direct neighbor
        t.record_advertised(Addr(9), Addr(4), 1);
        t.record_advertised(Addr(9), Addr(2), INFINITY);

        assert_eq!(t.best_direct_advertiser(&Addr(9), &costs), None);
    }
}
