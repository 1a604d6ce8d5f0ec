//! Tick-driven simulation engine
//!
//! Builds a live network out of a [`Topology`] and advances it in discrete
//! ticks: every router drains its inbound queues once, then every link
//! carries at most one frame per direction. Everything is deterministic for
//! a fixed topology and traffic pattern, which is what makes convergence
//! observable and testable.

use std::collections::BTreeMap;

use anyhow::{Context, bail};
use bytes::Bytes;
use tracing::{debug, info};

use dvmesh_core::{Addr, NodeKind, Packet};
use dvmesh_node::Host;
use dvmesh_routing::{CostTable, Router, RouterConfig};

use crate::link::Link;
use crate::topology::Topology;

/// Aggregate counters across the whole network
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimStats {
    pub ticks: u64,
    pub packets_processed: u64,
    pub data_forwarded: u64,
    pub data_dropped: u64,
    pub advertisements_sent: u64,
    pub frames_moved: u64,
    pub frames_dropped: u64,
}

/// A live network: routers, hosts, and the links between them
pub struct Simulation {
    routers: BTreeMap<Addr, Router>,
    hosts: BTreeMap<Addr, Host>,
    links: Vec<Link>,
    tick: u64,
}

impl Simulation {
    /// Instantiate every node and wire up the links
    ///
    /// Each router gets one interface per neighbor, assigned densely in
    /// neighbor address order. `queue_capacity` applies to every router
    /// queue (0 = unbounded).
    pub fn new(topology: &Topology, queue_capacity: usize) -> anyhow::Result<Self> {
        let mut routers = BTreeMap::new();
        let mut hosts = BTreeMap::new();

        for (addr, kind) in topology.nodes() {
            match kind {
                NodeKind::Router => {
                    let mut costs = CostTable::new();
                    for (i, (neighbor, cost)) in topology.neighbors_of(*addr).iter().enumerate() {
                        let kind = topology
                            .nodes()
                            .get(neighbor)
                            .copied()
                            .context("link to undeclared node")?;
                        costs.insert(*neighbor, i, *cost, kind);
                    }
                    if costs.is_empty() {
                        bail!("router {addr} has no links");
                    }
                    let config = RouterConfig::new(*addr, costs, queue_capacity);
                    routers.insert(*addr, Router::new(config));
                }
                NodeKind::Host => {
                    hosts.insert(*addr, Host::new(*addr));
                }
            }
        }

        let mut links = Vec::new();
        for edge in topology.edges() {
            let a_end = endpoint(&routers, &hosts, edge.a, edge.b)?;
            let b_end = endpoint(&routers, &hosts, edge.b, edge.a)?;
            links.push(Link::new(edge.a, a_end, edge.b, b_end));
        }

        info!(
            routers = routers.len(),
            hosts = hosts.len(),
            links = links.len(),
            "network built"
        );
        Ok(Self {
            routers,
            hosts,
            links,
            tick: 0,
        })
    }

    /// Kick off the protocol: every router bursts its initial advertisement
    pub fn start(&mut self) {
        for router in self.routers.values_mut() {
            router.advertise_all();
        }
    }

    /// Advance one tick; returns how much work happened
    ///
    /// A return of 0 means the network is quiescent: no router had anything
    /// to process and no link had anything to carry.
    pub fn step(&mut self) -> u64 {
        let mut activity = 0;
        for router in self.routers.values_mut() {
            activity += router.process_queues() as u64;
        }
        for link in &mut self.links {
            activity += link.pump();
        }
        self.tick += 1;
        debug!(tick = self.tick, activity, "tick complete");
        activity
    }

    /// Step until a whole tick passes with no activity
    ///
    /// Returns the tick count at quiescence, or an error if the network is
    /// still busy after `max_ticks`.
    pub fn run_until_quiet(&mut self, max_ticks: u64) -> anyhow::Result<u64> {
        let deadline = self.tick + max_ticks;
        while self.step() > 0 {
            if self.tick >= deadline {
                bail!("network still active after {max_ticks} ticks");
            }
        }
        info!(tick = self.tick, "network quiescent");
        Ok(self.tick)
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn router(&self, addr: Addr) -> Option<&Router> {
        self.routers.get(&addr)
    }

    pub fn host(&self, addr: Addr) -> Option<&Host> {
        self.hosts.get(&addr)
    }

    /// A router's converged cost to a destination
    pub fn route_cost(&self, router: Addr, dest: Addr) -> Option<u32> {
        self.routers.get(&router)?.table().self_cost(&dest)
    }

    /// Source a data packet from a host
    pub fn send(&self, from: Addr, to: Addr, payload: impl Into<Bytes>) -> anyhow::Result<()> {
        let host = self.hosts.get(&from).with_context(|| format!("no host {from}"))?;
        host.send(to, payload)?;
        Ok(())
    }

    /// Take the next packet delivered to a host, if any
    pub fn receive(&self, at: Addr) -> Option<Packet> {
        self.hosts.get(&at)?.poll_receive()
    }

    /// Tear the network apart for async execution
    ///
    /// The interface handles inside the links stay shared with the routers
    /// and hosts, so the pieces remain wired together.
    pub fn into_parts(self) -> (BTreeMap<Addr, Router>, BTreeMap<Addr, Host>, Vec<Link>) {
        (self.routers, self.hosts, self.links)
    }

    /// Aggregate counters over all routers and links
    pub fn stats(&self) -> SimStats {
        let mut stats = SimStats {
            ticks: self.tick,
            ..SimStats::default()
        };
        for router in self.routers.values() {
            let r = router.stats();
            stats.packets_processed += r.packets_processed;
            stats.data_forwarded += r.data_forwarded;
            stats.data_dropped += r.data_dropped;
            stats.advertisements_sent += r.advertisements_sent;
        }
        for link in &self.links {
            stats.frames_moved += link.frames_moved();
            stats.frames_dropped += link.frames_dropped();
        }
        stats
    }
}

fn endpoint(
    routers: &BTreeMap<Addr, Router>,
    hosts: &BTreeMap<Addr, Host>,
    node: Addr,
    peer: Addr,
) -> anyhow::Result<dvmesh_core::Interface> {
    if let Some(router) = routers.get(&node) {
        let index = router
            .costs()
            .neighbor(&peer)
            .with_context(|| format!("router {node} has no link to {peer}"))?
            .interface;
        return Ok(router
            .intf(index)
            .with_context(|| format!("router {node} missing interface {index}"))?
            .clone());
    }
    if let Some(host) = hosts.get(&node) {
        return Ok(host.intf().clone());
    }
    bail!("link references unknown node {node}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use dvmesh_routing::INFINITY;

    fn line_with_hosts() -> Simulation {
        // 101 -- 1 -- 2 -- 3 -- 102, router links at cost 1
        let topology = Topology::line(3, 1)
            .with_host(Addr(101), Addr(1), 1)
            .unwrap()
            .with_host(Addr(102), Addr(3), 1)
            .unwrap();
        Simulation::new(&topology, 0).unwrap()
    }

    #[test]
    fn test_build_rejects_isolated_router() {
        let topology = Topology::builder()
            .router(Addr(1))
            .router(Addr(2))
            .router(Addr(3))
            .link(Addr(1), Addr(2), 1)
            .build()
            .unwrap();
        assert!(Simulation::new(&topology, 0).is_err());
    }

    #[test]
    fn test_line_converges_to_shortest_paths() {
        let mut sim = line_with_hosts();
        sim.start();
        sim.run_until_quiet(1000).unwrap();

        // Router 1 reaches router 3 through 2, and the far host through 3
        assert_eq!(sim.route_cost(Addr(1), Addr(3)), Some(2));
        assert_eq!(sim.route_cost(Addr(1), Addr(102)), Some(3));
        assert_eq!(sim.route_cost(Addr(3), Addr(101)), Some(3));
        assert_eq!(sim.route_cost(Addr(2), Addr(2)), Some(0));

        for addr in [Addr(1), Addr(2), Addr(3)] {
            let router = sim.router(addr).unwrap();
            assert!(router.table().invariant_holds(router.costs()));
        }
    }

    #[test]
    fn test_triangle_prefers_cheap_detour() {
        // Direct 1-3 link costs 5, the detour through 2 costs 2
        let topology = Topology::builder()
            .router(Addr(1))
            .router(Addr(2))
            .router(Addr(3))
            .link(Addr(1), Addr(2), 1)
            .link(Addr(2), Addr(3), 1)
            .link(Addr(1), Addr(3), 5)
            .build()
            .unwrap();
        let mut sim = Simulation::new(&topology, 0).unwrap();
        sim.start();
        sim.run_until_quiet(1000).unwrap();

        assert_eq!(sim.route_cost(Addr(1), Addr(3)), Some(2));
        assert_eq!(sim.route_cost(Addr(3), Addr(1)), Some(2));
    }

    #[test]
    fn test_end_to_end_delivery() {
        let mut sim = line_with_hosts();
        sim.start();
        sim.run_until_quiet(1000).unwrap();

        sim.send(Addr(101), Addr(102), Bytes::from_static(b"across the line"))
            .unwrap();
        for _ in 0..20 {
            if let Some(packet) = sim.receive(Addr(102)) {
                assert_eq!(packet.dst, Addr(102));
                assert_eq!(packet.payload.as_ref(), b"across the line");
                return;
            }
            sim.step();
        }
        panic!("packet never delivered");
    }

    #[test]
    fn test_quiescence_is_stable() {
        let mut sim = line_with_hosts();
        sim.start();
        sim.run_until_quiet(1000).unwrap();

        let before = sim.stats();
        for _ in 0..5 {
            assert_eq!(sim.step(), 0);
        }
        let after = sim.stats();
        assert_eq!(before.frames_moved, after.frames_moved);
        assert_eq!(before.packets_processed, after.packets_processed);
    }

    #[test]
    fn test_unreachable_stays_infinite() {
        // Two disconnected router pairs sharing one simulation
        let topology = Topology::builder()
            .router(Addr(1))
            .router(Addr(2))
            .router(Addr(3))
            .router(Addr(4))
            .link(Addr(1), Addr(2), 1)
            .link(Addr(3), Addr(4), 1)
            .build()
            .unwrap();
        let mut sim = Simulation::new(&topology, 0).unwrap();
        sim.start();
        sim.run_until_quiet(1000).unwrap();

        // Router 1 never hears about 3 at all
        assert_eq!(sim.route_cost(Addr(1), Addr(3)), None);
        assert!(sim.route_cost(Addr(1), Addr(2)) < Some(INFINITY));
    }

    #[test]
    fn test_random_mesh_converges() {
        use rand::SeedableRng;
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let topology = Topology::random(8, 0.3, &mut rng);
        let mut sim = Simulation::new(&topology, 0).unwrap();
        sim.start();
        sim.run_until_quiet(10_000).unwrap();

        // Spanning line guarantees full reachability
        for a in 1..=8 {
            for b in 1..=8 {
                let cost = sim.route_cost(Addr(a), Addr(b)).unwrap();
                assert!(cost < INFINITY, "router {a} cannot reach {b}");
                let reverse = sim.route_cost(Addr(b), Addr(a)).unwrap();
                assert_eq!(cost, reverse, "asymmetric cost between {a} and {b}");
            }
        }
    }
}
