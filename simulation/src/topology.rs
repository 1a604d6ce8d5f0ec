//! Network topology definitions
//!
//! A [`Topology`] is the static shape of a simulated network: which
//! addresses are routers, which are hosts, and the weighted links between
//! them. Builders are provided for the usual teaching shapes (line, ring,
//! star) plus random meshes; arbitrary shapes go through [`Topology::builder`].

use std::collections::BTreeMap;

use anyhow::{Context, bail};
use rand::Rng;

use dvmesh_core::{Addr, NodeKind};

/// A bidirectional weighted link between two nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub a: Addr,
    pub b: Addr,
    pub cost: u32,
}

/// The static shape of a simulated network
#[derive(Debug, Clone)]
pub struct Topology {
    nodes: BTreeMap<Addr, NodeKind>,
    edges: Vec<Edge>,
}

impl Topology {
    pub fn builder() -> TopologyBuilder {
        TopologyBuilder::default()
    }

    /// Routers 1..=n in a chain, every link at the same cost
    pub fn line(routers: u32, cost: u32) -> Self {
        let mut b = Self::builder();
        for i in 1..=routers {
            b = b.router(Addr(i));
        }
        for i in 1..routers {
            b = b.link(Addr(i), Addr(i + 1), cost);
        }
        b.build_unchecked()
    }

    /// Routers 1..=n in a cycle
    pub fn ring(routers: u32, cost: u32) -> Self {
        let mut t = Self::line(routers, cost);
        if routers > 2 {
            t.edges.push(Edge {
                a: Addr(1),
                b: Addr(routers),
                cost,
            });
        }
        t
    }

    /// Router 1 as the hub, routers 2..=n as spokes
    pub fn star(routers: u32, cost: u32) -> Self {
        let mut b = Self::builder();
        for i in 1..=routers {
            b = b.router(Addr(i));
        }
        for i in 2..=routers {
            b = b.link(Addr(1), Addr(i), cost);
        }
        b.build_unchecked()
    }

    /// A connected random mesh: a spanning line plus extra random links
    ///
    /// Link costs are drawn uniformly from `1..=4`. Deterministic for a
    /// seeded generator.
    pub fn random(routers: u32, extra_link_probability: f64, rng: &mut impl Rng) -> Self {
        let mut t = Self::line(routers, 1);
        for a in 1..=routers {
            for b in (a + 2)..=routers {
                if rng.random_bool(extra_link_probability) {
                    t.edges.push(Edge {
                        a: Addr(a),
                        b: Addr(b),
                        cost: rng.random_range(1..=4),
                    });
                }
            }
        }
        t
    }

    /// Attach a host to a router with a direct link
    pub fn with_host(mut self, host: Addr, router: Addr, cost: u32) -> anyhow::Result<Self> {
        match self.nodes.get(&router) {
            Some(NodeKind::Router) => {}
            Some(NodeKind::Host) => bail!("{host} cannot attach to host {router}"),
            None => bail!("{host} cannot attach to unknown node {router}"),
        }
        if self.nodes.insert(host, NodeKind::Host).is_some() {
            bail!("duplicate node address {host}");
        }
        self.edges.push(Edge {
            a: host,
            b: router,
            cost,
        });
        Ok(self)
    }

    /// All nodes with their kinds, in address order
    pub fn nodes(&self) -> &BTreeMap<Addr, NodeKind> {
        &self.nodes
    }

    /// Addresses of all routers, in address order
    pub fn routers(&self) -> impl Iterator<Item = Addr> {
        self.nodes
            .iter()
            .filter(|(_, k)| k.is_router())
            .map(|(a, _)| *a)
    }

    /// Addresses of all hosts, in address order
    pub fn hosts(&self) -> impl Iterator<Item = Addr> {
        self.nodes
            .iter()
            .filter(|(_, k)| !k.is_router())
            .map(|(a, _)| *a)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Neighbors of a node with link costs, in address order
    pub fn neighbors_of(&self, addr: Addr) -> BTreeMap<Addr, u32> {
        let mut out = BTreeMap::new();
        for e in &self.edges {
            if e.a == addr {
                out.insert(e.b, e.cost);
            } else if e.b == addr {
                out.insert(e.a, e.cost);
            }
        }
        out
    }
}

/// Incremental construction of an arbitrary [`Topology`]
#[derive(Debug, Default)]
pub struct TopologyBuilder {
    nodes: BTreeMap<Addr, NodeKind>,
    edges: Vec<Edge>,
}

impl TopologyBuilder {
    pub fn router(mut self, addr: Addr) -> Self {
        self.nodes.insert(addr, NodeKind::Router);
        self
    }

    pub fn host(mut self, addr: Addr) -> Self {
        self.nodes.insert(addr, NodeKind::Host);
        self
    }

    pub fn link(mut self, a: Addr, b: Addr, cost: u32) -> Self {
        self.edges.push(Edge { a, b, cost });
        self
    }

    /// Validate and build the topology
    ///
    /// Rejects self-loops, links to undeclared nodes, duplicate links, and
    /// hosts with more than one link (a host has exactly one interface).
    pub fn build(self) -> anyhow::Result<Topology> {
        let mut degree: BTreeMap<Addr, usize> = BTreeMap::new();
        let mut seen: Vec<(Addr, Addr)> = Vec::new();

        for e in &self.edges {
            if e.a == e.b {
                bail!("self-loop on {}", e.a);
            }
            for end in [e.a, e.b] {
                self.nodes
                    .get(&end)
                    .with_context(|| format!("link references undeclared node {end}"))?;
                *degree.entry(end).or_default() += 1;
            }
            let key = if e.a < e.b { (e.a, e.b) } else { (e.b, e.a) };
            if seen.contains(&key) {
                bail!("duplicate link between {} and {}", key.0, key.1);
            }
            seen.push(key);
        }

        for (addr, kind) in &self.nodes {
            let d = degree.get(addr).copied().unwrap_or(0);
            if !kind.is_router() && d != 1 {
                bail!("host {addr} must have exactly one link, has {d}");
            }
        }

        Ok(Topology {
            nodes: self.nodes,
            edges: self.edges,
        })
    }

    // For the shape constructors, which are valid by construction
    fn build_unchecked(self) -> Topology {
        Topology {
            nodes: self.nodes,
            edges: self.edges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_shape() {
        let t = Topology::line(3, 1);
        assert_eq!(t.routers().collect::<Vec<_>>(), vec![Addr(1), Addr(2), Addr(3)]);
        assert_eq!(t.edges().len(), 2);
        assert_eq!(t.neighbors_of(Addr(2)).len(), 2);
        assert_eq!(t.neighbors_of(Addr(1)).get(&Addr(2)), Some(&1));
    }

    #[test]
    fn test_ring_closes_the_loop() {
        let t = Topology::ring(4, 2);
        assert_eq!(t.edges().len(), 4);
        assert_eq!(t.neighbors_of(Addr(1)).get(&Addr(4)), Some(&2));
    }

    #[test]
    fn test_star_hub_degree() {
        let t = Topology::star(5, 1);
        assert_eq!(t.neighbors_of(Addr(1)).len(), 4);
        assert_eq!(t.neighbors_of(Addr(3)).len(), 1);
    }

    #[test]
    fn test_with_host() {
        let t = Topology::line(2, 1)
            .with_host(Addr(101), Addr(1), 1)
            .unwrap();
        assert_eq!(t.hosts().collect::<Vec<_>>(), vec![Addr(101)]);
        assert_eq!(t.neighbors_of(Addr(1)).len(), 2);

        assert!(Topology::line(2, 1).with_host(Addr(101), Addr(9), 1).is_err());
    }

    #[test]
    fn test_builder_rejects_bad_shapes() {
        // Undeclared endpoint
        assert!(
            Topology::builder()
                .router(Addr(1))
                .link(Addr(1), Addr(2), 1)
                .build()
                .is_err()
        );
        // Self-loop
        assert!(
            Topology::builder()
                .router(Addr(1))
                .link(Addr(1), Addr(1), 1)
                .build()
                .is_err()
        );
        // Host with two links
        assert!(
            Topology::builder()
                .router(Addr(1))
                .router(Addr(2))
                .host(Addr(101))
                .link(Addr(101), Addr(1), 1)
                .link(Addr(101), Addr(2), 1)
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_random_is_connected_and_deterministic() {
        use rand::SeedableRng;
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let t1 = Topology::random(6, 0.4, &mut rng);
        // The spanning line is always present
        assert!(t1.edges().len() >= 5);

        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let t2 = Topology::random(6, 0.4, &mut rng);
        assert_eq!(t1.edges(), t2.edges());
    }
}
