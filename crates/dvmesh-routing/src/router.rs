//! Distance-vector router
//!
//! A [`Router`] owns one [`Interface`](dvmesh_core::Interface) per configured
//! link and a [`RoutingTable`] it converges through advertisement exchange.
//! All state is mutated from a single loop; the queues are the only
//! concurrency boundary, so the router itself needs no locking.
//!
//! The distance vector is populated lazily: the first advertisement request
//! (or the first received advertisement) seeds the one-hop rows from the
//! cost table and bursts the initial advertisement out every interface.

use bytes::Bytes;
use tracing::{debug, warn};

use dvmesh_core::{Addr, Interface, Packet, PacketKind, QueueSelector};

use crate::cost::CostTable;
use crate::error::RouterError;
use crate::table::{INFINITY, RoutingTable};
use crate::vector::DistanceVector;

/// Construction-time configuration for a router
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// This router's address
    pub addr: Addr,
    /// Direct links, one interface per neighbor
    pub cost_table: CostTable,
    /// Per-queue capacity for every interface (0 = unbounded)
    pub queue_capacity: usize,
}

impl RouterConfig {
    pub fn new(addr: Addr, cost_table: CostTable, queue_capacity: usize) -> Self {
        Self {
            addr,
            cost_table,
            queue_capacity,
        }
    }
}

/// Counters for a router's processing path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStats {
    /// Packets taken off inbound queues
    pub packets_processed: u64,
    /// Data packets successfully enqueued toward their next hop
    pub data_forwarded: u64,
    /// Data packets dropped (no route or full outbound queue)
    pub data_dropped: u64,
    /// Advertisements enqueued on outbound queues
    pub advertisements_sent: u64,
    /// Advertisements received and applied
    pub advertisements_received: u64,
    /// Advertisements dropped on a full outbound queue
    pub advertisements_dropped: u64,
    /// Inbound frames that failed to decode or parse
    pub malformed_dropped: u64,
}

/// A distance-vector router
pub struct Router {
    addr: Addr,
    costs: CostTable,
    table: RoutingTable,
    interfaces: Vec<Interface>,
    initialized: bool,
    stats: RouterStats,
}

impl Router {
    /// Build a router from its configuration
    ///
    /// Creates one interface per configured link. The routing table starts
    /// with the single self-row `{self: 0}`; one-hop rows are filled in by
    /// the lazy initialization step.
    pub fn new(config: RouterConfig) -> Self {
        let interface_count = config
            .cost_table
            .iter()
            .map(|(_, n)| n.interface + 1)
            .max()
            .unwrap_or(0);
        let interfaces = (0..interface_count)
            .map(|_| Interface::new(config.queue_capacity))
            .collect();
        Self {
            addr: config.addr,
            table: RoutingTable::new(config.addr),
            costs: config.cost_table,
            interfaces,
            initialized: false,
            stats: RouterStats::default(),
        }
    }

    /// This router's address
    pub fn addr(&self) -> Addr {
        self.addr
    }

    /// The configured links
    pub fn costs(&self) -> &CostTable {
        &self.costs
    }

    /// The current routing table
    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    /// Processing counters
    pub fn stats(&self) -> RouterStats {
        self.stats
    }

    /// Number of interfaces
    pub fn interface_count(&self) -> usize {
        self.interfaces.len()
    }

    /// Shared handle to an interface, for the host/link layer
    pub fn intf(&self, interface: usize) -> Option<&Interface> {
        self.interfaces.get(interface)
    }

    /// Seed one-hop rows from the cost table and burst the first
    /// advertisement out every interface. Runs at most once.
    fn lazy_init(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;

        let links: Vec<(Addr, u32)> = self.costs.iter().map(|(a, n)| (*a, n.cost)).collect();
        for (neighbor, cost) in links {
            self.table.ensure_destination(neighbor);
            self.table.set_self_cost(neighbor, cost);
        }
        // Placeholder columns for router neighbors that have not advertised
        let dests: Vec<Addr> = self.table.destinations().copied().collect();
        let routers: Vec<Addr> = self.costs.router_neighbors().copied().collect();
        for dest in dests {
            for router in &routers {
                if *router != dest && self.table.advertised(&dest, router).is_none() {
                    self.table.record_advertised(dest, *router, INFINITY);
                }
            }
        }

        debug!(router = %self.addr, table = %self.table, "distance vector initialized");
        for interface in 0..self.interfaces.len() {
            self.send_vector_on(interface);
        }
    }

    fn send_vector_on(&mut self, interface: usize) {
        let payload = DistanceVector::from_table(&self.table).render();
        let frame = Packet::control(payload).encode();
        match self.interfaces[interface].enqueue(QueueSelector::Out, frame) {
            Ok(()) => {
                self.stats.advertisements_sent += 1;
                debug!(router = %self.addr, interface, "advertisement sent");
            }
            Err(e) => {
                self.stats.advertisements_dropped += 1;
                warn!(router = %self.addr, interface, error = %e, "advertisement dropped");
            }
        }
    }

    /// Advertise the full routing table out one interface
    ///
    /// The first call (on any interface) triggers lazy initialization, which
    /// itself bursts the advertisement out every interface. Enqueue failures
    /// are logged and counted, never retried.
    pub fn send_routes(&mut self, interface: usize) -> Result<(), RouterError> {
        if !self.initialized {
            self.lazy_init();
            return Ok(());
        }
        if interface >= self.interfaces.len() {
            return Err(RouterError::UnknownInterface(interface));
        }
        self.send_vector_on(interface);
        Ok(())
    }

    /// Advertise the full routing table out every interface
    pub fn advertise_all(&mut self) {
        if !self.initialized {
            self.lazy_init();
            return;
        }
        for interface in 0..self.interfaces.len() {
            self.send_vector_on(interface);
        }
    }

    /// Apply a received advertisement and relax the table
    ///
    /// Identifies the sender from the arrival interface, overwrites the
    /// sender's cached rows, and runs a Bellman-Ford relaxation over the
    /// self-rows. Returns whether any self-row improved; improvements
    /// trigger an immediate re-advertisement out every interface.
    pub fn update_routes(
        &mut self,
        packet: &Packet,
        in_interface: usize,
    ) -> Result<bool, RouterError> {
        let neighbor = self
            .costs
            .neighbor_on(in_interface)
            .ok_or(RouterError::UnknownInterface(in_interface))?;
        let link = self
            .costs
            .link_cost(&neighbor)
            .ok_or(RouterError::UnknownInterface(in_interface))?;
        let vector = DistanceVector::parse(&packet.payload)?;

        self.lazy_init();

        let mut changed = false;
        for (dest, row) in vector.rows() {
            // The sender's own estimate is the only row that matters here
            let Some(&advertised) = row.get(&neighbor) else {
                continue;
            };
            self.table.ensure_destination(*dest);
            self.table.record_advertised(*dest, neighbor, advertised);

            let candidate = if advertised >= INFINITY {
                INFINITY
            } else {
                link.saturating_add(advertised).min(INFINITY)
            };
            let current = self.table.self_cost(dest).unwrap_or(INFINITY);
            if candidate < current {
                self.table.set_self_cost(*dest, candidate);
                changed = true;
                debug!(
                    router = %self.addr,
                    dest = %dest,
                    via = %neighbor,
                    cost = candidate,
                    was = current,
                    "route relaxed"
                );
            }
        }

        if changed {
            self.advertise_all();
        }
        Ok(changed)
    }

    /// Forward a data packet toward its destination
    ///
    /// Direct neighbors take the fast path straight to their interface.
    /// Anything else goes to the cheapest direct-neighbor advertiser for the
    /// destination; ties break to the smallest neighbor address. Returns the
    /// interface the packet left on.
    pub fn forward_packet(
        &mut self,
        packet: Packet,
        in_interface: usize,
    ) -> Result<usize, RouterError> {
        let out = if let Some(link) = self.costs.neighbor(&packet.dst) {
            link.interface
        } else {
            let (via, _) = self
                .table
                .best_direct_advertiser(&packet.dst, &self.costs)
                .ok_or(RouterError::NoRoute(packet.dst))?;
            match self.costs.neighbor(&via) {
                Some(link) => link.interface,
                None => return Err(RouterError::NoRoute(packet.dst)),
            }
        };

        let frame = packet.encode();
        self.interfaces[out].enqueue(QueueSelector::Out, frame)?;
        debug!(
            router = %self.addr,
            dst = %packet.dst,
            in_interface,
            out_interface = out,
            "packet forwarded"
        );
        Ok(out)
    }

    /// Drain every inbound queue once and dispatch by packet kind
    ///
    /// Each interface yields at most one packet per sweep. All failures are
    /// local: the offending packet is dropped, counted, and logged.
    /// Returns the number of packets taken off the queues.
    pub fn process_queues(&mut self) -> usize {
        let mut handled = 0;
        for interface in 0..self.interfaces.len() {
            let Some(frame) = self.interfaces[interface].dequeue(QueueSelector::In) else {
                continue;
            };
            handled += 1;
            self.stats.packets_processed += 1;
            self.handle_frame(frame, interface);
        }
        handled
    }

    fn handle_frame(&mut self, frame: Bytes, interface: usize) {
        let packet = match Packet::decode(&frame) {
            Ok(p) => p,
            Err(e) => {
                self.stats.malformed_dropped += 1;
                warn!(router = %self.addr, interface, error = %e, "malformed frame dropped");
                return;
            }
        };
        match packet.kind {
            PacketKind::Data => match self.forward_packet(packet, interface) {
                Ok(_) => self.stats.data_forwarded += 1,
                Err(e) => {
                    self.stats.data_dropped += 1;
                    warn!(router = %self.addr, interface, error = %e, "data packet dropped");
                }
            },
            PacketKind::Control => match self.update_routes(&packet, interface) {
                Ok(_) => self.stats.advertisements_received += 1,
                Err(e) => {
                    self.stats.malformed_dropped += 1;
                    warn!(router = %self.addr, interface, error = %e, "advertisement dropped");
                }
            },
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("addr", &self.addr)
            .field("interfaces", &self.interfaces.len())
            .field("initialized", &self.initialized)
            .field("stats", &self.stats)
            .finish()
    }
}
