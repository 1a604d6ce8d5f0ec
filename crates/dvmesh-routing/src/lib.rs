//! # dvmesh Routing
//!
//! Distance-vector routing for the dvmesh simulator.
//!
//! ## Core Components
//!
//! - [`CostTable`]: a router's direct links, fixed at construction
//! - [`RoutingTable`]: per-destination rows of advertised costs, including
//!   the router's own best estimates
//! - [`Router`]: the advertisement/relaxation engine and forwarding path
//!
//! ## Protocol
//!
//! Routers exchange their full routing table as in-band control packets.
//! Receiving an advertisement overwrites the sender's cached rows and runs a
//! Bellman-Ford relaxation over the self-rows; any improvement triggers an
//! immediate re-advertisement out every interface. Under a static topology
//! with non-negative costs and no control-packet loss, repeated relaxation
//! converges every self-row to the true shortest-path cost.
//!
//! Deliberately absent, matching the protocol being taught: split-horizon
//! and poison-reverse (count-to-infinity remains possible on cost increases)
//! and any detection of lost control packets (a dropped advertisement leaves
//! stale rows until the next triggered update).

pub mod cost;
pub mod error;
pub mod router;
pub mod table;
pub mod vector;

// Re-export main types
pub use cost::{CostTable, Neighbor};
pub use error::RouterError;
pub use router::{Router, RouterConfig, RouterStats};
pub use table::{INFINITY, RoutingTable};
pub use vector::DistanceVector;
