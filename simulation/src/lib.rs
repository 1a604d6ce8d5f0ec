//! # dvmesh Simulation
//!
//! A small network simulator over the dvmesh stack. A [`Topology`] describes
//! the shape of the network; a [`Simulation`] instantiates routers, hosts,
//! and links from it and advances them in deterministic ticks until the
//! distance-vector protocol converges. The scenarios module packages the
//! usual demonstrations, including one that runs every node as its own
//! tokio task.

pub mod link;
pub mod scenarios;
pub mod sim;
pub mod topology;

// Re-export main types
pub use link::Link;
pub use sim::{SimStats, Simulation};
pub use topology::{Edge, Topology, TopologyBuilder};
